use anyhow::anyhow;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, error, info, instrument, warn};

use coursehub_config::PaymentConfig;
use coursehub_core::{AppError, ensure_owner};
use coursehub_models::orders::ORDER_COLUMNS;
use coursehub_models::{
    Order, OrderId, PlaceOrderDto, PlaceOrderResponse, UserId, VerifyOrderDto,
    VerifyOrderResponse,
};

use crate::metrics;
use crate::modules::cart::service::CartService;
use crate::utils::payment::{CheckoutRequest, PaymentError, PaymentGateway, WebhookEvent};

fn order_not_found() -> AppError {
    AppError::not_found(anyhow!("Order not found"))
}

fn payment_not_confirmed() -> AppError {
    AppError::bad_request(anyhow!("Payment not confirmed"))
}

/// Webhook authentication failures are the sender's fault; anything else is ours.
fn webhook_error(e: PaymentError) -> AppError {
    match e {
        PaymentError::InvalidSignature(_)
        | PaymentError::SignatureExpired
        | PaymentError::InvalidPayload(_) => {
            warn!(error = %e, "Webhook rejected");
            AppError::bad_request(anyhow!("Webhook error: {}", e))
        }
        other => AppError::internal(other),
    }
}

pub struct OrderService;

impl OrderService {
    /// Stores the order unpaid, then opens a checkout session for it.
    ///
    /// If the gateway refuses, the pending order is removed again and the
    /// caller's cart is left untouched.
    #[instrument(skip(db, gateway, config, dto), fields(user.id = %user_id, items = dto.items.len(), db.table = "orders"))]
    pub async fn place(
        db: &PgPool,
        gateway: &dyn PaymentGateway,
        config: &PaymentConfig,
        user_id: UserId,
        dto: PlaceOrderDto,
    ) -> Result<PlaceOrderResponse, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, items, address, amount, payment)
             VALUES ($1, $2, $3, $4, FALSE)
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .bind(Json(&dto.items))
        .bind(Json(&dto.address))
        .bind(dto.amount)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error creating order");
            AppError::from(e)
        })?;

        let request = CheckoutRequest::for_order(order.id, &dto.items, config);
        let session = match gateway.create_checkout_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                error!(order.id = %order.id, error = %e, "Checkout session failed");
                Self::delete_unpaid(db, order.id).await?;
                return Err(AppError::internal(e));
            }
        };

        sqlx::query("UPDATE orders SET checkout_session_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(&session.id)
            .bind(order.id)
            .execute(db)
            .await?;

        CartService::clear(db, user_id).await?;

        metrics::track_order_placed();
        info!(order.id = %order.id, amount = order.amount, "Order placed");
        Ok(PlaceOrderResponse {
            order_id: order.id,
            session_url: session.url,
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "orders"))]
    pub async fn get_order(db: &PgPool, order_id: OrderId) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(order_not_found)
    }

    /// Settles the checkout redirect for the order's owner.
    ///
    /// The order is marked paid whenever the gateway reports its session as
    /// paid, whatever the redirect claimed. Otherwise a cancelled checkout
    /// removes the unpaid order and a reported success is a 400.
    #[instrument(skip(db, gateway, dto), fields(user.id = %user_id, order.id = %dto.order_id, success = dto.success))]
    pub async fn verify(
        db: &PgPool,
        gateway: &dyn PaymentGateway,
        user_id: UserId,
        dto: VerifyOrderDto,
    ) -> Result<VerifyOrderResponse, AppError> {
        let order = Self::get_order(db, dto.order_id).await?;
        ensure_owner(&order, &user_id)?;

        if order.payment {
            debug!("Order already paid");
            return Ok(VerifyOrderResponse {
                order_id: order.id,
                paid: true,
            });
        }

        let gateway_paid = match order.checkout_session_id.as_deref() {
            Some(session_id) => gateway
                .session_paid(session_id)
                .await
                .map_err(AppError::internal)?,
            None => {
                warn!("Order has no checkout session");
                false
            }
        };

        if !gateway_paid {
            if dto.success {
                warn!("Gateway has not confirmed payment");
                return Err(payment_not_confirmed());
            }
            Self::delete_unpaid(db, order.id).await?;
            info!("Unpaid order removed after cancelled checkout");
            return Ok(VerifyOrderResponse {
                order_id: order.id,
                paid: false,
            });
        }

        if !dto.success {
            info!("Cancelled redirect for a session the gateway reports paid");
        }
        Self::mark_paid(db, order.id).await?;
        Ok(VerifyOrderResponse {
            order_id: order.id,
            paid: true,
        })
    }

    /// Applies a signed gateway notification.
    #[instrument(skip_all, fields(payload.len = payload.len()))]
    pub async fn handle_webhook(
        db: &PgPool,
        gateway: &dyn PaymentGateway,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), AppError> {
        let event = gateway
            .verify_webhook(payload, signature_header, Utc::now().timestamp())
            .map_err(webhook_error)?;

        match event {
            WebhookEvent::Completed {
                session_id,
                order_id,
            } => {
                let Some(order_id) = Self::order_for_session(db, &session_id, order_id).await? else {
                    warn!(session.id = %session_id, "Completed session matches no order");
                    return Ok(());
                };
                Self::mark_paid(db, order_id).await?;
            }
            WebhookEvent::Expired {
                session_id,
                order_id,
            } => {
                let Some(order_id) = Self::order_for_session(db, &session_id, order_id).await? else {
                    debug!(session.id = %session_id, "Expired session matches no order");
                    return Ok(());
                };
                Self::delete_unpaid(db, order_id).await?;
                info!(order.id = %order_id, "Unpaid order removed after expired checkout");
            }
            WebhookEvent::Ignored(kind) => {
                debug!(event.kind = %kind, "Webhook event ignored");
            }
        }

        Ok(())
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "SELECT", db.table = "orders"))]
    pub async fn list_for_user(db: &PgPool, user_id: UserId) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching orders");
            AppError::from(e)
        })?;

        if orders.is_empty() {
            debug!("User has no orders");
            return Err(AppError::not_found(anyhow!("No orders found")));
        }

        Ok(orders)
    }

    /// Resolves the order a session belongs to, preferring the stored session id.
    async fn order_for_session(
        db: &PgPool,
        session_id: &str,
        fallback: Option<OrderId>,
    ) -> Result<Option<OrderId>, AppError> {
        let found = sqlx::query_scalar::<_, OrderId>(
            "SELECT id FROM orders WHERE checkout_session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(db)
        .await?;
        Ok(found.or(fallback))
    }

    /// Flips `payment` to true. Returns false when the order was already paid
    /// or no longer exists.
    async fn mark_paid(db: &PgPool, order_id: OrderId) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE orders SET payment = TRUE, updated_at = NOW() WHERE id = $1 AND payment = FALSE",
        )
        .bind(order_id)
        .execute(db)
        .await?;

        let flipped = result.rows_affected() > 0;
        if flipped {
            metrics::track_payment_confirmed();
            info!(order.id = %order_id, "Order marked paid");
        }
        Ok(flipped)
    }

    async fn delete_unpaid(db: &PgPool, order_id: OrderId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM orders WHERE id = $1 AND payment = FALSE")
            .bind(order_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
