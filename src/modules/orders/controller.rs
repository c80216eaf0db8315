use anyhow::anyhow;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::instrument;

use coursehub_core::{ApiResponse, AppError, MessageResponse};
use coursehub_models::{
    Order, PlaceOrderDto, PlaceOrderResponse, VerifyOrderDto, VerifyOrderResponse,
};

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::OrderService;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/api/order/place",
    request_body = PlaceOrderDto,
    responses(
        (status = 201, description = "Order stored unpaid, checkout session opened", body = PlaceOrderResponse),
        (status = 400, description = "Invalid order", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 500, description = "Payment gateway failure", body = MessageResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<PlaceOrderDto>,
) -> Result<(StatusCode, Json<ApiResponse<PlaceOrderResponse>>), AppError> {
    let placed = OrderService::place(
        &state.db,
        state.payment_gateway.as_ref(),
        &state.payment_config,
        user.id,
        dto,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Order placed", placed)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/order/verify",
    request_body = VerifyOrderDto,
    responses(
        (status = 200, description = "Order settled", body = VerifyOrderResponse),
        (status = 400, description = "Payment not confirmed by the gateway", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 403, description = "Not the order owner", body = MessageResponse),
        (status = 404, description = "Order not found", body = MessageResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn verify_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<VerifyOrderDto>,
) -> Result<Json<ApiResponse<VerifyOrderResponse>>, AppError> {
    let result =
        OrderService::verify(&state.db, state.payment_gateway.as_ref(), user.id, dto).await?;
    let message = if result.paid { "Payment successful" } else { "Payment cancelled" };
    Ok(Json(ApiResponse::with_message(message, result)))
}

#[utoipa::path(
    post,
    path = "/api/order/webhook",
    request_body(content = String, content_type = "application/json",
        description = "Raw gateway event, authenticated by the `Stripe-Signature` header"),
    responses(
        (status = 200, description = "Event accepted", body = MessageResponse),
        (status = 400, description = "Bad signature or payload", body = MessageResponse)
    ),
    tag = "Orders"
)]
#[instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing Stripe-Signature header")))?;

    OrderService::handle_webhook(&state.db, state.payment_gateway.as_ref(), &body, signature)
        .await?;
    Ok(Json(ApiResponse::message("Webhook received")))
}

#[utoipa::path(
    get,
    path = "/api/order/my-orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = Vec<Order>),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "No orders yet", body = MessageResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let orders = OrderService::list_for_user(&state.db, user.id).await?;
    Ok(Json(ApiResponse::ok(orders)))
}
