use anyhow::anyhow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use coursehub_core::AppError;
use coursehub_models::{CartData, CourseId, UserId};

use crate::modules::courses::service::CourseService;

/// Reads the cart with a row lock held until the transaction ends.
async fn lock_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<CartData, AppError> {
    let Json(cart) = sqlx::query_scalar::<_, Json<CartData>>(
        "SELECT cart_data FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
    Ok(cart)
}

async fn store_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    cart: &CartData,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET cart_data = $1, updated_at = NOW() WHERE id = $2")
        .bind(Json(cart))
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub struct CartService;

impl CartService {
    #[instrument(skip(db), fields(user.id = %user_id, course.id = %course_id, db.table = "users"))]
    pub async fn add(db: &PgPool, user_id: UserId, course_id: CourseId) -> Result<CartData, AppError> {
        if !CourseService::exists(db, course_id).await? {
            debug!("Cart add rejected: course not found");
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        let mut tx = db.begin().await?;
        let mut cart = lock_cart(&mut tx, user_id).await?;
        let quantity = cart.add(course_id);
        store_cart(&mut tx, user_id, &cart).await?;
        tx.commit().await?;

        info!(quantity, "Added to cart");
        Ok(cart)
    }

    #[instrument(skip(db), fields(user.id = %user_id, course.id = %course_id, db.table = "users"))]
    pub async fn remove(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CartData, AppError> {
        let mut tx = db.begin().await?;
        let mut cart = lock_cart(&mut tx, user_id).await?;

        let Some(remaining) = cart.remove(course_id) else {
            debug!("Cart remove rejected: item not in cart");
            return Err(AppError::not_found(anyhow!("Item not found in cart")));
        };

        store_cart(&mut tx, user_id, &cart).await?;
        tx.commit().await?;

        info!(remaining, "Removed from cart");
        Ok(cart)
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get(db: &PgPool, user_id: UserId) -> Result<CartData, AppError> {
        let Json(cart) =
            sqlx::query_scalar::<_, Json<CartData>>("SELECT cart_data FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
        Ok(cart)
    }

    /// Empties the cart after an order has been handed to the gateway.
    pub async fn clear(db: &PgPool, user_id: UserId) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET cart_data = '{}'::jsonb, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
