use axum::{Json, extract::State};
use tracing::instrument;

use coursehub_core::{ApiResponse, AppError, MessageResponse};
use coursehub_models::{CartItemDto, CartResponse};

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::CartService;

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = CartItemDto,
    responses(
        (status = 200, description = "Cart after adding one unit", body = CartResponse),
        (status = 400, description = "Missing item id", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Course not found", body = MessageResponse)
    ),
    tag = "Cart",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<CartItemDto>,
) -> Result<Json<ApiResponse<CartResponse>>, AppError> {
    let cart_data = CartService::add(&state.db, user.id, dto.item_id).await?;
    Ok(Json(ApiResponse::with_message(
        "Added to cart",
        CartResponse { cart_data },
    )))
}

#[utoipa::path(
    post,
    path = "/api/cart/remove",
    request_body = CartItemDto,
    responses(
        (status = 200, description = "Cart after removing one unit", body = CartResponse),
        (status = 400, description = "Missing item id", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Item not in cart", body = MessageResponse)
    ),
    tag = "Cart",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<CartItemDto>,
) -> Result<Json<ApiResponse<CartResponse>>, AppError> {
    let cart_data = CartService::remove(&state.db, user.id, dto.item_id).await?;
    Ok(Json(ApiResponse::with_message(
        "Removed from cart",
        CartResponse { cart_data },
    )))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart", body = CartResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Cart",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<CartResponse>>, AppError> {
    let cart_data = CartService::get(&state.db, user.id).await?;
    Ok(Json(ApiResponse::ok(CartResponse { cart_data })))
}
