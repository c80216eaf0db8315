use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{my_orders, payment_webhook, place_order, verify_order};

pub fn init_order_router() -> Router<AppState> {
    Router::new()
        .route("/place", post(place_order))
        .route("/verify", post(verify_order))
        .route("/webhook", post(payment_webhook))
        .route("/my-orders", get(my_orders))
}
