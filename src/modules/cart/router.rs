use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{add_to_cart, get_cart, remove_from_cart};

pub fn init_cart_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/remove", post(remove_from_cart))
        .route("/get", post(get_cart))
}
