use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{like_comment, likes_count, likes_count_all, toggle_like, total_likes};

pub fn init_likes_router() -> Router<AppState> {
    Router::new()
        .route("/like", post(like_comment))
        .route("/toggle-like", post(toggle_like))
}

pub fn init_total_likes_router() -> Router<AppState> {
    Router::new()
        .route("/likes-count/{commentId}", get(likes_count))
        .route("/total-likes", get(total_likes))
        .route("/likes-count-all", get(likes_count_all))
}
