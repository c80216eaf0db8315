use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    create_comment, delete_comment, get_comment, list_comments, update_comment,
};

pub fn init_comment_router() -> Router<AppState> {
    Router::new()
        .route("/create-comment", post(create_comment))
        .route("/update-comment/{id}", put(update_comment))
        .route("/delete-comment/{id}", delete(delete_comment))
        .route("/comment/{id}", get(get_comment))
}

pub fn init_comments_router() -> Router<AppState> {
    Router::new().route("/comments", get(list_comments))
}
