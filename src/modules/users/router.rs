use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    count_users, delete_me, get_me, list_users, login_user, register_user, send_email_otp,
    send_reset_otp, update_user, verify_email_otp, verify_reset_otp,
};

pub fn init_user_router() -> Router<AppState> {
    Router::new()
        .route("/registration", post(register_user))
        .route("/login", post(login_user))
        .route("/me", get(get_me).delete(delete_me))
        .route("/update-user", put(update_user))
        .route("/send-email-otp", post(send_email_otp))
        .route("/verify-email-otp", post(verify_email_otp))
        .route("/send-reset-otp", post(send_reset_otp))
        .route("/verify-reset-otp", post(verify_reset_otp))
}

pub fn init_users_directory_router() -> Router<AppState> {
    Router::new()
        .route("/users-total-list", get(list_users))
        .route("/users-count", get(count_users))
}
