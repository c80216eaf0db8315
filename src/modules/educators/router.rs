use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    count_educators, delete_educator, get_educator, list_educators, login_educator,
    register_educator, send_otp_email, send_reset_otp, update_educator, verify_otp_mail,
    verify_reset_otp,
};

pub fn init_educator_router() -> Router<AppState> {
    Router::new()
        .route("/registration", post(register_educator))
        .route("/login", post(login_educator))
        .route("/educator", get(get_educator))
        .route("/updateEducator", put(update_educator))
        .route("/deleteEducator", delete(delete_educator))
        .route("/sendOtpEmail", post(send_otp_email))
        .route("/verifyOtpMail", post(verify_otp_mail))
        .route("/sendResetOtp", post(send_reset_otp))
        .route("/verifyResetOtp", post(verify_reset_otp))
}

pub fn init_educators_directory_router() -> Router<AppState> {
    Router::new()
        .route("/educators-list", get(list_educators))
        .route("/count-educators", get(count_educators))
}
