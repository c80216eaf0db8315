use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use coursehub_auth::{PrincipalKind, create_access_token};
use coursehub_core::{ApiResponse, AppError, MessageResponse, Paginated, PaginationParams};
use coursehub_models::{
    CountResponse, LoginDto, RegisterAccountDto, RequestResetOtpDto, ResetPasswordDto,
    UpdateAccountDto, User, UserAuthResponse, UserId, VerifyOtpDto,
};

use crate::metrics;
use crate::middleware::auth::CurrentUser;
use crate::modules::accounts::service::AccountService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::upload::UploadForm;
use crate::validator::ValidatedJson;

use super::service::{ProfileFiles, UserService};

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    let token = create_access_token(
        user.id.into_inner(),
        &user.email,
        PrincipalKind::User,
        &state.jwt_config,
    )?;
    metrics::track_jwt_issued();
    Ok(token)
}

#[utoipa::path(
    post,
    path = "/api/user/registration",
    request_body(content = RegisterAccountDto, content_type = "multipart/form-data",
        description = "Account fields plus optional `image` and `resume` files"),
    responses(
        (status = 201, description = "User registered", body = UserAuthResponse),
        (status = 400, description = "Invalid input or file type", body = MessageResponse),
        (status = 409, description = "Email already exists", body = MessageResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn register_user(
    State(state): State<AppState>,
    mut form: UploadForm<RegisterAccountDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserAuthResponse>>), AppError> {
    let files = ProfileFiles {
        image: form.take_file("image"),
        resume: form.take_file("resume"),
    };
    let user = UserService::register(&state.db, state.file_storage.as_ref(), form.data, files).await?;
    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            UserAuthResponse { token, user },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Login successful", body = UserAuthResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Wrong password", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all, fields(email = %dto.email))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginDto>,
) -> Result<Json<ApiResponse<UserAuthResponse>>, AppError> {
    let user_id = AccountService::authenticate(&state.db, PrincipalKind::User, &dto).await?;
    let user = UserService::get_user(&state.db, UserId::from(user_id)).await?;
    let token = issue_token(&state, &user)?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        UserAuthResponse { token, user },
    )))
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Current user profile", body = User),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}

#[utoipa::path(
    put,
    path = "/api/user/update-user",
    request_body(content = UpdateAccountDto, content_type = "multipart/form-data",
        description = "Any of the account fields plus optional `image` and `resume` files"),
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 409, description = "Email already exists", body = MessageResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: UploadForm<UpdateAccountDto>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let files = ProfileFiles {
        image: form.take_file("image"),
        resume: form.take_file("resume"),
    };
    let updated =
        UserService::update(&state.db, state.file_storage.as_ref(), &user, form.data, files).await?;

    Ok(Json(ApiResponse::with_message("User updated successfully", updated)))
}

#[utoipa::path(
    delete,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    UserService::delete(&state.db, state.file_storage.as_ref(), &user).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/user/send-email-otp",
    responses(
        (status = 200, description = "Verification code sent", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn send_email_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AccountService::send_verification_code(
        &state.db,
        &email_service,
        PrincipalKind::User,
        user.id.into_inner(),
        &user.email,
        &user.name,
    )
    .await?;

    Ok(Json(ApiResponse::message("OTP sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/user/verify-email-otp",
    request_body = VerifyOtpDto,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "No code requested or code mismatch", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 410, description = "Code expired", body = MessageResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn verify_email_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<VerifyOtpDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AccountService::verify_email(&state.db, PrincipalKind::User, user.id.into_inner(), &dto.otp)
        .await?;
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

#[utoipa::path(
    post,
    path = "/api/user/send-reset-otp",
    request_body = RequestResetOtpDto,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn send_reset_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RequestResetOtpDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AccountService::send_reset_code(&state.db, &email_service, PrincipalKind::User, &dto.email)
        .await?;
    Ok(Json(ApiResponse::message("Reset OTP sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/user/verify-reset-otp",
    request_body = ResetPasswordDto,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "No code requested or code mismatch", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse),
        (status = 410, description = "Code expired", body = MessageResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn verify_reset_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AccountService::reset_password(
        &state.db,
        PrincipalKind::User,
        &dto.email,
        &dto.otp,
        &dto.password,
    )
    .await?;
    Ok(Json(ApiResponse::message("Password reset successfully")))
}

#[utoipa::path(
    get,
    path = "/api/users/users-total-list",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Users, newest first", body = Paginated<User>),
        (status = 400, description = "Invalid query parameters", body = MessageResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<User>>>, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let users = UserService::list(&state.db, params).await?;
    Ok(Json(ApiResponse::ok(users)))
}

#[utoipa::path(
    get,
    path = "/api/users/users-count",
    responses((status = 200, description = "Number of users", body = CountResponse)),
    tag = "Users"
)]
pub async fn count_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CountResponse>>, AppError> {
    let count = UserService::count(&state.db).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
