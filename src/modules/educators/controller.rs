use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use coursehub_auth::{PrincipalKind, create_access_token};
use coursehub_core::{ApiResponse, AppError, MessageResponse, Paginated, PaginationParams};
use coursehub_models::{
    CountResponse, Educator, EducatorAuthResponse, EducatorId, LoginDto, RegisterAccountDto,
    RequestResetOtpDto, ResetPasswordDto, UpdateAccountDto, VerifyOtpDto,
};

use crate::metrics;
use crate::middleware::auth::CurrentEducator;
use crate::modules::accounts::service::AccountService;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::upload::UploadForm;
use crate::validator::ValidatedJson;

use super::service::EducatorService;

fn issue_token(state: &AppState, educator: &Educator) -> Result<String, AppError> {
    let token = create_access_token(
        educator.id.into_inner(),
        &educator.email,
        PrincipalKind::Educator,
        &state.jwt_config,
    )?;
    metrics::track_jwt_issued();
    Ok(token)
}

#[utoipa::path(
    post,
    path = "/api/educator/registration",
    request_body(content = RegisterAccountDto, content_type = "multipart/form-data",
        description = "Account fields plus an optional `image` file"),
    responses(
        (status = 201, description = "Educator registered", body = EducatorAuthResponse),
        (status = 400, description = "Invalid input or file type", body = MessageResponse),
        (status = 409, description = "Email already exists", body = MessageResponse)
    ),
    tag = "Educators"
)]
#[instrument(skip_all)]
pub async fn register_educator(
    State(state): State<AppState>,
    mut form: UploadForm<RegisterAccountDto>,
) -> Result<(StatusCode, Json<ApiResponse<EducatorAuthResponse>>), AppError> {
    let image = form.take_file("image");
    let educator =
        EducatorService::register(&state.db, state.file_storage.as_ref(), form.data, image).await?;
    let token = issue_token(&state, &educator)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Educator registered successfully",
            EducatorAuthResponse { token, educator },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/educator/login",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Login successful", body = EducatorAuthResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Wrong password", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    ),
    tag = "Educators"
)]
#[instrument(skip_all)]
pub async fn login_educator(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginDto>,
) -> Result<Json<ApiResponse<EducatorAuthResponse>>, AppError> {
    let educator_id = AccountService::authenticate(&state.db, PrincipalKind::Educator, &dto).await?;
    let educator = EducatorService::get_educator(&state.db, EducatorId::from(educator_id)).await?;
    let token = issue_token(&state, &educator)?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        EducatorAuthResponse { token, educator },
    )))
}

#[utoipa::path(
    get,
    path = "/api/educator/educator",
    responses(
        (status = 200, description = "Current educator profile", body = Educator),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Educators",
    security(("bearer_auth" = []))
)]
pub async fn get_educator(CurrentEducator(educator): CurrentEducator) -> Json<ApiResponse<Educator>> {
    Json(ApiResponse::ok(educator))
}

#[utoipa::path(
    put,
    path = "/api/educator/updateEducator",
    request_body(content = UpdateAccountDto, content_type = "multipart/form-data",
        description = "Any of the account fields plus an optional `image` file"),
    responses(
        (status = 200, description = "Profile updated", body = Educator),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 409, description = "Email already exists", body = MessageResponse)
    ),
    tag = "Educators",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id))]
pub async fn update_educator(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
    mut form: UploadForm<UpdateAccountDto>,
) -> Result<Json<ApiResponse<Educator>>, AppError> {
    let image = form.take_file("image");
    let updated = EducatorService::update(
        &state.db,
        state.file_storage.as_ref(),
        &educator,
        form.data,
        image,
    )
    .await?;

    Ok(Json(ApiResponse::with_message(
        "Educator updated successfully",
        updated,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/educator/deleteEducator",
    responses(
        (status = 200, description = "Educator and their courses deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Educators",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id))]
pub async fn delete_educator(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
) -> Result<Json<ApiResponse<()>>, AppError> {
    EducatorService::delete(&state.db, state.file_storage.as_ref(), &educator).await?;
    Ok(Json(ApiResponse::message("Educator deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/educator/sendOtpEmail",
    responses(
        (status = 200, description = "Verification code sent", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    ),
    tag = "Educators",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id))]
pub async fn send_otp_email(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AccountService::send_verification_code(
        &state.db,
        &email_service,
        PrincipalKind::Educator,
        educator.id.into_inner(),
        &educator.email,
        &educator.name,
    )
    .await?;

    Ok(Json(ApiResponse::message("OTP sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/educator/verifyOtpMail",
    request_body = VerifyOtpDto,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "No code requested or code mismatch", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 410, description = "Code expired", body = MessageResponse)
    ),
    tag = "Educators",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(educator.id = %educator.id))]
pub async fn verify_otp_mail(
    State(state): State<AppState>,
    CurrentEducator(educator): CurrentEducator,
    ValidatedJson(dto): ValidatedJson<VerifyOtpDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AccountService::verify_email(
        &state.db,
        PrincipalKind::Educator,
        educator.id.into_inner(),
        &dto.otp,
    )
    .await?;
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

#[utoipa::path(
    post,
    path = "/api/educator/sendResetOtp",
    request_body = RequestResetOtpDto,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    ),
    tag = "Educators"
)]
#[instrument(skip_all)]
pub async fn send_reset_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RequestResetOtpDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AccountService::send_reset_code(
        &state.db,
        &email_service,
        PrincipalKind::Educator,
        &dto.email,
    )
    .await?;
    Ok(Json(ApiResponse::message("Reset OTP sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/educator/verifyResetOtp",
    request_body = ResetPasswordDto,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "No code requested or code mismatch", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse),
        (status = 410, description = "Code expired", body = MessageResponse)
    ),
    tag = "Educators"
)]
#[instrument(skip_all)]
pub async fn verify_reset_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AccountService::reset_password(
        &state.db,
        PrincipalKind::Educator,
        &dto.email,
        &dto.otp,
        &dto.password,
    )
    .await?;
    Ok(Json(ApiResponse::message("Password reset successfully")))
}

#[utoipa::path(
    get,
    path = "/api/educators-list/educators-list",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Educators, newest first", body = Paginated<Educator>),
        (status = 400, description = "Invalid query parameters", body = MessageResponse)
    ),
    tag = "Educators"
)]
#[instrument(skip_all)]
pub async fn list_educators(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<Educator>>>, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let educators = EducatorService::list(&state.db, params).await?;
    Ok(Json(ApiResponse::ok(educators)))
}

#[utoipa::path(
    get,
    path = "/api/educators-list/count-educators",
    responses((status = 200, description = "Number of educators", body = CountResponse)),
    tag = "Educators"
)]
pub async fn count_educators(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CountResponse>>, AppError> {
    let count = EducatorService::count(&state.db).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
