use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use coursehub_core::{ApiResponse, AppError, MessageResponse, Paginated};
use coursehub_models::{
    Comment, CommentDetails, CommentFilterParams, CommentId, CommentWithAuthor, CreateCommentDto,
    UpdateCommentDto,
};

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::validator::{IdPath, ValidatedJson};

use super::service::CommentService;

#[utoipa::path(
    post,
    path = "/api/comment/create-comment",
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Missing course id or blank comment", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Course not found", body = MessageResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), AppError> {
    let comment = CommentService::create(&state.db, user.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Comment added successfully", comment)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/comment/update-comment/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    request_body = UpdateCommentDto,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 400, description = "Blank comment", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 403, description = "Not the comment author", body = MessageResponse),
        (status = 404, description = "Comment not found", body = MessageResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id, comment.id = %id))]
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath<CommentId>,
    payload: Result<ValidatedJson<UpdateCommentDto>, AppError>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    let comment = CommentService::get_owned(&state.db, id, user.id).await?;

    let ValidatedJson(dto) = payload?;
    let updated = CommentService::update(&state.db, &comment, dto).await?;
    Ok(Json(ApiResponse::with_message("Comment updated successfully", updated)))
}

#[utoipa::path(
    delete,
    path = "/api/comment/delete-comment/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 403, description = "Not the comment author", body = MessageResponse),
        (status = 404, description = "Comment not found", body = MessageResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id, comment.id = %id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath<CommentId>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let comment = CommentService::get_owned(&state.db, id, user.id).await?;
    CommentService::delete(&state.db, &comment).await?;
    Ok(Json(ApiResponse::message("Comment deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/comment/comment/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment with author and course title", body = CommentDetails),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Comment not found", body = MessageResponse)
    ),
    tag = "Comments",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id, comment.id = %id))]
pub async fn get_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath<CommentId>,
) -> Result<Json<ApiResponse<CommentDetails>>, AppError> {
    let comment = CommentService::get_details(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(comment)))
}

#[utoipa::path(
    get,
    path = "/api/comments/comments",
    params(
        ("courseId" = Option<Uuid>, Query, description = "Only comments on this course"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = Paginated<CommentWithAuthor>),
        (status = 400, description = "Invalid query parameters", body = MessageResponse)
    ),
    tag = "Comments"
)]
#[instrument(skip_all)]
pub async fn list_comments(
    State(state): State<AppState>,
    filters: Result<Query<CommentFilterParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<CommentWithAuthor>>>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let comments = CommentService::list(&state.db, filters).await?;
    Ok(Json(ApiResponse::ok(comments)))
}
