use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use coursehub_core::{ApiResponse, AppError, MessageResponse};
use coursehub_models::{CommentId, Like, LikeCount, LikeDetails, LikeDto, ToggleLikeResponse};

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::validator::{IdPath, ValidatedJson};

use super::service::LikeService;

#[utoipa::path(
    post,
    path = "/api/likes/like",
    request_body = LikeDto,
    responses(
        (status = 201, description = "Comment liked", body = Like),
        (status = 400, description = "Missing comment id", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Comment not found", body = MessageResponse),
        (status = 409, description = "Already liked", body = MessageResponse)
    ),
    tag = "Likes",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn like_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<LikeDto>,
) -> Result<(StatusCode, Json<ApiResponse<Like>>), AppError> {
    let like = LikeService::like(&state.db, user.id, dto.comment_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Comment liked", like)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/likes/toggle-like",
    request_body = LikeDto,
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleLikeResponse),
        (status = 400, description = "Missing comment id", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse),
        (status = 404, description = "Comment not found", body = MessageResponse)
    ),
    tag = "Likes",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user.id = %user.id))]
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(dto): ValidatedJson<LikeDto>,
) -> Result<Json<ApiResponse<ToggleLikeResponse>>, AppError> {
    let result = LikeService::toggle(&state.db, user.id, dto.comment_id).await?;
    let message = if result.liked { "Comment liked" } else { "Like removed" };
    Ok(Json(ApiResponse::with_message(message, result)))
}

#[utoipa::path(
    get,
    path = "/api/total-likes/likes-count/{commentId}",
    params(("commentId" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like count for the comment", body = LikeCount),
        (status = 404, description = "Comment not found", body = MessageResponse)
    ),
    tag = "Likes"
)]
pub async fn likes_count(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
) -> Result<Json<ApiResponse<LikeCount>>, AppError> {
    let count = LikeService::count_for_comment(&state.db, comment_id).await?;
    Ok(Json(ApiResponse::ok(count)))
}

#[utoipa::path(
    get,
    path = "/api/total-likes/total-likes",
    responses(
        (status = 200, description = "Every like with its user and comment text", body = Vec<LikeDetails>)
    ),
    tag = "Likes"
)]
pub async fn total_likes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LikeDetails>>>, AppError> {
    let likes = LikeService::list_all(&state.db).await?;
    Ok(Json(ApiResponse::ok(likes)))
}

#[utoipa::path(
    get,
    path = "/api/total-likes/likes-count-all",
    responses(
        (status = 200, description = "Map of comment id to like count", body = BTreeMap<String, i64>)
    ),
    tag = "Likes"
)]
pub async fn likes_count_all(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<CommentId, i64>>>, AppError> {
    let counts = LikeService::counts_by_comment(&state.db).await?;
    Ok(Json(ApiResponse::ok(counts)))
}
