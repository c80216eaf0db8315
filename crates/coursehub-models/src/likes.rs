use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::accounts::UserSummary;
use crate::ids::{CommentId, LikeId, UserId};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub comment_id: CommentId,
    #[serde(rename = "like")]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Like joined with its author and the liked comment's text.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub like: Like,
    #[sqlx(flatten)]
    pub user: UserSummary,
    pub comment_text: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeDto {
    pub comment_id: CommentId,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub comment_id: CommentId,
    pub liked: bool,
    pub total_likes: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeCount {
    pub comment_id: CommentId,
    pub count: i64,
}
