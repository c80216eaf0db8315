use chrono::{DateTime, Utc};
use coursehub_core::PaginationParams;
use coursehub_core::ownership::Owned;
use coursehub_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::accounts::UserSummary;
use crate::ids::{CommentId, CourseId, UserId};

pub const COMMENT_COLUMNS: &str = "cm.id, cm.user_id, cm.course_id, cm.comment, cm.created_at, cm.updated_at";

/// Author join used by comment and like listings.
pub const AUTHOR_COLUMNS: &str =
    "u.id AS author_id, u.name AS author_name, u.email AS author_email, u.image AS author_image";

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    /// Not a foreign key: comments outlive a deleted course.
    pub course_id: CourseId,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
    type Owner = UserId;
    const RESOURCE: &'static str = "comment";

    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub comment: Comment,
    #[sqlx(flatten)]
    pub author: UserSummary,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub comment: Comment,
    #[sqlx(flatten)]
    pub author: UserSummary,
    /// `None` once the course has been deleted.
    pub course_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentDto {
    pub course_id: CourseId,
    #[validate(custom(function = "crate::validation::not_blank", message = "Comment cannot be empty"))]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentDto {
    #[validate(custom(function = "crate::validation::not_blank", message = "Comment cannot be empty"))]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
