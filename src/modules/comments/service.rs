use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use coursehub_core::{AppError, Paginated, ensure_owner};
use coursehub_models::comments::{AUTHOR_COLUMNS, COMMENT_COLUMNS};
use coursehub_models::{
    Comment, CommentDetails, CommentFilterParams, CommentId, CommentWithAuthor, CreateCommentDto,
    UpdateCommentDto, UserId,
};

use crate::modules::courses::service::CourseService;

fn comment_not_found() -> AppError {
    AppError::not_found(anyhow!("Comment not found"))
}

pub struct CommentService;

impl CommentService {
    #[instrument(skip(db, dto), fields(user.id = %user_id, course.id = %dto.course_id, db.operation = "INSERT", db.table = "comments"))]
    pub async fn create(
        db: &PgPool,
        user_id: UserId,
        dto: CreateCommentDto,
    ) -> Result<Comment, AppError> {
        if !CourseService::exists(db, dto.course_id).await? {
            debug!("Comment rejected: course not found");
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        let comment = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments AS cm (user_id, course_id, comment)
             VALUES ($1, $2, $3)
             RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(dto.course_id)
        .bind(dto.comment.trim())
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error creating comment");
            AppError::from(e)
        })?;

        info!(comment.id = %comment.id, "Comment created");
        Ok(comment)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "comments"))]
    pub async fn get_comment(db: &PgPool, comment_id: CommentId) -> Result<Comment, AppError> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments cm WHERE cm.id = $1",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(comment_not_found)
    }

    pub async fn exists(db: &PgPool, comment_id: CommentId) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
                .bind(comment_id)
                .fetch_one(db)
                .await?;
        Ok(exists)
    }

    /// Loads the comment and rejects callers other than its author.
    pub async fn get_owned(
        db: &PgPool,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<Comment, AppError> {
        let comment = Self::get_comment(db, comment_id).await?;
        ensure_owner(&comment, &user_id)?;
        Ok(comment)
    }

    #[instrument(skip(db, comment, dto), fields(comment.id = %comment.id, db.operation = "UPDATE", db.table = "comments"))]
    pub async fn update(
        db: &PgPool,
        comment: &Comment,
        dto: UpdateCommentDto,
    ) -> Result<Comment, AppError> {
        let updated = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments AS cm SET comment = $1, updated_at = NOW()
             WHERE cm.id = $2
             RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(dto.comment.trim())
        .bind(comment.id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error updating comment");
            AppError::from(e)
        })?
        .ok_or_else(comment_not_found)?;

        info!("Comment updated");
        Ok(updated)
    }

    /// Deletes the comment; its likes go with it.
    #[instrument(skip(db, comment), fields(comment.id = %comment.id, db.operation = "DELETE", db.table = "comments"))]
    pub async fn delete(db: &PgPool, comment: &Comment) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment.id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error deleting comment");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(comment_not_found());
        }

        info!("Comment deleted");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "comments"))]
    pub async fn get_details(
        db: &PgPool,
        comment_id: CommentId,
    ) -> Result<CommentDetails, AppError> {
        sqlx::query_as::<_, CommentDetails>(&format!(
            "SELECT {}, {}, c.course_title
             FROM comments cm
             JOIN users u ON u.id = cm.user_id
             LEFT JOIN courses c ON c.id = cm.course_id
             WHERE cm.id = $1",
            COMMENT_COLUMNS, AUTHOR_COLUMNS
        ))
        .bind(comment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(comment_not_found)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "comments"))]
    pub async fn list(
        db: &PgPool,
        filters: CommentFilterParams,
    ) -> Result<Paginated<CommentWithAuthor>, AppError> {
        let pagination = &filters.pagination;
        debug!(
            limit = %pagination.limit(),
            page = %pagination.page(),
            filter.course_id = ?filters.course_id,
            "Fetching comments"
        );

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments cm WHERE ($1::uuid IS NULL OR cm.course_id = $1)",
        )
        .bind(filters.course_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error counting comments");
            AppError::from(e)
        })?;

        let comments = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "SELECT {}, {} FROM comments cm
             JOIN users u ON u.id = cm.user_id
             WHERE ($1::uuid IS NULL OR cm.course_id = $1)
             ORDER BY cm.created_at DESC
             LIMIT $2 OFFSET $3",
            COMMENT_COLUMNS, AUTHOR_COLUMNS
        ))
        .bind(filters.course_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching comments");
            AppError::from(e)
        })?;

        Ok(Paginated {
            items: comments,
            meta: pagination.meta(total),
        })
    }
}
