use std::collections::BTreeMap;

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

use coursehub_core::AppError;
use coursehub_models::comments::AUTHOR_COLUMNS;
use coursehub_models::{CommentId, Like, LikeCount, LikeDetails, ToggleLikeResponse, UserId};

use crate::modules::comments::service::CommentService;

const LIKE_COLUMNS: &str = "l.id, l.user_id, l.comment_id, l.is_liked, l.created_at";

async fn ensure_comment_exists(db: &PgPool, comment_id: CommentId) -> Result<(), AppError> {
    if CommentService::exists(db, comment_id).await? {
        return Ok(());
    }
    debug!(comment.id = %comment_id, "Comment not found");
    Err(AppError::not_found(anyhow!("Comment not found")))
}

pub struct LikeService;

impl LikeService {
    /// Records a like. The `(user_id, comment_id)` unique constraint decides
    /// concurrent duplicates.
    #[instrument(skip(db), fields(user.id = %user_id, comment.id = %comment_id, db.operation = "INSERT", db.table = "likes"))]
    pub async fn like(
        db: &PgPool,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<Like, AppError> {
        ensure_comment_exists(db, comment_id).await?;

        let like = sqlx::query_as::<_, Like>(&format!(
            "INSERT INTO likes AS l (user_id, comment_id) VALUES ($1, $2) RETURNING {}",
            LIKE_COLUMNS
        ))
        .bind(user_id)
        .bind(comment_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    warn!("Comment already liked");
                    return AppError::conflict(anyhow!("You have already liked this comment"));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow!("Comment not found"));
                }
            }
            error!(error = %e, "Database error creating like");
            AppError::from(e)
        })?;

        info!(like.id = %like.id, "Comment liked");
        Ok(like)
    }

    /// Likes the comment if the caller has not, otherwise removes the like.
    #[instrument(skip(db), fields(user.id = %user_id, comment.id = %comment_id, db.table = "likes"))]
    pub async fn toggle(
        db: &PgPool,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<ToggleLikeResponse, AppError> {
        ensure_comment_exists(db, comment_id).await?;

        let mut tx = db.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            sqlx::query(
                "INSERT INTO likes (user_id, comment_id) VALUES ($1, $2)
                 ON CONFLICT ON CONSTRAINT likes_user_comment_unique DO NOTHING",
            )
            .bind(user_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
            true
        };

        let total_likes =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE comment_id = $1")
                .bind(comment_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        info!(liked, total_likes, "Like toggled");
        Ok(ToggleLikeResponse {
            comment_id,
            liked,
            total_likes,
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "likes"))]
    pub async fn count_for_comment(db: &PgPool, comment_id: CommentId) -> Result<LikeCount, AppError> {
        ensure_comment_exists(db, comment_id).await?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE comment_id = $1")
            .bind(comment_id)
            .fetch_one(db)
            .await?;

        Ok(LikeCount { comment_id, count })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "likes"))]
    pub async fn list_all(db: &PgPool) -> Result<Vec<LikeDetails>, AppError> {
        let likes = sqlx::query_as::<_, LikeDetails>(&format!(
            "SELECT {}, {}, cm.comment AS comment_text
             FROM likes l
             JOIN users u ON u.id = l.user_id
             JOIN comments cm ON cm.id = l.comment_id
             ORDER BY l.created_at DESC",
            LIKE_COLUMNS, AUTHOR_COLUMNS
        ))
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching likes");
            AppError::from(e)
        })?;

        debug!(count = likes.len(), "Likes fetched");
        Ok(likes)
    }

    /// Like totals keyed by comment. Comments without likes are absent.
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "likes"))]
    pub async fn counts_by_comment(db: &PgPool) -> Result<BTreeMap<CommentId, i64>, AppError> {
        let rows = sqlx::query_as::<_, LikeCount>(
            "SELECT comment_id, COUNT(*) AS count FROM likes GROUP BY comment_id",
        )
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(|row| (row.comment_id, row.count)).collect())
    }
}
