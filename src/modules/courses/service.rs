use anyhow::anyhow;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, error, info, instrument};

use coursehub_core::{AppError, FileStorage, Paginated, ensure_owner};
use coursehub_models::courses::COURSE_COLUMNS;
use coursehub_models::{
    Course, CourseFilterParams, CourseId, CourseWithEducator, CreateCourseDto, EducatorId,
    UpdateCourseDto,
};

use crate::metrics;
use crate::utils::upload::{UploadFolder, UploadedFile, discard_upload, store_upload};

const EDUCATOR_SUMMARY_COLUMNS: &str =
    "e.name AS educator_name, e.email AS educator_email, e.image AS educator_image";

fn course_not_found() -> AppError {
    AppError::not_found(anyhow!("Course not found"))
}

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, storage, dto, image), fields(educator.id = %educator_id, db.operation = "INSERT", db.table = "courses"))]
    pub async fn create(
        db: &PgPool,
        storage: &dyn FileStorage,
        educator_id: EducatorId,
        dto: CreateCourseDto,
        image: Option<UploadedFile>,
    ) -> Result<Course, AppError> {
        let image_url = match &image {
            Some(file) => Some(store_upload(storage, UploadFolder::CourseImages, file).await?),
            None => None,
        };

        let created = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses AS c
                (educator_id, course_title, course_description, course_price, discount,
                 course_content, image, is_published)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE))
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(educator_id)
        .bind(dto.course_title.trim())
        .bind(dto.course_description.trim())
        .bind(dto.course_price)
        .bind(dto.discount)
        .bind(Json(&dto.course_content))
        .bind(image_url.as_deref())
        .bind(dto.is_published)
        .fetch_one(db)
        .await;

        let course = match created {
            Ok(course) => course,
            Err(e) => {
                error!(error = %e, "Database error creating course");
                discard_upload(storage, image_url.as_deref()).await;
                return Err(AppError::from(e));
            }
        };

        metrics::track_course_created();
        info!(course.id = %course.id, chapters = course.course_content.len(), "Course created");
        Ok(course)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_course(db: &PgPool, course_id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses c WHERE c.id = $1",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error fetching course");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!(course.id = %course_id, "Course not found");
            course_not_found()
        })
    }

    pub async fn exists(db: &PgPool, course_id: CourseId) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
                .bind(course_id)
                .fetch_one(db)
                .await?;
        Ok(exists)
    }

    /// Loads the course and rejects callers other than its educator.
    pub async fn get_owned(
        db: &PgPool,
        course_id: CourseId,
        educator_id: EducatorId,
    ) -> Result<Course, AppError> {
        let course = Self::get_course(db, course_id).await?;
        ensure_owner(&course, &educator_id)?;
        Ok(course)
    }

    #[instrument(skip(db, storage, course, dto, image), fields(course.id = %course.id, db.operation = "UPDATE", db.table = "courses"))]
    pub async fn update(
        db: &PgPool,
        storage: &dyn FileStorage,
        course: &Course,
        dto: UpdateCourseDto,
        image: Option<UploadedFile>,
    ) -> Result<Course, AppError> {
        let image_url = match &image {
            Some(file) => Some(store_upload(storage, UploadFolder::CourseImages, file).await?),
            None => None,
        };

        let updated = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses AS c SET
                course_title = COALESCE($1, c.course_title),
                course_description = COALESCE($2, c.course_description),
                course_price = COALESCE($3, c.course_price),
                discount = COALESCE($4, c.discount),
                course_content = COALESCE($5, c.course_content),
                image = COALESCE($6, c.image),
                is_published = COALESCE($7, c.is_published),
                updated_at = NOW()
             WHERE c.id = $8
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(dto.course_title.as_deref().map(str::trim))
        .bind(dto.course_description.as_deref().map(str::trim))
        .bind(dto.course_price)
        .bind(dto.discount)
        .bind(dto.course_content.as_ref().map(Json))
        .bind(image_url.as_deref())
        .bind(dto.is_published)
        .bind(course.id)
        .fetch_optional(db)
        .await;

        let updated = match updated {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                discard_upload(storage, image_url.as_deref()).await;
                return Err(course_not_found());
            }
            Err(e) => {
                error!(error = %e, "Database error updating course");
                discard_upload(storage, image_url.as_deref()).await;
                return Err(AppError::from(e));
            }
        };

        if image_url.is_some() {
            discard_upload(storage, course.image.as_deref()).await;
        }

        info!("Course updated");
        Ok(updated)
    }

    /// Deletes the course and removes it from every cart. Comments are kept.
    #[instrument(skip(db, storage, course), fields(course.id = %course.id, db.operation = "DELETE", db.table = "courses"))]
    pub async fn delete(db: &PgPool, storage: &dyn FileStorage, course: &Course) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error deleting course");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(course_not_found());
        }

        let carts = sqlx::query(
            "UPDATE users SET cart_data = cart_data - $1::text, updated_at = NOW() WHERE cart_data ? $1::text",
        )
        .bind(course.id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        discard_upload(storage, course.image.as_deref()).await;

        info!(carts_cleaned = carts.rows_affected(), "Course deleted");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_with_educator(
        db: &PgPool,
        course_id: CourseId,
    ) -> Result<CourseWithEducator, AppError> {
        sqlx::query_as::<_, CourseWithEducator>(&format!(
            "SELECT {}, {} FROM courses c
             JOIN educators e ON e.id = c.educator_id
             WHERE c.id = $1",
            COURSE_COLUMNS, EDUCATOR_SUMMARY_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(course_not_found)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "courses"))]
    pub async fn list(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<Paginated<CourseWithEducator>, AppError> {
        let pagination = &filters.pagination;
        debug!(
            limit = %pagination.limit(),
            page = %pagination.page(),
            filter.educator_id = ?filters.educator_id,
            filter.published = ?filters.published,
            "Fetching courses"
        );

        const FILTER: &str =
            "($1::uuid IS NULL OR c.educator_id = $1) AND ($2::boolean IS NULL OR c.is_published = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM courses c WHERE {}",
            FILTER
        ))
        .bind(filters.educator_id)
        .bind(filters.published)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error counting courses");
            AppError::from(e)
        })?;

        let courses = sqlx::query_as::<_, CourseWithEducator>(&format!(
            "SELECT {}, {} FROM courses c
             JOIN educators e ON e.id = c.educator_id
             WHERE {}
             ORDER BY c.created_at DESC
             LIMIT $3 OFFSET $4",
            COURSE_COLUMNS, EDUCATOR_SUMMARY_COLUMNS, FILTER
        ))
        .bind(filters.educator_id)
        .bind(filters.published)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching courses");
            AppError::from(e)
        })?;

        debug!(total = %total, returned = courses.len(), "Courses fetched");
        Ok(Paginated {
            items: courses,
            meta: pagination.meta(total),
        })
    }
}
