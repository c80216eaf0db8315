use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use coursehub_auth::PrincipalKind;
use coursehub_core::{AppError, FileStorage, Paginated, PaginationParams, hash_password};
use coursehub_models::accounts::EDUCATOR_COLUMNS;
use coursehub_models::validation::normalize_email;
use coursehub_models::{Educator, EducatorId, RegisterAccountDto, UpdateAccountDto};

use crate::metrics;
use crate::modules::accounts::service::{AccountService, map_email_conflict};
use crate::utils::upload::{UploadFolder, UploadedFile, discard_upload, store_upload};

pub struct EducatorService;

impl EducatorService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "educators"))]
    pub async fn find_educator(
        db: &PgPool,
        educator_id: EducatorId,
    ) -> Result<Option<Educator>, AppError> {
        let educator = sqlx::query_as::<_, Educator>(&format!(
            "SELECT {} FROM educators WHERE id = $1",
            EDUCATOR_COLUMNS
        ))
        .bind(educator_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(educator.id = %educator_id, error = %e, "Database error fetching educator");
            AppError::from(e)
        })?;
        Ok(educator)
    }

    pub async fn get_educator(db: &PgPool, educator_id: EducatorId) -> Result<Educator, AppError> {
        Self::find_educator(db, educator_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Educator not found")))
    }

    async fn store_image(
        storage: &dyn FileStorage,
        image: Option<&UploadedFile>,
    ) -> Result<Option<String>, AppError> {
        match image {
            Some(file) => Ok(Some(
                store_upload(storage, UploadFolder::EducatorImages, file).await?,
            )),
            None => Ok(None),
        }
    }

    #[instrument(skip(db, storage, dto, image), fields(db.operation = "INSERT", db.table = "educators"))]
    pub async fn register(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: RegisterAccountDto,
        image: Option<UploadedFile>,
    ) -> Result<Educator, AppError> {
        let email = normalize_email(&dto.email);
        if AccountService::email_taken(db, PrincipalKind::Educator, &email, None).await? {
            debug!(email = %email, "Registration with existing email");
            return Err(AppError::conflict(anyhow!("Email already exists")));
        }

        let hashed = hash_password(&dto.password)?;
        let image_url = Self::store_image(storage, image.as_ref()).await?;

        let educator = sqlx::query_as::<_, Educator>(&format!(
            "INSERT INTO educators (name, email, password, image)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            EDUCATOR_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(&email)
        .bind(&hashed)
        .bind(image_url.as_deref())
        .fetch_one(db)
        .await;

        let educator = match educator {
            Ok(educator) => educator,
            Err(e) => {
                discard_upload(storage, image_url.as_deref()).await;
                return Err(map_email_conflict(e, &email));
            }
        };

        metrics::track_registration(PrincipalKind::Educator.as_str());
        info!(educator.id = %educator.id, "Educator registered");
        Ok(educator)
    }

    #[instrument(skip(db, storage, educator, dto, image), fields(educator.id = %educator.id, db.operation = "UPDATE", db.table = "educators"))]
    pub async fn update(
        db: &PgPool,
        storage: &dyn FileStorage,
        educator: &Educator,
        dto: UpdateAccountDto,
        image: Option<UploadedFile>,
    ) -> Result<Educator, AppError> {
        let email = dto.email.as_deref().map(normalize_email);
        if let Some(email) = &email
            && AccountService::email_taken(
                db,
                PrincipalKind::Educator,
                email,
                Some(educator.id.into_inner()),
            )
            .await?
        {
            return Err(AppError::conflict(anyhow!("Email already exists")));
        }

        let password = dto.password.as_deref().map(hash_password).transpose()?;
        let image_url = Self::store_image(storage, image.as_ref()).await?;

        let updated = sqlx::query_as::<_, Educator>(&format!(
            "UPDATE educators SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                password = COALESCE($3, password),
                image = COALESCE($4, image),
                updated_at = NOW()
             WHERE id = $5
             RETURNING {}",
            EDUCATOR_COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(email.as_deref())
        .bind(password.as_deref())
        .bind(image_url.as_deref())
        .bind(educator.id)
        .fetch_optional(db)
        .await;

        let updated = match updated {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                discard_upload(storage, image_url.as_deref()).await;
                return Err(AppError::not_found(anyhow!("Educator not found")));
            }
            Err(e) => {
                discard_upload(storage, image_url.as_deref()).await;
                return Err(map_email_conflict(
                    e,
                    email.as_deref().unwrap_or(&educator.email),
                ));
            }
        };

        if image_url.is_some() {
            discard_upload(storage, educator.image.as_deref()).await;
        }

        info!("Educator profile updated");
        Ok(updated)
    }

    /// Deletes the educator and their courses, drops those courses from
    /// every cart and removes the stored images.
    #[instrument(skip(db, storage, educator), fields(educator.id = %educator.id, db.operation = "DELETE", db.table = "educators"))]
    pub async fn delete(
        db: &PgPool,
        storage: &dyn FileStorage,
        educator: &Educator,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let courses = sqlx::query_as::<_, (uuid::Uuid, Option<String>)>(
            "SELECT id, image FROM courses WHERE educator_id = $1",
        )
        .bind(educator.id)
        .fetch_all(&mut *tx)
        .await?;

        let course_keys: Vec<String> = courses.iter().map(|(id, _)| id.to_string()).collect();
        if !course_keys.is_empty() {
            sqlx::query(
                "UPDATE users SET cart_data = cart_data - $1::text[], updated_at = NOW()
                 WHERE cart_data ?| $1::text[]",
            )
            .bind(&course_keys)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query("DELETE FROM educators WHERE id = $1")
            .bind(educator.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error deleting educator");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Educator not found")));
        }

        tx.commit().await?;

        discard_upload(storage, educator.image.as_deref()).await;
        for (_, image) in &courses {
            discard_upload(storage, image.as_deref()).await;
        }

        info!(courses = courses.len(), "Educator deleted");
        Ok(())
    }

    #[instrument(skip(db, pagination), fields(db.operation = "SELECT", db.table = "educators"))]
    pub async fn list(
        db: &PgPool,
        pagination: PaginationParams,
    ) -> Result<Paginated<Educator>, AppError> {
        let total = Self::count(db).await?;

        let educators = sqlx::query_as::<_, Educator>(&format!(
            "SELECT {} FROM educators ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            EDUCATOR_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing educators");
            AppError::from(e)
        })?;

        debug!(total = %total, returned = educators.len(), "Educators fetched");
        Ok(Paginated {
            items: educators,
            meta: pagination.meta(total),
        })
    }

    pub async fn count(db: &PgPool) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM educators")
            .fetch_one(db)
            .await?;
        Ok(total)
    }
}
