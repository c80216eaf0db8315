use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use coursehub_auth::PrincipalKind;
use coursehub_core::{AppError, FileStorage, Paginated, PaginationParams, hash_password};
use coursehub_models::accounts::USER_COLUMNS;
use coursehub_models::validation::normalize_email;
use coursehub_models::{RegisterAccountDto, UpdateAccountDto, User, UserId};

use crate::metrics;
use crate::modules::accounts::service::{AccountService, map_email_conflict};
use crate::utils::upload::{UploadFolder, UploadedFile, discard_upload, store_upload};

/// Files sent alongside a profile form.
#[derive(Debug, Default)]
pub struct ProfileFiles {
    pub image: Option<UploadedFile>,
    pub resume: Option<UploadedFile>,
}

/// Stored URLs for the files in a [`ProfileFiles`].
#[derive(Debug, Default)]
struct StoredFiles {
    image: Option<String>,
    resume: Option<String>,
}

impl StoredFiles {
    async fn store(storage: &dyn FileStorage, files: &ProfileFiles) -> Result<Self, AppError> {
        let image = match &files.image {
            Some(file) => Some(store_upload(storage, UploadFolder::UserImages, file).await?),
            None => None,
        };
        let resume = match &files.resume {
            Some(file) => match store_upload(storage, UploadFolder::UserResumes, file).await {
                Ok(url) => Some(url),
                Err(e) => {
                    discard_upload(storage, image.as_deref()).await;
                    return Err(e);
                }
            },
            None => None,
        };
        Ok(Self { image, resume })
    }

    async fn discard(self, storage: &dyn FileStorage) {
        discard_upload(storage, self.image.as_deref()).await;
        discard_upload(storage, self.resume.as_deref()).await;
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn find_user(db: &PgPool, user_id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error fetching user");
            AppError::from(e)
        })?;
        Ok(user)
    }

    pub async fn get_user(db: &PgPool, user_id: UserId) -> Result<User, AppError> {
        Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db, storage, dto, files), fields(db.operation = "INSERT", db.table = "users"))]
    pub async fn register(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: RegisterAccountDto,
        files: ProfileFiles,
    ) -> Result<User, AppError> {
        let email = normalize_email(&dto.email);
        if AccountService::email_taken(db, PrincipalKind::User, &email, None).await? {
            debug!(email = %email, "Registration with existing email");
            return Err(AppError::conflict(anyhow!("Email already exists")));
        }

        let hashed = hash_password(&dto.password)?;
        let stored = StoredFiles::store(storage, &files).await?;

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, image, resume)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(&email)
        .bind(&hashed)
        .bind(stored.image.as_deref())
        .bind(stored.resume.as_deref())
        .fetch_one(db)
        .await;

        let user = match inserted {
            Ok(user) => user,
            Err(e) => {
                stored.discard(storage).await;
                return Err(map_email_conflict(e, &email));
            }
        };

        metrics::track_registration(PrincipalKind::User.as_str());
        info!(user.id = %user.id, "User registered");
        Ok(user)
    }

    /// Applies a partial profile update. Replaced files are removed from storage.
    #[instrument(skip(db, storage, user, dto, files), fields(user.id = %user.id, db.operation = "UPDATE", db.table = "users"))]
    pub async fn update(
        db: &PgPool,
        storage: &dyn FileStorage,
        user: &User,
        dto: UpdateAccountDto,
        files: ProfileFiles,
    ) -> Result<User, AppError> {
        let email = dto.email.as_deref().map(normalize_email);
        if let Some(email) = &email
            && AccountService::email_taken(db, PrincipalKind::User, email, Some(user.id.into_inner()))
                .await?
        {
            return Err(AppError::conflict(anyhow!("Email already exists")));
        }

        let password = dto.password.as_deref().map(hash_password).transpose()?;
        let stored = StoredFiles::store(storage, &files).await?;

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                password = COALESCE($3, password),
                image = COALESCE($4, image),
                resume = COALESCE($5, resume),
                updated_at = NOW()
             WHERE id = $6
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(email.as_deref())
        .bind(password.as_deref())
        .bind(stored.image.as_deref())
        .bind(stored.resume.as_deref())
        .bind(user.id)
        .fetch_optional(db)
        .await;

        let updated = match updated {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                stored.discard(storage).await;
                return Err(AppError::not_found(anyhow!("User not found")));
            }
            Err(e) => {
                stored.discard(storage).await;
                return Err(map_email_conflict(e, email.as_deref().unwrap_or(&user.email)));
            }
        };

        if stored.image.is_some() {
            discard_upload(storage, user.image.as_deref()).await;
        }
        if stored.resume.is_some() {
            discard_upload(storage, user.resume.as_deref()).await;
        }

        info!("User profile updated");
        Ok(updated)
    }

    #[instrument(skip(db, storage, user), fields(user.id = %user.id, db.operation = "DELETE", db.table = "users"))]
    pub async fn delete(db: &PgPool, storage: &dyn FileStorage, user: &User) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error deleting user");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        discard_upload(storage, user.image.as_deref()).await;
        discard_upload(storage, user.resume.as_deref()).await;

        info!("User deleted");
        Ok(())
    }

    #[instrument(skip(db, pagination), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn list(db: &PgPool, pagination: PaginationParams) -> Result<Paginated<User>, AppError> {
        let total = Self::count(db).await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing users");
            AppError::from(e)
        })?;

        debug!(total = %total, returned = users.len(), "Users fetched");
        Ok(Paginated {
            items: users,
            meta: pagination.meta(total),
        })
    }

    pub async fn count(db: &PgPool) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(total)
    }
}
