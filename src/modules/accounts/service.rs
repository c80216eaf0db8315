use anyhow::anyhow;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use coursehub_auth::PrincipalKind;
use coursehub_core::{AppError, hash_password, verify_password};
use coursehub_models::validation::normalize_email;
use coursehub_models::{AccountCredentials, LoginDto, OtpPurpose, OtpRecord};

use crate::metrics;
use crate::utils::email::EmailService;
use crate::utils::otp::{OtpCheck, check_otp, issue_otp, otp_expiry};

fn table(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::User => "users",
        PrincipalKind::Educator => "educators",
    }
}

fn not_found(kind: PrincipalKind) -> AppError {
    match kind {
        PrincipalKind::User => AppError::not_found(anyhow!("User not found")),
        PrincipalKind::Educator => AppError::not_found(anyhow!("Educator not found")),
    }
}

/// Maps a unique violation on the email column to 409.
pub fn map_email_conflict(e: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!(email = %email, "Email already registered");
        return AppError::conflict(anyhow!("Email already exists"));
    }
    error!(error = %e, "Database error writing account");
    AppError::from(e)
}

pub struct AccountService;

impl AccountService {
    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn email_taken(
        db: &PgPool,
        kind: PrincipalKind,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
            table(kind)
        );
        let taken = sqlx::query_scalar::<_, bool>(&query)
            .bind(normalize_email(email))
            .bind(except)
            .fetch_one(db)
            .await?;
        Ok(taken)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn find_credentials(
        db: &PgPool,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<AccountCredentials>, AppError> {
        let query = format!("SELECT id, email, password FROM {} WHERE email = $1", table(kind));
        let credentials = sqlx::query_as::<_, AccountCredentials>(&query)
            .bind(normalize_email(email))
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error fetching credentials");
                AppError::from(e)
            })?;
        Ok(credentials)
    }

    /// Returns the account id when the password matches.
    #[instrument(skip(db, dto), fields(email = %dto.email, kind = %kind))]
    pub async fn authenticate(
        db: &PgPool,
        kind: PrincipalKind,
        dto: &LoginDto,
    ) -> Result<Uuid, AppError> {
        let credentials = Self::find_credentials(db, kind, &dto.email)
            .await?
            .ok_or_else(|| {
                metrics::track_login_failure(kind.as_str(), "unknown_email");
                debug!("Login attempt for unknown email");
                not_found(kind)
            })?;

        if !verify_password(&dto.password, &credentials.password)? {
            metrics::track_login_failure(kind.as_str(), "invalid_password");
            warn!(account.id = %credentials.id, "Invalid password");
            return Err(AppError::unauthorized(anyhow!("Invalid credentials")));
        }

        metrics::track_login_success(kind.as_str());
        info!(account.id = %credentials.id, "Login successful");
        Ok(credentials.id)
    }

    pub async fn set_password(
        conn: &mut PgConnection,
        kind: PrincipalKind,
        account_id: Uuid,
        password: &str,
    ) -> Result<(), AppError> {
        let hashed = hash_password(password)?;
        let query = format!(
            "UPDATE {} SET password = $1, updated_at = NOW() WHERE id = $2",
            table(kind)
        );
        sqlx::query(&query)
            .bind(hashed)
            .bind(account_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Stores a fresh code for `purpose`, replacing any earlier one, and
    /// returns the plain code.
    #[instrument(skip(db), fields(kind = %kind, account.id = %account_id, db.operation = "UPDATE"))]
    pub async fn issue_code(
        db: &PgPool,
        kind: PrincipalKind,
        account_id: Uuid,
        purpose: OtpPurpose,
    ) -> Result<String, AppError> {
        let (code, hash) = issue_otp()?;
        let (hash_col, expiry_col) = purpose.columns();
        let query = format!(
            "UPDATE {} SET {} = $1, {} = $2, updated_at = NOW() WHERE id = $3",
            table(kind),
            hash_col,
            expiry_col
        );

        let result = sqlx::query(&query)
            .bind(&hash)
            .bind(otp_expiry(Utc::now()))
            .bind(account_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(kind));
        }

        debug!(?purpose, "One-time code issued");
        Ok(code)
    }

    /// Runs the one-time-code check and consumes the code on success.
    ///
    /// An expired code is cleared before the 410 is returned.
    #[instrument(skip(conn, presented), fields(kind = %kind, account.id = %account_id))]
    pub async fn consume_code(
        conn: &mut PgConnection,
        kind: PrincipalKind,
        account_id: Uuid,
        purpose: OtpPurpose,
        presented: &str,
    ) -> Result<(), AppError> {
        let (hash_col, expiry_col) = purpose.columns();
        let select = format!(
            "SELECT {} AS otp_hash, {} AS otp_expires_at FROM {} WHERE id = $1",
            hash_col,
            expiry_col,
            table(kind)
        );
        let record = sqlx::query_as::<_, OtpRecord>(&select)
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(kind))?;

        let outcome = check_otp(
            record.otp_hash.as_deref(),
            record.otp_expires_at,
            presented,
            Utc::now(),
        )?;

        let clear = format!(
            "UPDATE {} SET {} = NULL, {} = NULL, updated_at = NOW() WHERE id = $1 AND {} = $2",
            table(kind),
            hash_col,
            expiry_col,
            hash_col
        );

        match outcome {
            OtpCheck::Expired => {
                sqlx::query(&clear)
                    .bind(account_id)
                    .bind(record.otp_hash.as_deref())
                    .execute(&mut *conn)
                    .await?;
                debug!(?purpose, "Expired one-time code cleared");
                outcome.into_result()
            }
            OtpCheck::Valid => {
                // Conditional on the hash so a code is consumed at most once.
                let result = sqlx::query(&clear)
                    .bind(account_id)
                    .bind(record.otp_hash.as_deref())
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return OtpCheck::Missing.into_result();
                }
                debug!(?purpose, "One-time code consumed");
                Ok(())
            }
            other => other.into_result(),
        }
    }

    #[instrument(skip(conn))]
    pub async fn mark_verified(
        conn: &mut PgConnection,
        kind: PrincipalKind,
        account_id: Uuid,
    ) -> Result<(), AppError> {
        let query = format!(
            "UPDATE {} SET is_account_verified = TRUE, updated_at = NOW() WHERE id = $1",
            table(kind)
        );
        sqlx::query(&query).bind(account_id).execute(&mut *conn).await?;
        Ok(())
    }

    /// Issues a verify-email code for a signed-in account and mails it.
    pub async fn send_verification_code(
        db: &PgPool,
        email_service: &EmailService,
        kind: PrincipalKind,
        account_id: Uuid,
        email: &str,
        name: &str,
    ) -> Result<(), AppError> {
        let code = Self::issue_code(db, kind, account_id, OtpPurpose::VerifyEmail).await?;
        email_service
            .send_otp_email(email, name, &code, OtpPurpose::VerifyEmail)
            .await
    }

    pub async fn verify_email(
        db: &PgPool,
        kind: PrincipalKind,
        account_id: Uuid,
        otp: &str,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;
        if let Err(e) =
            Self::consume_code(&mut *tx, kind, account_id, OtpPurpose::VerifyEmail, otp).await
        {
            // Keeps the clearing of an expired code.
            tx.commit().await?;
            return Err(e);
        }
        Self::mark_verified(&mut *tx, kind, account_id).await?;
        tx.commit().await?;
        info!(kind = %kind, account.id = %account_id, "Email verified");
        Ok(())
    }

    /// Looks the account up by email and mails a reset code.
    #[instrument(skip(db, email_service), fields(kind = %kind))]
    pub async fn send_reset_code(
        db: &PgPool,
        email_service: &EmailService,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<(), AppError> {
        let query = format!("SELECT id, name FROM {} WHERE email = $1", table(kind));
        let (account_id, name) = sqlx::query_as::<_, (Uuid, String)>(&query)
            .bind(normalize_email(email))
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found(kind))?;

        let code = Self::issue_code(db, kind, account_id, OtpPurpose::ResetPassword).await?;
        email_service
            .send_otp_email(&normalize_email(email), &name, &code, OtpPurpose::ResetPassword)
            .await
    }

    #[instrument(skip(db, otp, new_password), fields(kind = %kind))]
    pub async fn reset_password(
        db: &PgPool,
        kind: PrincipalKind,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let credentials = Self::find_credentials(db, kind, email)
            .await?
            .ok_or_else(|| not_found(kind))?;

        // The code is only spent if the new password is stored with it.
        let mut tx = db.begin().await?;
        if let Err(e) =
            Self::consume_code(&mut *tx, kind, credentials.id, OtpPurpose::ResetPassword, otp).await
        {
            tx.commit().await?;
            return Err(e);
        }
        Self::set_password(&mut *tx, kind, credentials.id, new_password).await?;
        tx.commit().await?;

        info!(account.id = %credentials.id, "Password reset");
        Ok(())
    }
}
