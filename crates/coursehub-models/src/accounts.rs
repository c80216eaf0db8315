//! Learner and educator accounts.
//!
//! Both kinds share the same credential and one-time-code columns; only
//! users carry a resume and a cart. The structs in this module never expose
//! the password hash or OTP state, those are read through
//! [`AccountCredentials`] and [`OtpRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::cart::CartData;
use crate::ids::{EducatorId, UserId};

pub const USER_COLUMNS: &str =
    "id, name, email, image, resume, is_account_verified, cart_data, created_at, updated_at";

pub const EDUCATOR_COLUMNS: &str =
    "id, name, email, image, is_account_verified, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Profile image URL
    pub image: Option<String>,
    /// Resume document URL
    pub resume: Option<String>,
    pub is_account_verified: bool,
    #[schema(value_type = Object)]
    pub cart_data: Json<CartData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Educator {
    pub id: EducatorId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub is_account_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author columns joined as `author_id, author_name, author_email, author_image`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[sqlx(rename = "author_id")]
    pub id: UserId,
    #[sqlx(rename = "author_name")]
    pub name: String,
    #[sqlx(rename = "author_email")]
    pub email: String,
    #[sqlx(rename = "author_image")]
    pub image: Option<String>,
}

/// Educator columns joined as `educator_id, educator_name, educator_email, educator_image`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EducatorSummary {
    #[sqlx(rename = "educator_id")]
    pub id: EducatorId,
    #[sqlx(rename = "educator_name")]
    pub name: String,
    #[sqlx(rename = "educator_email")]
    pub email: String,
    #[sqlx(rename = "educator_image")]
    pub image: Option<String>,
}

/// Login lookup row.
#[derive(Debug, Clone, FromRow)]
pub struct AccountCredentials {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

/// Stored one-time code for one purpose.
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    VerifyEmail,
    ResetPassword,
}

impl OtpPurpose {
    /// `(hash column, expiry column)` on the account tables.
    pub fn columns(&self) -> (&'static str, &'static str) {
        match self {
            Self::VerifyEmail => ("verify_otp_hash", "verify_otp_expires_at"),
            Self::ResetPassword => ("reset_otp_hash", "reset_otp_expires_at"),
        }
    }

    pub fn email_subject(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "Verify your email",
            Self::ResetPassword => "Password reset code",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterAccountDto {
    #[validate(custom(function = "crate::validation::not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountDto {
    #[validate(custom(function = "crate::validation::not_blank", message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpDto {
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RequestResetOtpDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
    #[serde(alias = "newPassword")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserAuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EducatorAuthResponse {
    pub token: String,
    pub educator: Educator,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}
