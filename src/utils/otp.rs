//! Six-digit one-time codes.
//!
//! Only the bcrypt hash of a code is stored, next to its expiry. A code is
//! single-use: both a successful check and an expired presentation clear
//! the stored fields.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use coursehub_core::{AppError, hash_password, verify_password};

pub const OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Missing,
    Expired,
    Mismatch,
}

impl OtpCheck {
    /// Maps a failed check to its HTTP error. `Valid` maps to `Ok`.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            OtpCheck::Valid => Ok(()),
            OtpCheck::Missing => Err(AppError::bad_request(anyhow::anyhow!("No OTP request found"))),
            OtpCheck::Expired => Err(AppError::gone(anyhow::anyhow!("OTP expired"))),
            OtpCheck::Mismatch => Err(AppError::bad_request(anyhow::anyhow!("Invalid OTP"))),
        }
    }
}

pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn otp_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(OTP_TTL_MINUTES)
}

/// Returns the code and its hash.
pub fn issue_otp() -> Result<(String, String), AppError> {
    let code = generate_otp();
    let hash = hash_password(&code)?;
    Ok((code, hash))
}

/// Expiry is checked before the hash, so an expired code is rejected even
/// when it matches.
pub fn check_otp(
    stored_hash: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<OtpCheck, AppError> {
    let (Some(hash), Some(expires_at)) = (stored_hash, expires_at) else {
        return Ok(OtpCheck::Missing);
    };

    if expires_at <= now {
        return Ok(OtpCheck::Expired);
    }

    if verify_password(presented.trim(), hash)? {
        Ok(OtpCheck::Valid)
    } else {
        Ok(OtpCheck::Mismatch)
    }
}
