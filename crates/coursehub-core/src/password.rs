use anyhow::anyhow;
use bcrypt::{hash, verify};

use crate::errors::AppError;

/// Work factor for account passwords and one-time codes.
pub const BCRYPT_COST: u32 = 10;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST).map_err(|e| AppError::internal(anyhow!("Failed to hash secret: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash).map_err(|e| AppError::internal(anyhow!("Failed to verify secret: {}", e)))
}
