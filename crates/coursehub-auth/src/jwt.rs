//! Token creation and verification.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use coursehub_config::JwtConfig;
use coursehub_core::AppError;

use crate::claims::{Claims, PrincipalKind};

/// Issues an HS256 access token for the given account.
pub fn create_access_token(
    account_id: Uuid,
    email: &str,
    kind: PrincipalKind,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: account_id.to_string(),
        kind,
        email: email.to_string(),
        exp: now + jwt_config.access_token_expiry.max(0) as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create token: {}", e)))
}

/// Checks signature and expiry. Any failure is a 401.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired token")))
}

/// Like [`verify_token`], but also requires the token to be issued to `kind`.
pub fn verify_token_for(
    token: &str,
    kind: PrincipalKind,
    jwt_config: &JwtConfig,
) -> Result<Claims, AppError> {
    let claims = verify_token(token, jwt_config)?;
    if claims.kind != kind {
        return Err(AppError::unauthorized(anyhow!(
            "Token is not valid for {} access",
            kind
        )));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret".into(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn test_token_carries_kind_and_subject() {
        let id = Uuid::new_v4();
        let token = create_access_token(id, "ada@example.com", PrincipalKind::User, &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.kind, PrincipalKind::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_kind_mismatch_is_unauthorized() {
        let token =
            create_access_token(Uuid::new_v4(), "ada@example.com", PrincipalKind::User, &config())
                .unwrap();
        let err = verify_token_for(&token, PrincipalKind::Educator, &config()).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token =
            create_access_token(Uuid::new_v4(), "ada@example.com", PrincipalKind::User, &config())
                .unwrap();
        let other = JwtConfig {
            secret: "another-secret".into(),
            access_token_expiry: 3600,
        };
        assert!(verify_token(&token, &other).is_err());
    }
}
