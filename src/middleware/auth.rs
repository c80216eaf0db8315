use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use coursehub_auth::{PrincipalKind, verify_token_for};
use coursehub_core::AppError;
use coursehub_models::{Educator, EducatorId, User, UserId};

use crate::modules::educators::service::EducatorService;
use crate::modules::users::service::UserService;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Not authorized, no token")))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid authorization header format")))
}

fn subject_id(sub: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(sub).map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired token")))
}

/// The learner behind a user token, loaded fresh from the database.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let token = bearer_token(parts)?;
        let claims = verify_token_for(token, PrincipalKind::User, &state.jwt_config)?;
        let user_id = UserId::from(subject_id(&claims.sub)?);

        let user = UserService::find_user(&state.db, user_id)
            .await?
            .ok_or_else(|| {
                debug!(user.id = %user_id, "Token subject no longer exists");
                AppError::unauthorized(anyhow!("User not found"))
            })?;

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// The course owner behind an educator token.
#[derive(Debug, Clone)]
pub struct CurrentEducator(pub Educator);

impl FromRequestParts<AppState> for CurrentEducator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentEducator>() {
            return Ok(current.clone());
        }

        let token = bearer_token(parts)?;
        let claims = verify_token_for(token, PrincipalKind::Educator, &state.jwt_config)?;
        let educator_id = EducatorId::from(subject_id(&claims.sub)?);

        let educator = EducatorService::find_educator(&state.db, educator_id)
            .await?
            .ok_or_else(|| {
                debug!(educator.id = %educator_id, "Token subject no longer exists");
                AppError::unauthorized(anyhow!("Educator not found"))
            })?;

        let current = CurrentEducator(educator);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
