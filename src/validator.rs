use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use coursehub_core::AppError;

pub(crate) fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();

    // Nested list errors (order items) carry no top-level field message.
    if messages.is_empty() {
        messages.push("Invalid request body".to_string());
    }
    messages.sort();
    messages.join(", ")
}

/// Turns a serde error string into a 400 with a readable reason.
pub(crate) fn describe_body_error(error_msg: &str) -> AppError {
    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    // Messages from the lenient field parsers are already user-facing.
    let reason = error_msg
        .split(" at line ")
        .next()
        .unwrap_or(error_msg)
        .trim_start_matches("Failed to deserialize the JSON body into the target type: ")
        .trim();
    if reason.is_empty() {
        return AppError::bad_request(anyhow!("Invalid request body"));
    }
    AppError::bad_request(anyhow!("{}", reason))
}

pub(crate) fn validate_value<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|errors| AppError::bad_request(anyhow!("{}", format_errors(&errors))))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    ));
                }
                if matches!(rejection, JsonRejection::JsonSyntaxError(_)) {
                    return AppError::bad_request(anyhow!("Malformed JSON body"));
                }
                describe_body_error(&rejection.body_text())
            })?;

        validate_value(&value)?;

        Ok(ValidatedJson(value))
    }
}

/// Path parameters parsed into typed ids. A malformed id is a 400.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| IdPath(value))
            .map_err(|_| AppError::bad_request(anyhow!("Invalid id in request path")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_missing_field_message() {
        let err = describe_body_error(
            "Failed to deserialize the JSON body into the target type: missing field `courseId` at line 1 column 2",
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "courseId is required");
    }

    #[test]
    fn test_custom_parser_message_is_kept() {
        let err = describe_body_error(
            "Failed to deserialize the JSON body into the target type: Invalid courseContent format. Must be valid JSON. at line 1 column 40",
        );
        assert_eq!(
            err.public_message(),
            "Invalid courseContent format. Must be valid JSON."
        );
    }
}
