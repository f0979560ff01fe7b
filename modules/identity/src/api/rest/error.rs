//! HTTP boundary: domain errors become statuses and JSON bodies here, and
//! nowhere else.
//!
//! Mapping: 400 validation (`{"errors":[{field,message}]}`), 401 bad
//! token/password, 403 wrong TFA code or missing role, 404 unknown entity,
//! 409 unique-violation business outcomes, 422 invalid state
//! (`{"error": msg}`), 500 generic with details only in the logs, 502 proxy
//! failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"error": "unauthorized"}),
        )
    }

    #[must_use]
    pub fn bad_gateway() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            serde_json::json!({"error": "upstream region unavailable"}),
        )
    }

    #[must_use]
    pub fn malformed_body() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            serde_json::json!({"errors": [{"field": "body", "message": "invalid JSON body"}]}),
        )
    }

    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            serde_json::json!({"error": "request body too large"}),
        )
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { field, message } => Self::new(
                StatusCode::BAD_REQUEST,
                serde_json::json!({"errors": [{"field": field, "message": message}]}),
            ),
            DomainError::Unauthorized => Self::unauthorized(),
            DomainError::WrongTfaCode => Self::new(
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "wrong TFA code"}),
            ),
            DomainError::Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "forbidden"}),
            ),
            DomainError::NotFound => Self::new(
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": "not found"}),
            ),
            DomainError::Conflict(message) => Self::new(
                StatusCode::CONFLICT,
                serde_json::json!({"error": message}),
            ),
            DomainError::InvalidState(message) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({"error": message}),
            ),
            DomainError::Database(ref source) => {
                tracing::error!(error = %e, source = %source, "request failed on infrastructure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "internal server error"}),
                )
            }
            DomainError::Internal(ref message) => {
                tracing::error!(error = %message, "request failed internally");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "internal server error"}),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_field_detail() {
        let err: ApiError = DomainError::validation("email", "not valid").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body["errors"][0],
            serde_json::json!({"field": "email", "message": "not valid"})
        );
    }

    #[test]
    fn invalid_state_maps_to_422_with_error_body() {
        let err: ApiError = DomainError::invalid_state("Cannot disable last admin user").into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.body,
            serde_json::json!({"error": "Cannot disable last admin user"})
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err: ApiError = DomainError::Internal("secret detail".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body, serde_json::json!({"error": "internal server error"}));
    }
}
