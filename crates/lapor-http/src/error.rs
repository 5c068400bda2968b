//! `DomainError` → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use lapor_core::DomainError;
use serde_json::json;

/// Wrapper to convert `DomainError` into an axum response with the uniform
/// `{"success": false, "error": …}` body.
pub struct AppError(pub DomainError);

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DomainError::Authorization(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Projection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "success": false,
            "error": self.0.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::Authentication("x".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (DomainError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                DomainError::Policy("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                DomainError::Transport("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DomainError::Projection("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = AppError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
