//! Shared axum edge for the lapor services.
//!
//! Uniform response envelope (`{"success": true, "data": …}` /
//! `{"success": false, "error": …}`), the `DomainError` → HTTP status
//! mapping, and the JWT auth middleware that turns a bearer token into a
//! `Principal` request extension.

pub mod auth;
pub mod error;
pub mod response;

pub use auth::{jwt_auth, password_digest, JwtConfig, LoginRequest};
pub use error::AppError;
pub use response::success;

use axum::response::Json;
use serde_json::{json, Value};

/// `GET /health` body shared by every service.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
