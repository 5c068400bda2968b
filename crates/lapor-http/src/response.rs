//! Uniform success envelope.

use axum::response::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Wrap handler output in the platform's `{"success": true, "data": …}`
/// body. Failures go through [`crate::AppError`] instead.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_has_envelope_shape() {
        let Json(body) = success(json!({ "id": 7 }));
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 7);
    }
}
