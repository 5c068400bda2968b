//! JWT auth edge.
//!
//! Extracts `Authorization: Bearer <token>`, validates the HS256 signature,
//! and injects a [`Principal`] into request extensions. Token issuing lives
//! here too so the per-service login handlers stay thin. The secret comes
//! from `LAPOR_JWT_SECRET`; the core never sees raw credentials.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lapor_core::{DomainError, Principal, Role};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried in the signed token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    pub exp: i64,
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self {
            subject: c.sub,
            role: c.role,
            agency: c.agency,
        }
    }
}

/// `POST /auth/login` request body, shared by every service.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Keys and validation rules for the HS256 tokens.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtConfig {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Read the secret from `LAPOR_JWT_SECRET`.
    pub fn from_env() -> Self {
        let secret = lapor_core::config::env_or("LAPOR_JWT_SECRET", "lapor-dev-secret");
        Self::from_secret(secret.as_bytes())
    }

    /// Issue a token for an authenticated identity.
    pub fn issue(&self, principal: &Principal) -> Result<String, DomainError> {
        let claims = Claims {
            sub: principal.subject.clone(),
            role: principal.role,
            agency: principal.agency.clone(),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::Authentication(format!("token issue failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| DomainError::Authentication(format!("invalid token: {e}")))
    }
}

/// Axum middleware layer that validates the bearer token and injects
/// `Principal`. Mount with `axum::middleware::from_fn` behind an
/// `Extension(JwtConfig)` layer.
pub async fn jwt_auth(mut req: Request, next: Next) -> Result<Response, Response> {
    let jwt_config = req
        .extensions()
        .get::<JwtConfig>()
        .cloned()
        .ok_or_else(|| unauthorized("JWT config not initialized"))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("expected 'Bearer <token>'"))?;

    let principal = jwt_config.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "token validation failed");
        unauthorized(&e.to_string())
    })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn unauthorized(msg: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": msg })),
    )
        .into_response()
}

/// Hex SHA-256 digest used for the demo user tables. Replace with a real
/// password hash when the credential store moves out of Postgres seed data.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn officer() -> Principal {
        Principal {
            subject: "officer1".into(),
            role: Role::Officer,
            agency: Some("AGENCY_INFRA".into()),
        }
    }

    #[test]
    fn issued_token_verifies_back_to_the_principal() {
        let cfg = JwtConfig::from_secret(b"test-secret");
        let token = cfg.issue(&officer()).unwrap();
        let principal = cfg.verify(&token).unwrap();
        assert_eq!(principal.subject, "officer1");
        assert_eq!(principal.role, Role::Officer);
        assert_eq!(principal.agency.as_deref(), Some("AGENCY_INFRA"));
    }

    #[test]
    fn token_from_wrong_secret_is_rejected() {
        let cfg = JwtConfig::from_secret(b"test-secret");
        let other = JwtConfig::from_secret(b"other-secret");
        let token = cfg.issue(&officer()).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn digest_is_stable_hex_sha256() {
        assert_eq!(
            password_digest("password123"),
            "ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f"
        );
    }
}
