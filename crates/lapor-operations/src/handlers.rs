//! HTTP surface of the operations service.
//!
//! ## Endpoints
//!
//! - `POST  /auth/login`          - issue an officer token
//! - `GET   /cases/inbox`         - agency-scoped case list (auth)
//! - `PATCH /cases/:id/status`    - transition a case (auth)
//! - `GET   /health`              - liveness

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::middleware as axum_mw;
use axum::response::Json;
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lapor_core::{DomainError, Principal, Role};
use lapor_http::{jwt_auth, password_digest, success, AppError, JwtConfig, LoginRequest};

use crate::service::OperationsService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OperationsService>,
    pub jwt: JwtConfig,
}

/// `PATCH /cases/:id/status` body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub fn build_router(service: Arc<OperationsService>, jwt: JwtConfig) -> Router {
    let state = AppState {
        service,
        jwt: jwt.clone(),
    };

    let protected = Router::new()
        .route("/cases/inbox", get(inbox))
        .route("/cases/:id/status", patch(update_status))
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt));

    let public = Router::new()
        .route("/auth/login", post(login))
        .route("/health", get(lapor_http::health));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .service
        .store()
        .find_user(&request.username)
        .await?
        .ok_or_else(|| DomainError::Authentication("unknown user".into()))?;

    if user.password_sha256 != password_digest(&request.password) {
        return Err(DomainError::Authentication("invalid credentials".into()).into());
    }

    let principal = Principal {
        subject: user.user_id,
        role: Role::Officer,
        agency: Some(user.agency),
    };
    let token = state.jwt.issue(&principal)?;
    Ok(success(json!({ "token": token })))
}

async fn inbox(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let cases = state.service.inbox(&principal).await?;
    Ok(success(cases))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let case = state
        .service
        .update_status(&principal, &raw_id, &request.status)
        .await?;
    Ok(success(case))
}
