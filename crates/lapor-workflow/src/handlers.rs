//! HTTP surface of the workflow service.
//!
//! ## Endpoints
//!
//! - `GET  /notifications/me`  - caller's notifications (auth)
//! - `GET  /sla/status`        - SLA job overview (auth)
//! - `GET  /sla/config`        - current SLA duration (auth)
//! - `POST /sla/config`        - set SLA duration, min 10 s (auth)
//! - `GET  /health`            - liveness

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::middleware as axum_mw;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lapor_core::types::SlaStatus;
use lapor_core::Principal;
use lapor_http::{jwt_auth, success, AppError, JwtConfig};

use crate::sla::SlaConfig;
use crate::store::WorkflowStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub store: WorkflowStore,
    pub sla: Arc<SlaConfig>,
}

/// `GET /sla/status` query string.
#[derive(Debug, Default, Deserialize)]
pub struct SlaStatusParams {
    pub status: Option<String>,
}

/// `POST /sla/config` body.
#[derive(Debug, Deserialize)]
pub struct SetSlaRequest {
    pub sla_duration_secs: i64,
}

pub fn build_router(store: WorkflowStore, sla: Arc<SlaConfig>, jwt: JwtConfig) -> Router {
    let state = AppState { store, sla };

    let protected = Router::new()
        .route("/notifications/me", get(my_notifications))
        .route("/sla/status", get(sla_status))
        .route("/sla/config", get(get_sla_config).post(set_sla_config))
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt));

    let public = Router::new().route("/health", get(lapor_http::health));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

async fn my_notifications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let notifications = state.store.notifications_for_user(&principal.subject).await?;
    Ok(success(notifications))
}

async fn sla_status(
    State(state): State<AppState>,
    Query(params): Query<SlaStatusParams>,
) -> Result<Json<Value>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(SlaStatus::try_from)
        .transpose()?;
    let jobs = state.store.sla_jobs(status).await?;
    Ok(success(jobs))
}

async fn get_sla_config(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let secs = state.sla.seconds().await;
    Ok(success(json!({ "sla_duration_secs": secs })))
}

async fn set_sla_config(
    State(state): State<AppState>,
    Json(request): Json<SetSlaRequest>,
) -> Result<Json<Value>, AppError> {
    state.sla.set_seconds(request.sla_duration_secs).await?;
    Ok(success(json!({ "sla_duration_secs": request.sla_duration_secs })))
}
