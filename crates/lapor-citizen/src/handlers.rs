//! HTTP surface of the citizen service.
//!
//! ## Endpoints
//!
//! - `POST /auth/login`              - issue a citizen token
//! - `POST /reports`                 - create a report (auth)
//! - `GET  /reports`                 - paginated master list (auth)
//! - `POST /reports/:id/upvote`      - upvote a public report (auth)
//! - `GET  /reports/me`              - submitter's feed (auth)
//! - `GET  /reports/public`          - public feed
//! - `GET  /reports/stats`           - per-category statistics
//! - `GET  /reports/:id`             - read-model row by id
//! - `GET  /health`                  - liveness

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::middleware as axum_mw;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lapor_core::{DomainError, Principal, Role};
use lapor_http::{jwt_auth, password_digest, success, AppError, JwtConfig, LoginRequest};

use crate::service::{CitizenService, CreateReportRequest, ListReportsParams};

/// Request timeout on every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CitizenService>,
    pub jwt: JwtConfig,
}

/// Build the full axum router.
pub fn build_router(service: Arc<CitizenService>, jwt: JwtConfig) -> Router {
    let state = AppState {
        service,
        jwt: jwt.clone(),
    };

    let protected = Router::new()
        .route("/reports", post(create_report).get(list_reports))
        .route("/reports/me", get(my_reports))
        .route("/reports/:id/upvote", post(upvote))
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt));

    let public = Router::new()
        .route("/auth/login", post(login))
        .route("/reports/public", get(public_feed))
        .route("/reports/stats", get(statistics))
        .route("/reports/:id", get(report_by_id))
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
        .write_store()
        .find_user(&request.username)
        .await?
        .ok_or_else(|| DomainError::Authentication("unknown user".into()))?;

    if user.password_sha256 != password_digest(&request.password) {
        return Err(DomainError::Authentication("invalid credentials".into()).into());
    }

    let principal = Principal {
        subject: user.user_id,
        role: Role::Citizen,
        agency: None,
    };
    let token = state.jwt.issue(&principal)?;
    Ok(success(json!({ "token": token })))
}

async fn create_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateReportRequest>,
) -> Result<Json<Value>, AppError> {
    let report_id = state.service.create_report(&principal, request).await?;
    Ok(success(json!({ "report_id": report_id })))
}

async fn upvote(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report_id = uuid::Uuid::parse_str(&raw_id)
        .map_err(|_| DomainError::validation(format!("invalid report id: {raw_id}")))?;
    let vote_count = state.service.upvote(&principal, report_id).await?;
    Ok(success(json!({ "report_id": report_id, "vote_count": vote_count })))
}

async fn my_reports(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let reports = state.service.my_reports(&principal).await?;
    Ok(success(reports))
}

async fn public_feed(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let reports = state.service.public_feed().await?;
    Ok(success(reports))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ListReportsParams>,
) -> Result<Json<Value>, AppError> {
    let page = state.service.list_reports(params).await?;
    Ok(success(page))
}

async fn report_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = state.service.report_by_id(&raw_id).await?;
    Ok(success(report))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.service.statistics().await?;
    Ok(success(stats))
}
