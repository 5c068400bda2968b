//! Citizen command and query logic.
//!
//! The command path returns success as soon as the authoritative write
//! commits: inline read seeds and the event publish are best-effort, and
//! the projector converges every replica from the published event.

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use lapor_bus::EventBus;
use lapor_core::events::EventEnvelope;
use lapor_core::types::{clamp_page, clamp_per_page, Report, ReportStatus, Visibility, DEFAULT_CATEGORY};
use lapor_core::{DomainError, Principal};

use crate::store::{
    MyReportRow, PublicReportRow, ReadModelRow, ReadStore, ReportListPage, ReportWriteStore,
    StatsSummary,
};

/// `POST /reports` body.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub content: String,
    pub visibility: Option<String>,
    pub category: Option<String>,
}

/// `GET /reports` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListReportsParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub struct CitizenService {
    write: ReportWriteStore,
    read: ReadStore,
    bus: EventBus,
}

impl CitizenService {
    pub fn new(write: ReportWriteStore, read: ReadStore, bus: EventBus) -> Self {
        Self { write, read, bus }
    }

    pub fn write_store(&self) -> &ReportWriteStore {
        &self.write
    }

    pub fn read_store(&self) -> &ReadStore {
        &self.read
    }

    // ── Command path ──────────────────────────────────────────

    /// Create a report: authoritative insert, inline view seeds,
    /// `report.created` publish.
    pub async fn create_report(
        &self,
        principal: &Principal,
        request: CreateReportRequest,
    ) -> Result<Uuid, DomainError> {
        let report = build_report(&principal.subject, request)?;

        self.write.insert_report(&report).await?;

        // Best-effort inline sync: the submitter sees their own report
        // immediately; the projector converges everything else.
        if let Err(e) = self.read.seed_my_report(&report).await {
            warn!(report_id = %report.id, error = %e, "inline my-reports seed failed");
        }
        if report.visibility == Visibility::Public {
            if let Err(e) = self.read.seed_public_report(&report).await {
                warn!(report_id = %report.id, error = %e, "inline public feed seed failed");
            }
        }

        let envelope = EventEnvelope::report_created(&report);
        if let Err(e) = self.bus.publish(&envelope).await {
            // The report is already durable; downstream convergence relies
            // on operator replay tooling.
            warn!(report_id = %report.id, error = %e, "report.created publish failed");
        }

        Ok(report.id)
    }

    /// Upvote a public report. Idempotent per (report, voter).
    pub async fn upvote(&self, principal: &Principal, report_id: Uuid) -> Result<i64, DomainError> {
        let report = self
            .write
            .find_report(report_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("report {report_id}")))?;

        if report.visibility != Visibility::Public {
            return Err(DomainError::Policy(
                "only public reports can be upvoted".into(),
            ));
        }

        self.write
            .insert_vote(report_id, &principal.subject)
            .await?;
        let count = self.write.vote_count(report_id).await?;

        if let Err(e) = self
            .read
            .sync_vote_count(report_id, &principal.subject, count)
            .await
        {
            warn!(report_id = %report_id, error = %e, "inline vote-count sync failed");
        }

        let envelope = EventEnvelope::report_upvoted(report_id, &principal.subject);
        if let Err(e) = self.bus.publish(&envelope).await {
            warn!(report_id = %report_id, error = %e, "report.upvoted publish failed");
        }

        Ok(count)
    }

    // ── Query path ────────────────────────────────────────────

    pub async fn my_reports(&self, principal: &Principal) -> Result<Vec<MyReportRow>, DomainError> {
        self.read.my_reports(&principal.subject).await
    }

    pub async fn public_feed(&self) -> Result<Vec<PublicReportRow>, DomainError> {
        self.read.public_feed().await
    }

    pub async fn list_reports(
        &self,
        params: ListReportsParams,
    ) -> Result<ReportListPage, DomainError> {
        let page = clamp_page(params.page);
        let per_page = clamp_per_page(params.per_page);
        let status = params
            .status
            .as_deref()
            .map(ReportStatus::try_from)
            .transpose()?;
        self.read
            .list_reports(page, per_page, params.category.as_deref(), status)
            .await
    }

    /// Fetch by id; the raw path segment is validated as a UUID first.
    pub async fn report_by_id(&self, raw_id: &str) -> Result<ReadModelRow, DomainError> {
        let id = Uuid::parse_str(raw_id)
            .map_err(|_| DomainError::validation(format!("invalid report id: {raw_id}")))?;
        self.read
            .report_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("report {id}")))
    }

    pub async fn statistics(&self) -> Result<StatsSummary, DomainError> {
        self.read.statistics().await
    }
}

/// Validate a create request into an authoritative report row.
fn build_report(
    reporter_user_id: &str,
    request: CreateReportRequest,
) -> Result<Report, DomainError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("content must not be empty"));
    }

    let visibility = match request.visibility.as_deref() {
        None | Some("") => Visibility::Public,
        Some(raw) => Visibility::try_from(raw)?,
    };

    let category = match request.category.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CATEGORY.to_string(),
        Some(raw) => raw.to_string(),
    };

    Ok(Report {
        id: Uuid::new_v4(),
        reporter_user_id: reporter_user_id.to_string(),
        visibility,
        content: content.to_string(),
        category,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, visibility: Option<&str>, category: Option<&str>) -> CreateReportRequest {
        CreateReportRequest {
            content: content.to_string(),
            visibility: visibility.map(str::to_string),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(build_report("citizen1", request("", None, None)).is_err());
        assert!(build_report("citizen1", request("   ", None, None)).is_err());
    }

    #[test]
    fn visibility_defaults_to_public() {
        let report = build_report("citizen1", request("Jalan rusak", None, None)).unwrap();
        assert_eq!(report.visibility, Visibility::Public);

        let report =
            build_report("citizen1", request("Jalan rusak", Some(""), None)).unwrap();
        assert_eq!(report.visibility, Visibility::Public);
    }

    #[test]
    fn only_public_and_anonymous_are_accepted() {
        assert!(build_report("citizen1", request("x", Some("ANONYMOUS"), None)).is_ok());
        assert!(build_report("citizen1", request("x", Some("SECRET"), None)).is_err());
    }

    #[test]
    fn category_falls_back_to_catch_all() {
        let report = build_report("citizen1", request("x", None, None)).unwrap();
        assert_eq!(report.category, DEFAULT_CATEGORY);

        let report = build_report("citizen1", request("x", None, Some("kesehatan"))).unwrap();
        assert_eq!(report.category, "kesehatan");
    }

    #[test]
    fn list_params_clamp_like_the_query_contract() {
        assert_eq!(clamp_per_page(Some(1000)), 100);
        assert_eq!(clamp_per_page(Some(-5)), 20);
        assert_eq!(clamp_page(Some(0)), 1);
    }
}
