//! Officer command path: agency-scoped status transitions.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use lapor_bus::EventBus;
use lapor_core::events::EventEnvelope;
use lapor_core::types::ReportStatus;
use lapor_core::{DomainError, Principal};

use crate::store::{CaseRow, CaseStore};

pub struct OperationsService {
    store: CaseStore,
    bus: EventBus,
}

impl OperationsService {
    pub fn new(store: CaseStore, bus: EventBus) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Transition a case's status on behalf of an officer.
    ///
    /// The write and history append commit first; the event publish
    /// follows and its failure never rolls the transition back.
    pub async fn update_status(
        &self,
        principal: &Principal,
        raw_id: &str,
        raw_status: &str,
    ) -> Result<CaseRow, DomainError> {
        let report_id = Uuid::parse_str(raw_id)
            .map_err(|_| DomainError::validation(format!("invalid case id: {raw_id}")))?;
        let new_status = ReportStatus::try_from(raw_status)?;

        let case = self
            .store
            .find_case(report_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("case {report_id}")))?;

        let agency = principal.require_agency()?;
        authorize_agency(&case.owner_agency, agency)?;

        let old_status = ReportStatus::try_from(case.status.as_str())?;
        if old_status.is_terminal() {
            return Err(DomainError::Policy(format!(
                "case {report_id} is already resolved"
            )));
        }

        let changed_at = Utc::now();
        self.store
            .transition(report_id, old_status, new_status, &principal.subject, changed_at)
            .await?;

        let envelope = EventEnvelope::report_status_updated(
            report_id,
            old_status,
            new_status,
            &case.owner_agency,
            changed_at,
        );
        if let Err(e) = self.bus.publish(&envelope).await {
            // Authoritative state already changed; downstream projections
            // rely on operator replay tooling.
            warn!(report_id = %report_id, error = %e, "report.status.updated publish failed");
        }

        Ok(CaseRow {
            status: new_status.as_str().to_string(),
            updated_at: changed_at,
            ..case
        })
    }

    /// Officer's inbox: cases owned by their agency.
    pub async fn inbox(&self, principal: &Principal) -> Result<Vec<CaseRow>, DomainError> {
        let agency = principal.require_agency()?;
        self.store.inbox(agency).await
    }
}

/// Agency isolation: officers act only on cases their agency owns.
fn authorize_agency(owner_agency: &str, caller_agency: &str) -> Result<(), DomainError> {
    if owner_agency != caller_agency {
        return Err(DomainError::Authorization(format!(
            "case belongs to {owner_agency}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapor_core::Role;

    #[test]
    fn matching_agency_is_authorized() {
        assert!(authorize_agency("AGENCY_INFRA", "AGENCY_INFRA").is_ok());
    }

    #[test]
    fn foreign_agency_is_rejected() {
        let err = authorize_agency("AGENCY_HEALTH", "AGENCY_INFRA").unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }

    #[test]
    fn citizens_have_no_agency_to_act_with() {
        let principal = Principal {
            subject: "citizen1".into(),
            role: Role::Citizen,
            agency: None,
        };
        assert!(principal.require_agency().is_err());
    }
}
