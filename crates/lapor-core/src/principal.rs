//! Authenticated identity, produced by the HTTP auth edge.
//!
//! The token module parses credentials at the edge and injects a
//! [`Principal`] into request extensions; everything below the handlers
//! treats it as opaque identity.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Caller role carried in the signed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Officer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Officer => "officer",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "citizen" => Ok(Self::Citizen),
            "officer" => Ok(Self::Officer),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::Authentication(format!("unknown role: {other}"))),
        }
    }
}

/// Identity attached to every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user id (token subject).
    pub subject: String,
    pub role: Role,
    /// Owning agency; present for officers only.
    pub agency: Option<String>,
}

impl Principal {
    /// Agency of an officer caller, or an authorization error for
    /// non-officer identities.
    pub fn require_agency(&self) -> Result<&str, DomainError> {
        self.agency
            .as_deref()
            .ok_or_else(|| DomainError::Authorization("caller has no agency".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_lowercase_names() {
        assert_eq!(Role::try_from("officer").unwrap(), Role::Officer);
        assert!(Role::try_from("root").is_err());
    }

    #[test]
    fn require_agency_rejects_citizens() {
        let citizen = Principal {
            subject: "citizen1".into(),
            role: Role::Citizen,
            agency: None,
        };
        assert!(citizen.require_agency().is_err());

        let officer = Principal {
            subject: "officer1".into(),
            role: Role::Officer,
            agency: Some("AGENCY_INFRA".into()),
        };
        assert_eq!(officer.require_agency().unwrap(), "AGENCY_INFRA");
    }
}
