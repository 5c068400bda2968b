//! Process-wide SLA duration.
//!
//! The only shared mutable state in the platform: read by the workflow
//! consumer when assigning deadlines, written by the administrative
//! setter. Guarded by a reader-writer lock; readers never starve writers.

use chrono::Duration;
use tokio::sync::RwLock;

use lapor_core::DomainError;

/// Default resolution window.
pub const DEFAULT_SLA_SECS: i64 = 60;
/// Administrative floor; anything below is rejected.
pub const MIN_SLA_SECS: i64 = 10;

pub struct SlaConfig {
    secs: RwLock<i64>,
}

impl SlaConfig {
    /// Start from a configured value, clamped up to the floor.
    pub fn new(initial_secs: i64) -> Self {
        Self {
            secs: RwLock::new(initial_secs.max(MIN_SLA_SECS)),
        }
    }

    pub async fn seconds(&self) -> i64 {
        *self.secs.read().await
    }

    pub async fn duration(&self) -> Duration {
        Duration::seconds(self.seconds().await)
    }

    /// Administrative setter; enforces the 10 second floor.
    pub async fn set_seconds(&self, secs: i64) -> Result<(), DomainError> {
        if secs < MIN_SLA_SECS {
            return Err(DomainError::Validation(format!(
                "SLA duration must be at least {MIN_SLA_SECS} seconds"
            )));
        }
        *self.secs.write().await = secs;
        Ok(())
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLA_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_is_sixty_seconds() {
        assert_eq!(SlaConfig::default().seconds().await, 60);
    }

    #[tokio::test]
    async fn below_floor_is_rejected() {
        let cfg = SlaConfig::default();
        let err = cfg.set_seconds(9).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(cfg.seconds().await, 60);
    }

    #[tokio::test]
    async fn floor_value_is_accepted() {
        let cfg = SlaConfig::default();
        cfg.set_seconds(10).await.unwrap();
        assert_eq!(cfg.seconds().await, 10);
    }

    #[tokio::test]
    async fn misconfigured_initial_value_is_clamped_up() {
        assert_eq!(SlaConfig::new(3).seconds().await, MIN_SLA_SECS);
    }
}
