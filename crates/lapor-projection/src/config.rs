//! Projection worker configuration.

use lapor_core::config::{env_or, BusConfig, DbConfig};

/// Replica pool sizing; the worker holds more connections than the
/// query-side services because it writes N replicas concurrently.
pub const POOL_MAX: u32 = 25;
pub const POOL_MIN_IDLE: u32 = 10;

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Template connection settings; each replica host is substituted in.
    pub replica_db: DbConfig,
    /// Replica hosts, from the comma-separated `REPLICA_HOSTS` variable.
    pub replica_hosts: Vec<String>,
    pub bus: BusConfig,
    pub instance_id: String,
}

impl ProjectionConfig {
    pub fn from_env() -> Self {
        Self {
            replica_db: DbConfig::from_env("REPLICA"),
            replica_hosts: parse_hosts(&env_or("REPLICA_HOSTS", "localhost")),
            bus: BusConfig::from_env(),
            instance_id: env_or("INSTANCE_ID", "projection-1"),
        }
    }
}

fn parse_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_list_is_trimmed_and_empty_entries_dropped() {
        assert_eq!(
            parse_hosts("db1, db2 ,,db3"),
            vec!["db1".to_string(), "db2".to_string(), "db3".to_string()]
        );
        assert!(parse_hosts("").is_empty());
    }
}
