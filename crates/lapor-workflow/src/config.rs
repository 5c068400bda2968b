//! Workflow service configuration.

use lapor_core::config::{env_or, env_parse, BusConfig, DbConfig};

use crate::sla::DEFAULT_SLA_SECS;

pub const POOL_MAX: u32 = 10;
pub const POOL_MIN_IDLE: u32 = 5;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub db: DbConfig,
    pub bus: BusConfig,
    pub server_port: u16,
    pub instance_id: String,
    /// Initial SLA duration; runtime-mutable through the admin endpoint.
    pub sla_duration_secs: i64,
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self {
            db: DbConfig::from_env("WORKFLOW"),
            bus: BusConfig::from_env(),
            server_port: env_parse("SERVER_PORT", 8083),
            instance_id: env_or("INSTANCE_ID", "workflow-1"),
            sla_duration_secs: env_parse("SLA_DURATION_SECS", DEFAULT_SLA_SECS),
        }
    }
}
