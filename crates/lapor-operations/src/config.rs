//! Operations service configuration.

use lapor_core::config::{env_or, env_parse, BusConfig, DbConfig};

pub const POOL_MAX: u32 = 10;
pub const POOL_MIN_IDLE: u32 = 5;

#[derive(Debug, Clone)]
pub struct OperationsConfig {
    pub db: DbConfig,
    pub bus: BusConfig,
    pub server_port: u16,
    pub instance_id: String,
    pub seed_demo_users: bool,
}

impl OperationsConfig {
    pub fn from_env() -> Self {
        Self {
            db: DbConfig::from_env("OPERATIONS"),
            bus: BusConfig::from_env(),
            server_port: env_parse("SERVER_PORT", 8082),
            instance_id: env_or("INSTANCE_ID", "operations-1"),
            seed_demo_users: env_parse("LAPOR_SEED_DEMO_USERS", false),
        }
    }
}
