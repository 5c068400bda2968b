//! Citizen service configuration.

use lapor_core::config::{env_or, env_parse, BusConfig, DbConfig};

/// Query-side pool sizing.
pub const POOL_MAX: u32 = 10;
pub const POOL_MIN_IDLE: u32 = 5;

#[derive(Debug, Clone)]
pub struct CitizenConfig {
    pub write_db: DbConfig,
    pub read_db: DbConfig,
    pub bus: BusConfig,
    pub server_port: u16,
    pub instance_id: String,
    /// Insert demo login rows at startup when set. Development only.
    pub seed_demo_users: bool,
}

impl CitizenConfig {
    pub fn from_env() -> Self {
        Self {
            write_db: DbConfig::from_env("CITIZEN_WRITE"),
            read_db: DbConfig::from_env("CITIZEN_READ"),
            bus: BusConfig::from_env(),
            server_port: env_parse("SERVER_PORT", 8081),
            instance_id: env_or("INSTANCE_ID", "citizen-1"),
            seed_demo_users: env_parse("LAPOR_SEED_DEMO_USERS", false),
        }
    }
}
