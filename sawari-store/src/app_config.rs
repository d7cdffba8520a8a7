use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the shared JSON collections.
    pub dir: String,
}

/// TTLs and sweep cadence. All of these are logical deadlines evaluated
/// against the clock, not real-time timers.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_minutes: i64,
    #[serde(default = "default_payment_ttl")]
    pub payment_ttl_minutes: i64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
    /// How long an expired hold lingers before the sweep deletes it.
    #[serde(default = "default_purge_grace")]
    pub purge_grace_minutes: i64,
}

fn default_hold_ttl() -> i64 {
    15
}

fn default_payment_ttl() -> i64 {
    30
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_purge_grace() -> i64 {
    60
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            hold_ttl_minutes: default_hold_ttl(),
            payment_ttl_minutes: default_payment_ttl(),
            sweep_interval_minutes: default_sweep_interval(),
            purge_grace_minutes: default_purge_grace(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SAWARI__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("SAWARI").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
