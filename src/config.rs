use std::env;

use anyhow::{Context, Result, anyhow};

use crate::service::reconcile::EntitlementPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("STORE_BACKEND must be 'mysql' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub store_backend: StoreBackend,
    /// Only required for the MySQL backend.
    pub database_url: Option<String>,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub entitlements: EntitlementPolicy,
    pub event_buffer: usize,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let store_backend = match lookup("STORE_BACKEND") {
            Some(v) => StoreBackend::parse(&v)?,
            None => StoreBackend::MySql,
        };
        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::MySql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set for the mysql backend"));
        }

        let entitlements = match lookup("LEAVE_ENTITLEMENTS") {
            Some(raw) => EntitlementPolicy::default()
                .with_overrides(&raw)
                .context("invalid LEAVE_ENTITLEMENTS")?,
            None => EntitlementPolicy::default(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            store_backend,
            database_url,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
            entitlements,
            event_buffer: parse_or(&lookup, "EVENT_BUFFER", 256)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v.trim().parse().with_context(|| format!("{key} is not a valid number")),
        None => Ok(default),
    }
}
