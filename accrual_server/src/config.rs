//! Server configuration.
//!
//! Everything is read from environment variables (a `.env` file is loaded first, if present). Invalid values are
//! logged and replaced by their defaults, so a typo never stops the server from starting. The one exception is
//! `ACCRUAL_SYSTEM_ADDRESS`, which has no sensible default; see [`ServerConfig::validate`].
use std::{env, time::Duration};

use accrual_common::{
    helpers::{parse_boolean_flag, parse_seconds},
    Secret,
};
use accrual_engine::{
    accrual_client::DEFAULT_RETRY_AFTER,
    reconciliation::DEFAULT_CADENCE,
    AccrualClientConfig,
    WorkerOptions,
};
use log::*;

use crate::errors::ServerError;

const DEFAULT_ACCRUAL_HOST: &str = "127.0.0.1";
const DEFAULT_ACCRUAL_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/accrual_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Secret<String>,
    /// Base URL of the accrual authority.
    pub accrual_system_address: String,
    /// Time between reconciliation passes.
    pub poll_interval: Duration,
    /// Back-off applied when the accrual authority rate-limits without a usable `Retry-After` header.
    pub default_retry_after: Duration,
    /// Timeout for one accrual lookup. `None` means lookups can take as long as the authority does.
    pub request_timeout: Option<Duration>,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ACCRUAL_HOST.to_string(),
            port: DEFAULT_ACCRUAL_PORT,
            database_url: Secret::new(DEFAULT_DATABASE_URL.to_string()),
            accrual_system_address: String::default(),
            poll_interval: DEFAULT_CADENCE,
            default_retry_after: DEFAULT_RETRY_AFTER,
            request_timeout: None,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key-value source. `lookup` returns `None` for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let host = lookup("ACCRUAL_HOST").unwrap_or_else(|| DEFAULT_ACCRUAL_HOST.into());
        let port = lookup("ACCRUAL_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for ACCRUAL_PORT. {e} Using the default, {DEFAULT_ACCRUAL_PORT}, \
                         instead."
                    );
                    DEFAULT_ACCRUAL_PORT
                })
            })
            .unwrap_or(DEFAULT_ACCRUAL_PORT);
        let database_url = lookup("ACCRUAL_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ ACCRUAL_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let accrual_system_address = lookup("ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|| {
            error!("🪛️ ACCRUAL_SYSTEM_ADDRESS is not set. Please set it to the base URL of the accrual authority.");
            String::default()
        });
        let poll_interval = seconds_or_default(&lookup, "ACCRUAL_POLL_INTERVAL_SECS", DEFAULT_CADENCE);
        let default_retry_after = seconds_or_default(&lookup, "ACCRUAL_DEFAULT_RETRY_AFTER_SECS", DEFAULT_RETRY_AFTER);
        let request_timeout = lookup("ACCRUAL_REQUEST_TIMEOUT_SECS").and_then(|s| {
            parse_seconds(&s)
                .map(Duration::from_secs)
                .map_err(|e| {
                    warn!("🪛️ Invalid configuration value for ACCRUAL_REQUEST_TIMEOUT_SECS. {e}. No timeout will be used.")
                })
                .ok()
        });
        let run_migrations = parse_boolean_flag(lookup("ACCRUAL_RUN_MIGRATIONS"), true);
        Self {
            host,
            port,
            database_url: Secret::new(database_url),
            accrual_system_address,
            poll_interval,
            default_retry_after,
            request_timeout,
            run_migrations,
        }
    }

    /// Checks the settings that have no usable default.
    pub fn validate(&self) -> Result<(), ServerError> {
        let address = self.accrual_system_address.trim();
        if address.is_empty() {
            return Err(ServerError::ConfigurationError("ACCRUAL_SYSTEM_ADDRESS must be set".into()));
        }
        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(ServerError::ConfigurationError(format!(
                "ACCRUAL_SYSTEM_ADDRESS must be an http(s) URL. Got {address}"
            )));
        }
        Ok(())
    }

    pub fn accrual_client_config(&self) -> AccrualClientConfig {
        AccrualClientConfig {
            base_url: self.accrual_system_address.trim().to_string(),
            default_retry_after: self.default_retry_after,
            request_timeout: self.request_timeout,
        }
    }

    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions { cadence: self.poll_interval }
    }
}

fn seconds_or_default<F>(lookup: &F, name: &str, default: Duration) -> Duration
where F: Fn(&str) -> Option<String> {
    match lookup(name) {
        Some(s) => parse_seconds(&s).map(Duration::from_secs).unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name}. {e}. Using the default of {}s.", default.as_secs());
            default
        }),
        None => {
            info!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs());
            default
        },
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8370);
        assert_eq!(config.database_url.reveal(), "sqlite://data/accrual_store.db");
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert_eq!(config.default_retry_after, Duration::from_secs(60));
        assert!(config.request_timeout.is_none());
        assert!(config.run_migrations);
        assert!(config.validate().is_err());
    }

    #[test]
    fn values_from_the_environment() {
        let config = config_from(&[
            ("ACCRUAL_HOST", "0.0.0.0"),
            ("ACCRUAL_PORT", "9000"),
            ("ACCRUAL_DATABASE_URL", "sqlite://tmp/x.db"),
            ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8080"),
            ("ACCRUAL_POLL_INTERVAL_SECS", "1"),
            ("ACCRUAL_DEFAULT_RETRY_AFTER_SECS", "15"),
            ("ACCRUAL_REQUEST_TIMEOUT_SECS", "5"),
            ("ACCRUAL_RUN_MIGRATIONS", "false"),
        ]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.reveal(), "sqlite://tmp/x.db");
        assert_eq!(config.worker_options().cadence, Duration::from_secs(1));
        let client = config.accrual_client_config();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.default_retry_after, Duration::from_secs(15));
        assert_eq!(client.request_timeout, Some(Duration::from_secs(5)));
        assert!(!config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("ACCRUAL_PORT", "eighty"),
            ("ACCRUAL_SYSTEM_ADDRESS", "localhost:8080"),
            ("ACCRUAL_POLL_INTERVAL_SECS", "0"),
            ("ACCRUAL_DEFAULT_RETRY_AFTER_SECS", "-1"),
            ("ACCRUAL_REQUEST_TIMEOUT_SECS", "forever"),
            ("ACCRUAL_RUN_MIGRATIONS", "perhaps"),
        ]);
        assert_eq!(config.port, 8370);
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert_eq!(config.default_retry_after, Duration::from_secs(60));
        assert!(config.request_timeout.is_none());
        assert!(config.run_migrations);
        assert!(matches!(config.validate(), Err(ServerError::ConfigurationError(_))));
    }

    #[test]
    fn database_url_is_not_logged() {
        let config = config_from(&[("ACCRUAL_DATABASE_URL", "sqlite://user:hunter2@db")]);
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
