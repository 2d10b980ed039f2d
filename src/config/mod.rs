//! Environment-backed configuration for the deployable binary.
//!
//! Everything secret or deployment-specific arrives through the environment;
//! nothing here is read from files or flags. [`Config::from_lookup`] takes
//! the lookup function as an argument so tests can feed in a plain map
//! instead of mutating process-global environment variables.

use std::time::Duration;

use thiserror::Error;

/// Address served when `LISTEN_ADDR` is not set.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Upstream deadline when `UPSTREAM_TIMEOUT_SECS` is not set.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Errors from assembling a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration, fully resolved.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the server binds to.
    pub listen_addr: String,
    /// API key for the Drive `files.list` calls.
    pub google_api_key: String,
    /// Drive folder holding the lunch menu.
    pub lunch_folder_id: String,
    /// Drive folder holding the dinner menu.
    pub dinner_folder_id: String,
    /// The one origin allowed to read the menu cross-origin.
    pub allowed_origin: String,
    /// This service's public origin, sent upstream as the `Referer`.
    pub public_origin: String,
    /// Deadline for each upstream fetch.
    pub upstream_timeout: Duration,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// Blank values (empty or whitespace-only) are treated as unset, so an
    /// `export GOOGLE_API_KEY=` line in a half-written unit file fails fast
    /// instead of producing a key that fails on every upstream call.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let required =
            |name: &'static str| var(name).ok_or(ConfigError::Missing { name });

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        Ok(Self {
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned()),
            google_api_key: required("GOOGLE_API_KEY")?,
            lunch_folder_id: required("LUNCH_FOLDER_ID")?,
            dinner_folder_id: required("DINNER_FOLDER_ID")?,
            allowed_origin: required("ALLOWED_ORIGIN")?,
            public_origin: required("PUBLIC_ORIGIN")?,
            upstream_timeout,
        })
    }
}
