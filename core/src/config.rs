//! Client configuration: where the account API lives and how long a call may take.
//!
//! # Design
//! `ClientConfig` is plain data with a serde derive so it can be embedded in
//! a larger config file. `from_env` overlays environment variables on the
//! defaults. The timeout is always finite: it is the hard upper bound on a
//! single HTTP exchange, including one whose caller has already given up.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "http://accountapi:8080/";

pub const BASE_URL_ENV: &str = "ACCOUNT_API_URL";
pub const TIMEOUT_ENV: &str = "ACCOUNT_API_TIMEOUT_MS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the `ureq`-backed transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound for a whole call. A `Context` deadline can only shorten it.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `ACCOUNT_API_URL` and `ACCOUNT_API_TIMEOUT_MS`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ApiError::RequestConstruction(format!("{TIMEOUT_ENV} is not a number: {raw:?}"))
            })?;
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}
