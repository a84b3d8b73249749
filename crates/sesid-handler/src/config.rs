//! Handler settings read from environment variables

use anyhow::Result;
use sesid_core::config::{EngineConfig, WaitSpec};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub event_file: Option<PathBuf>,
    pub wait_delay_secs: u64,
    pub wait_max_attempts: u32,
    pub log_level: String,
    pub skip_notify: bool,
    pub aws_endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = WaitSpec::default();

        Ok(Self {
            event_file: lookup("SESID_EVENT_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            wait_delay_secs: match lookup("SESID_WAIT_DELAY_SECS") {
                Some(s) => s.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SESID_WAIT_DELAY_SECS must be a number. Got: {}", s)
                })?,
                None => defaults.delay.as_secs(),
            },
            wait_max_attempts: match lookup("SESID_WAIT_MAX_ATTEMPTS") {
                Some(s) => s.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SESID_WAIT_MAX_ATTEMPTS must be a number. Got: {}", s)
                })?,
                None => defaults.max_attempts,
            },
            log_level: lookup("SESID_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            skip_notify: lookup("SESID_SKIP_NOTIFY")
                .is_some_and(|s| s.trim().eq_ignore_ascii_case("true")),
            aws_endpoint_url: lookup("SESID_AWS_ENDPOINT_URL").filter(|s| !s.is_empty()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(1..=300).contains(&self.wait_delay_secs) {
            anyhow::bail!(
                "SESID_WAIT_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                self.wait_delay_secs
            );
        }

        if !(1..=100).contains(&self.wait_max_attempts) {
            anyhow::bail!(
                "SESID_WAIT_MAX_ATTEMPTS must be between 1 and 100. Got: {}",
                self.wait_max_attempts
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SESID_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if let Some(ref url) = self.aws_endpoint_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "SESID_AWS_ENDPOINT_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        if let Some(ref path) = self.event_file
            && !path.is_file()
        {
            anyhow::bail!("SESID_EVENT_FILE does not exist: {}", path.display());
        }

        Ok(())
    }

    /// Engine settings handed to the lifecycle handler
    pub fn engine(&self) -> EngineConfig {
        EngineConfig::with_wait(WaitSpec::new(
            Duration::from_secs(self.wait_delay_secs),
            self.wait_max_attempts,
        ))
    }
}
