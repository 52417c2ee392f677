use crate::error::ConfigError;
use crate::model::{EntryCode, IceServerConfig, Identity};
use crate::utils::{
    DEFAULT_HOST_CODE, DEFAULT_HOST_IDENTITY, DEFAULT_POLL_INTERVAL, DEFAULT_STUDENT_CODES,
    DEFAULT_STUN_ADDR,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Deployment settings: who may enter, how often to poll, which ICE servers to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HuddleConfig {
    pub host_code: EntryCode,
    pub student_codes: Vec<EntryCode>,
    pub host_identity: Identity,
    pub poll_interval_ms: u64,
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for HuddleConfig {
    fn default() -> Self {
        Self {
            host_code: EntryCode::from(DEFAULT_HOST_CODE),
            student_codes: DEFAULT_STUDENT_CODES
                .iter()
                .map(|c| EntryCode::from(*c))
                .collect(),
            host_identity: Identity::from(DEFAULT_HOST_IDENTITY),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

impl HuddleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `HUDDLE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(code) = lookup("HUDDLE_HOST_CODE") {
            self.host_code = EntryCode::from(code.trim());
        }
        if let Some(codes) = lookup("HUDDLE_STUDENT_CODES") {
            self.student_codes = codes
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(EntryCode::from)
                .collect();
        }
        if let Some(identity) = lookup("HUDDLE_HOST_IDENTITY") {
            self.host_identity = Identity::from(identity.trim());
        }
        if let Some(ms) = lookup("HUDDLE_POLL_MS") {
            self.poll_interval_ms = ms
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("HUDDLE_POLL_MS is not a number: {ms}")))?;
        }
        if let Some(urls) = lookup("HUDDLE_ICE_URLS") {
            let urls: Vec<String> = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned)
                .collect();
            self.ice_servers = vec![IceServerConfig {
                urls,
                username: lookup("HUDDLE_TURN_USERNAME"),
                credential: lookup("HUDDLE_TURN_CREDENTIAL"),
            }];
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_code.as_str().is_empty() {
            return Err(ConfigError::Invalid("host code must not be empty".into()));
        }
        if self.student_codes.contains(&self.host_code) {
            return Err(ConfigError::Invalid(
                "host code must not double as a student code".into(),
            ));
        }
        if self.host_identity.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("host identity must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll interval must be positive".into()));
        }
        Ok(())
    }
}
