// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JmfError, Result};

/// Persistent client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server URL used when a submission names no explicit target.
    pub default_url: Option<String>,
    /// `DeviceID` applied to envelopes that do not carry one yet.
    pub device_id: Option<String>,
    /// Total transmission attempts per submission (default 2).
    pub max_attempts: u32,
    /// Connect + read timeout for each HTTP attempt, in seconds.
    pub timeout_secs: u64,
    /// Base directory for relative `cid://` references.
    pub attachment_dir: Option<PathBuf>,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            device_id: None,
            max_attempts: 2,
            timeout_secs: 30,
            attachment_dir: None,
            user_agent: format!("jmfwerk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the dispatcher cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(JmfError::Configuration(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(JmfError::Configuration(
                "timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pick the explicit target if given, else the configured default.
    pub fn resolve_url<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .or(self.default_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                JmfError::Configuration("no target URL given and no default_url configured".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_two_attempts() {
        let config = ClientConfig::default();
        assert_eq!(config.max_attempts, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_url_wins_over_default() {
        let config = ClientConfig {
            default_url: Some("http://default/jmf".into()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_url(Some("http://press/jmf")).expect("url"),
            "http://press/jmf"
        );
        assert_eq!(config.resolve_url(None).expect("url"), "http://default/jmf");
    }

    #[test]
    fn missing_url_is_configuration_error() {
        let err = ClientConfig::default().resolve_url(None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jmfwerk.json");
        std::fs::write(&path, r#"{ "default_url": "http://press:8080/jmf" }"#).expect("write");

        let config = ClientConfig::load(&path).expect("load");
        assert_eq!(config.default_url.as_deref(), Some("http://press:8080/jmf"));
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jmfwerk.json");
        let config = ClientConfig {
            device_id: Some("PRESS1".into()),
            max_attempts: 4,
            ..Default::default()
        };
        config.save(&path).expect("save");

        let loaded = ClientConfig::load(&path).expect("load");
        assert_eq!(loaded.device_id.as_deref(), Some("PRESS1"));
        assert_eq!(loaded.max_attempts, 4);
    }

    #[test]
    fn zero_attempts_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jmfwerk.json");
        std::fs::write(&path, r#"{ "max_attempts": 0 }"#).expect("write");
        assert!(matches!(
            ClientConfig::load(&path),
            Err(JmfError::Configuration(_))
        ));
    }
}
