//! Runtime settings.

use crate::error::{Result, StratusError};
use crate::lifecycle::PollConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a settings file.
pub const SETTINGS_ENV: &str = "STRATUS_SETTINGS";

/// Tunable settings for an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between dependency checks while a stack is blocked.
    pub blocked_interval_secs: u64,
    /// Seconds between polls while a remote operation is in progress.
    pub in_progress_interval_secs: u64,
    /// Directory that receives private keys for provisioned key pairs.
    pub key_dir: String,
    /// `aws` binary used by the CLI provider.
    pub aws_cli: String,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_interval_secs: 5,
            in_progress_interval_secs: 5,
            key_dir: "ssh_keys".to_string(),
            aws_cli: "aws".to_string(),
            region: None,
            profile: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `STRATUS_SETTINGS` when no path is given.
    ///
    /// With neither present, defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var_os(SETTINGS_ENV) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| StratusError::FileReadError { path: path.clone(), source: e })?;
        let settings: Self = serde_json::from_str(&content).map_err(|e| {
            StratusError::InvalidSettings {
                reason: format!("Failed to parse {}: {}", path.display(), e),
            }
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.blocked_interval_secs == 0 || self.in_progress_interval_secs == 0 {
            return Err(StratusError::InvalidSettings {
                reason: "poll intervals must be at least one second".to_string(),
            });
        }
        if self.aws_cli.trim().is_empty() {
            return Err(StratusError::InvalidSettings {
                reason: "aws_cli must name a binary".to_string(),
            });
        }
        Ok(())
    }

    /// Poll intervals for lifecycle tasks.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            blocked_interval: Duration::from_secs(self.blocked_interval_secs),
            in_progress_interval: Duration::from_secs(self.in_progress_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_interval() {
        let poll = Settings::default().poll_config();
        assert_eq!(poll.blocked_interval, Duration::from_secs(5));
        assert_eq!(poll.in_progress_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"in_progress_interval_secs": 15, "region": "us-west-2"}"#)
            .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.in_progress_interval_secs, 15);
        assert_eq!(settings.blocked_interval_secs, 5);
        assert_eq!(settings.region.as_deref(), Some("us-west-2"));
        assert_eq!(settings.aws_cli, "aws");
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"blocked_interval_secs": 0}"#).unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, StratusError::InvalidSettings { .. }));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.json"))).unwrap_err();
        assert!(matches!(err, StratusError::FileReadError { .. }));
    }
}
