//! CLI configuration utilities

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tollgate_session::SessionConfig;
use tollgate_session::config::ENV_PREFIX;

/// File name looked up in the data directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// File name of the persisted token store
pub const TOKENS_FILE: &str = "tokens.json";

/// Settings for one CLI invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// API base URL every endpoint is resolved against
    pub base_url: Option<String>,

    /// Per-request timeout; set from `--timeout`, not from files
    #[serde(skip)]
    pub request_timeout: Option<Duration>,

    pub session: SessionConfig,
}

impl CliConfig {
    /// Load from `path` (or the data directory's config file when present),
    /// then `TOLLGATE_` environment overrides such as `TOLLGATE_BASE_URL` or
    /// `TOLLGATE_SESSION__MAX_RETRIES`
    pub fn load(path: Option<&Path>, data_dir: &Path) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path),
            None => config::File::from(data_dir.join(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        // The CLI drives initialization itself
        config.session.auto_initialize = false;
        Ok(config)
    }
}

/// `$XDG_DATA_HOME/tollgate` or the platform equivalent
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tollgate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(None, dir.path()).unwrap();

        assert_eq!(config.session.max_retries, 3);
        assert_eq!(config.session.endpoints.login, "/token/");
        assert!(!config.session.auto_initialize);
    }

    #[test]
    fn test_data_dir_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"
base_url = "https://api.example.com"

[session]
max_retries = 1

[session.endpoints]
user = "/me/"
"#,
        )
        .unwrap();

        let config = CliConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.session.max_retries, 1);
        assert_eq!(config.session.endpoints.user, "/me/");
        assert_eq!(config.session.endpoints.refresh, "/token/refresh/");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(CliConfig::load(Some(&missing), dir.path()).is_err());
    }
}
