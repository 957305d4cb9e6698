//! Session configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment variable overrides, e.g. `TOLLGATE_MAX_RETRIES`
/// or `TOLLGATE_ENDPOINTS__LOGIN`
pub const ENV_PREFIX: &str = "TOLLGATE";

/// Main session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// API endpoints used by the session
    pub endpoints: Endpoints,

    /// Response field holding a newly issued access token
    pub token_key: String,

    /// Response field holding a newly issued refresh token
    pub refresh_token_key: String,

    /// Maximum number of refresh attempts before the session is cleared
    pub max_retries: u32,

    /// Route name of the login view
    pub login_route_name: String,

    /// Route name of the reset-password view; treated like the login view
    pub reset_password_route_name: String,

    /// Route meta flag marking public routes
    pub public_meta_key: String,

    /// Route meta flag marking routes that require authentication
    pub auth_meta_key: String,

    /// Post-login destination when no `redirect` query is present
    pub default_redirect: String,

    /// How long the navigation guard waits for the session to finish loading
    pub guard_timeout_ms: u64,

    /// Start `initialize()` on the current runtime when the plugin is installed
    pub auto_initialize: bool,

    /// Storage slot names for the two tokens
    pub storage_keys: StorageKeys,
}

/// API endpoint paths, relative to the transport's base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub user: String,
}

/// Keys under which tokens are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            token_key: "token".to_string(),
            refresh_token_key: "refresh".to_string(),
            max_retries: 3,
            login_route_name: "login".to_string(),
            reset_password_route_name: "redefinir-senha".to_string(),
            public_meta_key: "public".to_string(),
            auth_meta_key: "auth".to_string(),
            default_redirect: "/".to_string(),
            guard_timeout_ms: 5_000,
            auto_initialize: true,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/token/".to_string(),
            refresh: "/token/refresh/".to_string(),
            user: "/contexto-inicial/".to_string(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: "access_token".to_string(),
            refresh: "refresh_token".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration from defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::from_environment(env_source())
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder().add_source(env).build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Guard wait as a [`Duration`]
    pub const fn guard_timeout(&self) -> Duration {
        Duration::from_millis(self.guard_timeout_ms)
    }

    /// Fields tried, in order, when reading a new access token
    pub fn access_token_fields(&self) -> [&str; 3] {
        [self.token_key.as_str(), "access", "token"]
    }

    /// Fields tried, in order, when reading a new refresh token
    pub fn refresh_token_fields(&self) -> [&str; 3] {
        [self.refresh_token_key.as_str(), "refresh", "refresh_token"]
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
