//! Server configuration, read from a TOML file.
//!
//! Every section and key is optional; anything left out takes the value of the
//! matching `Default` impl. `config.example.toml` lists all keys.

use serde::Deserialize;
use std::path::Path;

use crate::{PinpinError, Result};

const MIB: i64 = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Base of the links handed out for shared files.
    pub public_url: String,
    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// HMAC secret for access tokens. Startup fails while it is empty.
    pub jwt_secret: String,
    pub jwt_access_token_expiry_secs: u64,
    /// Login attempts per client per minute.
    pub login_rate_limit: u32,
    /// Key redemptions per client per minute.
    pub redeem_rate_limit: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            cors_origins: Vec::new(),
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: 60 * 60,
            login_rate_limit: 10,
            redeem_rate_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; parent directories are created on open.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/pinpin.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Root of the blob store.
    pub storage_path: String,
    pub max_upload_size_mb: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: "data/files".to_string(),
            max_upload_size_mb: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "logs/pinpin.log".to_string(),
        }
    }
}

/// Process-level knobs around the maintenance document, which itself lives
/// in the database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaintenanceSettings {
    /// Key the web client binds to the admin bypass toggle.
    pub bypass_key: String,
    /// How often the stored document is re-read, so edits made by another
    /// process on the same database show up.
    pub refresh_interval_secs: u64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            bypass_key: "F12".to_string(),
            refresh_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlansConfig {
    pub free_storage_mb: i64,
    pub premium_storage_mb: i64,
}

impl PlansConfig {
    pub fn free_storage_bytes(&self) -> i64 {
        self.free_storage_mb * MIB
    }

    pub fn premium_storage_bytes(&self) -> i64 {
        self.premium_storage_mb * MIB
    }
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            free_storage_mb: 100,
            premium_storage_mb: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
    pub maintenance: MaintenanceSettings,
    pub plans: PlansConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// [`Config::load`] followed by [`Config::apply_env_overrides`].
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PinpinError::Config(format!("config parse error: {e}")))
    }

    /// A non-empty `PINPIN_JWT_SECRET` replaces `web.jwt_secret`, keeping the
    /// secret out of the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = std::env::var("PINPIN_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.web.jwt_secret = secret;
        }
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        let problem = if self.web.jwt_secret.is_empty() {
            "jwt_secret is not set. \
             Set it in config.toml or via PINPIN_JWT_SECRET environment variable."
        } else if self.plans.free_storage_mb <= 0 || self.plans.premium_storage_mb <= 0 {
            "plan storage limits must be positive"
        } else if self.maintenance.bypass_key.trim().is_empty() {
            "maintenance.bypass_key must not be empty"
        } else {
            return Ok(());
        };
        Err(PinpinError::Config(problem.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret() -> Config {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.public_url, "http://localhost:8080");
        assert!(config.web.jwt_secret.is_empty());
        assert_eq!(config.web.jwt_access_token_expiry_secs, 3600);
        assert_eq!(config.database.path, "data/pinpin.db");
        assert_eq!(config.files.max_upload_size_mb, 50);
        assert_eq!(config.logging.file, "logs/pinpin.log");
        assert_eq!(config.maintenance.bypass_key, "F12");
        assert_eq!(config.maintenance.refresh_interval_secs, 30);
        assert_eq!(config.plans.free_storage_bytes(), 100 * MIB);
        assert_eq!(config.plans.premium_storage_bytes(), 1000 * MIB);
    }

    #[test]
    fn test_parse_every_section() {
        let config = Config::parse(
            r#"
[web]
host = "127.0.0.1"
port = 3000
public_url = "https://cloud.example.com"
cors_origins = ["http://localhost:5173"]
jwt_secret = "test-secret-key"
login_rate_limit = 3
redeem_rate_limit = 2

[database]
path = "custom/db.sqlite"

[files]
storage_path = "custom/files"
max_upload_size_mb = 20

[logging]
level = "debug"

[maintenance]
bypass_key = "F9"
refresh_interval_secs = 5

[plans]
free_storage_mb = 50
premium_storage_mb = 2000
"#,
        )
        .unwrap();

        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.web.public_url, "https://cloud.example.com");
        assert_eq!(config.web.cors_origins, ["http://localhost:5173"]);
        assert_eq!(config.web.login_rate_limit, 3);
        assert_eq!(config.web.redeem_rate_limit, 2);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.files.storage_path, "custom/files");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "logs/pinpin.log");
        assert_eq!(config.maintenance.bypass_key, "F9");
        assert_eq!(config.maintenance.refresh_interval_secs, 5);
        assert_eq!(config.plans.free_storage_bytes(), 50 * MIB);
        assert_eq!(config.plans.premium_storage_mb, 2000);
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let config = Config::parse("[web]\nport = 9000\n").unwrap();
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.redeem_rate_limit, 5);
        assert_eq!(config.maintenance.bypass_key, "F12");

        let empty = Config::parse("").unwrap();
        assert_eq!(empty.database.path, "data/pinpin.db");
    }

    #[test]
    fn test_load_errors() {
        match Config::parse("this is not valid toml [[[") {
            Err(PinpinError::Config(msg)) => assert!(msg.contains("config parse error")),
            other => panic!("expected a config error, got {other:?}"),
        }
        assert!(matches!(
            Config::load("nonexistent.toml"),
            Err(PinpinError::Io(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[files]\nmax_upload_size_mb = 7\n").unwrap();

        assert_eq!(Config::load(&path).unwrap().files.max_upload_size_mb, 7);
    }

    #[test]
    fn test_validate() {
        match Config::default().validate() {
            Err(PinpinError::Config(msg)) => assert!(msg.contains("jwt_secret")),
            other => panic!("expected a config error, got {other:?}"),
        }
        assert!(with_secret().validate().is_ok());

        let mut config = with_secret();
        config.plans.free_storage_mb = 0;
        assert!(config.validate().is_err());

        let mut config = with_secret();
        config.maintenance.bypass_key = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        let original = std::env::var("PINPIN_JWT_SECRET").ok();

        std::env::set_var("PINPIN_JWT_SECRET", "env-secret-key");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.web.jwt_secret, "env-secret-key");

        match original {
            Some(value) => std::env::set_var("PINPIN_JWT_SECRET", value),
            None => std::env::remove_var("PINPIN_JWT_SECRET"),
        }
    }
}
