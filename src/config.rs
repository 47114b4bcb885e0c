// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::gateway::client::DEFAULT_TIMEOUT_SECS;

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the CV REST backend.
    pub cv_api_url: String,
    pub request_timeout_secs: u64,
    pub address: String,
    pub port: u16,
    pub typst_bin: PathBuf,
    /// Parent of the per-request Typst workspaces.
    pub scratch_dir: PathBuf,
    pub log_file: PathBuf,
    /// Upper bound on live wizard sessions kept in memory.
    pub max_sessions: usize,
    /// Seconds without a request after which a wizard session is dropped.
    pub session_idle_secs: u64,
    /// PEM file with the SSO RS256 public key used to verify bearer tokens.
    pub jwt_public_key: Option<PathBuf>,
    /// Shared HS256 secret, used when no public key is configured.
    pub jwt_secret: Option<String>,
    #[serde(skip)]
    pub environment: String,
    #[serde(skip)]
    pub source: ConfigSource,
}

/// Where the active configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Defaults,
    File(PathBuf),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cv_api_url: "http://127.0.0.1:8080/api".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            address: "0.0.0.0".to_string(),
            port: 4002,
            typst_bin: PathBuf::from("typst"),
            scratch_dir: PathBuf::from("tmp_workspace"),
            log_file: PathBuf::from("logs/cvbuilder.log"),
            max_sessions: 1000,
            session_idle_secs: 30 * 60,
            jwt_public_key: None,
            jwt_secret: None,
            environment: "local".to_string(),
            source: ConfigSource::Defaults,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: AppConfig,
}

impl AppConfig {
    /// Loads `config.yaml` for the active environment, then applies
    /// environment variable overrides. Nothing is logged here since tracing
    /// is configured from the result; see [`AppConfig::log_loaded`].
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        let mut config = Self::load_from_file(Path::new(CONFIG_FILE), &environment)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.resolve_paths()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("CVBUILDER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from_file(config_path: &Path, environment: &str) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self {
                environment: environment.to_string(),
                ..Self::default()
            });
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config_file: ConfigFile = serde_yaml::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let mut config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };
        config.environment = environment.to_string();
        config.source = ConfigSource::File(config_path.to_path_buf());
        Ok(config)
    }

    /// Reports how the configuration was resolved, once tracing is up.
    pub fn log_loaded(&self) {
        app_log!(info, "Loaded configuration for environment: {}", self.environment);
        match &self.source {
            ConfigSource::File(path) => {
                app_log!(info, "Configuration read from {}", path.display())
            }
            ConfigSource::Defaults => {
                app_log!(warn, "{} not found, using default configuration", CONFIG_FILE)
            }
        }
        if self.jwt_public_key.is_none() && self.jwt_secret.is_none() {
            app_log!(
                warn,
                "No JWT key configured, bearer token signatures are not checked"
            );
        }
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CV_API_URL") {
            self.cv_api_url = url;
        }
        if let Some(port) = lookup("ROCKET_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid ROCKET_PORT: {}", port))?;
        }
        if let Some(bin) = lookup("TYPST_BIN") {
            self.typst_bin = PathBuf::from(bin);
        }
        if let Some(log_file) = lookup("CVBUILDER_LOG_FILE") {
            self.log_file = PathBuf::from(log_file);
        }
        if let Some(key) = lookup("JWT_PUBLIC_KEY") {
            self.jwt_public_key = Some(PathBuf::from(key));
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        Ok(())
    }

    fn resolve_paths(&mut self) -> Result<()> {
        self.scratch_dir = Self::resolve_path(&self.scratch_dir)?;
        self.log_file = Self::resolve_path(&self.log_file)?;
        Ok(())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the scratch directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", self.scratch_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
local:
  cv_api_url: "http://localhost:9000/api"
  port: 4100
production:
  cv_api_url: "https://cv.example.org/api"
  typst_bin: "/usr/local/bin/typst"
  scratch_dir: "/app/tmp"
"#;

    #[test]
    fn test_environment_selects_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let local = AppConfig::load_from_file(&path, "local").unwrap();
        assert_eq!(local.source, ConfigSource::File(path.clone()));
        assert_eq!(local.environment, "local");
        assert_eq!(local.cv_api_url, "http://localhost:9000/api");
        assert_eq!(local.port, 4100);
        assert_eq!(local.request_timeout_secs, 400);

        let production = AppConfig::load_from_file(&path, "production").unwrap();
        assert_eq!(production.environment, "production");
        assert_eq!(production.typst_bin, PathBuf::from("/usr/local/bin/typst"));
        assert_eq!(production.port, 4002);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_file(&dir.path().join("absent.yaml"), "local").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.source, ConfigSource::Defaults);

        let config =
            AppConfig::load_from_file(&dir.path().join("absent.yaml"), "production").unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.port, 4002);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CV_API_URL", "http://backend:8080"),
            ("ROCKET_PORT", "5000"),
            ("TYPST_BIN", "/opt/typst"),
            ("JWT_SECRET", "sso-signing-key"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.cv_api_url, "http://backend:8080");
        assert_eq!(config.port, 5000);
        assert_eq!(config.typst_bin, PathBuf::from("/opt/typst"));
        assert_eq!(config.jwt_secret.as_deref(), Some("sso-signing-key"));

        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(|k| (k == "ROCKET_PORT").then(|| "not-a-port".to_string()))
            .is_err());
    }
}
