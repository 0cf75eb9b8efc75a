//! ---
//! su_section: "01-core-functionality"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Shared primitives and utilities for the console runtime."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;

fn default_base_url() -> Url {
    Url::parse("http://localhost:8000/api/v1").expect("valid default api url")
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("target/su-console/local-storage.toml")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults were used.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "SU_CONFIG";
    pub const ENV_API_URL: &'static str = "SU_API_URL";

    /// Load configuration, falling back to defaults when no candidate exists.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// `SU_CONFIG` wins over the candidate list; `SU_API_URL` overrides
    /// `api.base_url` whatever the source.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        Self::resolve(
            std::env::var(Self::ENV_CONFIG_PATH).ok(),
            std::env::var(Self::ENV_API_URL).ok(),
            candidates,
        )
    }

    fn resolve<P: AsRef<Path>>(
        env_path: Option<String>,
        env_api_url: Option<String>,
        candidates: &[P],
    ) -> Result<LoadedAppConfig> {
        let mut loaded = match env_path.filter(|path| !path.trim().is_empty()) {
            Some(path) => {
                let path = PathBuf::from(path);
                LoadedAppConfig {
                    config: Self::from_path(&path)?,
                    source: Some(path),
                }
            }
            None => match candidates.iter().find(|c| c.as_ref().exists()) {
                Some(candidate) => {
                    let path = candidate.as_ref().to_path_buf();
                    LoadedAppConfig {
                        config: Self::from_path(&path)?,
                        source: Some(path),
                    }
                }
                None => {
                    debug!("no configuration file found, using defaults");
                    LoadedAppConfig {
                        config: AppConfig::default(),
                        source: None,
                    }
                }
            },
        };

        if let Some(raw) = env_api_url.filter(|url| !url.trim().is_empty()) {
            loaded.config.api.base_url = Url::parse(raw.trim())
                .with_context(|| format!("invalid {} value {raw}", Self::ENV_API_URL))?;
        }
        loaded.config.validate()?;
        Ok(loaded)
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "api base_url {} must use http or https",
                self.base_url
            ));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(anyhow!("api base_url {} cannot be a base", self.base_url));
        }
        if self.timeout.is_zero() {
            return Err(anyhow!("api timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Location of the local storage file holding the persisted token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub file_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            file_enabled: false,
        }
    }
}
