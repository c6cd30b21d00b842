//! Environment-backed run configuration.
//!
//! Variable names match the `.env` files used with earlier versions of the tool
//! (`PCS_BASE_URL`, `USERNAME`, `UPDATE_SUBMISSIONS`, ...). Everything else is
//! prefixed `AFFINITY_`. A [`Config`] is built once per run and passed by reference
//! into each component; nothing reads the environment after startup.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::constants::{DEFAULT_ADAPTER_NAME, DEFAULT_CONFERENCE_NAME};
use crate::source::Credentials;

/// Default upper bound for a single landmark wait.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 10;

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the conference management site.
    pub base_url: Option<String>,

    /// Login for the source site.
    pub credentials: Option<Credentials>,

    /// Display name used to find the committee row. Default: `CHI 2025`.
    pub conference_name: String,

    /// Re-extract submissions even when a snapshot exists.
    pub force_refresh_submissions: bool,

    /// Match on expert keywords only.
    pub expert_only: bool,

    /// Never contact the source site; missing snapshots are errors.
    pub offline: bool,

    /// Directory holding the record snapshots. Default: `.`.
    pub cache_dir: PathBuf,

    /// Directory receiving the CSV/JSON artifacts. Default: `.`.
    pub output_dir: PathBuf,

    /// Encoder directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// Required unless `stub_embedder` is set.
    pub model_dir: Option<PathBuf>,

    /// Use the deterministic hash-based embedder instead of a model. Distances are
    /// meaningless; for dry runs and tests only.
    pub stub_embedder: bool,

    /// Adapter weights; defaults to `adapter.safetensors` inside `model_dir`.
    pub adapter_path: Option<PathBuf>,

    /// Adapter name as it appears in weight keys.
    pub adapter_name: String,

    /// Upper bound for each page landmark wait.
    pub page_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            credentials: None,
            conference_name: DEFAULT_CONFERENCE_NAME.to_string(),
            force_refresh_submissions: false,
            expert_only: false,
            offline: false,
            cache_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            model_dir: None,
            stub_embedder: false,
            adapter_path: None,
            adapter_name: DEFAULT_ADAPTER_NAME.to_string(),
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub const ENV_BASE_URL: &'static str = "PCS_BASE_URL";
    pub const ENV_USERNAME: &'static str = "USERNAME";
    pub const ENV_PASSWORD: &'static str = "PASSWORD";
    const ENV_CONFERENCE_NAME: &'static str = "CONFERENCE_NAME";
    const ENV_UPDATE_SUBMISSIONS: &'static str = "UPDATE_SUBMISSIONS";
    const ENV_EXPERT_ONLY: &'static str = "EXPERT_ONLY";
    const ENV_CACHE_DIR: &'static str = "AFFINITY_CACHE_DIR";
    const ENV_OUTPUT_DIR: &'static str = "AFFINITY_OUTPUT_DIR";
    pub const ENV_MODEL_DIR: &'static str = "AFFINITY_MODEL_DIR";
    const ENV_STUB_EMBEDDER: &'static str = "AFFINITY_STUB_EMBEDDER";
    const ENV_ADAPTER_PATH: &'static str = "AFFINITY_ADAPTER_PATH";
    const ENV_ADAPTER_NAME: &'static str = "AFFINITY_ADAPTER_NAME";
    const ENV_PAGE_TIMEOUT_SECS: &'static str = "AFFINITY_PAGE_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = Self::parse_optional_string_from_env(Self::ENV_BASE_URL)
            .map(|url| url.trim_end_matches('/').to_string());

        let credentials = match (
            Self::parse_optional_string_from_env(Self::ENV_USERNAME),
            env::var(Self::ENV_PASSWORD).ok(),
        ) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        };

        let conference_name =
            Self::parse_string_from_env(Self::ENV_CONFERENCE_NAME, defaults.conference_name);
        let force_refresh_submissions = Self::parse_flag_from_env(
            Self::ENV_UPDATE_SUBMISSIONS,
            defaults.force_refresh_submissions,
        );
        let expert_only = Self::parse_flag_from_env(Self::ENV_EXPERT_ONLY, defaults.expert_only);
        let cache_dir = Self::parse_path_from_env(Self::ENV_CACHE_DIR, defaults.cache_dir);
        let output_dir = Self::parse_path_from_env(Self::ENV_OUTPUT_DIR, defaults.output_dir);
        let model_dir = Self::parse_optional_path_from_env(Self::ENV_MODEL_DIR);
        let stub_embedder =
            Self::parse_flag_from_env(Self::ENV_STUB_EMBEDDER, defaults.stub_embedder);
        let adapter_path = Self::parse_optional_path_from_env(Self::ENV_ADAPTER_PATH);
        let adapter_name =
            Self::parse_string_from_env(Self::ENV_ADAPTER_NAME, defaults.adapter_name);
        let page_timeout = Self::parse_timeout_from_env(defaults.page_timeout)?;

        Ok(Self {
            base_url,
            credentials,
            conference_name,
            force_refresh_submissions,
            expert_only,
            offline: defaults.offline,
            cache_dir,
            output_dir,
            model_dir,
            stub_embedder,
            adapter_path,
            adapter_name,
            page_timeout,
        })
    }

    /// Validates paths and the base URL (does not create directories).
    ///
    /// A run needs a model directory unless the stub embedder was asked for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.cache_dir, &self.output_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        if let Some(ref path) = self.model_dir {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.adapter_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref value) = self.base_url {
            Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
                value: value.clone(),
                source,
            })?;
        }

        if self.model_dir.is_none() && !self.stub_embedder {
            return Err(ConfigError::ModelDirRequired {
                name: Self::ENV_MODEL_DIR,
            });
        }

        Ok(())
    }

    /// Returns the base URL and credentials, or the first missing variable.
    pub fn live_source(&self) -> Result<(Url, &Credentials), ConfigError> {
        let value = self.base_url.as_ref().ok_or(ConfigError::MissingEnvVar {
            name: Self::ENV_BASE_URL,
        })?;
        let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
            value: value.clone(),
            source,
        })?;
        let credentials = self.credentials.as_ref().ok_or(ConfigError::MissingEnvVar {
            name: Self::ENV_USERNAME,
        })?;
        Ok((url, credentials))
    }

    /// Adapter weights to load: the explicit path, else `adapter.safetensors` next
    /// to the encoder if present.
    pub fn resolved_adapter_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.adapter_path {
            return Some(path.clone());
        }
        self.model_dir
            .as_ref()
            .map(|dir| dir.join("adapter.safetensors"))
            .filter(|path| path.is_file())
    }

    fn parse_timeout_from_env(default: Duration) -> Result<Duration, ConfigError> {
        match env::var(Self::ENV_PAGE_TIMEOUT_SECS) {
            Ok(value) => {
                let secs: u64 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::InvalidTimeout {
                            value: value.clone(),
                            source: e,
                        })?;
                Ok(Duration::from_secs(secs))
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_flag_from_env(var_name: &str, default: bool) -> bool {
        env::var(var_name)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_path_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }
}
