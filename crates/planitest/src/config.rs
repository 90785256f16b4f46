//! Environment-driven configuration
//!
//! | Variable          | Meaning                                          |
//! |-------------------|--------------------------------------------------|
//! | `OM_URL`          | Ops Manager target passed to `om --target`       |
//! | `PRODUCT_NAME`    | Product to stage, e.g. `cf` or `srt`             |
//! | `PRODUCT_VERSION` | Version to stage                                 |
//! | `PRODUCT_CONFIG`  | Optional path to the base configuration JSON     |

use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the `om` target
pub const OM_URL_ENV: &str = "OM_URL";
/// Environment variable naming the product to stage
pub const PRODUCT_NAME_ENV: &str = "PRODUCT_NAME";
/// Environment variable naming the product version to stage
pub const PRODUCT_VERSION_ENV: &str = "PRODUCT_VERSION";
/// Environment variable naming the base configuration file
pub const PRODUCT_CONFIG_ENV: &str = "PRODUCT_CONFIG";

/// Where and how `om` connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmTarget {
    /// Ops Manager URL
    pub url: String,
    /// Pass `--skip-ssl-validation`
    pub skip_ssl_validation: bool,
}

impl OmTarget {
    /// Target a URL, skipping SSL validation
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            skip_ssl_validation: true,
        }
    }

    /// Read the target from `OM_URL`
    ///
    /// # Errors
    /// [`ConfigError::MissingEnv`] if `OM_URL` is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        required_env(OM_URL_ENV).map(Self::new)
    }

    /// With SSL validation toggled
    #[inline]
    #[must_use]
    pub fn with_skip_ssl_validation(mut self, skip: bool) -> Self {
        self.skip_ssl_validation = skip;
        self
    }

    /// Arguments placed before every `om` subcommand
    #[must_use]
    pub fn global_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if self.skip_ssl_validation {
            args.push("--skip-ssl-validation".to_string());
        }
        args.push("--target".to_string());
        args.push(self.url.clone());
        args
    }
}

/// Product to stage and its base configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProductConfig {
    /// Product name as known to `om stage-product`
    pub name: String,
    /// Product version as known to `om stage-product`
    pub version: String,
    /// Base `configure-product` document; overrides are merged into it
    pub base_config: Map<String, Value>,
    /// `om` target
    pub target: OmTarget,
}

impl ProductConfig {
    /// Create configuration with an empty base document
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, target: OmTarget) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            base_config: Map::new(),
            target,
        }
    }

    /// Read configuration from the environment
    ///
    /// # Errors
    /// Missing required variables, or an unreadable `PRODUCT_CONFIG` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let name = required_env(PRODUCT_NAME_ENV)?;
        let version = required_env(PRODUCT_VERSION_ENV)?;
        let target = OmTarget::from_env()?;

        let mut config = Self::new(name, version, target);
        if let Some(path) = optional_env(PRODUCT_CONFIG_ENV) {
            config = config.with_base_config_file(path)?;
        }
        Ok(config)
    }

    /// With base configuration document
    #[inline]
    #[must_use]
    pub fn with_base_config(mut self, base_config: Map<String, Value>) -> Self {
        self.base_config = base_config;
        self
    }

    /// With base configuration read from a JSON file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Invalid`]
    /// if it is not a JSON object.
    pub fn with_base_config_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = parse_base_config(&text, path)?;
        Ok(self.with_base_config(base))
    }
}

fn parse_base_config(text: &str, path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        path: PathBuf::from(path),
        message,
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("expected a JSON object".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    optional_env(name).ok_or(ConfigError::MissingEnv(name))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
