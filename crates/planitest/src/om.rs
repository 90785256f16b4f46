//! Driving the `om` platform-configuration CLI
//!
//! Each operation is one or more blocking `om` invocations whose stdout is
//! parsed as JSON. Failures carry the attempted action, the underlying cause
//! and the captured stderr.

use crate::config::OmTarget;
use crate::error::OmError;
use crate::runner::CommandRunner;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Program name passed to the [`CommandRunner`]
pub const OM_PROGRAM: &str = "om";

const STAGED_PRODUCTS_PATH: &str = "/api/v0/staged/products";

/// A product registered with the target but not yet deployed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedProduct {
    pub guid: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub product_version: String,
}

#[derive(Debug, Deserialize)]
struct StagedManifestResponse {
    #[serde(rename = "Manifest", alias = "manifest")]
    manifest: Option<Map<String, Value>>,
    #[serde(default)]
    errors: ResponseErrors,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseErrors {
    #[serde(rename = "base", default)]
    messages: Vec<String>,
}

/// Runs `om` against one target
#[derive(Debug, Clone)]
pub struct OmRunner<R> {
    runner: R,
    target: OmTarget,
    temp_dir: Option<PathBuf>,
}

impl<R: CommandRunner> OmRunner<R> {
    /// Create runner for a target
    #[inline]
    #[must_use]
    pub fn new(runner: R, target: OmTarget) -> Self {
        Self {
            runner,
            target,
            temp_dir: None,
        }
    }

    /// Write configuration files under `dir` instead of the system temp dir
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Target this runner talks to
    #[inline]
    #[must_use]
    pub fn target(&self) -> &OmTarget {
        &self.target
    }

    /// Directory configuration files are written to, if overridden
    #[inline]
    #[must_use]
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    /// List products staged on the target
    ///
    /// # Errors
    /// [`OmError::Execution`]/[`OmError::CommandFailed`] if `om` fails,
    /// [`OmError::Parse`] if the response is not a product list.
    pub fn staged_products(&self) -> Result<Vec<StagedProduct>, OmError> {
        let action = "retrieve staged products";
        let response = self.om(action, &["curl", "--path", STAGED_PRODUCTS_PATH])?;
        serde_json::from_str(&response).map_err(|e| OmError::parse(action, e))
    }

    /// Find the staged product with the given type
    ///
    /// # Errors
    /// [`OmError::NotStaged`] listing the staged types if none match; a
    /// failure to list staged products is returned unchanged.
    pub fn find_staged_product(&self, product_type: &str) -> Result<StagedProduct, OmError> {
        let staged = self.staged_products()?;

        if let Some(product) = staged.iter().find(|sp| sp.product_type == product_type) {
            return Ok(product.clone());
        }

        let available: Vec<String> = staged.into_iter().map(|sp| sp.product_type).collect();
        tracing::warn!(
            product = product_type,
            staged = ?available,
            "product is not staged"
        );
        Err(OmError::NotStaged {
            name: product_type.to_string(),
            available,
        })
    }

    /// Revert, stage and configure a product from a JSON configuration
    ///
    /// Steps run strictly in order: revert staged changes, stage the
    /// product, write `config_json` to a temporary file, configure from that
    /// file. The temporary file is removed whether or not configuring
    /// succeeds.
    ///
    /// # Errors
    /// The first failing step's error; later steps are not attempted.
    pub fn reset_and_configure(
        &self,
        product_name: &str,
        product_version: &str,
        config_json: &str,
    ) -> Result<(), OmError> {
        tracing::info!(product = product_name, version = product_version, "resetting product");

        self.om("revert staged changes", &["revert-staged-changes"])?;

        self.om(
            &format!("stage product {product_name:?}, version {product_version:?}"),
            &[
                "stage-product",
                "--product-name",
                product_name,
                "--product-version",
                product_version,
            ],
        )?;

        let action = format!("configure product {product_name:?}");
        let mut builder = tempfile::Builder::new();
        builder.prefix("planitest-config-").suffix(".json");
        let mut config_file = match self.temp_dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| OmError::io(&action, e))?;
        config_file
            .write_all(config_json.as_bytes())
            .and_then(|()| config_file.flush())
            .map_err(|e| OmError::io(&action, e))?;

        let config_path = config_file.path().to_string_lossy().into_owned();
        self.om(
            &action,
            &[
                "configure-product",
                "--product-name",
                product_name,
                "--config",
                config_path.as_str(),
            ],
        )?;

        config_file.close().map_err(|e| OmError::io(&action, e))?;
        tracing::info!(product = product_name, "product configured");
        Ok(())
    }

    /// Fetch the rendered manifest for a staged product
    ///
    /// # Errors
    /// [`OmError::Execution`]/[`OmError::CommandFailed`] if `om` fails,
    /// [`OmError::Parse`] for an unreadable body or one without a manifest
    /// mapping, [`OmError::Render`] with the first message when the body
    /// reports errors.
    pub fn get_manifest(&self, product_guid: &str) -> Result<Value, OmError> {
        let action = format!("retrieve staged manifest for product guid {product_guid:?}");
        let path = format!("{STAGED_PRODUCTS_PATH}/{product_guid}/manifest");
        let response = self.om(&action, &["curl", "--path", path.as_str()])?;

        let parsed: StagedManifestResponse =
            serde_json::from_str(&response).map_err(|e| OmError::parse(&action, e))?;

        if let Some(message) = parsed.errors.messages.into_iter().next() {
            return Err(OmError::Render { action, message });
        }

        match parsed.manifest {
            Some(manifest) => Ok(Value::Object(manifest)),
            None => Err(OmError::parse(
                action,
                <serde_json::Error as serde::de::Error>::missing_field("Manifest"),
            )),
        }
    }

    fn om(&self, action: &str, subcommand: &[&str]) -> Result<String, OmError> {
        let mut args = self.target.global_args();
        args.extend(subcommand.iter().map(|s| (*s).to_string()));

        tracing::debug!(subcommand = subcommand.first().copied(), "running om");

        let output = self
            .runner
            .run(OM_PROGRAM, &args)
            .map_err(|source| OmError::Execution {
                action: action.to_string(),
                source,
                stderr: String::new(),
            })?;

        if !output.is_success() {
            return Err(OmError::CommandFailed {
                action: action.to_string(),
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        Ok(output.stdout)
    }
}
