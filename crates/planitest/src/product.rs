//! Rendering a product manifest with configuration overrides
//!
//! [`RenderService`] is what manifest tests talk to. [`OmRenderService`]
//! implements it by reconfiguring a staged product through `om` and fetching
//! the resulting manifest.

use crate::config::ProductConfig;
use crate::error::{PlanitestError, PlanitestResult};
use crate::manifest::Manifest;
use crate::om::OmRunner;
use crate::runner::{CommandRunner, SystemCommandRunner};
use serde_json::{Map, Value};

/// Configuration key holding per-property settings
pub const PRODUCT_PROPERTIES_KEY: &str = "product-properties";

/// Renders a manifest, optionally overriding product properties
///
/// Override keys are property references such as
/// `.properties.cc_logging_level`.
pub trait RenderService {
    /// Render with the given overrides (`None` keeps the base configuration)
    ///
    /// # Errors
    /// Any failure configuring the product or reading the manifest.
    fn render_manifest(&self, overrides: Option<&Map<String, Value>>) -> PlanitestResult<Manifest>;
}

impl<S: RenderService + ?Sized> RenderService for &S {
    fn render_manifest(&self, overrides: Option<&Map<String, Value>>) -> PlanitestResult<Manifest> {
        (**self).render_manifest(overrides)
    }
}

impl<S: RenderService + ?Sized> RenderService for Box<S> {
    fn render_manifest(&self, overrides: Option<&Map<String, Value>>) -> PlanitestResult<Manifest> {
        (**self).render_manifest(overrides)
    }
}

/// Renders through `om`: reset, configure, then fetch the staged manifest
#[derive(Debug, Clone)]
pub struct OmRenderService<R> {
    om: OmRunner<R>,
    product: ProductConfig,
}

impl<R: CommandRunner> OmRenderService<R> {
    /// Create service for a product using the given process runner
    #[must_use]
    pub fn new(runner: R, product: ProductConfig) -> Self {
        Self {
            om: OmRunner::new(runner, product.target.clone()),
            product,
        }
    }

    /// Product being rendered
    #[inline]
    #[must_use]
    pub fn product(&self) -> &ProductConfig {
        &self.product
    }

    /// Underlying `om` runner
    #[inline]
    #[must_use]
    pub fn om(&self) -> &OmRunner<R> {
        &self.om
    }
}

impl<R: CommandRunner> RenderService for OmRenderService<R> {
    fn render_manifest(&self, overrides: Option<&Map<String, Value>>) -> PlanitestResult<Manifest> {
        let config = merge_overrides(&self.product.base_config, overrides);
        let config_json = Value::Object(config).to_string();

        self.om
            .reset_and_configure(&self.product.name, &self.product.version, &config_json)?;
        let staged = self.om.find_staged_product(&self.product.name)?;
        tracing::info!(product = %self.product.name, guid = %staged.guid, "rendering manifest");

        let raw = self.om.get_manifest(&staged.guid)?;
        Manifest::from_value(raw).map_err(PlanitestError::Manifest)
    }
}

/// Merge overrides into the base document's `product-properties`
///
/// Each override `key: v` becomes `key: {"value": v}`, keeping any other
/// fields the base already had for that key.
#[must_use]
pub fn merge_overrides(
    base: &Map<String, Value>,
    overrides: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut config = base.clone();
    let Some(overrides) = overrides.filter(|o| !o.is_empty()) else {
        return config;
    };

    let properties = config
        .entry(PRODUCT_PROPERTIES_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !properties.is_object() {
        *properties = Value::Object(Map::new());
    }

    if let Value::Object(properties) = properties {
        for (key, value) in overrides {
            let entry = properties
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(setting) => {
                    setting.insert("value".to_string(), value.clone());
                }
                other => {
                    let mut setting = Map::new();
                    setting.insert("value".to_string(), value.clone());
                    *other = Value::Object(setting);
                }
            }
        }
    }

    config
}

/// A product under test
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    /// How manifests are rendered
    pub render_service: S,
}

impl<S: RenderService> ProductService<S> {
    /// Create product service over a render service
    #[inline]
    #[must_use]
    pub fn new(render_service: S) -> Self {
        Self { render_service }
    }

    /// Render with the given overrides
    ///
    /// # Errors
    /// See [`RenderService::render_manifest`].
    pub fn render_manifest(&self, overrides: Option<&Map<String, Value>>) -> PlanitestResult<Manifest> {
        self.render_service.render_manifest(overrides)
    }
}

impl ProductService<OmRenderService<SystemCommandRunner>> {
    /// Product service driven by the real `om`, configured from the environment
    ///
    /// # Errors
    /// Missing or invalid environment configuration.
    pub fn from_env() -> PlanitestResult<Self> {
        let product = ProductConfig::from_env()?;
        Ok(Self::new(OmRenderService::new(SystemCommandRunner::new(), product)))
    }
}
