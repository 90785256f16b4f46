//! planitest - manifest tests for products staged through `om`
//!
//! Stages and configures a product on an Ops Manager target by driving the
//! `om` CLI, fetches the rendered manifest, and gives typed access to the
//! jobs and properties inside it.
//!
//! # Architecture
//!
//! ```text
//! ProductService → RenderService → OmRunner → CommandRunner → om
//!                        ↓
//!                    Manifest → InstanceGroup → Job → property(path)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use planitest::ProductService;
//! use serde_json::json;
//!
//! let product = ProductService::from_env()?;
//! let overrides = json!({ ".properties.cc_logging_level": "debug" });
//! let manifest = product.render_manifest(overrides.as_object())?;
//!
//! let job = manifest.find_instance_group_job("cloud_controller", "cloud_controller_ng")?;
//! assert_eq!(job.property("cc/logging_level")?, &json!("debug"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod manifest;
pub mod om;
pub mod path;
pub mod product;
pub mod runner;

// Re-exports for convenience
pub use config::{OmTarget, ProductConfig};
pub use error::{ConfigError, LookupError, OmError, PlanitestError, PlanitestResult};
pub use manifest::{InstanceGroup, Job, Manifest};
pub use om::{OmRunner, StagedProduct};
pub use path::{PathError, PropertyPath};
pub use product::{merge_overrides, OmRenderService, ProductService, RenderService};
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for manifest tests
    pub use crate::error::{LookupError, PlanitestError, PlanitestResult};
    pub use crate::manifest::{Job, Manifest};
    pub use crate::product::{ProductService, RenderService};
}
