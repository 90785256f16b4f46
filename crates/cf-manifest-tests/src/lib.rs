//! Manifest tests for the Cloud Foundry runtime product
//!
//! Knows where jobs live in each product flavor and how the product maps
//! its configuration onto job properties. The tests under `tests/` render a
//! manifest with planitest and assert on the result against a fixture
//! renderer. Each scenario also has an ignored twin that renders on a live
//! Ops Manager; run those with `OM_URL` and `PRODUCT_*` set:
//!
//! ```text
//! cargo test -p cf-manifest-tests -- --ignored
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod fixture;
pub mod flavor;
pub mod jobs;

pub use flavor::{FlavorError, ProductFlavor};
pub use jobs::{autoscaling_instance_group, cloud_controller_jobs, JobRef};
