//! Products the manifest tests run against
//!
//! Every scenario runs twice: against a fixture product per flavor, and as an
//! `#[ignore]`d test against the live product described by `OM_URL` and the
//! `PRODUCT_*` variables. Live renders share one staged product, so they are
//! serialized through [`LIVE_RENDER`].

#![allow(dead_code)]

use cf_manifest_tests::{fixture, ProductFlavor};
use parking_lot::{const_mutex, Mutex};
use planitest::{Manifest, OmRenderService, OmTarget, ProductConfig, ProductService, RenderService};
use planitest_test_utils::{init_tracing, FakeOm};
use serde_json::Value;

pub type SharedRenderService = Box<dyn RenderService + Send + Sync>;

/// Held for the whole reset, configure and fetch sequence of a live render
pub static LIVE_RENDER: Mutex<()> = const_mutex(());

pub struct ProductUnderTest {
    pub flavor: ProductFlavor,
    pub product: ProductService<SharedRenderService>,
    live: bool,
}

impl ProductUnderTest {
    /// `live` products render under [`LIVE_RENDER`]
    pub fn new(flavor: ProductFlavor, service: SharedRenderService, live: bool) -> Self {
        Self {
            flavor,
            product: ProductService::new(service),
            live,
        }
    }

    /// Render with overrides given as a JSON object literal
    pub fn render(&self, overrides: Option<Value>) -> Manifest {
        let overrides = overrides.map(|value| match value {
            Value::Object(map) => map,
            other => panic!("overrides must be an object, got {other}"),
        });
        let _guard = self.live.then(|| LIVE_RENDER.lock());
        self.product
            .render_service
            .render_manifest(overrides.as_ref())
            .unwrap_or_else(|e| panic!("render {} manifest: {e}", self.flavor))
    }
}

/// A fixture product per flavor
pub fn fixture_products() -> Vec<ProductUnderTest> {
    init_tracing();
    ProductFlavor::ALL.into_iter().map(fixture_product).collect()
}

pub fn fixture_product(flavor: ProductFlavor) -> ProductUnderTest {
    let om = FakeOm::new(move |properties| fixture::render_manifest(flavor, properties));
    let config = ProductConfig::new(
        flavor.product_name(),
        "fixture",
        OmTarget::new("https://opsman.fixture.invalid"),
    );
    ProductUnderTest::new(flavor, Box::new(OmRenderService::new(om, config)), false)
}

/// The product staged on the Ops Manager named by `OM_URL`
pub fn live_product() -> ProductUnderTest {
    init_tracing();
    let live = ProductService::from_env()
        .unwrap_or_else(|e| panic!("live tests need OM_URL and PRODUCT_* set: {e}"));
    let flavor = ProductFlavor::from_product_name(&live.render_service.product().name);
    ProductUnderTest::new(flavor, Box::new(live.render_service), true)
}

/// Generate a fixture test and an ignored live test for each check
macro_rules! product_tests {
    ($($name:ident => $check:ident;)+) => {
        mod fixture {
            $(
                #[test]
                fn $name() {
                    for product in $crate::common::fixture_products() {
                        super::$check(&product);
                    }
                }
            )+
        }

        mod live {
            $(
                #[test]
                #[ignore = "renders on a live Ops Manager; set OM_URL and run with --ignored"]
                fn $name() {
                    super::$check(&$crate::common::live_product());
                }
            )+
        }
    };
}

pub(crate) use product_tests;
