//! OmRunner behaviour against a recording fake `om`

use planitest::{OmError, OmRunner, OmTarget};
use planitest_test_utils::{
    init_tracing, manifest_body, om_args, render_errors_body, staged_products_body,
    FakeCommandRunner,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::ErrorKind;

const URL: &str = "https://opsman.example.com";
const STAGED: &str = "curl /api/v0/staged/products";

fn runner(fake: &FakeCommandRunner) -> OmRunner<&FakeCommandRunner> {
    init_tracing();
    OmRunner::new(fake, OmTarget::new(URL))
}

#[test]
fn test_reset_and_configure_invokes_om_in_order() {
    let fake = FakeCommandRunner::new();
    runner(&fake)
        .reset_and_configure("cf", "2.1.0-build.5", r#"{"product-properties":{}}"#)
        .unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|call| call.program == "om"));
    assert_eq!(calls[0].args, om_args(URL, &["revert-staged-changes"]));
    assert_eq!(
        calls[1].args,
        om_args(
            URL,
            &[
                "stage-product",
                "--product-name",
                "cf",
                "--product-version",
                "2.1.0-build.5"
            ]
        )
    );

    let configure = &calls[2];
    let config_path = configure.config_path.clone().unwrap();
    assert_eq!(
        configure.args,
        om_args(
            URL,
            &[
                "configure-product",
                "--product-name",
                "cf",
                "--config",
                config_path.to_str().unwrap()
            ]
        )
    );
    assert_eq!(
        configure.config_contents.as_deref(),
        Some(r#"{"product-properties":{}}"#)
    );
}

#[test]
fn test_temp_config_removed_after_success() {
    let fake = FakeCommandRunner::new();
    runner(&fake)
        .reset_and_configure("cf", "2.1.0", "{}")
        .unwrap();

    let path = fake.last_configure().unwrap().config_path.unwrap();
    assert!(!path.exists(), "temp config {} was left behind", path.display());
}

#[test]
fn test_temp_config_removed_after_configure_failure() {
    let fake = FakeCommandRunner::new().on_failure("configure-product", 1, "invalid property");
    let err = runner(&fake)
        .reset_and_configure("cf", "2.1.0", "{}")
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "unable to configure product \"cf\": exit status 1: invalid property"
    );
    let configure = fake.last_configure().unwrap();
    assert_eq!(configure.config_contents.as_deref(), Some("{}"));
    assert!(!configure.config_path.unwrap().exists());
}

#[test]
fn test_temp_config_removed_when_om_cannot_start() {
    let fake = FakeCommandRunner::new().on_spawn_error(
        "configure-product",
        ErrorKind::PermissionDenied,
        "permission denied",
    );
    let err = runner(&fake)
        .reset_and_configure("cf", "2.1.0", "{}")
        .unwrap_err();

    assert!(matches!(err, OmError::Execution { .. }));
    assert!(!fake.last_configure().unwrap().config_path.unwrap().exists());
}

#[test]
fn test_stage_failure_skips_configure() {
    let fake = FakeCommandRunner::new().on_failure("stage-product", 1, "no such version");
    let err = runner(&fake)
        .reset_and_configure("cf", "9.9.9", "{}")
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "unable to stage product \"cf\", version \"9.9.9\": exit status 1: no such version"
    );
    assert_eq!(fake.keys(), vec!["revert-staged-changes", "stage-product"]);
    assert!(fake.last_configure().is_none());
}

#[test]
fn test_find_staged_product_by_type() {
    let fake = FakeCommandRunner::new().on_success(
        STAGED,
        staged_products_body(&[
            ("p-bosh-1", "p-bosh", "2.1.0"),
            ("cf-abc", "cf", "2.1.0"),
        ]),
    );
    let product = runner(&fake).find_staged_product("cf").unwrap();
    assert_eq!(product.guid, "cf-abc");
    assert_eq!(product.product_version, "2.1.0");
}

#[test]
fn test_find_staged_product_not_staged_lists_types() {
    let fake = FakeCommandRunner::new().on_success(
        STAGED,
        staged_products_body(&[
            ("p-bosh-1", "p-bosh", "2.1.0"),
            ("mysql-1", "p-mysql", "1.0.0"),
        ]),
    );
    let err = runner(&fake).find_staged_product("cf").unwrap_err();

    match &err {
        OmError::NotStaged { name, available } => {
            assert_eq!(name, "cf");
            assert_eq!(available, &vec!["p-bosh".to_string(), "p-mysql".to_string()]);
        }
        other => panic!("expected NotStaged, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "product \"cf\" has not been staged. Staged products: \"p-bosh, p-mysql\""
    );
}

#[test]
fn test_find_staged_product_keeps_query_failure() {
    let fake = FakeCommandRunner::new().on_failure(STAGED, 1, "connection refused");
    let err = runner(&fake).find_staged_product("cf").unwrap_err();

    assert!(err.is_execution_failure());
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_get_manifest_returns_manifest() {
    let manifest = json!({ "name": "cf", "instance_groups": [] });
    let fake = FakeCommandRunner::new().on_success(
        "curl /api/v0/staged/products/cf-abc/manifest",
        manifest_body(&manifest),
    );
    assert_eq!(runner(&fake).get_manifest("cf-abc").unwrap(), manifest);
}

#[test]
fn test_get_manifest_render_error_is_not_parse_error() {
    let fake = FakeCommandRunner::new().on_success(
        "curl /api/v0/staged/products/cf-abc/manifest",
        render_errors_body(&["Cannot generate manifest: invalid configuration"]),
    );
    let err = runner(&fake).get_manifest("cf-abc").unwrap_err();

    assert!(matches!(err, OmError::Render { .. }));
    assert_eq!(
        err.to_string(),
        "unable to retrieve staged manifest for product guid \"cf-abc\": Cannot generate manifest: invalid configuration"
    );
}

#[test]
fn test_get_manifest_bad_json_is_parse_error() {
    let fake = FakeCommandRunner::new()
        .on_success("curl /api/v0/staged/products/cf-abc/manifest", "<html>");
    let err = runner(&fake).get_manifest("cf-abc").unwrap_err();
    assert!(matches!(err, OmError::Parse { .. }));
}

#[test]
fn test_get_manifest_without_manifest_mapping_is_parse_error() {
    for body in [r#"{"errors":{"base":[]}}"#, r#"{"Manifest":"oops"}"#] {
        let fake = FakeCommandRunner::new()
            .on_success("curl /api/v0/staged/products/cf-abc/manifest", body);
        let err = runner(&fake).get_manifest("cf-abc").unwrap_err();

        assert!(matches!(err, OmError::Parse { .. }), "{body}: {err:?}");
        assert!(
            err.to_string()
                .starts_with("unable to retrieve staged manifest for product guid \"cf-abc\""),
            "{err}"
        );
    }
}

#[test]
fn test_config_file_creation_failure_skips_configure() {
    let scratch = tempfile::tempdir().unwrap();
    let missing = scratch.path().join("does-not-exist");
    let fake = FakeCommandRunner::new();

    let err = runner(&fake)
        .with_temp_dir(&missing)
        .reset_and_configure("cf", "2.1.0", "{}")
        .unwrap_err();

    match &err {
        OmError::Io { action, source } => {
            assert_eq!(action, "configure product \"cf\"");
            assert_eq!(source.kind(), ErrorKind::NotFound);
        }
        other => panic!("expected Io, got {other:?}"),
    }
    assert_eq!(fake.keys(), ["revert-staged-changes", "stage-product"]);
}

#[test]
fn test_config_file_written_under_chosen_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let fake = FakeCommandRunner::new();

    runner(&fake)
        .with_temp_dir(scratch.path())
        .reset_and_configure("cf", "2.1.0", "{}")
        .unwrap();

    let path = fake.last_configure().unwrap().config_path.unwrap();
    assert_eq!(path.parent(), Some(scratch.path()));
    assert!(!path.exists());
}

#[test]
fn test_get_manifest_process_failure_keeps_stderr() {
    let fake = FakeCommandRunner::new().on_failure(
        "curl /api/v0/staged/products/cf-abc/manifest",
        2,
        "token expired",
    );
    let err = runner(&fake).get_manifest("cf-abc").unwrap_err();
    match err {
        OmError::CommandFailed { code, stderr, .. } => {
            assert_eq!(code, Some(2));
            assert_eq!(stderr, "token expired");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}
