//! Offline stand-in for the product's manifest rendering
//!
//! Maps the handful of product properties the tests exercise onto job
//! properties the same way the product does, so assertions can run without
//! an Ops Manager. Property references not listed here are ignored.

use crate::flavor::ProductFlavor;
use crate::jobs::{autoscaling_instance_group, cloud_controller_jobs};
use serde_json::{json, Map, Value};

pub const CC_LOGGING_LEVEL: &str = ".properties.cc_logging_level";
pub const CC_HEALTH_CHECK_TIMEOUT: &str = ".properties.cloud_controller_default_health_check_timeout";
pub const INSECURE_DOCKER_REGISTRY_LIST: &str = ".diego_cell.insecure_docker_registry_list";
pub const AUTOSCALE_DISABLE_CONNECTION_POOLING: &str =
    ".properties.autoscale_api_disable_connection_pooling";

const DEFAULT_LOGGING_LEVEL: &str = "info";
const DEFAULT_HEALTH_CHECK_TIMEOUT: u64 = 60;

/// Render a manifest for `flavor` from flattened product properties
#[must_use]
pub fn render_manifest(flavor: ProductFlavor, properties: &Map<String, Value>) -> Value {
    tracing::debug!(%flavor, overrides = properties.len(), "rendering fixture manifest");

    let cc = cc_properties(properties);
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();

    for job in cloud_controller_jobs(flavor) {
        push_job(
            &mut groups,
            job.instance_group,
            json!({ "name": job.name, "release": "capi", "properties": { "cc": cc } }),
        );
    }

    let autoscale_group = autoscaling_instance_group(flavor);
    push_job(
        &mut groups,
        autoscale_group,
        json!({
            "name": "test-autoscaling",
            "release": "app-autoscaler",
            "properties": { "autoscale": { "organization": "system", "space": "autoscaling" } }
        }),
    );
    push_job(
        &mut groups,
        autoscale_group,
        json!({
            "name": "deploy-autoscaler",
            "release": "app-autoscaler",
            "properties": {
                "autoscale": {
                    "organization": "system",
                    "space": "autoscaling",
                    "api": {
                        "disable_connection_pooling": properties
                            .get(AUTOSCALE_DISABLE_CONNECTION_POOLING)
                            .and_then(Value::as_bool)
                            .unwrap_or(false)
                    }
                }
            }
        }),
    );

    let instance_groups: Vec<Value> = groups
        .into_iter()
        .map(|(name, mut jobs)| {
            jobs.push(json!({ "name": "route_registrar", "release": "routing" }));
            json!({ "name": name, "instances": 1, "jobs": jobs })
        })
        .collect();

    json!({
        "name": format!("{}-fixture", flavor.product_name()),
        "instance_groups": instance_groups,
    })
}

fn cc_properties(properties: &Map<String, Value>) -> Value {
    let logging_level = properties
        .get(CC_LOGGING_LEVEL)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_LOGGING_LEVEL);
    let timeout = properties
        .get(CC_HEALTH_CHECK_TIMEOUT)
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_HEALTH_CHECK_TIMEOUT);
    let registries = properties
        .get(INSECURE_DOCKER_REGISTRY_LIST)
        .and_then(Value::as_str)
        .map(split_list)
        .unwrap_or_default();

    json!({
        "logging_level": logging_level,
        "default_health_check_timeout": timeout,
        "diego": { "insecure_docker_registry_list": registries }
    })
}

/// Comma-separated setting → ordered list, blanks dropped
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn push_job(groups: &mut Vec<(String, Vec<Value>)>, group: &str, job: Value) {
    match groups.iter_mut().find(|(name, _)| name.as_str() == group) {
        Some((_, jobs)) => jobs.push(job),
        None => groups.push((group.to_string(), vec![job])),
    }
}
