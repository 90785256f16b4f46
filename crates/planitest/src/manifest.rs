//! Rendered manifest accessor
//!
//! A [`Manifest`] is the parsed output of a staged-manifest render: instance
//! groups containing jobs containing an arbitrary-depth property mapping.
//! The document is held once; instance groups and jobs own their slice of it.
//! Lookups never mutate or cache; every call walks from its root again.

use crate::error::LookupError;
use crate::path::{PathError, PropertyPath};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A rendered deployment manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    instance_groups: Vec<InstanceGroup>,
    #[serde(flatten)]
    sections: Map<String, Value>,
}

/// Named collection of jobs deployed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceGroup {
    pub name: String,
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Remaining group settings (`instances`, `networks`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployable unit within an instance group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default = "empty_properties")]
    pub properties: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_properties() -> Value {
    Value::Object(Map::new())
}

impl Manifest {
    /// Build from an already parsed JSON document, taking ownership of it
    ///
    /// # Errors
    /// Fails if the document is not a map, or `instance_groups` is present
    /// but not a list of named groups with named jobs.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Fails on invalid JSON or an unexpected `instance_groups` shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Top-level sections other than `instance_groups`
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &Map<String, Value> {
        &self.sections
    }

    /// Instance groups in manifest order
    #[inline]
    #[must_use]
    pub fn instance_groups(&self) -> &[InstanceGroup] {
        &self.instance_groups
    }

    /// Find an instance group by name (first match wins)
    ///
    /// # Errors
    /// [`LookupError::InstanceGroupNotFound`] listing the groups present.
    pub fn instance_group(&self, name: &str) -> Result<&InstanceGroup, LookupError> {
        self.instance_groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| LookupError::InstanceGroupNotFound {
                group: name.to_string(),
                available: self.instance_groups.iter().map(|g| g.name.clone()).collect(),
            })
    }

    /// Find a job within an instance group
    ///
    /// # Errors
    /// [`LookupError::InstanceGroupNotFound`] or [`LookupError::JobNotFound`];
    /// never an empty job.
    pub fn find_instance_group_job(&self, group: &str, job: &str) -> Result<&Job, LookupError> {
        self.instance_group(group)?.job(job)
    }

    /// Read a value from a top-level section, e.g. `update/canaries`
    ///
    /// Instance groups are reached through [`Manifest::instance_group`], so
    /// `instance_groups` is not a section here.
    ///
    /// # Errors
    /// Same failures as [`Job::property`].
    pub fn path(&self, path: &str) -> Result<&Value, LookupError> {
        let parsed = PropertyPath::parse(path)?;
        descend_map(&self.sections, &parsed)
    }
}

impl TryFrom<Value> for Manifest {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl InstanceGroup {
    /// Find a job by name (first match wins)
    ///
    /// # Errors
    /// [`LookupError::JobNotFound`] listing the jobs in this group.
    pub fn job(&self, name: &str) -> Result<&Job, LookupError> {
        self.jobs
            .iter()
            .find(|job| job.name == name)
            .ok_or_else(|| LookupError::JobNotFound {
                group: self.name.clone(),
                job: name.to_string(),
                available: self.jobs.iter().map(|j| j.name.clone()).collect(),
            })
    }
}

impl Job {
    /// Read a property by `/`- or `.`-delimited path
    ///
    /// Containers at the end of the path are returned as-is.
    ///
    /// # Errors
    /// - [`LookupError::InvalidPath`] for an empty path or empty segment
    /// - [`LookupError::MissingSegment`] when a key along the path is absent
    /// - [`LookupError::NotAMap`] when a non-map value sits mid-path
    pub fn property(&self, path: &str) -> Result<&Value, LookupError> {
        let parsed = PropertyPath::parse(path)?;
        descend(&self.properties, &parsed)
    }

    /// Whether a property exists at `path`
    #[must_use]
    pub fn has_property(&self, path: &str) -> bool {
        self.property(path).is_ok()
    }
}

fn descend<'a>(root: &'a Value, path: &PropertyPath) -> Result<&'a Value, LookupError> {
    match root {
        Value::Object(map) => descend_map(map, path),
        // the root itself is not a map
        other => Err(LookupError::NotAMap {
            path: path.to_string(),
            prefix: String::new(),
            found: kind(other),
        }),
    }
}

fn descend_map<'a>(
    root: &'a Map<String, Value>,
    path: &PropertyPath,
) -> Result<&'a Value, LookupError> {
    let mut map = root;
    let mut current: Option<&Value> = None;
    for (index, segment) in path.iter().enumerate() {
        if let Some(value) = current {
            map = match value {
                Value::Object(next) => next,
                other => {
                    return Err(LookupError::NotAMap {
                        path: path.to_string(),
                        prefix: path.prefix(index - 1),
                        found: kind(other),
                    })
                }
            };
        }
        current = Some(map.get(segment).ok_or_else(|| LookupError::MissingSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        })?);
    }
    current.ok_or(LookupError::InvalidPath(PathError::Empty))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
