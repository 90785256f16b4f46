//! Error types for planitest
//!
//! Provides error handling for:
//! - Running `om` (process failures, unparseable responses, render errors)
//! - Looking up instance groups, jobs and properties in a manifest
//! - Loading product configuration from the environment

use crate::path::PathError;
use std::path::PathBuf;

/// Errors while driving `om`
#[derive(Debug, thiserror::Error)]
pub enum OmError {
    /// The process could not be started or its output could not be read
    #[error("unable to {action}: {source}: {stderr}")]
    Execution {
        action: String,
        #[source]
        source: std::io::Error,
        stderr: String,
    },

    /// The process ran and exited unsuccessfully
    #[error("unable to {action}: {}: {stderr}", exit_description(.code))]
    CommandFailed {
        action: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The response body is not valid JSON or has the wrong shape
    #[error("unable to {action}: {source}")]
    Parse {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest service answered with a structured error payload
    #[error("unable to {action}: {message}")]
    Render { action: String, message: String },

    /// No staged product has the requested type
    #[error("product {name:?} has not been staged. Staged products: {:?}", .available.join(", "))]
    NotStaged { name: String, available: Vec<String> },

    /// Local file handling around an `om` call failed
    #[error("unable to {action}: {source}")]
    Io {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl OmError {
    /// Create a parse error for an action
    pub fn parse(action: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            action: action.into(),
            source,
        }
    }

    /// Create an IO error for an action
    pub fn io(action: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            action: action.into(),
            source,
        }
    }

    /// Check if the external process failed (could not run, or ran and failed)
    #[inline]
    #[must_use]
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution { .. } | Self::CommandFailed { .. })
    }

    /// Check if this is a "not found" outcome rather than a failure to ask
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotStaged { .. })
    }
}

/// Errors while looking up a value in a manifest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Property path could not be parsed
    #[error("invalid property path: {0}")]
    InvalidPath(#[from] PathError),

    /// No instance group with that name
    #[error("instance group {group:?} not found. Instance groups: {}", .available.join(", "))]
    InstanceGroupNotFound {
        group: String,
        available: Vec<String>,
    },

    /// Instance group exists, but has no job with that name
    #[error("job {job:?} not found in instance group {group:?}. Jobs: {}", .available.join(", "))]
    JobNotFound {
        group: String,
        job: String,
        available: Vec<String>,
    },

    /// A key along the path does not exist
    #[error("property {path:?} not found: missing key {segment:?}")]
    MissingSegment { path: String, segment: String },

    /// A scalar or list was found where a map was needed to keep descending
    #[error("property {path:?} not found: {prefix:?} is {found}, not a map")]
    NotAMap {
        path: String,
        prefix: String,
        found: &'static str,
    },
}

impl LookupError {
    /// Check if error is a missing group or job (as opposed to a property)
    #[inline]
    #[must_use]
    pub fn is_missing_job(&self) -> bool {
        matches!(
            self,
            Self::InstanceGroupNotFound { .. } | Self::JobNotFound { .. }
        )
    }
}

/// Errors while loading product configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is unset or blank
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// Configuration file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not a JSON object
    #[error("invalid product configuration in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Combined planitest error
#[derive(Debug, thiserror::Error)]
pub enum PlanitestError {
    #[error(transparent)]
    Om(#[from] OmError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rendered output could not be read as a manifest
    #[error("invalid manifest: {0}")]
    Manifest(#[source] serde_json::Error),
}

/// Result type alias for planitest operations
pub type PlanitestResult<T> = Result<T, PlanitestError>;
