//! Property paths for addressing values inside a job or manifest
//!
//! Provides [`PropertyPath`], the parsed form of strings such as
//! `cc/logging_level` or `cc.diego.insecure_docker_registry_list`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a nested property mapping
///
/// Segments are separated by `/` or `.`; both may appear in the same path.
///
/// # Examples
/// - `cc/logging_level` → `["cc", "logging_level"]`
/// - `autoscale.api.disable_connection_pooling` → `["autoscale", "api", "disable_connection_pooling"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// Characters accepted as segment separators
    pub const SEPARATORS: [char; 2] = ['/', '.'];

    /// Parse a delimited path
    ///
    /// # Errors
    /// Returns [`PathError`] if the path is empty or contains an empty segment.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        raw.parse()
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a parsed path; kept for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Prefix of this path up to and including segment `index`
    #[must_use]
    pub fn prefix(&self, index: usize) -> String {
        let end = (index + 1).min(self.0.len());
        self.0[..end].join("/")
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = trimmed
            .split(Self::SEPARATORS)
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(trimmed.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<&str> for PropertyPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Errors related to property paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path has no segments at all
    #[error("property path is empty")]
    Empty,

    /// Two separators in a row, or a leading/trailing separator
    #[error("property path '{0}' contains an empty segment")]
    EmptySegment(String),
}
