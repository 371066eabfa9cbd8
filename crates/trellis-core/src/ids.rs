//! Composite element identifiers and branch namespaces.
//!
//! An element id is the slash-delimited composite `org/project/branch/local`.
//! Ids are validated once at the system boundary (parse or deserialize) and
//! are plain data afterwards; the same `local` segment may exist
//! independently in different branches.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local id of the distinguished root element of every branch.
pub const MODEL_ROOT: &str = "model";

/// Number of segments in a composite id string.
const SEGMENT_COUNT: usize = 4;

const SEGMENT_NAMES: [&str; SEGMENT_COUNT] = ["org", "project", "branch", "local"];

/// Validation limits for identifier parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdLimits {
    /// Maximum length of a single segment, in bytes.
    pub max_segment_len: usize,
}

impl Default for IdLimits {
    fn default() -> Self {
        Self {
            max_segment_len: 256,
        }
    }
}

/// An identifier string failed structural parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIdError {
    /// The composite string did not split into exactly four segments.
    #[error("expected 4 '/'-delimited segments, found {0}")]
    WrongSegmentCount(usize),

    /// A segment was present but empty.
    #[error("empty {0} segment")]
    EmptySegment(&'static str),

    /// A segment exceeded the configured maximum length.
    #[error("{segment} segment exceeds {max} bytes")]
    SegmentTooLong {
        segment: &'static str,
        max: usize,
    },
}

/// Composite identifier of one element: `{org, project, branch, local}`.
///
/// Unique only within its branch scope; branches are independent copies of a
/// project's element tree, so two branches routinely hold the same `local`.
/// Serialized on the wire as the composite string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementId {
    org: String,
    project: String,
    branch: String,
    local: String,
}

impl ElementId {
    /// Parse a composite id string with default [`IdLimits`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedIdError`] if the string does not split into four
    /// non-empty segments within the length limit.
    pub fn parse(raw: &str) -> Result<Self, MalformedIdError> {
        Self::parse_with_limits(raw, IdLimits::default())
    }

    /// Parse a composite id string under caller-supplied limits.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedIdError`] if the string does not split into four
    /// non-empty segments within `limits.max_segment_len`.
    pub fn parse_with_limits(raw: &str, limits: IdLimits) -> Result<Self, MalformedIdError> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(MalformedIdError::WrongSegmentCount(segments.len()));
        }
        for (segment, name) in segments.iter().zip(SEGMENT_NAMES) {
            if segment.is_empty() {
                return Err(MalformedIdError::EmptySegment(name));
            }
            if segment.len() > limits.max_segment_len {
                return Err(MalformedIdError::SegmentTooLong {
                    segment: name,
                    max: limits.max_segment_len,
                });
            }
        }
        Ok(Self {
            org: segments[0].to_owned(),
            project: segments[1].to_owned(),
            branch: segments[2].to_owned(),
            local: segments[3].to_owned(),
        })
    }

    #[must_use]
    pub fn org(&self) -> &str {
        &self.org
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Whether two ids share `{org, project, branch}`.
    #[must_use]
    pub fn same_scope(&self, other: &Self) -> bool {
        self.org == other.org && self.project == other.project && self.branch == other.branch
    }

    /// Whether this id names the canonical root element of its branch.
    #[must_use]
    pub fn is_model_root(&self) -> bool {
        self.local == MODEL_ROOT
    }

    /// The `{org, project, branch}` scope this id lives in.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::from(self)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.org, self.project, self.branch, self.local
        )
    }
}

impl FromStr for ElementId {
    type Err = MalformedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ElementId {
    type Error = MalformedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.to_string()
    }
}

impl JsonSchema for ElementId {
    fn schema_name() -> Cow<'static, str> {
        "ElementId".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^[^/]+/[^/]+/[^/]+/[^/]+$"
        })
    }
}

/// The `{org, project, branch}` triple identifying where a cross-reference
/// pointer resolves when it leaves the current project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Namespace {
    pub org: String,
    pub project: String,
    pub branch: String,
}

impl Namespace {
    /// Whether `id` lives inside this namespace.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.org == id.org && self.project == id.project && self.branch == id.branch
    }

    /// Whether this namespace belongs to the same project (org + project),
    /// regardless of branch.
    #[must_use]
    pub fn same_project(&self, other: &Self) -> bool {
        self.org == other.org && self.project == other.project
    }
}

impl From<&ElementId> for Namespace {
    fn from(id: &ElementId) -> Self {
        Self {
            org: id.org.clone(),
            project: id.project.clone(),
            branch: id.branch.clone(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.org, self.project, self.branch)
    }
}
