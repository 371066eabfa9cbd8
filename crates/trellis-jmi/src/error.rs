//! Conversion and indexing error types.

use thiserror::Error;
use trellis_core::ids::MalformedIdError;

/// Errors raised by the hierarchy index and the JMI converter.
///
/// All errors are returned as values; the core never masks ambiguous input
/// (duplicate ids are surfaced, not deduplicated). The HTTP boundary maps
/// these onto status classes via [`JmiError::is_internal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JmiError {
    /// Two records in the working set share an id.
    #[error("duplicate element id: {0}")]
    DuplicateId(String),

    /// The chosen conversion key is not unique across the working set.
    #[error("non-unique key for field '{field}': {value:?}")]
    NonUniqueKey { field: String, value: String },

    /// Requested representation level outside `{1, 2, 3}`, or an
    /// unimplemented transition between levels.
    #[error("unsupported representation: {0}")]
    UnsupportedFormat(String),

    /// The parent relation contains a cycle. Explicit validation names the
    /// cycle members; nesting names everything the cycle left unreachable.
    #[error("cycle detected through elements: {0:?}")]
    CycleDetected(Vec<String>),

    /// An identifier string failed structural parsing.
    #[error(transparent)]
    MalformedId(#[from] MalformedIdError),
}

impl JmiError {
    /// Whether this error is an internal invariant violation (500-class at
    /// the HTTP boundary) rather than malformed input (400-class).
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::CycleDetected(_))
    }
}
