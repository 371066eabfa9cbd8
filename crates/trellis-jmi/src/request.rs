//! The conversion request contract consumed from the HTTP/query layer.
//!
//! By the time a request reaches this crate, the boundary has already
//! resolved the working set (permissions, id-list precedence, field
//! projection). What arrives here is the requested format token, an
//! optional key field, and the archival switch.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use trellis_core::element::Element;

use crate::convert::{DEFAULT_KEY_FIELD, JmiLevel, Representation, convert};
use crate::error::JmiError;

/// One conversion request against an already-materialized working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionRequest {
    /// Requested format token: `jmi1`, `jmi2`, or `jmi3`.
    pub format: String,
    /// Element field to key JMI2 entries by; defaults to `id`.
    pub key_field: Option<String>,
    /// Whether archived elements stay in the hierarchy view.
    pub include_archived: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            format: JmiLevel::Jmi1.as_str().to_owned(),
            key_field: None,
            include_archived: false,
        }
    }
}

impl ConversionRequest {
    /// Resolve the format token and key field.
    ///
    /// # Errors
    ///
    /// Returns [`JmiError::UnsupportedFormat`] for tokens outside
    /// `jmi1|jmi2|jmi3`.
    pub fn resolve(&self) -> Result<(JmiLevel, &str), JmiError> {
        let level = self.format.parse()?;
        let key_field = self.key_field.as_deref().unwrap_or(DEFAULT_KEY_FIELD);
        Ok((level, key_field))
    }

    /// Run the conversion this request describes over `working_set`.
    ///
    /// # Errors
    ///
    /// Propagates every [`JmiError`] of [`convert`].
    pub fn execute(&self, working_set: Vec<Element>) -> Result<Representation, JmiError> {
        let (level, key_field) = self.resolve()?;
        let working_set = if self.include_archived {
            working_set
        } else {
            strip_archived(working_set)
        };
        convert(JmiLevel::Jmi1, level, working_set, key_field)
    }
}

/// Drop archived elements, preserving the order of the rest.
#[must_use]
pub fn strip_archived(working_set: Vec<Element>) -> Vec<Element> {
    working_set.into_iter().filter(|el| !el.archived).collect()
}
