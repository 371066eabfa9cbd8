//! The JMI converter: flat, indexed, and nested element representations.
//!
//! JMI1 is the working set as received, JMI2 keys each record by a chosen
//! field, JMI3 nests records under their parents. Conversion indexes once
//! and nests once — no per-element rescans — so latency scales linearly
//! with working-set size.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trellis_core::element::Element;
use trellis_core::ids::ElementId;

use crate::error::JmiError;
use crate::index::HierarchyIndex;

/// Default key field for JMI2 conversion.
pub const DEFAULT_KEY_FIELD: &str = "id";

/// The three JMI representation levels.
///
/// Only the observed transitions are implemented: `1→1`, `1→2`, `1→3`.
/// Flattening back out of levels 2 and 3 is an extension point; any such
/// conversion must be lossless and ordered by ascending id, since the
/// original flat order is not recoverable from the richer levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JmiLevel {
    Jmi1,
    Jmi2,
    Jmi3,
}

impl JmiLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jmi1 => "jmi1",
            Self::Jmi2 => "jmi2",
            Self::Jmi3 => "jmi3",
        }
    }
}

impl fmt::Display for JmiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JmiLevel {
    type Err = JmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jmi1" => Ok(Self::Jmi1),
            "jmi2" => Ok(Self::Jmi2),
            "jmi3" => Ok(Self::Jmi3),
            other => Err(JmiError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// A nested JMI3 record: the element with its `contains` cache replaced by
/// the nested records of its children. Leaves carry an empty list, never
/// null.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct JmiNode {
    #[serde(flatten)]
    pub record: Element,
    pub contains: Vec<JmiNode>,
}

impl JmiNode {
    /// Total number of records in this subtree, the node itself included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.contains.iter());
        }
        count
    }
}

impl Drop for JmiNode {
    // The derived drop glue recurses once per nesting level; drain the
    // subtree iteratively so deep parent chains stay off the call stack.
    fn drop(&mut self) {
        let mut queue: Vec<Self> = self.contains.drain(..).collect();
        while let Some(mut node) = queue.pop() {
            queue.append(&mut node.contains);
        }
    }
}

/// One converted working set, at whichever level was requested.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Representation {
    /// JMI1: order-preserving flat sequence.
    Flat(Vec<Element>),
    /// JMI2: key → record, one entry per element.
    Indexed(BTreeMap<String, Element>),
    /// JMI3: nested records, one tree per working-set root.
    Nested(Vec<JmiNode>),
}

impl Representation {
    #[must_use]
    pub fn as_flat(&self) -> Option<&[Element]> {
        match self {
            Self::Flat(elements) => Some(elements),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_indexed(&self) -> Option<&BTreeMap<String, Element>> {
        match self {
            Self::Indexed(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&[JmiNode]> {
        match self {
            Self::Nested(nodes) => Some(nodes),
            _ => None,
        }
    }
}

/// Convert a working set between JMI representation levels.
///
/// Supported transitions are `1→1` (identity pass-through), `1→2`, and
/// `1→3`; anything else fails with [`JmiError::UnsupportedFormat`]. The
/// `source`/`target` pairs and their namespaces pass through untouched at
/// every level.
///
/// # Errors
///
/// [`JmiError::DuplicateId`] if two records share an id,
/// [`JmiError::NonUniqueKey`] if `key_field` does not resolve on every
/// record or does not key the set uniquely,
/// [`JmiError::UnsupportedFormat`] for unimplemented transitions, and
/// [`JmiError::CycleDetected`] if nesting finds a parent cycle — naming the
/// whole region left unreachable by it, descendants included (the narrower
/// cycle-members-only report is
/// [`HierarchyIndex::validate_acyclic`](crate::index::HierarchyIndex::validate_acyclic)).
pub fn convert(
    from: JmiLevel,
    to: JmiLevel,
    working_set: Vec<Element>,
    key_field: &str,
) -> Result<Representation, JmiError> {
    debug!(
        %from,
        %to,
        size = working_set.len(),
        key_field,
        "converting working set"
    );
    match (from, to) {
        (JmiLevel::Jmi1, JmiLevel::Jmi1) => Ok(Representation::Flat(working_set)),
        (JmiLevel::Jmi1, JmiLevel::Jmi2) => to_indexed(working_set, key_field),
        (JmiLevel::Jmi1, JmiLevel::Jmi3) => to_nested(working_set),
        (from, to) => Err(JmiError::UnsupportedFormat(format!("{from}->{to}"))),
    }
}

/// JMI1 → JMI2: key every record by `key_field`, stamping the recomputed
/// `contains` onto each record on the way through.
fn to_indexed(working_set: Vec<Element>, key_field: &str) -> Result<Representation, JmiError> {
    let index = HierarchyIndex::build(&working_set)?;
    let contains: Vec<Vec<ElementId>> = (0..working_set.len())
        .map(|i| index.contains_at(i))
        .collect();
    drop(index);

    let mut map = BTreeMap::new();
    for (mut element, contains) in working_set.into_iter().zip(contains) {
        // A field that does not resolve on some record cannot key the set;
        // surfaced, never masked under a placeholder.
        let Some(key) = element.key_value(key_field) else {
            return Err(JmiError::NonUniqueKey {
                field: key_field.to_owned(),
                value: String::new(),
            });
        };
        element.contains = contains;
        if map.insert(key.clone(), element).is_some() {
            return Err(JmiError::NonUniqueKey {
                field: key_field.to_owned(),
                value: key,
            });
        }
    }
    Ok(Representation::Indexed(map))
}

/// JMI1 → JMI3: index once, then nest each root's subtree in input order.
fn to_nested(working_set: Vec<Element>) -> Result<Representation, JmiError> {
    let index = HierarchyIndex::build(&working_set)?;
    let roots = index.root_indices().to_vec();
    let children: Vec<Vec<usize>> = (0..working_set.len())
        .map(|i| index.child_indices(i).to_vec())
        .collect();
    drop(index);

    let mut slots: Vec<Option<Element>> = working_set.into_iter().map(Some).collect();
    let mut built: Vec<Option<JmiNode>> = slots.iter().map(|_| None).collect();

    // Post-order assembly over an explicit work stack: the second visit of
    // an index finds all of its children already built. Deep parent chains
    // must not translate into call-stack depth.
    for &root in &roots {
        let mut stack = vec![(root, 0usize)];
        while let Some((idx, cursor)) = stack.pop() {
            if let Some(&child) = children[idx].get(cursor) {
                stack.push((idx, cursor + 1));
                stack.push((child, 0));
                continue;
            }
            let Some(mut record) = slots[idx].take() else {
                continue;
            };
            // The stored cache is replaced by nested records; clear the id
            // list so the flattened record does not serialize a competing
            // `contains` key.
            record.contains.clear();
            let nested = children[idx]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[idx] = Some(JmiNode {
                record,
                contains: nested,
            });
        }
    }

    let mut nested = Vec::with_capacity(roots.len());
    for root in roots {
        if let Some(node) = built[root].take() {
            nested.push(node);
        }
    }

    // Every element is reachable from exactly one root unless the parent
    // relation cycles inside the working set; leftovers are the whole
    // unreachable region — the cycle members plus anything hanging off them.
    let leftover: Vec<String> = slots
        .iter()
        .filter_map(|slot| slot.as_ref().map(|el| el.id.to_string()))
        .collect();
    if leftover.is_empty() {
        Ok(Representation::Nested(nested))
    } else {
        Err(JmiError::CycleDetected(leftover))
    }
}
