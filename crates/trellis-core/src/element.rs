//! The Element record: one node of a branch's model tree.
//!
//! `parent` is the authoritative tree relation; `contains` is a derived
//! cache that downstream consumers recompute and never trust as input.
//! `source`/`target` form a secondary, non-tree edge relation that may cross
//! projects and branches.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ElementId, Namespace};

/// Which end of a `source`/`target` edge an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeEnd {
    Source,
    Target,
}

impl EdgeEnd {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for EdgeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `source`/`target` pair violated the linked-edge invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeError {
    /// Only one of `source`/`target` was set; the pair exists or neither does.
    #[error("edge is half-open: {0} is set without its counterpart")]
    HalfOpen(EdgeEnd),

    /// The endpoint leaves the current project but carries no namespace.
    #[error("{0} points outside the current project but has no namespace")]
    MissingNamespace(EdgeEnd),

    /// The endpoint stays inside the current project yet carries a namespace.
    #[error("{0} stays inside the current project but carries a namespace")]
    SpuriousNamespace(EdgeEnd),

    /// The namespace disagrees with where the pointee record would be found.
    #[error("{end} namespace {found} does not match pointee scope {expected}")]
    NamespaceMismatch {
        end: EdgeEnd,
        found: Namespace,
        expected: Namespace,
    },
}

/// A linked `source`/`target` pair with its optional cross-project namespaces.
///
/// Updated as a unit: both endpoints exist or neither does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<Namespace>,
}

impl Edge {
    /// Check the namespace invariant against the owning element's scope:
    /// a namespace is present iff its endpoint leaves the current project,
    /// and when present it matches the pointee's own scope.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError`] naming the offending end.
    pub fn validate(&self, scope: &Namespace) -> Result<(), EdgeError> {
        validate_end(EdgeEnd::Source, &self.source, self.source_namespace.as_ref(), scope)?;
        validate_end(EdgeEnd::Target, &self.target, self.target_namespace.as_ref(), scope)?;
        Ok(())
    }
}

fn validate_end(
    end: EdgeEnd,
    pointer: &ElementId,
    namespace: Option<&Namespace>,
    scope: &Namespace,
) -> Result<(), EdgeError> {
    let pointee = pointer.namespace();
    let foreign = !scope.same_project(&pointee);
    match namespace {
        None if foreign => Err(EdgeError::MissingNamespace(end)),
        None => Ok(()),
        Some(_) if !foreign => Err(EdgeError::SpuriousNamespace(end)),
        Some(ns) if *ns != pointee => Err(EdgeError::NamespaceMismatch {
            end,
            found: ns.clone(),
            expected: pointee,
        }),
        Some(_) => Ok(()),
    }
}

/// How an [`ElementPatch`] changes the `source`/`target` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EdgeUpdate {
    /// Drop both endpoints and their namespaces.
    Clear,
    /// Replace the whole pair.
    Set(Edge),
}

/// One element of a branch's model tree.
///
/// Wire field names are camelCase; `type` is `element_type` in Rust. The
/// `custom` bag, `documentation`, and the audit fields are opaque payload —
/// the core carries them through conversions without interpreting them,
/// except that `archived` elements can be filtered out of hierarchy views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub element_type: String,
    /// `None` only for the distinguished root element of the branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    /// Derived cache of child ids. Recomputable from `parent`; hierarchy
    /// consumers rebuild it and never trust the stored value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contains: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub custom: serde_json::Value,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl Element {
    /// A fresh element created against its required parent.
    #[must_use]
    pub fn new(id: ElementId, parent: ElementId) -> Self {
        Self::with_parent(id, Some(parent))
    }

    /// The distinguished root element of a branch (`parent = None`).
    #[must_use]
    pub fn root(id: ElementId) -> Self {
        Self::with_parent(id, None)
    }

    fn with_parent(id: ElementId, parent: Option<ElementId>) -> Self {
        Self {
            id,
            name: String::new(),
            element_type: String::new(),
            parent,
            contains: Vec::new(),
            source: None,
            target: None,
            source_namespace: None,
            target_namespace: None,
            documentation: None,
            custom: serde_json::Value::Null,
            archived: false,
            created_by: None,
            last_modified_by: None,
            created_at: None,
            last_modified_at: None,
        }
    }

    /// Whether this element is a root of its tree (`parent = None`).
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The `source`/`target` pair as a unit.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::HalfOpen`] if only one endpoint is set.
    pub fn edge(&self) -> Result<Option<Edge>, EdgeError> {
        match (&self.source, &self.target) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(EdgeError::HalfOpen(EdgeEnd::Source)),
            (None, Some(_)) => Err(EdgeError::HalfOpen(EdgeEnd::Target)),
            (Some(source), Some(target)) => Ok(Some(Edge {
                source: source.clone(),
                target: target.clone(),
                source_namespace: self.source_namespace.clone(),
                target_namespace: self.target_namespace.clone(),
            })),
        }
    }

    /// Replace or clear the `source`/`target` pair as a unit.
    pub fn set_edge(&mut self, edge: Option<Edge>) {
        match edge {
            None => {
                self.source = None;
                self.target = None;
                self.source_namespace = None;
                self.target_namespace = None;
            }
            Some(edge) => {
                self.source = Some(edge.source);
                self.target = Some(edge.target);
                self.source_namespace = edge.source_namespace;
                self.target_namespace = edge.target_namespace;
            }
        }
    }

    /// Check the linked-edge invariant against this element's own scope.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError`] if the pair is half-open or a namespace is
    /// missing, spurious, or inconsistent with its pointee.
    pub fn validate_edge(&self) -> Result<(), EdgeError> {
        match self.edge()? {
            Some(edge) => edge.validate(&self.id.namespace()),
            None => Ok(()),
        }
    }

    /// Apply a lifecycle update. Audit fields are stamped by the caller.
    pub fn apply(&mut self, patch: ElementPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(element_type) = patch.element_type {
            self.element_type = element_type;
        }
        if let Some(parent) = patch.parent {
            self.parent = Some(parent);
        }
        if let Some(documentation) = patch.documentation {
            self.documentation = Some(documentation);
        }
        if let Some(custom) = patch.custom {
            self.custom = custom;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        match patch.edge {
            Some(EdgeUpdate::Clear) => self.set_edge(None),
            Some(EdgeUpdate::Set(edge)) => self.set_edge(Some(edge)),
            None => {}
        }
    }

    /// Resolve the value of `field` for use as a conversion key.
    ///
    /// Covers the record's scalar fields plus string values of `custom`;
    /// a missing or non-string field resolves to `None`.
    #[must_use]
    pub fn key_value(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.to_string()),
            "local" => Some(self.id.local().to_owned()),
            "name" => Some(self.name.clone()),
            "type" => Some(self.element_type.clone()),
            "documentation" => self.documentation.clone(),
            other => self
                .custom
                .get(other)
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
        }
    }
}

/// Update surface of the element lifecycle: every field a consumer may
/// change after creation. The `source`/`target` pair moves only as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    pub parent: Option<ElementId>,
    pub documentation: Option<String>,
    pub custom: Option<serde_json::Value>,
    pub archived: Option<bool>,
    pub edge: Option<EdgeUpdate>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(raw: &str) -> ElementId {
        ElementId::parse(raw).unwrap()
    }

    fn ns(org: &str, project: &str, branch: &str) -> Namespace {
        Namespace {
            org: org.into(),
            project: project.into(),
            branch: branch.into(),
        }
    }

    #[test]
    fn new_element_has_parent_and_empty_payload() {
        let el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        assert_eq!(el.parent, Some(id("acme/widgets/main/model")));
        assert!(!el.is_root());
        assert!(el.contains.is_empty());
        assert!(el.custom.is_null());
    }

    #[test]
    fn root_element_has_no_parent() {
        let el = Element::root(id("acme/widgets/main/model"));
        assert!(el.is_root());
        assert!(el.id.is_model_root());
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.element_type = "Block".into();
        el.source = Some(id("acme/gadgets/main/e9"));
        el.target = Some(id("acme/widgets/main/e2"));
        el.source_namespace = Some(ns("acme", "gadgets", "main"));

        let value = serde_json::to_value(&el).unwrap();
        assert_eq!(value["type"], "Block");
        assert_eq!(value["sourceNamespace"]["project"], "gadgets");
        assert!(value.get("targetNamespace").is_none());
        assert!(value.get("contains").is_none());
    }

    #[test]
    fn half_open_edge_is_rejected() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.source = Some(id("acme/widgets/main/e2"));
        assert_eq!(el.edge(), Err(EdgeError::HalfOpen(EdgeEnd::Source)));
        assert_eq!(
            el.validate_edge(),
            Err(EdgeError::HalfOpen(EdgeEnd::Source))
        );
    }

    #[test]
    fn local_edge_needs_no_namespace() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/widgets/main/e2"),
            target: id("acme/widgets/main/e3"),
            source_namespace: None,
            target_namespace: None,
        }));
        assert_eq!(el.validate_edge(), Ok(()));
    }

    #[test]
    fn cross_project_edge_requires_namespace() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/gadgets/main/e9"),
            target: id("acme/widgets/main/e2"),
            source_namespace: None,
            target_namespace: None,
        }));
        assert_eq!(
            el.validate_edge(),
            Err(EdgeError::MissingNamespace(EdgeEnd::Source))
        );
    }

    #[test]
    fn local_edge_rejects_spurious_namespace() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/widgets/main/e2"),
            target: id("acme/widgets/main/e3"),
            source_namespace: Some(ns("acme", "widgets", "main")),
            target_namespace: None,
        }));
        assert_eq!(
            el.validate_edge(),
            Err(EdgeError::SpuriousNamespace(EdgeEnd::Source))
        );
    }

    #[test]
    fn namespace_must_match_pointee_scope() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/gadgets/main/e9"),
            target: id("acme/widgets/main/e2"),
            source_namespace: Some(ns("acme", "gadgets", "dev")),
            target_namespace: None,
        }));
        assert_eq!(
            el.validate_edge(),
            Err(EdgeError::NamespaceMismatch {
                end: EdgeEnd::Source,
                found: ns("acme", "gadgets", "dev"),
                expected: ns("acme", "gadgets", "main"),
            })
        );
    }

    #[test]
    fn apply_patch_updates_fields_and_edge_as_unit() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.set_edge(Some(Edge {
            source: id("acme/widgets/main/e2"),
            target: id("acme/widgets/main/e3"),
            source_namespace: None,
            target_namespace: None,
        }));

        el.apply(ElementPatch {
            name: Some("Engine".into()),
            element_type: Some("Block".into()),
            archived: Some(true),
            edge: Some(EdgeUpdate::Clear),
            ..ElementPatch::default()
        });

        assert_eq!(el.name, "Engine");
        assert_eq!(el.element_type, "Block");
        assert!(el.archived);
        assert_eq!(el.source, None);
        assert_eq!(el.target, None);
        assert_eq!(el.source_namespace, None);
    }

    #[test]
    fn key_value_covers_scalar_fields_and_custom() {
        let mut el = Element::new(id("acme/widgets/main/e1"), id("acme/widgets/main/model"));
        el.name = "Engine".into();
        el.custom = serde_json::json!({"sku": "W-100", "weight": 12});

        assert_eq!(el.key_value("id").as_deref(), Some("acme/widgets/main/e1"));
        assert_eq!(el.key_value("local").as_deref(), Some("e1"));
        assert_eq!(el.key_value("name").as_deref(), Some("Engine"));
        assert_eq!(el.key_value("sku").as_deref(), Some("W-100"));
        assert_eq!(el.key_value("weight"), None);
        assert_eq!(el.key_value("documentation"), None);
    }
}
