//! Cross-reference resolver contract.
//!
//! The core never chases a `source`/`target` pointer itself — lookup lives
//! with the persistence collaborator. What it does define is the contract:
//! given a pointer and its optional namespace, decide whether the pointee
//! lives in the current working set's branch or elsewhere.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use trellis_core::ids::{ElementId, Namespace};

/// Where a cross-reference pointer resolves relative to the current branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionHint {
    /// Same branch as the current working set.
    Local,
    /// A different project or branch; the namespace says which.
    Foreign(Namespace),
}

/// Collaborator boundary for resolving `source`/`target` pointers.
pub trait CrossReferenceResolver {
    /// Classify a pointer relative to the resolver's scope. An explicit
    /// namespace wins over the scope derived from the pointer itself.
    fn resolve(&self, pointer: &ElementId, namespace: Option<&Namespace>) -> ResolutionHint;
}

/// The pure scope-comparison rule — the only resolver the core ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeResolver {
    /// The `{org, project, branch}` of the current working set.
    pub scope: Namespace,
}

impl CrossReferenceResolver for ScopeResolver {
    fn resolve(&self, pointer: &ElementId, namespace: Option<&Namespace>) -> ResolutionHint {
        match namespace {
            Some(ns) if *ns == self.scope => ResolutionHint::Local,
            Some(ns) => ResolutionHint::Foreign(ns.clone()),
            None if self.scope.contains(pointer) => ResolutionHint::Local,
            None => ResolutionHint::Foreign(pointer.namespace()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolver() -> ScopeResolver {
        ScopeResolver {
            scope: Namespace {
                org: "acme".into(),
                project: "widgets".into(),
                branch: "main".into(),
            },
        }
    }

    #[test]
    fn pointer_in_scope_is_local() {
        let pointer = ElementId::parse("acme/widgets/main/e1").unwrap();
        assert_eq!(resolver().resolve(&pointer, None), ResolutionHint::Local);
    }

    #[test]
    fn pointer_outside_scope_derives_its_namespace() {
        let pointer = ElementId::parse("acme/gadgets/dev/e9").unwrap();
        assert_eq!(
            resolver().resolve(&pointer, None),
            ResolutionHint::Foreign(Namespace {
                org: "acme".into(),
                project: "gadgets".into(),
                branch: "dev".into(),
            })
        );
    }

    #[test]
    fn explicit_namespace_wins() {
        // Pointer string looks local, but the namespace says otherwise.
        let pointer = ElementId::parse("acme/widgets/main/e1").unwrap();
        let foreign = Namespace {
            org: "acme".into(),
            project: "widgets".into(),
            branch: "release-1".into(),
        };
        assert_eq!(
            resolver().resolve(&pointer, Some(&foreign)),
            ResolutionHint::Foreign(foreign.clone())
        );
        assert_eq!(
            resolver().resolve(&pointer, Some(&resolver().scope)),
            ResolutionHint::Local
        );
    }
}
