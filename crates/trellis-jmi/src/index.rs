//! Hierarchy index over a working set of element records.
//!
//! The index is built from the `parent` fields alone — a record's own
//! `contains` cache is never trusted. Construction is total over any finite
//! duplicate-free working set: an element whose parent is absent from the
//! set becomes a root of the working set instead of being dropped
//! (partial-data policy).

use std::collections::HashMap;

use trellis_core::element::Element;
use trellis_core::ids::ElementId;

use crate::error::JmiError;

const UNSEEN: u8 = 0;
const ACTIVE: u8 = 1;
const DONE: u8 = 2;

/// Id lookup and parent→children adjacency over one working set.
///
/// All child and root orderings preserve the original input order of the
/// working set.
#[derive(Debug)]
pub struct HierarchyIndex<'a> {
    working_set: &'a [Element],
    by_id: HashMap<&'a ElementId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> HierarchyIndex<'a> {
    /// Index a working set in one pass over ids and one pass over parents.
    ///
    /// # Errors
    ///
    /// Returns [`JmiError::DuplicateId`] if two records share an id.
    pub fn build(working_set: &'a [Element]) -> Result<Self, JmiError> {
        let mut by_id = HashMap::with_capacity(working_set.len());
        for (i, element) in working_set.iter().enumerate() {
            if by_id.insert(&element.id, i).is_some() {
                return Err(JmiError::DuplicateId(element.id.to_string()));
            }
        }

        let mut children = vec![Vec::new(); working_set.len()];
        let mut roots = Vec::new();
        for (i, element) in working_set.iter().enumerate() {
            match element.parent.as_ref().and_then(|p| by_id.get(p)) {
                Some(&parent_idx) => children[parent_idx].push(i),
                // No parent, or parent outside the working set: root here.
                None => roots.push(i),
            }
        }

        Ok(Self {
            working_set,
            by_id,
            children,
            roots,
        })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.working_set.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.working_set.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&'a Element> {
        self.by_id.get(id).map(|&i| &self.working_set[i])
    }

    /// Roots of the working set in input order: elements with no parent,
    /// plus elements whose parent is absent from the set.
    pub fn roots(&self) -> impl Iterator<Item = &'a ElementId> + '_ {
        self.roots.iter().map(|&i| &self.working_set[i].id)
    }

    /// Root positions within the working set, in input order.
    #[must_use]
    pub fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    /// Ordered child ids of `id`, computed from the working set's `parent`
    /// fields. Empty for leaves and for ids not in the set.
    pub fn children_of(&self, id: &ElementId) -> impl Iterator<Item = &'a ElementId> + '_ {
        self.by_id
            .get(id)
            .map(|&i| &self.children[i])
            .into_iter()
            .flatten()
            .map(|&c| &self.working_set[c].id)
    }

    /// Child positions of the element at `idx`, in input order.
    #[must_use]
    pub fn child_indices(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// The recomputed `contains` value for `id` — the derived cache a
    /// consumer may stamp onto output records.
    #[must_use]
    pub fn contains_of(&self, id: &ElementId) -> Vec<ElementId> {
        self.by_id
            .get(id)
            .map(|&i| self.contains_at(i))
            .unwrap_or_default()
    }

    /// The recomputed `contains` value for the element at `idx`.
    #[must_use]
    pub fn contains_at(&self, idx: usize) -> Vec<ElementId> {
        self.children[idx]
            .iter()
            .map(|&c| self.working_set[c].id.clone())
            .collect()
    }

    /// Confirm the parent relation is a forest.
    ///
    /// Only needed when a caller demands a confirmed-complete branch view;
    /// ordinary index construction is total without it.
    ///
    /// # Errors
    ///
    /// Returns [`JmiError::CycleDetected`] naming the elements on the cycle.
    pub fn validate_acyclic(&self) -> Result<(), JmiError> {
        let mut state = vec![UNSEEN; self.working_set.len()];
        for start in 0..self.working_set.len() {
            if state[start] != UNSEEN {
                continue;
            }
            let mut path = Vec::new();
            let mut current = start;
            loop {
                state[current] = ACTIVE;
                path.push(current);
                let next = self.working_set[current]
                    .parent
                    .as_ref()
                    .and_then(|p| self.by_id.get(p))
                    .copied();
                match next {
                    None => break,
                    Some(n) if state[n] == DONE => break,
                    Some(n) if state[n] == ACTIVE => {
                        // ACTIVE nodes are exactly the current path.
                        let entry = path.iter().position(|&i| i == n).unwrap_or(0);
                        let ids = path[entry..]
                            .iter()
                            .map(|&i| self.working_set[i].id.to_string())
                            .collect();
                        return Err(JmiError::CycleDetected(ids));
                    }
                    Some(n) => current = n,
                }
            }
            for i in path {
                state[i] = DONE;
            }
        }
        Ok(())
    }
}
