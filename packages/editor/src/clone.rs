//! # Clone Engine
//!
//! Deep-copies subtrees with fresh identities, leaving the originals alone.
//!
//! ## Algorithm
//!
//! - Roots are normalized first: a `section-content` is replaced by its
//!   owning `section`, duplicates and roots nested under another root are
//!   dropped (the ancestor's clone already covers them).
//! - Each subtree is visited top-down. Every visited node gets a new id and a
//!   copy of every attribute except id, selection and children. The cloned
//!   parent id travels alongside the record while recursing; children lists
//!   are rebuilt from it afterwards and the field is dropped before anything
//!   is returned.
//! - Only cloned roots are marked selected.

use crate::element::{Element, ElementId};
use crate::id_generator::IdGenerator;
use crate::selection::{addressable, remove_nested};
use crate::store::{ElementStore, ElementTree, StoreError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloneError {
    #[error("Cannot clone missing element {0}")]
    NotFound(ElementId),

    #[error("The body cannot be cloned")]
    Body,

    #[error("Clone source is inconsistent: {0}")]
    Source(#[from] StoreError),
}

/// Flat list of cloned records plus the ids of the cloned roots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneSet {
    /// Roots and all their descendants, parents before children
    pub elements: Vec<Element>,
    pub roots: Vec<ElementId>,
}

impl CloneSet {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn root_elements(&self) -> Vec<&Element> {
        self.roots
            .iter()
            .filter_map(|id| self.elements.iter().find(|e| &e.id == id))
            .collect()
    }
}

/// A cloned record still carrying the id of its cloned parent
struct PendingClone {
    element: Element,
    cloned_parent: Option<ElementId>,
}

struct CloneContext<'a, F> {
    source: &'a ElementTree,
    ids: &'a mut IdGenerator,
    exists: F,
    out: Vec<PendingClone>,
}

impl<'a, F: Fn(&ElementId) -> bool> CloneContext<'a, F> {
    fn visit(&mut self, id: &ElementId, cloned_parent: Option<ElementId>) -> Result<(), CloneError> {
        let source = self.source;
        let original = source.get(id).ok_or_else(|| CloneError::NotFound(id.clone()))?;
        if original.is_body {
            return Err(CloneError::Body);
        }

        let exists = &self.exists;
        let new_id = self.ids.next_id(|candidate| exists(candidate) || source.contains(candidate));

        let mut element = original.clone();
        element.id = new_id.clone();
        element.selected = cloned_parent.is_none();
        element.children = Vec::new();

        self.out.push(PendingClone {
            element,
            cloned_parent,
        });

        for child in &original.children {
            self.visit(child, Some(new_id.clone()))?;
        }
        Ok(())
    }

    fn finish(self) -> Vec<Element> {
        let mut index: HashMap<ElementId, usize> = HashMap::new();
        for (i, pending) in self.out.iter().enumerate() {
            index.insert(pending.element.id.clone(), i);
        }

        let links: Vec<(usize, ElementId)> = self
            .out
            .iter()
            .filter_map(|pending| {
                let parent = pending.cloned_parent.as_ref()?;
                Some((*index.get(parent)?, pending.element.id.clone()))
            })
            .collect();

        let mut elements: Vec<Element> = self.out.into_iter().map(|pending| pending.element).collect();
        for (parent, child) in links {
            elements[parent].children.push(child);
        }
        elements
    }
}

/// Clone `roots` (and their subtrees) out of `source`
///
/// New ids avoid every id in `source` and every id for which `exists`
/// returns true.
pub fn clone_elements(
    source: &ElementTree,
    roots: &[ElementId],
    ids: &mut IdGenerator,
    exists: impl Fn(&ElementId) -> bool,
) -> Result<CloneSet, CloneError> {
    let mut normalized = Vec::with_capacity(roots.len());
    for id in roots {
        let element = source.get(id).ok_or_else(|| CloneError::NotFound(id.clone()))?;
        let element = addressable(source, element);
        if element.is_body {
            return Err(CloneError::Body);
        }
        normalized.push(element.id.clone());
    }
    let normalized = remove_nested(source, &normalized);

    let mut ctx = CloneContext {
        source,
        ids,
        exists,
        out: Vec::new(),
    };
    let mut cloned_roots = Vec::with_capacity(normalized.len());
    for id in &normalized {
        let start = ctx.out.len();
        ctx.visit(id, None)?;
        cloned_roots.push(ctx.out[start].element.id.clone());
    }

    let elements = ctx.finish();
    tracing::debug!(roots = cloned_roots.len(), total = elements.len(), "cloned elements");
    Ok(CloneSet {
        elements,
        roots: cloned_roots,
    })
}

/// Clone elements of the store itself, with ids fresh for the store
pub fn clone_from_store(store: &mut ElementStore, roots: &[ElementId]) -> Result<CloneSet, CloneError> {
    let (tree, ids) = store.parts_mut();
    clone_elements(tree, roots, ids, |_| false)
}

/// Copied elements waiting to be pasted
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    contents: Option<CloneSet>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.as_ref().map(CloneSet::is_empty).unwrap_or(true)
    }

    pub fn set(&mut self, contents: CloneSet) {
        self.contents = Some(contents);
    }

    pub fn clear(&mut self) {
        self.contents = None;
    }

    pub fn contents(&self) -> Option<&CloneSet> {
        self.contents.as_ref()
    }

    /// A fresh clone of the clipboard, so repeated pastes never share ids
    pub fn reclone(&self, store: &mut ElementStore) -> Result<Option<CloneSet>, CloneError> {
        let Some(contents) = &self.contents else {
            return Ok(None);
        };
        let source = ElementTree::from_elements(contents.elements.clone())?;
        let (tree, ids) = store.parts_mut();
        clone_elements(&source, &contents.roots, ids, |id| tree.contains(id)).map(Some)
    }
}
