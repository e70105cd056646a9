//! Selection tracking and ancestry queries.
//!
//! Selection is a predicate over the store (`selected` flags); these helpers
//! read it and compute the `{from, to}` changes that move it.

use crate::element::{Element, ElementChange, ElementId, ElementType};
use crate::store::{ElementTree, StoreError};
use std::collections::HashSet;

/// Selected elements, falling back to the body when nothing is selected
pub fn selected_or_body(tree: &ElementTree) -> Vec<&Element> {
    let selected = tree.selected();
    if selected.is_empty() {
        tree.body().into_iter().collect()
    } else {
        selected
    }
}

/// Changes that select exactly `ids` and deselect everything else
pub fn select_only(tree: &ElementTree, ids: &[ElementId]) -> Result<Vec<ElementChange>, StoreError> {
    for id in ids {
        tree.require(id)?;
    }
    let wanted: HashSet<&ElementId> = ids.iter().collect();

    Ok(tree
        .iter()
        .filter(|element| element.selected != wanted.contains(&element.id))
        .map(|element| ElementChange::edit(element, |e| e.selected = !e.selected))
        .collect())
}

/// Changes that flip the selection of `id`, keeping the rest
pub fn toggle(tree: &ElementTree, id: &ElementId) -> Result<Vec<ElementChange>, StoreError> {
    let element = tree.require(id)?;
    Ok(vec![ElementChange::edit(element, |e| e.selected = !e.selected)])
}

/// Changes that clear every selection flag
pub fn deselect_all(tree: &ElementTree) -> Vec<ElementChange> {
    tree.selected()
        .into_iter()
        .map(|element| ElementChange::edit(element, |e| e.selected = false))
        .collect()
}

/// Ancestors of `id`, nearest first
pub fn ancestors<'a>(tree: &'a ElementTree, id: &ElementId) -> Vec<&'a Element> {
    let mut out = Vec::new();
    let mut current = tree.parent(id);
    while let Some(parent) = current {
        // a corrupt tree must not spin forever
        if out.len() > tree.len() {
            break;
        }
        out.push(parent);
        current = tree.parent(&parent.id);
    }
    out
}

pub fn depth(tree: &ElementTree, id: &ElementId) -> usize {
    ancestors(tree, id).len()
}

pub fn is_ancestor(tree: &ElementTree, ancestor: &ElementId, id: &ElementId) -> bool {
    ancestors(tree, id).iter().any(|a| &a.id == ancestor)
}

/// Pre-order descendants of `id`, excluding `id` itself
pub fn descendants<'a>(tree: &'a ElementTree, id: &ElementId) -> Vec<&'a Element> {
    let mut out = Vec::new();
    let mut stack: Vec<&ElementId> = match tree.get(id) {
        Some(element) => element.children.iter().rev().collect(),
        None => return out,
    };
    while let Some(next) = stack.pop() {
        if let Some(element) = tree.get(next) {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
    }
    out
}

/// Sort deepest first; equal depths keep store insertion order
pub fn sort_deepest_first<'a>(tree: &ElementTree, elements: &mut [&'a Element]) {
    elements.sort_by_cached_key(|element| {
        (
            std::cmp::Reverse(depth(tree, &element.id)),
            tree.position(&element.id).unwrap_or(usize::MAX),
        )
    });
}

/// Breadcrumb path from the body down to `id`
pub fn breadcrumbs<'a>(tree: &'a ElementTree, id: &ElementId) -> Vec<&'a Element> {
    let mut path = ancestors(tree, id);
    path.reverse();
    if let Some(element) = tree.get(id) {
        path.push(element);
    }
    path
}

/// Replace a section-content with its owning section
pub fn addressable<'a>(tree: &'a ElementTree, element: &'a Element) -> &'a Element {
    if element.is_section_content {
        if let Some(section) = tree
            .parent(&element.id)
            .filter(|p| p.element_type == ElementType::Section)
        {
            return section;
        }
    }
    element
}

/// Drop ids whose ancestor is also in the set, keeping the input order
pub fn remove_nested(tree: &ElementTree, ids: &[ElementId]) -> Vec<ElementId> {
    let set: HashSet<&ElementId> = ids.iter().collect();
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !ancestors(tree, id).iter().any(|a| set.contains(&a.id)))
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}
