//! # Structural Operations
//!
//! Free functions composing store calls into user-level edits: paste,
//! duplicate, copy, create, delete, move and property edits.
//!
//! ## Paste
//!
//! 1. Offset each successive root so siblings do not stack.
//! 2. Stamp page names (caller override, or the page-inheritance rule).
//! 3. One `create` with every record, roots and descendants together.
//! 4. One `update` appending roots to their parent (sections always go to
//!    the body) and clearing the previous selection.
//!
//! The store's `create` does not take a half-formed parent/child graph, so
//! descendants exist before any parent lists them.

use crate::clone::{clone_from_store, CloneError, CloneSet, Clipboard};
use crate::config::EditorConfig;
use crate::element::{Breakpoint, Element, ElementChange, ElementId, ElementType, Link};
use crate::notifications::Notifier;
use crate::pages::{inherited_page_names, PageStore};
use crate::selection::{addressable, descendants, is_ancestor, remove_nested};
use crate::store::{ElementStore, ElementTree, StoreError};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Rejected before touching the store; reported to the user
    #[error("{title}: {message}")]
    Illegal { title: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Clone(#[from] CloneError),
}

/// Collaborators an operation may consult
pub struct EditContext<'a> {
    pub pages: &'a dyn PageStore,
    pub notifier: &'a dyn Notifier,
    pub config: &'a EditorConfig,
}

impl<'a> EditContext<'a> {
    pub fn new(pages: &'a dyn PageStore, notifier: &'a dyn Notifier, config: &'a EditorConfig) -> Self {
        Self {
            pages,
            notifier,
            config,
        }
    }

    fn reject(&self, title: &str, message: impl Into<String>) -> OperationError {
        let message = message.into();
        self.notifier.alert(title, &message);
        OperationError::Illegal {
            title: title.to_string(),
            message,
        }
    }
}

/// Accumulates at most one change per element, in first-touch order
#[derive(Debug, Default)]
pub struct ChangeSet {
    order: Vec<ElementId>,
    changes: HashMap<ElementId, ElementChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit the pending `to` record of `id`, starting from the stored one
    pub fn edit(
        &mut self,
        tree: &ElementTree,
        id: &ElementId,
        edit: impl FnOnce(&mut Element),
    ) -> Result<(), StoreError> {
        if let Some(change) = self.changes.get_mut(id) {
            edit(&mut change.to);
            return Ok(());
        }
        let element = tree.require(id)?;
        self.order.push(id.clone());
        self.changes.insert(id.clone(), ElementChange::edit(element, edit));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Changes whose record actually differs
    pub fn into_changes(mut self) -> Vec<ElementChange> {
        self.order
            .iter()
            .filter_map(|id| self.changes.remove(id))
            .filter(|change| change.from != change.to)
            .collect()
    }
}

/// Paste input: the target plus a clone set
#[derive(Debug, Clone)]
pub struct PasteRequest {
    pub parent: ElementId,
    pub set: CloneSet,
    /// Overrides the page-inheritance rule for every pasted record
    pub page_names: Option<Vec<String>>,
}

/// Where new children of `target` actually go; `None` when no ancestor
/// can hold children
fn resolve_container<'a>(tree: &'a ElementTree, target: &'a Element) -> Option<&'a Element> {
    if target.element_type == ElementType::Section {
        if let Some(content) = target.children.first().and_then(|id| tree.get(id)) {
            return Some(content);
        }
    }
    if target.accepts_children() {
        return Some(target);
    }
    resolve_container(tree, tree.parent(&target.id)?)
}

fn shift_px(value: &str, by: i64) -> Option<String> {
    let number: f64 = value.trim().strip_suffix("px")?.trim().parse().ok()?;
    Some(format!("{}px", number + by as f64))
}

fn offset_root(element: &mut Element, by: i64) {
    let absolute = element
        .style
        .desktop
        .get("position")
        .map(|p| p == "absolute")
        .unwrap_or(false);
    if !absolute || by == 0 {
        return;
    }
    for breakpoint in [Breakpoint::Desktop, Breakpoint::Mobile] {
        let style = element.style.get_mut(breakpoint);
        for key in ["top", "left"] {
            if let Some(shifted) = style.get(key).and_then(|v| shift_px(v, by)) {
                style.insert(key.to_string(), shifted);
            }
        }
    }
}

/// Insert a clone set under `request.parent`
pub fn paste(
    store: &mut ElementStore,
    request: PasteRequest,
    ctx: &EditContext<'_>,
) -> Result<Vec<ElementId>, OperationError> {
    let PasteRequest {
        parent,
        set,
        page_names,
    } = request;
    if set.is_empty() {
        return Ok(Vec::new());
    }

    let tree = store.tree();
    let Some(target) = tree.get(&parent) else {
        return Err(ctx.reject("Paste", format!("The target element {} no longer exists", parent)));
    };
    let Some(container) = resolve_container(tree, target).map(|c| c.id.clone()) else {
        return Err(ctx.reject("Paste", format!("{} cannot contain other elements", parent)));
    };
    let body = store.body().id.clone();

    let mut elements = set.elements;
    let index: HashMap<ElementId, usize> = elements
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.clone(), i))
        .collect();

    let mut root_parent: HashMap<ElementId, ElementId> = HashMap::new();
    for (i, root_id) in set.roots.iter().enumerate() {
        let Some(&at) = index.get(root_id) else {
            return Err(CloneError::NotFound(root_id.clone()).into());
        };
        let parent_of_root = if elements[at].element_type == ElementType::Section {
            body.clone()
        } else {
            container.clone()
        };

        // 1. offset
        offset_root(&mut elements[at], ctx.config.paste_offset_px * (i as i64 + 1));

        // 2. page names, for the root and its whole subtree
        let pages = match &page_names {
            Some(pages) => pages.clone(),
            None => inherited_page_names(store.tree(), &parent_of_root, ctx.pages),
        };
        let mut stack = vec![at];
        while let Some(next) = stack.pop() {
            elements[next].page_names = pages.clone();
            stack.extend(elements[next].children.iter().filter_map(|c| index.get(c).copied()));
        }

        root_parent.insert(root_id.clone(), parent_of_root);
    }

    let previously_selected: Vec<ElementId> = store.get_selected().iter().map(|e| e.id.clone()).collect();
    let created: Vec<ElementId> = elements.iter().map(|e| e.id.clone()).collect();

    // 3. one create
    store.create(elements)?;

    // 4. one update: attach roots, clear the old selection
    let mut changes = ChangeSet::new();
    let attach = |changes: &mut ChangeSet, tree: &ElementTree| -> Result<(), StoreError> {
        for root in &set.roots {
            if let Some(target) = root_parent.get(root) {
                changes.edit(tree, target, |p| p.children.push(root.clone()))?;
            }
        }
        for id in &previously_selected {
            changes.edit(tree, id, |e| e.selected = false)?;
        }
        Ok(())
    };
    let result = attach(&mut changes, store.tree()).and_then(|_| store.update(changes.into_changes()));
    if let Err(error) = result {
        tracing::warn!(%error, "paste reparent failed, rolling back created elements");
        store.delete(&created)?;
        return Err(error.into());
    }

    tracing::debug!(roots = set.roots.len(), total = created.len(), parent = %container, "pasted elements");
    Ok(set.roots)
}

/// Selected elements that may be copied, moved or deleted
fn selected_addressable(tree: &ElementTree) -> Vec<ElementId> {
    let ids: Vec<ElementId> = tree
        .selected()
        .into_iter()
        .filter(|e| !e.is_body)
        .map(|e| addressable(tree, e).id.clone())
        .collect();
    remove_nested(tree, &ids)
}

/// Copy the selection into the clipboard; returns the number of roots
pub fn copy_selection(store: &mut ElementStore, clipboard: &mut Clipboard) -> Result<usize, OperationError> {
    let roots = selected_addressable(store.tree());
    if roots.is_empty() {
        return Ok(0);
    }
    let set = clone_from_store(store, &roots)?;
    let count = set.roots.len();
    clipboard.set(set);
    Ok(count)
}

/// Paste the clipboard into the first selected element (or the body)
pub fn paste_clipboard(
    store: &mut ElementStore,
    clipboard: &Clipboard,
    ctx: &EditContext<'_>,
) -> Result<Vec<ElementId>, OperationError> {
    let target = store
        .get_selected()
        .first()
        .map(|e| e.id.clone())
        .unwrap_or_else(|| store.body().id.clone());

    let Some(set) = clipboard.reclone(store)? else {
        return Ok(Vec::new());
    };
    paste(
        store,
        PasteRequest {
            parent: target,
            set,
            page_names: None,
        },
        ctx,
    )
}

/// Clone the selection next to itself
pub fn duplicate_selection(store: &mut ElementStore, ctx: &EditContext<'_>) -> Result<Vec<ElementId>, OperationError> {
    let roots = selected_addressable(store.tree());
    let Some(first) = roots.first() else {
        return Ok(Vec::new());
    };
    let parent = store
        .get_parent(first)
        .map(|p| p.id.clone())
        .unwrap_or_else(|| store.body().id.clone());

    let set = clone_from_store(store, &roots)?;
    paste(
        store,
        PasteRequest {
            parent,
            set,
            page_names: None,
        },
        ctx,
    )
}

fn default_element(id: ElementId, element_type: ElementType) -> Element {
    let element = Element::new(id, element_type);
    match element_type {
        ElementType::Section | ElementType::SectionContent => element,
        _ => element
            .with_style(Breakpoint::Desktop, "position", "absolute")
            .with_style(Breakpoint::Desktop, "top", "0px")
            .with_style(Breakpoint::Desktop, "left", "0px")
            .with_style(Breakpoint::Desktop, "width", "100px")
            .with_style(Breakpoint::Desktop, "height", "100px"),
    }
}

/// Create a default element of `element_type` under `parent` and select it
pub fn add_element(
    store: &mut ElementStore,
    element_type: ElementType,
    parent: &ElementId,
    ctx: &EditContext<'_>,
) -> Result<ElementId, OperationError> {
    if element_type == ElementType::SectionContent {
        return Err(ctx.reject("Add element", "Section contents are created with their section"));
    }
    let tree = store.tree();
    let Some(target) = tree.get(parent) else {
        return Err(ctx.reject("Add element", format!("The target element {} no longer exists", parent)));
    };
    let container = if element_type == ElementType::Section {
        store.body().id.clone()
    } else {
        match resolve_container(tree, target) {
            Some(container) => container.id.clone(),
            None => return Err(ctx.reject("Add element", format!("{} cannot contain other elements", parent))),
        }
    };
    let pages = inherited_page_names(tree, &container, ctx.pages);

    let id = store.new_id();
    let mut element = default_element(id.clone(), element_type);
    element.page_names = pages;
    element.selected = true;
    store.create(vec![element])?;

    let mut changes = ChangeSet::new();
    changes.edit(store.tree(), &container, |p| p.children.push(id.clone()))?;
    let others: Vec<ElementId> = store
        .get_selected()
        .iter()
        .filter(|e| e.id != id)
        .map(|e| e.id.clone())
        .collect();
    for other in &others {
        changes.edit(store.tree(), other, |e| e.selected = false)?;
    }
    store.update(changes.into_changes())?;
    Ok(id)
}

/// Delete `ids` and their descendants; returns how many records went away
pub fn remove_elements(
    store: &mut ElementStore,
    ids: &[ElementId],
    ctx: &EditContext<'_>,
) -> Result<usize, OperationError> {
    let tree = store.tree();
    let mut roots = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(element) = tree.get(id) else {
            return Err(ctx.reject("Delete", format!("The element {} no longer exists", id)));
        };
        let element = addressable(tree, element);
        if element.is_body {
            return Err(ctx.reject("Delete", "The body cannot be deleted"));
        }
        roots.push(element.id.clone());
    }
    let roots = remove_nested(tree, &roots);
    if roots.is_empty() {
        return Ok(0);
    }

    if ctx.config.confirm_delete {
        let message = format!("Delete {} element(s)?", roots.len());
        if !ctx.notifier.confirm("Delete elements", &message) {
            tracing::debug!("delete cancelled");
            return Ok(0);
        }
    }

    let mut doomed: Vec<ElementId> = Vec::new();
    for root in &roots {
        doomed.push(root.clone());
        doomed.extend(descendants(tree, root).into_iter().map(|e| e.id.clone()));
    }
    let count = doomed.len();
    store.delete(&doomed)?;
    Ok(count)
}

/// Delete the current selection
pub fn remove_selected(store: &mut ElementStore, ctx: &EditContext<'_>) -> Result<usize, OperationError> {
    let ids = selected_addressable(store.tree());
    remove_elements(store, &ids, ctx)
}

/// Reparent `ids` under `new_parent` at `index`, in one update
pub fn move_elements(
    store: &mut ElementStore,
    ids: &[ElementId],
    new_parent: &ElementId,
    index: usize,
    ctx: &EditContext<'_>,
) -> Result<(), OperationError> {
    let tree = store.tree();
    let Some(target) = tree.get(new_parent) else {
        return Err(ctx.reject("Move", format!("The target element {} no longer exists", new_parent)));
    };
    let Some(container) = resolve_container(tree, target).map(|c| c.id.clone()) else {
        return Err(ctx.reject("Move", format!("{} cannot contain other elements", new_parent)));
    };

    let mut moving = Vec::with_capacity(ids.len());
    for id in ids {
        let element = tree.require(id)?;
        let element = addressable(tree, element);
        if element.is_body {
            return Err(ctx.reject("Move", "The body cannot be moved"));
        }
        if element.element_type == ElementType::Section && !tree.get(&container).map(|c| c.is_body).unwrap_or(false) {
            return Err(ctx.reject("Move", "Sections can only be placed in the body"));
        }
        if element.id == container || is_ancestor(tree, &element.id, &container) {
            return Err(ctx.reject("Move", "An element cannot be moved into itself"));
        }
        moving.push(element.id.clone());
    }
    let moving = remove_nested(tree, &moving);
    let moving_set: HashSet<&ElementId> = moving.iter().collect();

    let mut changes = ChangeSet::new();
    for id in &moving {
        if let Some(old_parent) = tree.parent_id(id) {
            changes.edit(tree, old_parent, |p| p.children.retain(|c| c != id))?;
        }
    }
    changes.edit(tree, &container, |p| {
        p.children.retain(|c| !moving_set.contains(c));
        let at = index.min(p.children.len());
        for (offset, id) in moving.iter().enumerate() {
            p.children.insert(at + offset, id.clone());
        }
    })?;

    store.update(changes.into_changes())?;
    Ok(())
}

/// Apply `edit` to every element of `ids` in one update
pub fn edit_elements(
    store: &mut ElementStore,
    ids: &[ElementId],
    edit: impl Fn(&mut Element),
) -> Result<(), OperationError> {
    let mut changes = ChangeSet::new();
    for id in ids {
        changes.edit(store.tree(), id, &edit)?;
    }
    store.update(changes.into_changes())?;
    Ok(())
}

/// Set (or with `None`, remove) a style property at `breakpoint`
pub fn set_style(
    store: &mut ElementStore,
    ids: &[ElementId],
    breakpoint: Breakpoint,
    key: &str,
    value: Option<&str>,
) -> Result<(), OperationError> {
    edit_elements(store, ids, |e| {
        let style = e.style.get_mut(breakpoint);
        match value {
            Some(value) => {
                style.insert(key.to_string(), value.to_string());
            }
            None => {
                style.remove(key);
            }
        }
    })
}

pub fn set_visibility(
    store: &mut ElementStore,
    ids: &[ElementId],
    breakpoint: Breakpoint,
    visible: bool,
) -> Result<(), OperationError> {
    edit_elements(store, ids, |e| e.visibility.set(breakpoint, visible))
}

pub fn set_page_names(store: &mut ElementStore, ids: &[ElementId], pages: &[String]) -> Result<(), OperationError> {
    edit_elements(store, ids, |e| e.page_names = pages.to_vec())
}

pub fn set_link(store: &mut ElementStore, ids: &[ElementId], link: Option<Link>) -> Result<(), OperationError> {
    edit_elements(store, ids, |e| e.link = link.clone())
}

pub fn set_inner_html(store: &mut ElementStore, id: &ElementId, html: &str) -> Result<(), OperationError> {
    edit_elements(store, std::slice::from_ref(id), |e| e.inner_html = html.to_string())
}

pub fn set_class_list(store: &mut ElementStore, ids: &[ElementId], classes: &[String]) -> Result<(), OperationError> {
    edit_elements(store, ids, |e| {
        let mut seen = HashSet::new();
        e.class_list = classes.iter().filter(|c| seen.insert(*c)).cloned().collect();
    })
}
