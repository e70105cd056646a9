//! # Element Store
//!
//! Normalized, id-keyed tree of element records. Single source of truth for
//! the document.
//!
//! ## Contract
//!
//! - `create`, `update`, `delete` and `load` take whole records (no partial
//!   patches) and are atomic: the batch is applied to a candidate tree, the
//!   candidate is validated, and only then swapped in. A rejected batch
//!   leaves the store untouched and notifies nobody.
//! - Every successful batch produces exactly one [`StoreEvent`].
//! - `delete` does not cascade: callers expand the descendant set first.
//!   Surviving parents are detached from deleted ids in the same batch.
//! - Creating a `section` also creates its `section-content` child when the
//!   batch does not already carry one.

use crate::config::EditorConfig;
use crate::element::{Element, ElementChange, ElementId, ElementType};
use crate::id_generator::IdGenerator;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Element not found: {0}")]
    NotFound(ElementId),

    #[error("Duplicate element id: {0}")]
    DuplicateId(ElementId),

    #[error("Element {parent} references missing child {child}")]
    DanglingChild { parent: ElementId, child: ElementId },

    #[error("Element {parent} lists child {child} more than once")]
    DuplicateChild { parent: ElementId, child: ElementId },

    #[error("Element {child} is a child of both {first} and {second}")]
    MultipleParents {
        child: ElementId,
        first: ElementId,
        second: ElementId,
    },

    #[error("Element {0} would become its own ancestor")]
    Cycle(ElementId),

    #[error("Body violation: {0}")]
    Body(String),

    #[error("Section pairing violation on {id}: {reason}")]
    SectionPairing { id: ElementId, reason: String },

    #[error("Change targets {from} but replaces it with {to}")]
    IdMismatch { from: ElementId, to: ElementId },

    #[error("Deleting {parent} would orphan descendant {child}")]
    OrphanedDescendant { parent: ElementId, child: ElementId },
}

/// What kind of batch produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
    Delete,
    /// Whole-store replacement (document open, undo/redo restore)
    Load,
}

/// Notification describing one applied batch
///
/// For `Load`, `deleted` carries the previous full state and `created` the
/// next one.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub kind: EventKind,
    pub created: Vec<Element>,
    pub updated: Vec<ElementChange>,
    pub deleted: Vec<Element>,
}

impl StoreEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Handle returned by [`ElementStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type StoreListener = Box<dyn FnMut(&StoreEvent, &ElementTree)>;

/// Read view of the element records
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
    parents: HashMap<ElementId, ElementId>,
}

impl ElementTree {
    /// Index a flat list of records; structure is not validated here
    pub fn from_elements(elements: Vec<Element>) -> Result<Self, StoreError> {
        let mut tree = Self::default();
        for element in elements {
            if tree.elements.contains_key(&element.id) {
                return Err(StoreError::DuplicateId(element.id));
            }
            tree.order.push(element.id.clone());
            tree.elements.insert(element.id.clone(), element);
        }
        tree.reindex();
        Ok(tree)
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn require(&self, id: &ElementId) -> Result<&Element, StoreError> {
        self.elements
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn to_vec(&self) -> Vec<Element> {
        self.iter().cloned().collect()
    }

    /// Position of `id` in insertion order
    pub fn position(&self, id: &ElementId) -> Option<usize> {
        self.order.iter().position(|other| other == id)
    }

    pub fn children(&self, id: &ElementId) -> Result<Vec<&Element>, StoreError> {
        let element = self.require(id)?;
        element
            .children
            .iter()
            .map(|child| self.require(child))
            .collect()
    }

    pub fn parent(&self, id: &ElementId) -> Option<&Element> {
        self.parents.get(id).and_then(|parent| self.elements.get(parent))
    }

    pub fn parent_id(&self, id: &ElementId) -> Option<&ElementId> {
        self.parents.get(id)
    }

    pub fn body(&self) -> Option<&Element> {
        self.iter().find(|element| element.is_body)
    }

    pub fn selected(&self) -> Vec<&Element> {
        self.iter().filter(|element| element.selected).collect()
    }

    /// Collect every invariant violation, in a stable order
    pub fn check(&self) -> Vec<StoreError> {
        let mut errors = Vec::new();

        let bodies: Vec<&Element> = self.iter().filter(|e| e.is_body).collect();
        match bodies.len() {
            0 => errors.push(StoreError::Body("document has no body".to_string())),
            1 => {}
            n => errors.push(StoreError::Body(format!("document has {} bodies", n))),
        }

        let mut seen_parent: HashMap<&ElementId, &ElementId> = HashMap::new();
        for element in self.iter() {
            let mut local = HashSet::new();
            for child in &element.children {
                if !local.insert(child) {
                    errors.push(StoreError::DuplicateChild {
                        parent: element.id.clone(),
                        child: child.clone(),
                    });
                    continue;
                }
                match self.elements.get(child) {
                    None => errors.push(StoreError::DanglingChild {
                        parent: element.id.clone(),
                        child: child.clone(),
                    }),
                    Some(c) if c.is_body => {
                        errors.push(StoreError::Body(format!("body is listed as a child of {}", element.id)))
                    }
                    Some(_) => {}
                }
                if let Some(first) = seen_parent.insert(child, &element.id) {
                    errors.push(StoreError::MultipleParents {
                        child: child.clone(),
                        first: first.clone(),
                        second: element.id.clone(),
                    });
                }
            }
        }

        // With at most one parent each, anything unreachable from a
        // parentless element sits on a cycle.
        let mut reachable: HashSet<&ElementId> = HashSet::new();
        let mut stack: Vec<&ElementId> = self
            .order
            .iter()
            .filter(|id| !seen_parent.contains_key(id))
            .collect();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(element) = self.elements.get(id) {
                stack.extend(element.children.iter().filter(|c| self.elements.contains_key(*c)));
            }
        }
        for id in &self.order {
            if !reachable.contains(id) {
                errors.push(StoreError::Cycle(id.clone()));
            }
        }

        for element in self.iter() {
            if element.element_type == ElementType::Section {
                let paired = element
                    .children
                    .first()
                    .and_then(|first| self.elements.get(first))
                    .map(|first| first.is_section_content)
                    .unwrap_or(false);
                if !paired {
                    errors.push(StoreError::SectionPairing {
                        id: element.id.clone(),
                        reason: "first child is not a section-content".to_string(),
                    });
                }
            }
            if element.is_section_content {
                let owner = seen_parent
                    .get(&element.id)
                    .and_then(|parent| self.elements.get(*parent));
                let owned = owner
                    .map(|section| {
                        section.element_type == ElementType::Section
                            && section.children.first() == Some(&element.id)
                    })
                    .unwrap_or(false);
                if !owned {
                    errors.push(StoreError::SectionPairing {
                        id: element.id.clone(),
                        reason: "section-content is not the first child of a section".to_string(),
                    });
                }
            }
        }

        errors
    }

    /// First invariant violation, if any
    pub fn validate(&self) -> Result<(), StoreError> {
        match self.check().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Elements no parent lists, apart from the body
    pub fn floating(&self) -> Vec<&Element> {
        self.iter()
            .filter(|element| !element.is_body && !self.parents.contains_key(&element.id))
            .collect()
    }

    fn insert(&mut self, element: Element) {
        if !self.elements.contains_key(&element.id) {
            self.order.push(element.id.clone());
        }
        self.elements.insert(element.id.clone(), element);
    }

    fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let removed = self.elements.remove(id)?;
        self.order.retain(|other| other != id);
        Some(removed)
    }

    fn reindex(&mut self) {
        self.parents.clear();
        for id in &self.order {
            if let Some(element) = self.elements.get(id) {
                for child in &element.children {
                    self.parents.entry(child.clone()).or_insert_with(|| id.clone());
                }
            }
        }
    }
}

/// The element store
pub struct ElementStore {
    tree: ElementTree,
    ids: IdGenerator,
    listeners: Vec<(SubscriptionId, StoreListener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ElementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStore")
            .field("tree", &self.tree)
            .field("ids", &self.ids)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ElementStore {
    /// Create a store holding only a fresh body
    pub fn new(mut ids: IdGenerator) -> Self {
        let body = Element::body(ids.next_id(|_| false));
        let mut tree = ElementTree::default();
        tree.insert(body);
        Self {
            tree,
            ids,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Fresh store whose ids use the configured prefix
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(IdGenerator::new(config.id_prefix.clone()))
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn id_generator(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Read the tree while allocating ids
    pub fn parts_mut(&mut self) -> (&ElementTree, &mut IdGenerator) {
        (&self.tree, &mut self.ids)
    }

    /// Allocate an id unused by the current element set
    pub fn new_id(&mut self) -> ElementId {
        let tree = &self.tree;
        self.ids.next_id(|id| tree.contains(id))
    }

    pub fn get_all(&self) -> Vec<&Element> {
        self.tree.iter().collect()
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.tree.get(id)
    }

    pub fn get_children(&self, id: &ElementId) -> Result<Vec<&Element>, StoreError> {
        self.tree.children(id)
    }

    pub fn get_parent(&self, id: &ElementId) -> Option<&Element> {
        self.tree.parent(id)
    }

    pub fn get_selected(&self) -> Vec<&Element> {
        self.tree.selected()
    }

    pub fn body(&self) -> &Element {
        // Every constructor and `load` guarantee exactly one body.
        self.tree
            .body()
            .unwrap_or_else(|| unreachable!("element store without a body"))
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent, &ElementTree) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    /// Insert new records
    pub fn create(&mut self, elements: Vec<Element>) -> Result<(), StoreError> {
        if elements.is_empty() {
            return Ok(());
        }

        let mut batch_ids = HashSet::new();
        for element in &elements {
            if element.is_body {
                return Err(StoreError::Body("cannot create a second body".to_string()));
            }
            if self.tree.contains(&element.id) || !batch_ids.insert(element.id.clone()) {
                return Err(StoreError::DuplicateId(element.id.clone()));
            }
        }

        let elements = self.pair_sections(elements, &mut batch_ids);

        let mut candidate = self.tree.clone();
        for element in &elements {
            candidate.insert(element.clone());
        }
        candidate.reindex();

        let mut event = StoreEvent::new(EventKind::Create);
        normalize_selection(&mut candidate, &self.tree, &mut event.updated);
        candidate.validate()?;

        event.created = elements;
        self.commit(candidate, event);
        Ok(())
    }

    /// Replace records with their `to` snapshots
    pub fn update(&mut self, changes: Vec<ElementChange>) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut touched = HashSet::new();
        let mut candidate = self.tree.clone();
        let mut applied = Vec::with_capacity(changes.len());
        for change in changes {
            if change.from.id != change.to.id {
                return Err(StoreError::IdMismatch {
                    from: change.from.id,
                    to: change.to.id,
                });
            }
            if !touched.insert(change.to.id.clone()) {
                return Err(StoreError::DuplicateId(change.to.id));
            }
            let current = self.tree.require(&change.to.id)?;
            if current.is_body != change.to.is_body {
                return Err(StoreError::Body(format!(
                    "cannot change the body flag of {}",
                    change.to.id
                )));
            }
            applied.push(ElementChange::new(current.clone(), change.to.clone()));
            candidate.insert(change.to);
        }
        candidate.reindex();

        normalize_selection(&mut candidate, &self.tree, &mut applied);
        candidate.validate()?;

        let mut event = StoreEvent::new(EventKind::Update);
        event.updated = applied;
        self.commit(candidate, event);
        Ok(())
    }

    /// Remove records; the id set must already include all descendants
    pub fn delete(&mut self, ids: &[ElementId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let doomed: HashSet<&ElementId> = ids.iter().collect();
        for id in &doomed {
            let element = self.tree.require(id)?;
            if element.is_body {
                return Err(StoreError::Body("the body cannot be deleted".to_string()));
            }
            if let Some(child) = element.children.iter().find(|c| !doomed.contains(c)) {
                return Err(StoreError::OrphanedDescendant {
                    parent: element.id.clone(),
                    child: child.clone(),
                });
            }
            if element.is_section_content {
                let owner_doomed = self
                    .tree
                    .parent_id(&element.id)
                    .map(|parent| doomed.contains(parent))
                    .unwrap_or(false);
                if !owner_doomed {
                    return Err(StoreError::SectionPairing {
                        id: element.id.clone(),
                        reason: "section-content cannot be deleted without its section".to_string(),
                    });
                }
            }
        }

        let mut candidate = self.tree.clone();
        let mut event = StoreEvent::new(EventKind::Delete);
        for id in ids {
            if let Some(removed) = candidate.remove(id) {
                event.deleted.push(removed);
            }
        }

        let survivors: Vec<Element> = candidate
            .iter()
            .filter(|element| element.children.iter().any(|c| doomed.contains(c)))
            .cloned()
            .collect();
        for parent in survivors {
            let change = ElementChange::edit(&parent, |p| p.children.retain(|c| !doomed.contains(c)));
            candidate.insert(change.to.clone());
            event.updated.push(change);
        }
        candidate.reindex();
        candidate.validate()?;

        self.commit(candidate, event);
        Ok(())
    }

    /// Replace the whole store with `elements`
    pub fn load(&mut self, elements: Vec<Element>) -> Result<(), StoreError> {
        let mut candidate = ElementTree::from_elements(elements)?;
        let mut ignored = Vec::new();
        normalize_selection(&mut candidate, &ElementTree::default(), &mut ignored);
        candidate.validate()?;

        let mut event = StoreEvent::new(EventKind::Load);
        event.deleted = self.tree.to_vec();
        event.created = candidate.to_vec();
        self.commit(candidate, event);
        Ok(())
    }

    fn pair_sections(&mut self, elements: Vec<Element>, batch_ids: &mut HashSet<ElementId>) -> Vec<Element> {
        let contents: HashSet<ElementId> = elements
            .iter()
            .filter(|e| e.is_section_content)
            .map(|e| e.id.clone())
            .collect();

        let mut out = Vec::with_capacity(elements.len());
        for mut element in elements {
            let paired = element.element_type != ElementType::Section
                || element
                    .children
                    .first()
                    .map(|first| contents.contains(first))
                    .unwrap_or(false);
            if paired {
                out.push(element);
                continue;
            }

            let tree = &self.tree;
            let taken = &*batch_ids;
            let content_id = self.ids.next_id(|id| tree.contains(id) || taken.contains(id));
            batch_ids.insert(content_id.clone());

            let mut content = Element::section_content(content_id.clone());
            content.page_names = element.page_names.clone();
            element.children.insert(0, content_id);
            tracing::debug!(section = %element.id, content = %content.id, "paired section with content");
            out.push(element);
            out.push(content);
        }
        out
    }

    fn commit(&mut self, candidate: ElementTree, event: StoreEvent) {
        self.tree = candidate;
        let tree = &self.tree;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, tree);
        }
    }
}

/// Deselect the body when anything else is selected
fn normalize_selection(candidate: &mut ElementTree, previous: &ElementTree, changes: &mut Vec<ElementChange>) {
    let others_selected = candidate.iter().any(|e| e.selected && !e.is_body);
    let Some(body) = candidate.body().filter(|b| b.selected).cloned() else {
        return;
    };
    if !others_selected {
        return;
    }

    let mut deselected = body.clone();
    deselected.selected = false;
    candidate.insert(deselected.clone());

    if let Some(existing) = changes.iter_mut().find(|c| c.to.id == body.id) {
        existing.to.selected = false;
    } else {
        let from = previous.get(&body.id).cloned().unwrap_or(body);
        changes.push(ElementChange::new(from, deselected));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> ElementStore {
        ElementStore::new(IdGenerator::from_seed("t", "s"))
    }

    fn attach(store: &mut ElementStore, parent: &ElementId, child: &ElementId) {
        let parent = store.get(parent).unwrap().clone();
        let change = ElementChange::edit(&parent, |p| p.children.push(child.clone()));
        store.update(vec![change]).unwrap();
    }

    #[test]
    fn test_from_config_uses_prefix() {
        let config = EditorConfig {
            id_prefix: "site".to_string(),
            ..EditorConfig::default()
        };
        let store = ElementStore::from_config(&config);
        assert!(store.body().id.as_str().starts_with("site-"));
    }

    #[test]
    fn test_new_store_has_body() {
        let store = store();
        assert_eq!(store.get_all().len(), 1);
        assert!(store.body().is_body);
        assert!(store.get_parent(&store.body().id).is_none());
    }

    #[test]
    fn test_create_then_attach() {
        let mut store = store();
        let body_id = store.body().id.clone();

        store
            .create(vec![Element::new("a", ElementType::Container)])
            .unwrap();
        attach(&mut store, &body_id, &ElementId::from("a"));

        let children = store.get_children(&body_id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(store.get_parent(&"a".into()).unwrap().id, body_id);
    }

    #[test]
    fn test_create_rejects_dangling_child() {
        let mut store = store();
        let bad = Element::new("a", ElementType::Container).with_children(["missing"]);

        let err = store.create(vec![bad]).unwrap_err();
        assert!(matches!(err, StoreError::DanglingChild { .. }));
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let mut store = store();
        let err = store
            .create(vec![
                Element::new("a", ElementType::Text),
                Element::new("a", ElementType::Text),
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId("a".into()));
    }

    #[test]
    fn test_create_section_pairs_content() {
        let mut store = store();
        store
            .create(vec![Element::new("s", ElementType::Section)])
            .unwrap();

        let section = store.get(&"s".into()).unwrap();
        assert_eq!(section.children.len(), 1);
        let content = store.get(&section.children[0]).unwrap();
        assert!(content.is_section_content);
        assert!(content.has_class(crate::element::PREVENT_DRAGGABLE_CLASS));
        assert!(content.has_class(crate::element::WIDTH_LOCKED_CLASS));
    }

    #[test]
    fn test_update_rejects_cycle() {
        let mut store = store();
        store
            .create(vec![
                Element::new("b", ElementType::Container),
                Element::new("a", ElementType::Container).with_children(["b"]),
            ])
            .unwrap();

        let b = store.get(&"b".into()).unwrap().clone();
        let err = store
            .update(vec![ElementChange::edit(&b, |b| b.children.push("a".into()))])
            .unwrap_err();
        assert!(matches!(err, StoreError::Cycle(_)));
        assert!(store.get(&"b".into()).unwrap().children.is_empty());
    }

    #[test]
    fn test_update_rejects_second_parent() {
        let mut store = store();
        store
            .create(vec![
                Element::new("c", ElementType::Text),
                Element::new("a", ElementType::Container).with_children(["c"]),
                Element::new("b", ElementType::Container),
            ])
            .unwrap();

        let b = store.get(&"b".into()).unwrap().clone();
        let err = store
            .update(vec![ElementChange::edit(&b, |b| b.children.push("c".into()))])
            .unwrap_err();
        assert!(matches!(err, StoreError::MultipleParents { .. }));
    }

    #[test]
    fn test_update_reports_stored_from() {
        let mut store = store();
        store.create(vec![Element::new("a", ElementType::Text)]).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));

        let stale = Element::new("a", ElementType::Text).with_inner_html("stale");
        let to = Element::new("a", ElementType::Text).with_inner_html("new");
        store.update(vec![ElementChange::new(stale, to)]).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Update);
        assert_eq!(events[0].updated[0].from.inner_html, "");
        assert_eq!(events[0].updated[0].to.inner_html, "new");
    }

    #[test]
    fn test_selection_deselects_body() {
        let mut store = store();
        let body = store.body().clone();
        store
            .update(vec![ElementChange::edit(&body, |b| b.selected = true)])
            .unwrap();
        assert!(store.body().selected);

        let mut a = Element::new("a", ElementType::Text);
        a.selected = true;
        store.create(vec![a]).unwrap();

        assert!(!store.body().selected);
        assert_eq!(store.get_selected().len(), 1);
    }

    #[test]
    fn test_delete_requires_descendants() {
        let mut store = store();
        store
            .create(vec![
                Element::new("t", ElementType::Text),
                Element::new("a", ElementType::Container).with_children(["t"]),
            ])
            .unwrap();

        let err = store.delete(&["a".into()]).unwrap_err();
        assert!(matches!(err, StoreError::OrphanedDescendant { .. }));

        store.delete(&["a".into(), "t".into()]).unwrap();
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_delete_detaches_from_parent_in_one_event() {
        let mut store = store();
        let body_id = store.body().id.clone();
        store.create(vec![Element::new("a", ElementType::Text)]).unwrap();
        attach(&mut store, &body_id, &"a".into());

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));

        store.delete(&["a".into()]).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].deleted.len(), 1);
        assert_eq!(events[0].updated.len(), 1);
        assert!(store.body().children.is_empty());
    }

    #[test]
    fn test_delete_rejects_body_and_lone_section_content() {
        let mut store = store();
        let body_id = store.body().id.clone();
        assert!(matches!(store.delete(&[body_id]), Err(StoreError::Body(_))));

        store.create(vec![Element::new("s", ElementType::Section)]).unwrap();
        let content = store.get(&"s".into()).unwrap().children[0].clone();
        let err = store.delete(&[content]).unwrap_err();
        assert!(matches!(err, StoreError::SectionPairing { .. }));
    }

    #[test]
    fn test_load_requires_single_body() {
        let mut store = store();
        let err = store
            .load(vec![Element::new("a", ElementType::Container)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Body(_)));

        store
            .load(vec![
                Element::body("b").with_children(["x"]),
                Element::new("x", ElementType::Text),
            ])
            .unwrap();
        assert_eq!(store.body().id.as_str(), "b");
        assert_eq!(store.get_all().len(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = store();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let sub = store.subscribe(move |_, _| *sink.borrow_mut() += 1);

        store.create(vec![Element::new("a", ElementType::Text)]).unwrap();
        assert!(store.unsubscribe(sub));
        store.create(vec![Element::new("b", ElementType::Text)]).unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_floating_elements() {
        let mut store = store();
        store.create(vec![Element::new("a", ElementType::Text)]).unwrap();
        let floating: Vec<&str> = store.tree().floating().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(floating, vec!["a"]);
    }
}
