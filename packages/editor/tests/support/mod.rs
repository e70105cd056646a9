//! Shared fakes for the integration tests

#![allow(dead_code)]

use pagecraft_editor::{
    Element, ElementChange, ElementId, ElementStore, ElementType, EventKind, Geometry, IdGenerator, Stage,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One call made on the stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageCall {
    Add(ElementId),
    Remove(ElementId),
    Move(ElementId, ElementId, usize),
    Metrics(Option<Vec<ElementId>>),
    Select(Vec<ElementId>),
    Clear,
}

/// In-memory surface recording every call made on it
#[derive(Default)]
pub struct RecordingStage {
    pub calls: Vec<StageCall>,
    parents: HashMap<ElementId, Option<ElementId>>,
    children: HashMap<ElementId, Vec<ElementId>>,
    selection: Vec<ElementId>,
    pub geometry: HashMap<ElementId, Geometry>,
}

impl RecordingStage {
    pub fn take_calls(&mut self) -> Vec<StageCall> {
        std::mem::take(&mut self.calls)
    }

    /// Simulate the user dragging `id` under `parent` at `index`
    pub fn drag_to(&mut self, id: &ElementId, parent: &ElementId, index: usize) {
        self.detach(id);
        self.parents.insert(id.clone(), Some(parent.clone()));
        let siblings = self.children.entry(parent.clone()).or_default();
        siblings.insert(index.min(siblings.len()), id.clone());
    }

    /// Simulate the stage losing a node behind the synchronizer's back
    pub fn forget(&mut self, id: &ElementId) {
        self.detach(id);
        self.parents.remove(id);
        self.children.remove(id);
    }

    fn detach(&mut self, id: &ElementId) {
        if let Some(Some(old)) = self.parents.get(id).cloned() {
            if let Some(siblings) = self.children.get_mut(&old) {
                siblings.retain(|c| c != id);
            }
        }
    }
}

impl Stage for RecordingStage {
    fn add_element(&mut self, element: &Element, parent: Option<&ElementId>, index: usize) {
        self.calls.push(StageCall::Add(element.id.clone()));
        self.parents.insert(element.id.clone(), parent.cloned());
        self.children.entry(element.id.clone()).or_default();
        if let Some(parent) = parent {
            let siblings = self.children.entry(parent.clone()).or_default();
            siblings.insert(index.min(siblings.len()), element.id.clone());
        }
    }

    fn remove_element(&mut self, id: &ElementId) {
        self.calls.push(StageCall::Remove(id.clone()));
        self.detach(id);
        self.parents.remove(id);
        self.children.remove(id);
    }

    fn move_element(&mut self, id: &ElementId, parent: &ElementId, index: usize) {
        self.calls.push(StageCall::Move(id.clone(), parent.clone(), index));
        self.drag_to(id, parent, index);
    }

    fn update_metrics(&mut self, elements: Option<&[Element]>) {
        let ids = elements.map(|elements| elements.iter().map(|e| e.id.clone()).collect());
        self.calls.push(StageCall::Metrics(ids));
    }

    fn set_selection(&mut self, ids: &[ElementId]) {
        self.calls.push(StageCall::Select(ids.to_vec()));
        self.selection = ids.to_vec();
    }

    fn selection(&self) -> Vec<ElementId> {
        self.selection.clone()
    }

    fn has_node(&self, id: &ElementId) -> bool {
        self.parents.contains_key(id)
    }

    fn node_parent(&self, id: &ElementId) -> Option<ElementId> {
        self.parents.get(id).cloned().flatten()
    }

    fn node_children(&self, id: &ElementId) -> Vec<ElementId> {
        self.children.get(id).cloned().unwrap_or_default()
    }

    fn geometry(&self, id: &ElementId) -> Option<Geometry> {
        if !self.has_node(id) {
            return None;
        }
        Some(self.geometry.get(id).copied().unwrap_or_default())
    }

    fn clear(&mut self) {
        self.calls.push(StageCall::Clear);
        self.parents.clear();
        self.children.clear();
        self.selection.clear();
    }
}

/// (kind, created, updated, deleted) per store event
pub type EventLog = Rc<RefCell<Vec<(EventKind, usize, usize, usize)>>>;

pub fn record_events(store: &mut ElementStore) -> EventLog {
    let log: EventLog = Rc::default();
    let sink = log.clone();
    store.subscribe(move |event, _| {
        sink.borrow_mut()
            .push((event.kind, event.created.len(), event.updated.len(), event.deleted.len()));
    });
    log
}

/// body → [containerA → [textX], containerB]
pub fn sample_store() -> ElementStore {
    let mut store = ElementStore::new(IdGenerator::from_seed("it", "seed"));
    let body = store.body().clone();
    store
        .create(vec![
            Element::new("textX", ElementType::Text).with_inner_html("hello"),
            Element::new("containerA", ElementType::Container).with_children(["textX"]),
            Element::new("containerB", ElementType::Container),
        ])
        .unwrap();
    store
        .update(vec![ElementChange::edit(&body, |b| {
            b.children = vec!["containerA".into(), "containerB".into()]
        })])
        .unwrap();
    store
}

pub fn ids(values: &[&str]) -> Vec<ElementId> {
    values.iter().map(|v| ElementId::from(*v)).collect()
}
