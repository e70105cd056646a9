//! # Stage Synchronizer
//!
//! Keeps the stage consistent with the element store in both directions.
//!
//! ## Store → stage
//!
//! Subscribed to the store. Created elements attached under a visible
//! parent get nodes; deleted ones lose them; updates are diffed (selection,
//! visibility on the current page/breakpoint, tag/type, style, children
//! order) into the smallest stage operation. A `Load` rebuilds everything.
//!
//! ## Stage → store
//!
//! [`StageSynchronizer::handle_surface_event`] turns post-interaction
//! geometry into style updates, reparenting into one `children` rewrite per
//! affected parent, and surface selection into selection flags.
//!
//! ## Suspension
//!
//! Two counters, one per direction. Store writes caused by the surface run
//! with store → stage suspended, so the synchronizer never replays its own
//! change onto a node being dragged. Full resets run with stage → store
//! suspended. Drag and resize hold store → stage suspended from start to
//! drop.
//!
//! Drift (a node the store implies is missing) is logged and repaired with a
//! full reset; it is never reported as a failure.

use crate::element::{Breakpoint, Element, ElementChange, ElementId};
use crate::errors::EditorError;
use crate::operations::ChangeSet;
use crate::selection::{ancestors, depth, select_only};
use crate::snapshot::DocumentSerializer;
use crate::stage::{Geometry, Stage, StageContext, SurfaceEvent};
use crate::store::{ElementStore, ElementTree, EventKind, StoreError, StoreEvent, SubscriptionId};
use crate::undo_stack::UndoManager;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    StoreToStage,
    StageToStore,
}

/// Suspension counters shared by the synchronizer and its guards
#[derive(Debug, Default)]
pub struct Suspension {
    store_to_stage: Cell<u32>,
    stage_to_store: Cell<u32>,
}

impl Suspension {
    fn counter(&self, direction: Direction) -> &Cell<u32> {
        match direction {
            Direction::StoreToStage => &self.store_to_stage,
            Direction::StageToStore => &self.stage_to_store,
        }
    }

    pub fn stop(&self, direction: Direction) {
        let counter = self.counter(direction);
        counter.set(counter.get() + 1);
    }

    pub fn start(&self, direction: Direction) {
        let counter = self.counter(direction);
        counter.set(counter.get().saturating_sub(1));
    }

    pub fn is_suspended(&self, direction: Direction) -> bool {
        self.counter(direction).get() > 0
    }
}

/// Resumes its direction when dropped
#[must_use = "the direction resumes as soon as the guard is dropped"]
pub struct SuspendGuard {
    suspension: Rc<Suspension>,
    direction: Direction,
}

impl SuspendGuard {
    fn new(suspension: Rc<Suspension>, direction: Direction) -> Self {
        suspension.stop(direction);
        Self { suspension, direction }
    }
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.suspension.start(self.direction);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Drag,
    Resize,
}

/// A node the store implies is missing from the stage
#[derive(Debug)]
struct Drift(ElementId);

struct Shared<S> {
    stage: RefCell<S>,
    context: RefCell<StageContext>,
    suspension: Rc<Suspension>,
}

/// Whether `id` belongs on the stage in `ctx`: attached to the body and
/// shown together with all its ancestors
fn on_stage(tree: &ElementTree, ctx: &StageContext, id: &ElementId) -> bool {
    let Some(element) = tree.get(id) else {
        return false;
    };
    if element.is_body {
        return true;
    }
    if !ctx.shows(element) {
        return false;
    }
    let chain = ancestors(tree, id);
    chain.last().map(|root| root.is_body).unwrap_or(false) && chain.iter().all(|a| a.is_body || ctx.shows(a))
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Rebuild `store_children` so on-stage children follow surface order while
/// children absent from the stage keep their slots
fn merge_children<S: Stage>(stage: &S, store_children: &[ElementId], surface: Vec<ElementId>) -> Vec<ElementId> {
    let mut surface = surface.into_iter();
    let mut out = Vec::with_capacity(store_children.len());
    for child in store_children {
        if stage.has_node(child) {
            out.extend(surface.next());
        } else {
            out.push(child.clone());
        }
    }
    out.extend(surface);
    out
}

impl<S: Stage> Shared<S> {
    fn on_store_event(&self, event: &StoreEvent, tree: &ElementTree) {
        if self.suspension.is_suspended(Direction::StoreToStage) {
            tracing::trace!(kind = ?event.kind, "store event not projected, stage observer stopped");
            return;
        }

        let result = match event.kind {
            EventKind::Load => {
                self.full_reset(tree);
                Ok(())
            }
            EventKind::Create => self.project_created(&event.created, tree),
            EventKind::Update => self.project_updated(&event.updated, tree),
            EventKind::Delete => {
                self.project_deleted(&event.deleted, tree);
                Ok(())
            }
        };

        if let Err(Drift(id)) = result {
            tracing::warn!(element = %id, "stage drifted from store, resetting");
            self.full_reset(tree);
        }
    }

    fn full_reset(&self, tree: &ElementTree) {
        let _guard = SuspendGuard::new(self.suspension.clone(), Direction::StageToStore);
        let ctx = self.context.borrow();
        let mut stage = self.stage.borrow_mut();

        stage.clear();
        if let Some(body) = tree.body() {
            if let Err(Drift(id)) = Self::add_subtree(&mut stage, tree, &ctx, &body.id) {
                tracing::warn!(element = %id, "missing node during full reset");
            }
        }
        Self::sync_selection(&mut stage, tree);
        stage.update_metrics(None);
        tracing::debug!(page = ?ctx.page, breakpoint = ?ctx.breakpoint, "stage reset");
    }

    /// Add `id` and its shown descendants; the parent node must exist
    fn add_subtree(stage: &mut S, tree: &ElementTree, ctx: &StageContext, id: &ElementId) -> Result<(), Drift> {
        let element = tree.get(id).ok_or_else(|| Drift(id.clone()))?;
        let parent = tree.parent_id(id);

        let index = match parent {
            Some(parent_id) => {
                if !stage.has_node(parent_id) {
                    return Err(Drift(parent_id.clone()));
                }
                tree.get(parent_id)
                    .map(|p| {
                        p.children
                            .iter()
                            .take_while(|c| *c != id)
                            .filter(|c| stage.has_node(c))
                            .count()
                    })
                    .unwrap_or(0)
            }
            None => 0,
        };
        stage.add_element(element, parent, index);

        for child in &element.children {
            if tree.get(child).map(|c| ctx.shows(c)).unwrap_or(false) {
                Self::add_subtree(stage, tree, ctx, child)?;
            }
        }
        Ok(())
    }

    /// Remove the node of `id` and every node below it on the stage
    fn remove_subtree(stage: &mut S, id: &ElementId) {
        for child in stage.node_children(id) {
            Self::remove_subtree(stage, &child);
        }
        stage.remove_element(id);
    }

    fn sync_selection(stage: &mut S, tree: &ElementTree) {
        let selected: Vec<ElementId> = tree
            .selected()
            .into_iter()
            .filter(|e| stage.has_node(&e.id))
            .map(|e| e.id.clone())
            .collect();
        stage.set_selection(&selected);
    }

    fn project_created(&self, created: &[Element], tree: &ElementTree) -> Result<(), Drift> {
        let ctx = self.context.borrow();
        let mut stage = self.stage.borrow_mut();
        let batch: HashSet<&ElementId> = created.iter().map(|e| &e.id).collect();

        for element in created {
            // floating elements appear once a parent adopts them
            let Some(parent) = tree.parent_id(&element.id) else {
                continue;
            };
            if batch.contains(parent) || stage.has_node(&element.id) {
                continue;
            }
            if on_stage(tree, &ctx, &element.id) {
                Self::add_subtree(&mut stage, tree, &ctx, &element.id)?;
            }
        }

        if created.iter().any(|e| e.selected) {
            Self::sync_selection(&mut stage, tree);
        }
        Ok(())
    }

    fn project_updated(&self, changes: &[ElementChange], tree: &ElementTree) -> Result<(), Drift> {
        let ctx = self.context.borrow();
        let mut stage = self.stage.borrow_mut();
        let breakpoint: Breakpoint = ctx.breakpoint;

        let mut to_add: Vec<ElementId> = Vec::new();
        let mut reorder: Vec<&ElementChange> = Vec::new();
        let mut restyled: Vec<Element> = Vec::new();
        let mut selection_changed = false;

        for change in changes {
            let id = change.id();
            let visible = on_stage(tree, &ctx, id);
            let present = stage.has_node(id);
            selection_changed |= change.from.selected != change.to.selected;

            match (visible, present) {
                (true, false) => to_add.push(id.clone()),
                (false, true) => Self::remove_subtree(&mut stage, id),
                (true, true) => {
                    let retagged = change.from.tag_name != change.to.tag_name
                        || change.from.element_type != change.to.element_type;
                    if retagged {
                        Self::remove_subtree(&mut stage, id);
                        to_add.push(id.clone());
                    } else if change.from.style.get(breakpoint) != change.to.style.get(breakpoint) {
                        restyled.push(change.to.clone());
                    }
                }
                (false, false) => {}
            }

            if change.from.children != change.to.children {
                // children dropped from the list and now attached nowhere
                for old in change.from.children.iter().filter(|c| !change.to.children.contains(c)) {
                    if stage.has_node(old) && !on_stage(tree, &ctx, old) {
                        Self::remove_subtree(&mut stage, old);
                    }
                }
                if visible {
                    reorder.push(change);
                }
            }
        }

        to_add.sort_by_cached_key(|id| depth(tree, id));
        for id in &to_add {
            if !stage.has_node(id) {
                Self::add_subtree(&mut stage, tree, &ctx, id)?;
            }
        }

        let mut added = !to_add.is_empty();
        for change in reorder {
            let parent = change.id();
            let mut index = 0;
            for child in &change.to.children {
                if !on_stage(tree, &ctx, child) {
                    continue;
                }
                if !stage.has_node(child) {
                    Self::add_subtree(&mut stage, tree, &ctx, child)?;
                    added = true;
                } else if stage.node_parent(child).as_ref() != Some(parent)
                    || stage.node_children(parent).get(index) != Some(child)
                {
                    stage.move_element(child, parent, index);
                }
                index += 1;
            }
        }

        if !restyled.is_empty() {
            stage.update_metrics(Some(&restyled));
        }
        if selection_changed || added {
            Self::sync_selection(&mut stage, tree);
        }
        Ok(())
    }

    fn project_deleted(&self, deleted: &[Element], tree: &ElementTree) {
        let mut stage = self.stage.borrow_mut();
        for element in deleted {
            if stage.has_node(&element.id) {
                Self::remove_subtree(&mut stage, &element.id);
            }
        }
        if deleted.iter().any(|e| e.selected) {
            Self::sync_selection(&mut stage, tree);
        }
    }
}

/// Bidirectional adapter between an [`ElementStore`] and a [`Stage`]
pub struct StageSynchronizer<S: Stage + 'static> {
    shared: Rc<Shared<S>>,
    interaction: Cell<Option<Interaction>>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl<S: Stage + 'static> StageSynchronizer<S> {
    pub fn new(stage: S, context: StageContext) -> Self {
        Self {
            shared: Rc::new(Shared {
                stage: RefCell::new(stage),
                context: RefCell::new(context),
                suspension: Rc::new(Suspension::default()),
            }),
            interaction: Cell::new(None),
            subscription: Cell::new(None),
        }
    }

    /// Subscribe to `store` and build the stage from it
    pub fn attach(&self, store: &mut ElementStore) {
        if let Some(previous) = self.subscription.take() {
            store.unsubscribe(previous);
        }
        let shared = self.shared.clone();
        let id = store.subscribe(move |event, tree| shared.on_store_event(event, tree));
        self.subscription.set(Some(id));
        self.shared.full_reset(store.tree());
    }

    pub fn detach(&self, store: &mut ElementStore) -> bool {
        match self.subscription.take() {
            Some(id) => store.unsubscribe(id),
            None => false,
        }
    }

    pub fn stage(&self) -> Ref<'_, S> {
        self.shared.stage.borrow()
    }

    pub fn stage_mut(&self) -> RefMut<'_, S> {
        self.shared.stage.borrow_mut()
    }

    pub fn context(&self) -> StageContext {
        self.shared.context.borrow().clone()
    }

    /// Stop projecting store changes onto the stage
    pub fn stop_stage_observer(&self) {
        self.shared.suspension.stop(Direction::StoreToStage);
    }

    pub fn start_stage_observer(&self) {
        self.shared.suspension.start(Direction::StoreToStage);
    }

    /// Suspend `direction` until the guard drops
    pub fn suspend(&self, direction: Direction) -> SuspendGuard {
        SuspendGuard::new(self.shared.suspension.clone(), direction)
    }

    pub fn is_suspended(&self, direction: Direction) -> bool {
        self.shared.suspension.is_suspended(direction)
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction.get().is_some()
    }

    /// Recompute every node from the store
    pub fn reset_stage(&self, tree: &ElementTree) {
        self.shared.full_reset(tree);
    }

    pub fn on_page_change(&self, tree: &ElementTree, page: Option<String>) {
        self.shared.context.borrow_mut().page = page;
        self.shared.full_reset(tree);
    }

    pub fn on_breakpoint_change(&self, tree: &ElementTree, breakpoint: Breakpoint) {
        self.shared.context.borrow_mut().breakpoint = breakpoint;
        self.shared.full_reset(tree);
    }

    /// Commit a checkpoint with store → stage suspended for the capture
    pub async fn capture_checkpoint<D: DocumentSerializer>(&self, undo: &UndoManager<D>) -> Result<bool, EditorError> {
        let _guard = self.suspend(Direction::StoreToStage);
        undo.commit_checkpoint().await
    }

    fn begin_interaction(&self, interaction: Interaction) {
        if self.interaction.get().is_none() {
            self.shared.suspension.stop(Direction::StoreToStage);
        }
        self.interaction.set(Some(interaction));
        tracing::debug!(?interaction, "surface interaction started");
    }

    fn end_interaction(&self) {
        if let Some(interaction) = self.interaction.take() {
            self.shared.suspension.start(Direction::StoreToStage);
            tracing::debug!(?interaction, "surface interaction ended");
        }
    }

    /// Translate a surface interaction into store writes
    pub fn handle_surface_event(&self, store: &mut ElementStore, event: SurfaceEvent) -> Result<(), EditorError> {
        if self.is_suspended(Direction::StageToStore) {
            tracing::debug!(?event, "surface event ignored during stage reset");
            return Ok(());
        }

        if let Some(missing) = event.ids().iter().find(|id| store.get(id).is_none()) {
            tracing::warn!(element = %missing, "surface event for an element missing from the store, resetting stage");
            self.end_interaction();
            self.shared.full_reset(store.tree());
            return Ok(());
        }

        match event {
            SurfaceEvent::StartDrag(_) => self.begin_interaction(Interaction::Drag),
            SurfaceEvent::StartResize(_) => self.begin_interaction(Interaction::Resize),
            SurfaceEvent::Change(ids) => {
                let _guard = self.suspend(Direction::StoreToStage);
                self.write_changes(store, &ids, false)?;
            }
            SurfaceEvent::Drop(ids) => {
                let result = {
                    let _guard = self.suspend(Direction::StoreToStage);
                    self.write_changes(store, &ids, true)
                };
                self.end_interaction();
                result?;
            }
            SurfaceEvent::ResizeEnd(ids) => {
                let result = {
                    let _guard = self.suspend(Direction::StoreToStage);
                    self.write_changes(store, &ids, false)
                };
                self.end_interaction();
                result?;
            }
            SurfaceEvent::Select(ids) => {
                let _guard = self.suspend(Direction::StoreToStage);
                let changes = select_only(store.tree(), &ids)?;
                if !changes.is_empty() {
                    store.update(changes)?;
                }
            }
        }
        Ok(())
    }

    /// One update carrying geometry styles and, for drops, the rewritten
    /// `children` of every affected parent
    fn write_changes(&self, store: &mut ElementStore, ids: &[ElementId], reparent: bool) -> Result<(), StoreError> {
        let mut drifted = false;
        let changes = {
            let tree = store.tree();
            let stage = self.shared.stage.borrow();
            let breakpoint = self.shared.context.borrow().breakpoint;
            let mut changes = ChangeSet::new();

            for id in ids {
                let Some(geometry) = stage.geometry(id) else {
                    tracing::warn!(element = %id, "no stage node for moved element");
                    drifted = true;
                    continue;
                };
                changes.edit(tree, id, |element| apply_geometry(element, breakpoint, geometry))?;
            }

            if reparent {
                let mut parents: Vec<ElementId> = Vec::new();
                for id in ids {
                    let old = tree.parent_id(id).cloned();
                    let new = stage.node_parent(id);
                    for parent in old.into_iter().chain(new) {
                        if !parents.contains(&parent) {
                            parents.push(parent);
                        }
                    }
                }
                for parent in &parents {
                    let Some(record) = tree.get(parent) else {
                        tracing::warn!(element = %parent, "surface parent missing from the store");
                        drifted = true;
                        continue;
                    };
                    let merged = merge_children(&*stage, &record.children, stage.node_children(parent));
                    changes.edit(tree, parent, |p| p.children = merged)?;
                }
            }
            changes.into_changes()
        };

        if drifted {
            self.shared.full_reset(store.tree());
        }
        if changes.is_empty() {
            return Ok(());
        }
        store.update(changes)
    }
}

fn apply_geometry(element: &mut Element, breakpoint: Breakpoint, geometry: Geometry) {
    let absolute = element
        .style
        .desktop
        .get("position")
        .map(|p| p == "absolute")
        .unwrap_or(false);
    let style = element.style.get_mut(breakpoint);
    if absolute {
        style.insert("top".to_string(), px(geometry.top));
        style.insert("left".to_string(), px(geometry.left));
    }
    style.insert("width".to_string(), px(geometry.width));
    style.insert("height".to_string(), px(geometry.height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::id_generator::IdGenerator;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TreeStage {
        parents: HashMap<ElementId, Option<ElementId>>,
        children: HashMap<ElementId, Vec<ElementId>>,
        selection: Vec<ElementId>,
        geometry: HashMap<ElementId, Geometry>,
    }

    impl Stage for TreeStage {
        fn add_element(&mut self, element: &Element, parent: Option<&ElementId>, index: usize) {
            self.parents.insert(element.id.clone(), parent.cloned());
            self.children.insert(element.id.clone(), Vec::new());
            if let Some(parent) = parent {
                let siblings = self.children.entry(parent.clone()).or_default();
                siblings.insert(index.min(siblings.len()), element.id.clone());
            }
        }

        fn remove_element(&mut self, id: &ElementId) {
            if let Some(Some(parent)) = self.parents.remove(id) {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|c| c != id);
                }
            }
            self.children.remove(id);
        }

        fn move_element(&mut self, id: &ElementId, parent: &ElementId, index: usize) {
            if let Some(Some(old)) = self.parents.get(id).cloned() {
                if let Some(siblings) = self.children.get_mut(&old) {
                    siblings.retain(|c| c != id);
                }
            }
            self.parents.insert(id.clone(), Some(parent.clone()));
            let siblings = self.children.entry(parent.clone()).or_default();
            siblings.insert(index.min(siblings.len()), id.clone());
        }

        fn update_metrics(&mut self, _elements: Option<&[Element]>) {}

        fn set_selection(&mut self, ids: &[ElementId]) {
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
            if self.has_node(id) {
                Some(self.geometry.get(id).copied().unwrap_or_default())
            } else {
                None
            }
        }

        fn clear(&mut self) {
            self.parents.clear();
            self.children.clear();
            self.selection.clear();
        }
    }

    fn store() -> ElementStore {
        let mut store = ElementStore::new(IdGenerator::from_seed("t", "s"));
        let body = store.body().clone();
        store
            .create(vec![
                Element::new("a", ElementType::Container),
                Element::new("b", ElementType::Container),
                Element::new("hidden", ElementType::Container).with_pages(["other"]),
            ])
            .unwrap();
        store
            .update(vec![ElementChange::edit(&body, |b| {
                b.children = vec!["a".into(), "hidden".into(), "b".into()]
            })])
            .unwrap();
        store
    }

    fn synced(store: &mut ElementStore) -> StageSynchronizer<TreeStage> {
        let sync = StageSynchronizer::new(TreeStage::default(), StageContext::new(Some("home".into()), Breakpoint::Desktop));
        sync.attach(store);
        sync
    }

    #[test]
    fn test_full_reset_skips_hidden_elements() {
        let mut store = store();
        let sync = synced(&mut store);
        let body = store.body().id.clone();

        let children = sync.stage().node_children(&body);
        assert_eq!(children, vec![ElementId::from("a"), ElementId::from("b")]);
        assert!(!sync.stage().has_node(&"hidden".into()));
    }

    #[test]
    fn test_merge_children_keeps_hidden_slots() {
        let mut store = store();
        let sync = synced(&mut store);
        let body = store.body().children.clone();

        let merged = merge_children(&*sync.stage(), &body, vec!["b".into(), "a".into()]);
        assert_eq!(merged, vec![ElementId::from("b"), ElementId::from("hidden"), ElementId::from("a")]);
    }

    #[test]
    fn test_suspension_counts_nest() {
        let suspension = Rc::new(Suspension::default());
        {
            let _outer = SuspendGuard::new(suspension.clone(), Direction::StoreToStage);
            {
                let _inner = SuspendGuard::new(suspension.clone(), Direction::StoreToStage);
            }
            assert!(suspension.is_suspended(Direction::StoreToStage));
            assert!(!suspension.is_suspended(Direction::StageToStore));
        }
        assert!(!suspension.is_suspended(Direction::StoreToStage));
    }

    #[test]
    fn test_stopped_observer_skips_projection() {
        let mut store = store();
        let sync = synced(&mut store);

        sync.stop_stage_observer();
        store.delete(&["a".into()]).unwrap();
        assert!(sync.stage().has_node(&"a".into()));
        sync.start_stage_observer();

        store.delete(&["b".into()]).unwrap();
        assert!(!sync.stage().has_node(&"b".into()));
    }

    #[test]
    fn test_page_change_resets_stage() {
        let mut store = store();
        let sync = synced(&mut store);

        sync.on_page_change(store.tree(), Some("other".into()));
        assert!(sync.stage().has_node(&"hidden".into()));
        assert_eq!(sync.context().page.as_deref(), Some("other"));
    }

    #[test]
    fn test_apply_geometry_only_moves_absolute() {
        let mut flow = Element::new("a", ElementType::Container);
        apply_geometry(&mut flow, Breakpoint::Desktop, Geometry::new(1.0, 2.0, 30.0, 40.0));
        assert!(flow.style.desktop.get("top").is_none());
        assert_eq!(flow.style.desktop["width"], "30px");

        let mut absolute = Element::new("b", ElementType::Container).with_style(Breakpoint::Desktop, "position", "absolute");
        apply_geometry(&mut absolute, Breakpoint::Mobile, Geometry::new(1.0, 2.0, 30.0, 40.0));
        assert_eq!(absolute.style.mobile["top"], "1px");
        assert_eq!(absolute.style.mobile["left"], "2px");
    }
}
