//! Store ⇄ stage synchronization against a recording surface

mod support;

use pagecraft_editor::operations::{self, PasteRequest};
use pagecraft_editor::{
    clone_from_store, Breakpoint, Direction, EditContext, EditorConfig, ElementId, ElementStore, ElementType,
    LogNotifier, OpenPage, Stage, StageContext, StageSynchronizer, StoreSerializer, SurfaceEvent, UndoManager,
};
use std::cell::RefCell;
use std::rc::Rc;
use support::{ids, sample_store, RecordingStage, StageCall};

fn attached(store: &mut ElementStore) -> StageSynchronizer<RecordingStage> {
    let sync = StageSynchronizer::new(RecordingStage::default(), StageContext::default());
    sync.attach(store);
    sync.stage_mut().take_calls();
    sync
}

fn id(value: &str) -> ElementId {
    ElementId::from(value)
}

#[test]
fn test_attach_builds_visible_tree() {
    let mut store = sample_store();
    let sync = StageSynchronizer::new(RecordingStage::default(), StageContext::default());
    sync.attach(&mut store);

    let calls = sync.stage_mut().take_calls();
    assert_eq!(calls[0], StageCall::Clear);
    let added: Vec<&ElementId> = calls
        .iter()
        .filter_map(|call| match call {
            StageCall::Add(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(added, vec![&store.body().id, &id("containerA"), &id("textX"), &id("containerB")]);
    assert_eq!(sync.stage().node_children(&store.body().id), ids(&["containerA", "containerB"]));
}

#[test]
fn test_paste_projects_new_subtree() {
    let mut store = sample_store();
    let sync = attached(&mut store);
    let config = EditorConfig::default();
    let pages = OpenPage::default();
    let notifier = LogNotifier::default();
    let ctx = EditContext::new(&pages, &notifier, &config);

    let set = clone_from_store(&mut store, &ids(&["containerA"])).unwrap();
    let body = store.body().id.clone();
    let roots = operations::paste(
        &mut store,
        PasteRequest {
            parent: body.clone(),
            set,
            page_names: None,
        },
        &ctx,
    )
    .unwrap();

    let stage = sync.stage();
    assert_eq!(stage.node_parent(&roots[0]), Some(body.clone()));
    assert_eq!(stage.node_children(&roots[0]).len(), 1);
    assert_eq!(stage.selection(), roots);
    assert!(!stage.calls.contains(&StageCall::Clear));
}

#[test]
fn test_drop_reparents_without_echo() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    sync.handle_surface_event(&mut store, SurfaceEvent::StartDrag(ids(&["containerB"])))
        .unwrap();
    assert!(sync.is_interacting());
    assert!(sync.is_suspended(Direction::StoreToStage));

    sync.stage_mut().drag_to(&id("containerB"), &id("containerA"), 0);
    sync.handle_surface_event(&mut store, SurfaceEvent::Drop(ids(&["containerB"])))
        .unwrap();

    assert_eq!(store.get(&id("containerA")).unwrap().children, ids(&["containerB", "textX"]));
    assert_eq!(store.body().children, ids(&["containerA"]));
    assert!(sync.stage_mut().take_calls().is_empty());
    assert!(!sync.is_interacting());
    assert!(!sync.is_suspended(Direction::StoreToStage));
}

#[test]
fn test_resize_writes_geometry() {
    let mut store = sample_store();
    let sync = attached(&mut store);
    operations::set_style(&mut store, &ids(&["containerB"]), Breakpoint::Desktop, "position", Some("absolute")).unwrap();
    sync.stage_mut().take_calls();

    sync.stage_mut().geometry.insert(
        id("containerB"),
        pagecraft_editor::Geometry::new(10.0, 20.0, 300.0, 150.0),
    );
    sync.handle_surface_event(&mut store, SurfaceEvent::StartResize(ids(&["containerB"])))
        .unwrap();
    sync.handle_surface_event(&mut store, SurfaceEvent::ResizeEnd(ids(&["containerB"])))
        .unwrap();

    let style = &store.get(&id("containerB")).unwrap().style.desktop;
    assert_eq!(style["top"], "10px");
    assert_eq!(style["left"], "20px");
    assert_eq!(style["width"], "300px");
    assert_eq!(style["height"], "150px");
    assert!(sync.stage_mut().take_calls().is_empty());
}

#[test]
fn test_surface_selection_updates_store() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    sync.handle_surface_event(&mut store, SurfaceEvent::Select(ids(&["textX"])))
        .unwrap();
    let selected: Vec<&str> = store.get_selected().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(selected, vec!["textX"]);
    assert!(sync.stage_mut().take_calls().is_empty());

    // store-side selection is projected
    let changes = pagecraft_editor::selection::select_only(store.tree(), &ids(&["containerB"])).unwrap();
    store.update(changes).unwrap();
    assert_eq!(sync.stage().selection(), ids(&["containerB"]));
}

#[test]
fn test_style_update_remeasures_only_that_node() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    operations::set_style(&mut store, &ids(&["textX"]), Breakpoint::Desktop, "color", Some("red")).unwrap();
    assert_eq!(sync.stage_mut().take_calls(), vec![StageCall::Metrics(Some(ids(&["textX"])))]);

    // mobile styles are invisible on the desktop stage
    operations::set_style(&mut store, &ids(&["textX"]), Breakpoint::Mobile, "color", Some("blue")).unwrap();
    assert!(sync.stage_mut().take_calls().is_empty());
}

#[test]
fn test_breakpoint_visibility() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    operations::set_visibility(&mut store, &ids(&["containerB"]), Breakpoint::Mobile, false).unwrap();
    assert!(sync.stage().has_node(&id("containerB")));

    sync.on_breakpoint_change(store.tree(), Breakpoint::Mobile);
    assert!(!sync.stage().has_node(&id("containerB")));
    sync.stage_mut().take_calls();

    operations::set_visibility(&mut store, &ids(&["containerB"]), Breakpoint::Mobile, true).unwrap();
    assert_eq!(sync.stage_mut().take_calls()[0], StageCall::Add(id("containerB")));
}

#[test]
fn test_delete_removes_nodes() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    store.delete(&ids(&["containerA", "textX"])).unwrap();
    let stage = sync.stage();
    assert!(!stage.has_node(&id("containerA")));
    assert!(!stage.has_node(&id("textX")));
    assert_eq!(stage.node_children(&store.body().id), ids(&["containerB"]));
}

#[test]
fn test_drift_triggers_full_reset() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    sync.stage_mut().forget(&id("textX"));
    sync.stage_mut().forget(&id("containerA"));
    operations::set_style(&mut store, &ids(&["textX"]), Breakpoint::Desktop, "color", Some("red")).unwrap();

    let stage = sync.stage();
    assert!(stage.calls.contains(&StageCall::Clear));
    assert!(stage.has_node(&id("containerA")));
    assert_eq!(stage.node_parent(&id("textX")), Some(id("containerA")));
}

#[test]
fn test_surface_event_for_unknown_element_resets() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    sync.handle_surface_event(&mut store, SurfaceEvent::Drop(ids(&["ghost"])))
        .unwrap();
    assert_eq!(sync.stage_mut().take_calls()[0], StageCall::Clear);
}

#[test]
fn test_page_scoped_elements_follow_page() {
    let mut store = sample_store();
    let sync = attached(&mut store);

    operations::set_page_names(&mut store, &ids(&["containerA"]), &["home".to_string()]).unwrap();
    sync.on_page_change(store.tree(), Some("about".to_string()));
    assert!(!sync.stage().has_node(&id("containerA")));
    assert!(!sync.stage().has_node(&id("textX")));

    sync.on_page_change(store.tree(), Some("home".to_string()));
    assert!(sync.stage().has_node(&id("textX")));
}

#[tokio::test]
async fn test_undo_restore_resets_stage() {
    let store = Rc::new(RefCell::new(sample_store()));
    let sync = attached(&mut store.borrow_mut());
    let undo = UndoManager::new(StoreSerializer::new(store.clone()), &EditorConfig::default());

    assert!(sync.capture_checkpoint(&undo).await.unwrap());
    assert!(!sync.is_suspended(Direction::StoreToStage));

    store
        .borrow_mut()
        .create(vec![pagecraft_editor::Element::new("floating", ElementType::Image)])
        .unwrap();
    operations::set_style(&mut store.borrow_mut(), &ids(&["containerB"]), Breakpoint::Desktop, "color", Some("red"))
        .unwrap();
    sync.stage_mut().take_calls();

    assert!(undo.undo().await.unwrap());
    assert_eq!(sync.stage_mut().take_calls()[0], StageCall::Clear);
    assert!(store.borrow().get(&id("floating")).is_none());
}
