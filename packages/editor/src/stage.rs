//! Visual surface boundary.
//!
//! The stage is the live, directly-manipulable rendering of the document.
//! It owns one node per visible element, addressed by element id, and
//! reports user interactions as [`SurfaceEvent`]s.

use crate::element::{Breakpoint, Element, ElementId};
use serde::{Deserialize, Serialize};

/// Post-interaction box of a stage node, in px
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Page and breakpoint the stage currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageContext {
    pub page: Option<String>,
    pub breakpoint: Breakpoint,
}

impl StageContext {
    pub fn new(page: Option<String>, breakpoint: Breakpoint) -> Self {
        Self { page, breakpoint }
    }

    /// Whether `element` alone (ignoring ancestors) shows in this context
    pub fn shows(&self, element: &Element) -> bool {
        element.is_on_page(self.page.as_deref()) && element.visibility.get(self.breakpoint)
    }
}

/// Interaction callbacks raised by the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    StartDrag(Vec<ElementId>),
    StartResize(Vec<ElementId>),
    /// Geometry changed mid-interaction
    Change(Vec<ElementId>),
    /// Drag ended; nodes may have a new parent or sibling order
    Drop(Vec<ElementId>),
    ResizeEnd(Vec<ElementId>),
    Select(Vec<ElementId>),
}

impl SurfaceEvent {
    pub fn ids(&self) -> &[ElementId] {
        match self {
            SurfaceEvent::StartDrag(ids)
            | SurfaceEvent::StartResize(ids)
            | SurfaceEvent::Change(ids)
            | SurfaceEvent::Drop(ids)
            | SurfaceEvent::ResizeEnd(ids)
            | SurfaceEvent::Select(ids) => ids,
        }
    }
}

/// Capability set of the direct-manipulation surface
pub trait Stage {
    /// Insert a node for `element` under `parent` (root when `None`) at `index`
    fn add_element(&mut self, element: &Element, parent: Option<&ElementId>, index: usize);

    /// Remove the node of `id` only; descendants are removed separately
    fn remove_element(&mut self, id: &ElementId);

    /// Move an existing node under `parent` at `index`
    fn move_element(&mut self, id: &ElementId, parent: &ElementId, index: usize);

    /// Re-apply records to their nodes and re-measure; `None` re-measures all
    fn update_metrics(&mut self, elements: Option<&[Element]>);

    fn set_selection(&mut self, ids: &[ElementId]);

    fn selection(&self) -> Vec<ElementId>;

    fn has_node(&self, id: &ElementId) -> bool;

    fn node_parent(&self, id: &ElementId) -> Option<ElementId>;

    /// Children of `id` in surface order
    fn node_children(&self, id: &ElementId) -> Vec<ElementId>;

    fn geometry(&self, id: &ElementId) -> Option<Geometry>;

    /// Drop every node
    fn clear(&mut self);
}
