//! Document serialization boundary.
//!
//! The undo manager never looks inside a document: it asks a
//! [`DocumentSerializer`] for an opaque rendering (also the dirty-comparison
//! key) plus the open page and scroll offset, and hands the same triple back
//! to restore.

use crate::element::Element;
use crate::errors::EditorError;
use crate::store::ElementStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Scroll position of the visual surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Point-in-time capture of the document, immutable once taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoState {
    pub html: String,
    pub page: Option<String>,
    pub scroll: ScrollOffset,
}

impl UndoState {
    /// Same rendered payload on the same page; scroll is ignored
    pub fn same_document(&self, other: &UndoState) -> bool {
        self.html == other.html && self.page == other.page
    }
}

#[async_trait(?Send)]
pub trait DocumentSerializer {
    /// Render the live document; may yield before completing
    async fn render(&self) -> Result<String, EditorError>;

    fn open_page(&self) -> Option<String>;

    fn scroll_offset(&self) -> ScrollOffset;

    /// Replace the live document with `state`
    async fn restore(&self, state: &UndoState) -> Result<(), EditorError>;
}

/// Capture the live document through `serializer`
pub async fn capture<S: DocumentSerializer + ?Sized>(serializer: &S) -> Result<UndoState, EditorError> {
    let html = serializer.render().await?;
    Ok(UndoState {
        html,
        page: serializer.open_page(),
        scroll: serializer.scroll_offset(),
    })
}

/// Serializer rendering the element store itself as a JSON array
pub struct StoreSerializer {
    store: Rc<RefCell<ElementStore>>,
    page: RefCell<Option<String>>,
    scroll: Cell<ScrollOffset>,
}

impl StoreSerializer {
    pub fn new(store: Rc<RefCell<ElementStore>>) -> Self {
        Self {
            store,
            page: RefCell::new(None),
            scroll: Cell::new(ScrollOffset::default()),
        }
    }

    pub fn store(&self) -> &Rc<RefCell<ElementStore>> {
        &self.store
    }

    pub fn set_open_page(&self, page: Option<String>) {
        *self.page.borrow_mut() = page;
    }

    pub fn set_scroll_offset(&self, scroll: ScrollOffset) {
        self.scroll.set(scroll);
    }
}

#[async_trait(?Send)]
impl DocumentSerializer for StoreSerializer {
    async fn render(&self) -> Result<String, EditorError> {
        let html = serde_json::to_string(&self.store.borrow().tree().to_vec())?;
        tokio::task::yield_now().await;
        Ok(html)
    }

    fn open_page(&self) -> Option<String> {
        self.page.borrow().clone()
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll.get()
    }

    async fn restore(&self, state: &UndoState) -> Result<(), EditorError> {
        let elements: Vec<Element> = serde_json::from_str(&state.html)?;
        self.store.borrow_mut().load(elements)?;
        self.set_open_page(state.page.clone());
        self.set_scroll_offset(state.scroll);
        Ok(())
    }
}
