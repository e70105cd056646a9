//! # Pagecraft Editor
//!
//! Document-tree state engine for the Pagecraft page editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ operations: paste, duplicate, delete, move  │
//! │  - clone engine (fresh ids, local shape)    │
//! │  - page inheritance, selection queries      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: id-keyed element tree                │
//! │  - atomic create/update/delete/load         │
//! │  - invariant checks, one event per batch    │
//! └─────────────────────────────────────────────┘
//!          ↓ subscribe                ↑ surface events
//! ┌─────────────────────────────────────────────┐
//! │ stage_sync: store ⇄ stage, with suspension  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The undo manager sits beside the store: it snapshots the rendered
//! document at checkpoints and restores snapshots through a
//! [`DocumentSerializer`].
//!
//! ## Core Principles
//!
//! 1. **The store is the source of truth**: the stage is a projection
//! 2. **Whole records in, one event out**: no partial patches
//! 3. **Coarse history**: snapshots, not diffs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{ElementStore, IdGenerator, operations};
//!
//! let mut store = ElementStore::new(IdGenerator::new("pc"));
//! let ctx = EditContext::new(&pages, &notifier, &config);
//!
//! let id = operations::add_element(&mut store, ElementType::Container, &body, &ctx)?;
//! let copies = operations::duplicate_selection(&mut store, &ctx)?;
//! ```

pub mod clone;
pub mod config;
pub mod element;
pub mod errors;
pub mod id_generator;
pub mod notifications;
pub mod operations;
pub mod pages;
pub mod selection;
pub mod snapshot;
pub mod stage;
pub mod stage_sync;
pub mod store;
pub mod undo_stack;

pub use clone::{clone_elements, clone_from_store, Clipboard, CloneError, CloneSet};
pub use config::EditorConfig;
pub use element::{Breakpoint, Element, ElementChange, ElementId, ElementType, Link, StyleSet, Visibility};
pub use errors::EditorError;
pub use id_generator::IdGenerator;
pub use notifications::{LogNotifier, Notifier};
pub use operations::{EditContext, OperationError, PasteRequest};
pub use pages::{OpenPage, PageStore};
pub use snapshot::{DocumentSerializer, ScrollOffset, StoreSerializer, UndoState};
pub use stage::{Geometry, Stage, StageContext, SurfaceEvent};
pub use stage_sync::{Direction, StageSynchronizer, SuspendGuard};
pub use store::{ElementStore, ElementTree, EventKind, StoreError, StoreEvent, SubscriptionId};
pub use undo_stack::{Debouncer, UndoManager};
