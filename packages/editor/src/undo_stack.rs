//! # Undo/Redo Manager
//!
//! Coarse, snapshot-based history: each checkpoint captures the whole
//! rendered document rather than a diff.
//!
//! ## Design
//!
//! - `request_checkpoint` may be called on every edit; requests inside the
//!   debounce window reset the window, and `poll_checkpoint` commits at most
//!   one capture once it elapses.
//! - A commit clears the redo history, captures asynchronously and pushes
//!   the state only when it differs from the top entry (payload + page).
//! - `flush_due` sleeps on the tokio clock until the window of the latest
//!   request elapses, then commits.
//! - Undo/redo wait for in-flight captures by yielding to the runtime; they
//!   are never dropped. A commit that finds an undo/redo in progress waits
//!   for it and is then dropped, like a pending request.
//! - `last_saved` remembers the history index at the last save; the
//!   document is dirty whenever the top of the history moved away from it.
//!
//! ## Example
//!
//! ```rust,ignore
//! let undo = UndoManager::new(serializer, &config);
//! undo.commit_checkpoint().await?;   // before an edit
//! store.borrow_mut().update(changes)?;
//! undo.undo().await?;                 // back to the captured state
//! ```

use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::snapshot::{capture, DocumentSerializer, UndoState};
use std::cell::{Cell, RefCell};
use std::time::Duration;
use tokio::time::Instant;

/// Coalesces bursts of requests into one, firing after a quiet window
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, deadline: None }
    }

    /// Arm (or re-arm) the window starting at `now`
    pub fn request(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once, when the window armed by the last request has elapsed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Decrements its counter however the capture or restore ends
struct InFlight<'a>(&'a Cell<usize>);

impl<'a> InFlight<'a> {
    fn start(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Undo/redo history over document snapshots
///
/// Methods take `&self` so a capture and an undo request can be outstanding
/// at the same time on one task.
pub struct UndoManager<S: DocumentSerializer> {
    serializer: S,
    undo_history: RefCell<Vec<UndoState>>,
    redo_history: RefCell<Vec<UndoState>>,
    last_saved_index: Cell<Option<usize>>,
    in_flight: Cell<usize>,
    restoring: Cell<usize>,
    debouncer: RefCell<Debouncer>,
    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl<S: DocumentSerializer> UndoManager<S> {
    pub fn new(serializer: S, config: &EditorConfig) -> Self {
        Self {
            serializer,
            undo_history: RefCell::new(Vec::new()),
            redo_history: RefCell::new(Vec::new()),
            last_saved_index: Cell::new(None),
            in_flight: Cell::new(0),
            restoring: Cell::new(0),
            debouncer: RefCell::new(Debouncer::new(config.checkpoint_debounce())),
            max_levels: config.max_undo_levels,
        }
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Ask for a checkpoint; bursts collapse into one
    pub fn request_checkpoint(&self, now: Instant) {
        self.debouncer.borrow_mut().request(now);
    }

    pub fn has_pending_request(&self) -> bool {
        self.debouncer.borrow().is_pending()
    }

    /// Commit the requested checkpoint if its window has elapsed
    pub async fn poll_checkpoint(&self, now: Instant) -> Result<bool, EditorError> {
        let due = self.debouncer.borrow_mut().take_due(now);
        if !due {
            return Ok(false);
        }
        self.commit_checkpoint().await
    }

    /// Sleep until the pending request's window elapses and commit it
    ///
    /// Newer requests push the deadline back; returns `Ok(false)` when the
    /// request was cancelled (by undo or reset) or none was pending.
    pub async fn flush_due(&self) -> Result<bool, EditorError> {
        loop {
            let deadline = self.debouncer.borrow().deadline();
            let Some(deadline) = deadline else {
                return Ok(false);
            };
            tokio::time::sleep_until(deadline).await;
            if self.poll_checkpoint(Instant::now()).await? {
                return Ok(true);
            }
        }
    }

    /// Capture the live document now; returns whether a state was pushed
    pub async fn commit_checkpoint(&self) -> Result<bool, EditorError> {
        if self.restoring.get() > 0 {
            tracing::debug!("checkpoint requested during undo/redo, waiting");
            while self.restoring.get() > 0 {
                tokio::task::yield_now().await;
            }
            tracing::info!("checkpoint superseded by undo/redo, dropped");
            return Ok(false);
        }

        let state = {
            let _guard = InFlight::start(&self.in_flight);
            self.redo_history.borrow_mut().clear();
            capture(&self.serializer).await?
        };

        let mut undo = self.undo_history.borrow_mut();
        if undo.last().map(|top| top.same_document(&state)).unwrap_or(false) {
            tracing::info!("checkpoint identical to the previous one, dropped");
            return Ok(false);
        }
        undo.push(state);

        if self.max_levels > 0 && undo.len() > self.max_levels {
            let excess = undo.len() - self.max_levels;
            undo.drain(..excess);
            self.last_saved_index
                .set(self.last_saved_index.get().and_then(|i| i.checked_sub(excess)));
        }
        tracing::debug!(levels = undo.len(), "checkpoint committed");
        Ok(true)
    }

    fn busy(&self) -> bool {
        self.in_flight.get() > 0 || self.restoring.get() > 0
    }

    async fn wait_for_captures(&self, action: &str) {
        if !self.busy() {
            return;
        }
        tracing::debug!(
            action,
            pending = self.in_flight.get(),
            restoring = self.restoring.get(),
            "deferring until history settles"
        );
        while self.busy() {
            tokio::task::yield_now().await;
        }
    }

    /// Restore the previous state; `Ok(false)` when there is none
    pub async fn undo(&self) -> Result<bool, EditorError> {
        self.wait_for_captures("undo").await;
        if self.debouncer.borrow_mut().cancel() {
            tracing::debug!("pending checkpoint request dropped by undo");
        }
        self.step(&self.undo_history, &self.redo_history).await
    }

    /// Re-apply the last undone state; `Ok(false)` when there is none
    pub async fn redo(&self) -> Result<bool, EditorError> {
        self.wait_for_captures("redo").await;
        self.step(&self.redo_history, &self.undo_history).await
    }

    async fn step(&self, from: &RefCell<Vec<UndoState>>, to: &RefCell<Vec<UndoState>>) -> Result<bool, EditorError> {
        let target = from.borrow_mut().pop();
        let Some(target) = target else {
            return Ok(false);
        };
        let _guard = InFlight::start(&self.restoring);

        let current = match capture(&self.serializer).await {
            Ok(current) => current,
            Err(error) => {
                from.borrow_mut().push(target);
                return Err(error);
            }
        };
        to.borrow_mut().push(current);

        if let Err(error) = self.serializer.restore(&target).await {
            to.borrow_mut().pop();
            from.borrow_mut().push(target);
            return Err(error);
        }
        Ok(true)
    }

    /// Forget all history (new document loaded)
    pub fn reset(&self) {
        self.undo_history.borrow_mut().clear();
        self.redo_history.borrow_mut().clear();
        self.last_saved_index.set(None);
        self.debouncer.borrow_mut().cancel();
    }

    /// Record that the document was just saved
    pub fn mark_saved(&self) {
        self.last_saved_index
            .set(self.undo_history.borrow().len().checked_sub(1));
    }

    pub fn is_dirty(&self) -> bool {
        self.last_saved_index.get() != self.undo_history.borrow().len().checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_history.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_history.borrow().is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_history.borrow().len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_history.borrow().len()
    }

    pub fn is_capturing(&self) -> bool {
        self.in_flight.get() > 0
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.get() > 0
    }
}
