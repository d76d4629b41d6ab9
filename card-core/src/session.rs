//! Editing session - current document, selection, and history.

use std::collections::VecDeque;

use crate::document::Document;
use crate::element::{ElementDraft, ElementId, ElementPatch, Position};
use crate::engine;
use crate::error::ValidationError;

/// How many undo states a session retains.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// A single-writer editing session over one document.
///
/// The session routes every edit through [`crate::engine`] and swaps its
/// current document on change. Because the engine returns fresh values,
/// history is just the prior values; undo and redo move them between two
/// stacks. Selection is session state, not document state: it never
/// serializes, it clears when the selected element disappears, and loading
/// a different document resets it along with the history.
#[derive(Debug, Clone)]
pub struct EditorSession {
    current: Document,
    selected: Option<ElementId>,
    undo_stack: VecDeque<Document>,
    redo_stack: Vec<Document>,
    history_limit: usize,
}

impl EditorSession {
    /// Open a session over `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self::with_history_limit(document, DEFAULT_HISTORY_LIMIT)
    }

    /// Open a session retaining at most `history_limit` undo states.
    #[must_use]
    pub fn with_history_limit(document: Document, history_limit: usize) -> Self {
        Self {
            current: document,
            selected: None,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            history_limit,
        }
    }

    /// The current document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.current
    }

    /// The selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    /// Select an element. Returns false (selection unchanged) when the id
    /// is not in the document.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.current.element(&id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Add an element to the card.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the draft is invalid; the session
    /// is untouched on failure.
    pub fn add_element(&mut self, draft: ElementDraft) -> Result<ElementId, ValidationError> {
        let (next, id) = engine::add_element(&self.current, draft)?;
        self.commit(next);
        Ok(id)
    }

    /// Move an element, clamping drag coordinates to be non-negative.
    pub fn move_element(&mut self, id: &ElementId, position: Position) {
        let next = engine::move_element(&self.current, id, position);
        self.commit(next);
    }

    /// Merge a patch into an element.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) {
        let next = engine::update_element(&self.current, id, patch);
        self.commit(next);
    }

    /// Delete an element. Deleting the selected element clears the
    /// selection.
    pub fn delete_element(&mut self, id: &ElementId) {
        let next = engine::delete_element(&self.current, id);
        if self.commit(next) && self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
    }

    /// Step back one state. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack
            .push(std::mem::replace(&mut self.current, previous));
        self.prune_selection();
        true
    }

    /// Step forward one state. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack
            .push_back(std::mem::replace(&mut self.current, next));
        self.prune_selection();
        true
    }

    /// Whether undo would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether redo would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Replace the document wholesale, as when loading a saved card.
    /// History and selection reset.
    pub fn replace_document(&mut self, document: Document) {
        self.current = document;
        self.selected = None;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Swap in `next` if it differs from the current document, pushing the
    /// old state for undo. Structural no-ops (an edit that changed nothing)
    /// record no history, so undo is never consumed by them.
    fn commit(&mut self, next: Document) -> bool {
        if next == self.current {
            return false;
        }
        self.undo_stack
            .push_back(std::mem::replace(&mut self.current, next));
        if self.undo_stack.len() > self.history_limit {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
        true
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selected {
            if self.current.element(id).is_none() {
                self.selected = None;
            }
        }
    }
}

impl Default for EditorSession {
    /// A session over the blank default card.
    fn default() -> Self {
        Self::new(Document::default())
    }
}
