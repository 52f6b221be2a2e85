//! Bounded undo/redo history of position snapshots

use std::collections::VecDeque;

use tracing::debug;

use crate::Position;

/// Default number of snapshots kept on each stack
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Two bounded stacks of owned snapshots. Once a stack is full the oldest
/// entry is dropped from the bottom.
#[derive(Clone, Debug)]
pub struct History {
    capacity: usize,
    undo: VecDeque<Position>,
    redo: VecDeque<Position>,
}

impl Default for History {
    fn default() -> Self {
        History::new(DEFAULT_HISTORY_CAPACITY)
    }
}

fn push_bounded(stack: &mut VecDeque<Position>, capacity: usize, position: Position) {
    stack.push_back(position);
    while stack.len() > capacity {
        stack.pop_front();
    }
}

impl History {
    /// Stacks holding `capacity` snapshots each. At least one is always kept,
    /// so the last change can be undone.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        History {
            capacity,
            undo: VecDeque::with_capacity(capacity + 1),
            redo: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record the position as it was before a change. Invalidates redo.
    pub fn push(&mut self, snapshot: Position) {
        push_bounded(&mut self.undo, self.capacity, snapshot);
        self.redo.clear();
        debug!(undo_depth = self.undo.len(), "history push");
    }

    /// Step back: `current` moves onto the redo stack and the latest snapshot is returned
    pub fn undo(&mut self, current: &Position) -> Option<Position> {
        let previous = self.undo.pop_back()?;
        push_bounded(&mut self.redo, self.capacity, current.clone());
        debug!(
            undo_depth = self.undo.len(),
            redo_depth = self.redo.len(),
            "history undo"
        );
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: &Position) -> Option<Position> {
        let next = self.redo.pop_back()?;
        push_bounded(&mut self.undo, self.capacity, current.clone());
        debug!(
            undo_depth = self.undo.len(),
            redo_depth = self.redo.len(),
            "history redo"
        );
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
