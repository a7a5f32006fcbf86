// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo of committed edits on the active image.

use crate::models::annotation::BoundingBox;

/// Snapshots of the active image's boxes.
pub struct History {
    /// Undo stack (past states)
    undo_stack: Vec<Vec<BoundingBox>>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<Vec<BoundingBox>>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Save current state before making a change
    pub fn push(&mut self, boxes: Vec<BoundingBox>) {
        self.undo_stack.push(boxes);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Restore the previous state, remembering `current` for redo.
    pub fn undo(&mut self, current: Vec<BoundingBox>) -> Option<Vec<BoundingBox>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Restore the next state, remembering `current` for undo.
    pub fn redo(&mut self, current: Vec<BoundingBox>) -> Option<Vec<BoundingBox>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
