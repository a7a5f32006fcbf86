// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive bounding-box editing.
//!
//! The [`Editor`] owns the labeling [`Session`] and turns pointer and key
//! events into create, move, resize, select and delete operations on the
//! active image. Pointer positions arrive in canvas space and are converted
//! to clamped image pixels before any geometry runs; boxes are written back
//! to the store in normalized space only when a gesture ends.

pub mod handles;
pub mod history;

use crate::error::{LabelerError, Result};
use crate::models::annotation::BoundingBox;
use crate::models::classes::{ClassDefinition, Rgb};
use crate::models::session::Session;
use crate::render::RedrawListener;
use crate::util::geometry::{
    canvas_to_image, fit_to_display, image_to_normalized, CanvasPoint, CanvasRect, ImagePoint,
    ImageSize, PixelRect, Viewport,
};
use handles::{hit_test, resize_anchor, resize_rect, Handle, Hit};
use history::History;
use std::path::Path;

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Cancel the current gesture or deselect
    Escape,
    /// Delete the selected box
    Delete,
    /// Make the n-th class (display order, 0-based) the active class
    SelectClass(usize),
}

/// Input delivered by the chrome, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(CanvasPoint),
    PointerMove(CanvasPoint),
    PointerUp(CanvasPoint),
    KeyPress(Key),
}

/// Interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Idle,
    Drawing {
        anchor: ImagePoint,
        current: ImagePoint,
    },
    Moving {
        index: usize,
        /// Pointer position relative to the box's top-left corner
        grab_offset: (f64, f64),
        original: PixelRect,
        current: PixelRect,
    },
    Resizing {
        index: usize,
        handle: Handle,
        anchor: ImagePoint,
        original: PixelRect,
        current: PixelRect,
    },
    Selected(usize),
}

impl Mode {
    /// Index of the selected (or edited) box.
    pub fn selection(&self) -> Option<usize> {
        match *self {
            Mode::Selected(index)
            | Mode::Moving { index, .. }
            | Mode::Resizing { index, .. } => Some(index),
            Mode::Idle | Mode::Drawing { .. } => None,
        }
    }

    /// True while a pointer gesture is in progress.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Mode::Drawing { .. } | Mode::Moving { .. } | Mode::Resizing { .. }
        )
    }
}

/// What an event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Nothing,
    /// In-progress geometry changed
    Preview,
    Selected(usize),
    Deselected,
    Created(usize),
    Moved(usize),
    Resized(usize),
    Deleted(BoundingBox),
    /// Gesture ended below the minimum size and was dropped
    Discarded,
    /// Gesture aborted without committing
    Cancelled,
    ClassSelected(u32),
}

pub struct Editor {
    session: Session,
    mode: Mode,
    active_class: Option<u32>,
    viewport: Viewport,
    history: History,
    listener: Option<Box<dyn RedrawListener>>,
    /// Last auto-save failure, kept until the front end reports it
    save_error: Option<LabelerError>,
}

impl Editor {
    pub fn new(session: Session) -> Self {
        let active_class = session.registry().at(0).map(|c| c.class_id);
        Self {
            session,
            mode: Mode::Idle,
            active_class,
            viewport: Viewport::identity(),
            history: History::default(),
            listener: None,
            save_error: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selection(&self) -> Option<usize> {
        self.mode.selection()
    }

    pub fn active_class(&self) -> Option<u32> {
        self.active_class
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Register the callback fired after every state change.
    pub fn set_listener(&mut self, listener: impl RedrawListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Fit the active image into a display area and use that viewport.
    pub fn fit_to_display(&mut self, display: CanvasRect) -> Option<Viewport> {
        let size = self.session.image_size()?;
        self.viewport = fit_to_display(size, display);
        Some(self.viewport)
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_frame_needs_redraw();
        }
    }

    /// Process one input event.
    pub fn handle(&mut self, event: InputEvent) -> Result<Outcome> {
        let outcome = match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerMove(p) => Ok(self.pointer_move(p)),
            InputEvent::PointerUp(p) => self.pointer_up(p),
            InputEvent::KeyPress(key) => self.key_press(key),
        }?;
        if outcome != Outcome::Nothing {
            log::debug!("{:?} -> {:?} ({:?})", event, outcome, self.mode);
            self.notify();
        }
        Ok(outcome)
    }

    /// Map a canvas point into the active image.
    fn locate(&self, p: CanvasPoint) -> Option<(ImagePoint, ImageSize)> {
        let size = self.session.image_size()?;
        self.session.store()?.active()?;
        Some((canvas_to_image(p, self.viewport, size), size))
    }

    fn box_rects(&self, size: ImageSize) -> Vec<PixelRect> {
        self.session
            .store()
            .map(|s| s.active_boxes().iter().map(|b| b.to_pixels(size)).collect())
            .unwrap_or_default()
    }

    /// What a press at `p` would hit; used by the chrome for cursor hints.
    pub fn hit_at(&self, p: CanvasPoint) -> Hit {
        match self.locate(p) {
            Some((point, size)) => hit_test(
                &self.box_rects(size),
                self.selection(),
                point,
                self.handle_radius(),
            ),
            None => Hit::Empty,
        }
    }

    /// Handle hit radius converted to image pixels.
    fn handle_radius(&self) -> f64 {
        self.session.config().handle_radius / self.viewport.scale.max(f64::EPSILON)
    }

    fn pointer_down(&mut self, p: CanvasPoint) -> Result<Outcome> {
        if self.mode.is_gesture() {
            return Ok(Outcome::Nothing);
        }
        let Some((point, size)) = self.locate(p) else {
            return Ok(Outcome::Nothing);
        };

        let selected = self.selection();
        let rects = self.box_rects(size);
        match hit_test(&rects, selected, point, self.handle_radius()) {
            Hit::Handle(index, handle) => {
                let original = rects[index];
                self.mode = Mode::Resizing {
                    index,
                    handle,
                    anchor: resize_anchor(original, handle),
                    original,
                    current: original,
                };
                Ok(Outcome::Selected(index))
            }
            Hit::Body(index) => {
                let original = rects[index];
                self.mode = Mode::Moving {
                    index,
                    grab_offset: (point.x - original.x1, point.y - original.y1),
                    original,
                    current: original,
                };
                Ok(Outcome::Selected(index))
            }
            Hit::Empty => {
                let was_selected = selected.is_some();
                if self.active_class.is_some() {
                    self.mode = Mode::Drawing {
                        anchor: point,
                        current: point,
                    };
                    Ok(if was_selected {
                        Outcome::Deselected
                    } else {
                        Outcome::Preview
                    })
                } else {
                    self.mode = Mode::Idle;
                    Ok(if was_selected {
                        Outcome::Deselected
                    } else {
                        Outcome::Nothing
                    })
                }
            }
        }
    }

    fn pointer_move(&mut self, p: CanvasPoint) -> Outcome {
        let Some((point, size)) = self.locate(p) else {
            return Outcome::Nothing;
        };
        let min_size = self.session.config().min_box_size;

        match &mut self.mode {
            Mode::Drawing { current, .. } => {
                *current = point;
                Outcome::Preview
            }
            Mode::Moving {
                grab_offset,
                original,
                current,
                ..
            } => {
                let origin = ImagePoint::new(point.x - grab_offset.0, point.y - grab_offset.1);
                *current = original.moved_to(origin, size);
                Outcome::Preview
            }
            Mode::Resizing {
                handle,
                anchor,
                original,
                current,
                ..
            } => {
                *current = resize_rect(*original, *handle, *anchor, point, min_size, size);
                Outcome::Preview
            }
            Mode::Idle | Mode::Selected(_) => Outcome::Nothing,
        }
    }

    fn pointer_up(&mut self, p: CanvasPoint) -> Result<Outcome> {
        if !self.mode.is_gesture() {
            return Ok(Outcome::Nothing);
        }
        self.pointer_move(p);
        let Some(size) = self.session.image_size() else {
            self.mode = Mode::Idle;
            return Ok(Outcome::Cancelled);
        };
        let min_size = self.session.config().min_box_size;

        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Drawing { anchor, current } => {
                let rect = PixelRect::from_corners(anchor, current);
                let Some(class_id) = self.active_class else {
                    return Ok(Outcome::Discarded);
                };
                if rect.width() < min_size || rect.height() < min_size {
                    return Ok(Outcome::Discarded);
                }
                self.snapshot();
                let index = self
                    .session
                    .store_mut()?
                    .add_box(BoundingBox::from_pixels(class_id, rect, size))?;
                log::info!("Created box {} with class {}", index, class_id);
                self.after_commit();
                self.mode = Mode::Selected(index);
                Ok(Outcome::Created(index))
            }
            Mode::Moving {
                index,
                original,
                current,
                ..
            } => {
                self.mode = Mode::Selected(index);
                if current == original {
                    return Ok(Outcome::Selected(index));
                }
                self.commit_geometry(index, current, size)?;
                Ok(Outcome::Moved(index))
            }
            Mode::Resizing {
                index,
                original,
                current,
                ..
            } => {
                self.mode = Mode::Selected(index);
                if current == original {
                    return Ok(Outcome::Selected(index));
                }
                self.commit_geometry(index, current, size)?;
                Ok(Outcome::Resized(index))
            }
            other => {
                self.mode = other;
                Ok(Outcome::Nothing)
            }
        }
    }

    fn commit_geometry(&mut self, index: usize, rect: PixelRect, size: ImageSize) -> Result<()> {
        self.snapshot();
        self.session
            .store_mut()?
            .update_box(index, image_to_normalized(rect, size))?;
        self.after_commit();
        Ok(())
    }

    fn key_press(&mut self, key: Key) -> Result<Outcome> {
        match key {
            Key::Escape => Ok(self.cancel()),
            Key::Delete => self.delete_selected(),
            Key::SelectClass(position) => {
                let Some(class_id) = self.session.registry().at(position).map(|c| c.class_id)
                else {
                    return Ok(Outcome::Nothing);
                };
                self.active_class = Some(class_id);
                Ok(Outcome::ClassSelected(class_id))
            }
        }
    }

    /// Abort the current gesture, or deselect when none is running.
    fn cancel(&mut self) -> Outcome {
        match self.mode {
            Mode::Drawing { .. } => {
                self.mode = Mode::Idle;
                Outcome::Cancelled
            }
            Mode::Moving { index, .. } | Mode::Resizing { index, .. } => {
                self.mode = Mode::Selected(index);
                Outcome::Cancelled
            }
            Mode::Selected(_) => {
                self.mode = Mode::Idle;
                Outcome::Deselected
            }
            Mode::Idle => Outcome::Nothing,
        }
    }

    /// Select a box of the active image by index.
    pub fn select_box(&mut self, index: usize) -> bool {
        let exists = self
            .session
            .store()
            .is_some_and(|s| index < s.active_boxes().len());
        if !exists || self.mode.is_gesture() {
            return false;
        }
        self.mode = Mode::Selected(index);
        self.notify();
        true
    }

    /// Delete the selected box.
    pub fn delete_selected(&mut self) -> Result<Outcome> {
        let Mode::Selected(index) = self.mode else {
            return Ok(Outcome::Nothing);
        };
        self.snapshot();
        let removed = self.session.store_mut()?.remove_box(index)?;
        self.mode = Mode::Idle;
        log::info!("Deleted box {}", index);
        self.after_commit();
        self.notify();
        Ok(Outcome::Deleted(removed))
    }

    /// Remove every box of the active image.
    pub fn clear_all(&mut self) -> Result<usize> {
        if self.mode.is_gesture() {
            return Ok(0);
        }
        self.snapshot();
        let removed = self.session.store_mut()?.clear_all()?;
        self.mode = Mode::Idle;
        if removed > 0 {
            log::info!("Cleared {} boxes", removed);
            self.after_commit();
        }
        self.notify();
        Ok(removed)
    }

    /// Give the selected box another class.
    pub fn assign_class_to_selected(&mut self, class_id: u32) -> Result<bool> {
        let Mode::Selected(index) = self.mode else {
            return Ok(false);
        };
        if !self.session.registry().contains(class_id) {
            return Err(LabelerError::UnknownClass(class_id));
        }
        self.snapshot();
        self.session.store_mut()?.set_box_class(index, class_id)?;
        self.after_commit();
        self.notify();
        Ok(true)
    }

    pub fn select_class(&mut self, class_id: u32) -> Result<()> {
        if !self.session.registry().contains(class_id) {
            return Err(LabelerError::UnknownClass(class_id));
        }
        self.active_class = Some(class_id);
        self.notify();
        Ok(())
    }

    fn snapshot(&mut self) {
        let boxes = self
            .session
            .store()
            .map(|s| s.active_boxes().to_vec())
            .unwrap_or_default();
        self.history.push(boxes);
    }

    fn after_commit(&mut self) {
        if let Err(e) = self.session.after_commit() {
            log::error!("Auto-save failed: {}", e);
            self.save_error = Some(e);
        }
    }

    /// The auto-save failure since the last call, if any.
    pub fn take_save_error(&mut self) -> Option<LabelerError> {
        self.save_error.take()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<bool> {
        self.step_history(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.step_history(false)
    }

    fn step_history(&mut self, back: bool) -> Result<bool> {
        if self.mode.is_gesture() {
            return Ok(false);
        }
        let current = self
            .session
            .store()
            .map(|s| s.active_boxes().to_vec())
            .unwrap_or_default();
        let restored = if back {
            self.history.undo(current)
        } else {
            self.history.redo(current)
        };
        let Some(boxes) = restored else {
            return Ok(false);
        };
        self.session.store_mut()?.replace_boxes(boxes)?;
        self.mode = Mode::Idle;
        self.after_commit();
        self.notify();
        Ok(true)
    }

    /// Forget selection and history when the active image changes.
    fn reset(&mut self) {
        self.mode = Mode::Idle;
        self.history.clear();
    }

    pub fn open_directory(&mut self, dir: &Path) -> Result<usize> {
        self.reset();
        let count = self.session.open(dir)?;
        self.active_class = self.session.registry().at(0).map(|c| c.class_id);
        self.notify();
        Ok(count)
    }

    pub fn go_to(&mut self, index: usize) -> Result<bool> {
        let moved = self.session.go_to(index)?;
        Ok(self.navigated(moved))
    }

    pub fn next_image(&mut self) -> Result<bool> {
        let moved = self.session.next()?;
        Ok(self.navigated(moved))
    }

    pub fn previous_image(&mut self) -> Result<bool> {
        let moved = self.session.previous()?;
        Ok(self.navigated(moved))
    }

    fn navigated(&mut self, moved: bool) -> bool {
        if moved {
            self.reset();
            self.notify();
        }
        moved
    }

    pub fn save_all(&mut self) -> Result<()> {
        self.session.save_all()
    }

    /// Cancel any gesture and flush everything before exit.
    pub fn shutdown(&mut self) -> Result<()> {
        self.cancel();
        self.session.shutdown()
    }

    pub fn add_class(
        &mut self,
        name: &str,
        color: Option<Rgb>,
        explicit_id: Option<u32>,
    ) -> Result<ClassDefinition> {
        let def = self.session.add_class(name, color, explicit_id)?;
        if self.active_class.is_none() {
            self.active_class = Some(def.class_id);
        }
        self.notify();
        Ok(def)
    }

    pub fn remove_class(&mut self, class_id: u32) -> Result<ClassDefinition> {
        let def = self.session.remove_class(class_id)?;
        // Cascaded deletions shift indices and make old snapshots stale.
        self.reset();
        if self.active_class == Some(class_id) {
            self.active_class = self.session.registry().at(0).map(|c| c.class_id);
        }
        self.notify();
        Ok(def)
    }

    pub fn rename_class(&mut self, class_id: u32, name: &str) -> Result<()> {
        self.session.rename_class(class_id, name)?;
        self.notify();
        Ok(())
    }

    pub fn set_class_color(&mut self, class_id: u32, color: Rgb) -> Result<()> {
        self.session.set_class_color(class_id, color)?;
        self.notify();
        Ok(())
    }

    pub fn set_class_id(&mut self, class_id: u32, new_id: u32) -> Result<()> {
        self.session.set_class_id(class_id, new_id)?;
        self.history.clear();
        if self.active_class == Some(class_id) {
            self.active_class = Some(new_id);
        }
        self.notify();
        Ok(())
    }

    /// Replace all classes with a class list file.
    pub fn import_class_list(&mut self, path: &Path) -> Result<usize> {
        let count = self.session.import_class_list(path)?;
        self.reset();
        self.active_class = self.session.registry().at(0).map(|c| c.class_id);
        self.notify();
        Ok(count)
    }

    pub fn export_class_list(&self, path: &Path) -> Result<()> {
        self.session.export_class_list(path)
    }
}

#[cfg(test)]
impl Editor {
    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelerConfig;
    use crate::models::session::tests::dataset;
    use std::cell::Cell;
    use std::rc::Rc;

    fn editor(sizes: &[(u32, u32)]) -> (tempfile::TempDir, Editor) {
        let (dir, images) = dataset(sizes);
        let mut editor = Editor::new(Session::new(LabelerConfig::default()));
        editor.open_directory(&images).expect("open dataset");
        (dir, editor)
    }

    fn pt(x: f64, y: f64) -> CanvasPoint {
        CanvasPoint::new(x, y)
    }

    fn drag(editor: &mut Editor, from: CanvasPoint, to: CanvasPoint) -> Outcome {
        editor.handle(InputEvent::PointerDown(from)).unwrap();
        editor.handle(InputEvent::PointerMove(to)).unwrap();
        editor.handle(InputEvent::PointerUp(to)).unwrap()
    }

    fn boxes(editor: &Editor) -> Vec<BoundingBox> {
        editor.session().store().unwrap().active_boxes().to_vec()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn test_draw_creates_normalized_box() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        let outcome = drag(&mut ed, pt(100.0, 100.0), pt(300.0, 400.0));

        assert_eq!(outcome, Outcome::Created(0));
        assert_eq!(ed.mode(), Mode::Selected(0));
        let b = boxes(&ed)[0];
        assert_eq!(b.class_id, 0);
        assert_close(b.x_center, 0.25);
        assert_close(b.y_center, 0.4167);
        assert_close(b.width, 0.25);
        assert_close(b.height, 0.5);
    }

    #[test]
    fn test_draw_through_viewport_and_outside_image() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        ed.set_viewport(Viewport::new(0.5, 100.0, 50.0));

        // Ends far outside the image: clamped to the bottom-right corner.
        drag(&mut ed, pt(300.0, 200.0), pt(2000.0, 2000.0));
        let px = boxes(&ed)[0].to_pixels(ImageSize::new(800, 600));
        assert_close(px.x1, 400.0);
        assert_close(px.y1, 300.0);
        assert_close(px.x2, 800.0);
        assert_close(px.y2, 600.0);
    }

    #[test]
    fn test_small_drag_is_discarded() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        let outcome = drag(&mut ed, pt(100.0, 100.0), pt(101.0, 300.0));
        assert_eq!(outcome, Outcome::Discarded);
        assert!(boxes(&ed).is_empty());
        assert_eq!(ed.mode(), Mode::Idle);

        // A plain click is discarded the same way.
        ed.handle(InputEvent::PointerDown(pt(10.0, 10.0))).unwrap();
        assert_eq!(
            ed.handle(InputEvent::PointerUp(pt(10.0, 10.0))).unwrap(),
            Outcome::Discarded
        );
        assert!(boxes(&ed).is_empty());
    }

    #[test]
    fn test_move_preserves_size_and_clamps() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 400.0));

        let outcome = drag(&mut ed, pt(200.0, 200.0), pt(900.0, 250.0));
        assert_eq!(outcome, Outcome::Moved(0));
        let px = boxes(&ed)[0].to_pixels(ImageSize::new(800, 600));
        assert_close(px.x2, 800.0);
        assert_close(px.x1, 600.0);
        assert_close(px.y1, 150.0);
        assert_close(px.y2, 450.0);
    }

    #[test]
    fn test_resize_flip_through_anchor() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 400.0));

        // Drag the bottom-right corner past the top-left anchor.
        let outcome = drag(&mut ed, pt(300.0, 400.0), pt(50.0, 20.0));
        assert_eq!(outcome, Outcome::Resized(0));
        let px = boxes(&ed)[0].to_pixels(ImageSize::new(800, 600));
        assert_close(px.x1, 50.0);
        assert_close(px.y1, 20.0);
        assert_close(px.x2, 100.0);
        assert_close(px.y2, 100.0);
        assert!(boxes(&ed)[0].width > 0.0 && boxes(&ed)[0].height > 0.0);
    }

    #[test]
    fn test_resize_onto_anchor_keeps_min_size() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 400.0));

        drag(&mut ed, pt(300.0, 400.0), pt(100.0, 100.0));
        let px = boxes(&ed)[0].to_pixels(ImageSize::new(800, 600));
        assert_close(px.width(), 2.0);
        assert_close(px.height(), 2.0);
    }

    #[test]
    fn test_topmost_box_selected_on_overlap() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        drag(&mut ed, pt(500.0, 500.0), pt(550.0, 550.0));
        // Starts on empty space and ends over box 0.
        drag(&mut ed, pt(400.0, 400.0), pt(250.0, 250.0));
        ed.handle(InputEvent::KeyPress(Key::Escape)).unwrap();

        ed.handle(InputEvent::PointerDown(pt(280.0, 280.0))).unwrap();
        let outcome = ed.handle(InputEvent::PointerUp(pt(280.0, 280.0))).unwrap();
        assert_eq!(outcome, Outcome::Selected(2));
        assert_eq!(ed.selection(), Some(2));
    }

    #[test]
    fn test_click_empty_deselects() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        assert_eq!(ed.selection(), Some(0));

        assert_eq!(
            ed.handle(InputEvent::PointerDown(pt(600.0, 500.0))).unwrap(),
            Outcome::Deselected
        );
        ed.handle(InputEvent::PointerUp(pt(600.0, 500.0))).unwrap();
        assert_eq!(ed.mode(), Mode::Idle);
        assert_eq!(boxes(&ed).len(), 1);
    }

    #[test]
    fn test_escape_reverts_move() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        let before = boxes(&ed)[0];

        ed.handle(InputEvent::PointerDown(pt(200.0, 200.0))).unwrap();
        ed.handle(InputEvent::PointerMove(pt(400.0, 400.0))).unwrap();
        assert_eq!(
            ed.handle(InputEvent::KeyPress(Key::Escape)).unwrap(),
            Outcome::Cancelled
        );
        assert_eq!(ed.mode(), Mode::Selected(0));
        assert_eq!(
            ed.handle(InputEvent::PointerUp(pt(400.0, 400.0))).unwrap(),
            Outcome::Nothing
        );
        assert_eq!(boxes(&ed)[0], before);
    }

    #[test]
    fn test_escape_cancels_drawing() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        ed.handle(InputEvent::PointerDown(pt(100.0, 100.0))).unwrap();
        ed.handle(InputEvent::PointerMove(pt(300.0, 300.0))).unwrap();
        ed.handle(InputEvent::KeyPress(Key::Escape)).unwrap();
        ed.handle(InputEvent::PointerUp(pt(300.0, 300.0))).unwrap();
        assert!(boxes(&ed).is_empty());
        assert_eq!(ed.mode(), Mode::Idle);
    }

    #[test]
    fn test_delete_key_and_undo() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        drag(&mut ed, pt(400.0, 400.0), pt(500.0, 500.0));

        let outcome = ed.handle(InputEvent::KeyPress(Key::Delete)).unwrap();
        assert!(matches!(outcome, Outcome::Deleted(_)));
        assert_eq!(ed.mode(), Mode::Idle);
        assert_eq!(boxes(&ed).len(), 1);

        assert!(ed.undo().unwrap());
        assert_eq!(boxes(&ed).len(), 2);
        assert!(ed.redo().unwrap());
        assert_eq!(boxes(&ed).len(), 1);
    }

    #[test]
    fn test_select_class_key_sets_new_box_class() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        assert_eq!(
            ed.handle(InputEvent::KeyPress(Key::SelectClass(2))).unwrap(),
            Outcome::ClassSelected(2)
        );
        assert_eq!(
            ed.handle(InputEvent::KeyPress(Key::SelectClass(9))).unwrap(),
            Outcome::Nothing
        );
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        assert_eq!(boxes(&ed)[0].class_id, 2);

        ed.assign_class_to_selected(1).unwrap();
        assert_eq!(boxes(&ed)[0].class_id, 1);
    }

    #[test]
    fn test_handle_radius_scales_with_viewport() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        ed.set_viewport(Viewport::new(0.5, 0.0, 0.0));
        // Image rect (100,100)-(300,300) is canvas (50,50)-(150,150).
        drag(&mut ed, pt(50.0, 50.0), pt(150.0, 150.0));

        // 6 canvas px from the corner is within the 8 px radius.
        assert_eq!(ed.hit_at(pt(156.0, 156.0)), Hit::Handle(0, Handle::BottomRight));
        assert_eq!(ed.hit_at(pt(160.0, 160.0)), Hit::Empty);
    }

    #[test]
    fn test_auto_save_failure_is_kept_for_reporting() {
        let (dir, images) = dataset(&[(800, 600)]);
        // A file where the labels directory should be makes every write fail.
        std::fs::write(dir.path().join("labels"), b"").unwrap();
        let config = LabelerConfig {
            auto_save: true,
            ..Default::default()
        };
        let mut ed = Editor::new(Session::new(config));
        ed.open_directory(&images).unwrap();

        let outcome = drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        assert_eq!(outcome, Outcome::Created(0));
        assert!(matches!(ed.take_save_error(), Some(LabelerError::Io(_))));
        assert!(ed.take_save_error().is_none());
        assert_eq!(ed.session().store().unwrap().dirty_count(), 1);
    }

    #[test]
    fn test_import_class_list_resets_editor() {
        let (dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        let list = dir.path().join("names.txt");
        std::fs::write(&list, "\ntree\nrock\n").unwrap();

        assert_eq!(ed.import_class_list(&list).unwrap(), 2);
        assert_eq!(ed.active_class(), Some(1));
        assert_eq!(ed.mode(), Mode::Idle);
        assert!(!ed.can_undo());

        // The box drawn with class 0 was saved and is now unknown.
        let set = ed.session().store().unwrap().active().unwrap();
        assert_eq!(set.boxes.len(), 1);
        assert!(matches!(
            set.issues[..],
            [LabelerError::Referential { class_id: 0, .. }]
        ));
    }

    #[test]
    fn test_remove_class_clears_selection_and_boxes() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        ed.handle(InputEvent::KeyPress(Key::SelectClass(1))).unwrap();
        drag(&mut ed, pt(400.0, 400.0), pt(500.0, 500.0));

        ed.remove_class(1).unwrap();
        assert_eq!(ed.mode(), Mode::Idle);
        assert_eq!(ed.active_class(), Some(0));
        assert!(boxes(&ed).iter().all(|b| b.class_id != 1));
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_redraw_listener_fires_on_changes_only() {
        let (_dir, mut ed) = editor(&[(800, 600)]);
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        ed.set_listener(move || c.set(c.get() + 1));

        ed.handle(InputEvent::PointerMove(pt(10.0, 10.0))).unwrap();
        assert_eq!(count.get(), 0);

        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_navigation_resets_selection_and_saves() {
        let (dir, mut ed) = editor(&[(800, 600), (800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));

        assert!(ed.next_image().unwrap());
        assert_eq!(ed.mode(), Mode::Idle);
        assert!(!ed.can_undo());
        assert!(dir.path().join("labels").join("img0.txt").exists());
    }

    #[test]
    fn test_go_to_jumps_and_ignores_bad_index() {
        let (dir, mut ed) = editor(&[(800, 600), (64, 32), (800, 600)]);
        drag(&mut ed, pt(100.0, 100.0), pt(300.0, 300.0));

        assert!(!ed.go_to(3).unwrap());
        assert!(!ed.go_to(0).unwrap());
        assert_eq!(ed.selection(), Some(0));

        assert!(ed.go_to(2).unwrap());
        assert_eq!(ed.session().current_index(), Some(2));
        assert_eq!(ed.mode(), Mode::Idle);
        assert!(dir.path().join("labels").join("img0.txt").exists());
    }

    #[test]
    fn test_events_without_image_are_ignored() {
        let mut ed = Editor::new(Session::new(LabelerConfig::default()));
        assert_eq!(
            ed.handle(InputEvent::PointerDown(pt(1.0, 1.0))).unwrap(),
            Outcome::Nothing
        );
        assert_eq!(
            ed.handle(InputEvent::PointerUp(pt(1.0, 1.0))).unwrap(),
            Outcome::Nothing
        );
    }
}
