// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! What the canvas paints.
//!
//! The editor never draws. After each state change it tells its
//! [`RedrawListener`] that a frame is due, and the chrome asks for an
//! [`Overlay`] describing the boxes, handles and preview in canvas space.

use crate::editor::handles::Handle;
use crate::editor::{Editor, Mode};
use crate::models::classes::Rgb;
use crate::util::geometry::{image_to_canvas, pixel_rect_to_canvas, CanvasRect, ImagePoint, PixelRect};

/// Color of boxes whose class id is not in the registry.
pub const UNKNOWN_CLASS_COLOR: Rgb = Rgb::new(0x80, 0x80, 0x80);

/// Half the side of a painted handle square, in canvas pixels.
pub const HANDLE_HALF_SIZE: f64 = 4.0;

/// Receives a notification whenever the editor state changed.
pub trait RedrawListener {
    fn on_frame_needs_redraw(&mut self);
}

impl<F: FnMut()> RedrawListener for F {
    fn on_frame_needs_redraw(&mut self) {
        self()
    }
}

/// One box as painted.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxOverlay {
    pub index: usize,
    pub rect: CanvasRect,
    pub color: Rgb,
    pub label: String,
    pub selected: bool,
    /// False when the box carries an id missing from the registry
    pub known_class: bool,
}

/// Everything drawn on top of the image for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub image_rect: CanvasRect,
    /// Boxes in paint order (last is topmost)
    pub boxes: Vec<BoxOverlay>,
    /// Handle squares of the selected box
    pub handles: Vec<CanvasRect>,
    /// Box being drawn, with the active class color
    pub preview: Option<(CanvasRect, Rgb)>,
}

/// Build the overlay for the active image, or `None` if nothing is editable.
pub fn build_overlay(editor: &Editor) -> Option<Overlay> {
    let session = editor.session();
    let size = session.image_size()?;
    let store = session.store()?;
    let viewport = editor.viewport();
    let registry = session.registry();
    let mode = editor.mode();

    // The box under a move or resize is shown at its in-progress geometry.
    let in_progress = match mode {
        Mode::Moving { index, current, .. } | Mode::Resizing { index, current, .. } => {
            Some((index, current))
        }
        _ => None,
    };
    let selected = mode.selection();

    let mut selected_rect: Option<PixelRect> = None;
    let boxes: Vec<BoxOverlay> = store
        .active_boxes()
        .iter()
        .enumerate()
        .map(|(index, b)| {
            let pixels = match in_progress {
                Some((i, current)) if i == index => current,
                _ => b.to_pixels(size),
            };
            let is_selected = selected == Some(index);
            if is_selected {
                selected_rect = Some(pixels);
            }
            let (color, label, known_class) = match registry.get(b.class_id) {
                Some(c) => (c.color, c.name.clone(), true),
                None => (UNKNOWN_CLASS_COLOR, format!("unknown ({})", b.class_id), false),
            };
            BoxOverlay {
                index,
                rect: pixel_rect_to_canvas(pixels, viewport),
                color,
                label,
                selected: is_selected,
                known_class,
            }
        })
        .collect();

    let handles = selected_rect
        .map(|rect| {
            Handle::ALL
                .iter()
                .map(|h| {
                    let center = image_to_canvas(h.position(rect), viewport);
                    CanvasRect::around(center, HANDLE_HALF_SIZE)
                })
                .collect()
        })
        .unwrap_or_default();

    let preview = match mode {
        Mode::Drawing { anchor, current } => {
            let color = editor
                .active_class()
                .and_then(|id| registry.get(id))
                .map(|c| c.color)
                .unwrap_or(UNKNOWN_CLASS_COLOR);
            Some((
                pixel_rect_to_canvas(PixelRect::from_corners(anchor, current), viewport),
                color,
            ))
        }
        _ => None,
    };

    let image_rect = CanvasRect {
        min: image_to_canvas(ImagePoint::new(0.0, 0.0), viewport),
        max: image_to_canvas(
            ImagePoint::new(size.width as f64, size.height as f64),
            viewport,
        ),
    };

    Some(Overlay {
        image_rect,
        boxes,
        handles,
        preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelerConfig;
    use crate::editor::InputEvent;
    use crate::models::session::tests::dataset;
    use crate::models::session::Session;
    use crate::util::geometry::{CanvasPoint, Viewport};

    fn pt(x: f64, y: f64) -> CanvasPoint {
        CanvasPoint::new(x, y)
    }

    #[test]
    fn test_no_overlay_without_image() {
        let editor = Editor::new(Session::new(LabelerConfig::default()));
        assert!(build_overlay(&editor).is_none());
    }

    #[test]
    fn test_selected_box_has_handles() {
        let (_dir, images) = dataset(&[(800, 600)]);
        let mut editor = Editor::new(Session::new(LabelerConfig::default()));
        editor.open_directory(&images).unwrap();
        editor.set_viewport(Viewport::new(0.5, 10.0, 20.0));

        editor.handle(InputEvent::PointerDown(pt(60.0, 70.0))).unwrap();
        editor.handle(InputEvent::PointerMove(pt(160.0, 170.0))).unwrap();

        let overlay = build_overlay(&editor).unwrap();
        let (preview, color) = overlay.preview.unwrap();
        assert_eq!(color, Rgb::new(0xFF, 0x00, 0x00));
        assert!((preview.width() - 100.0).abs() < 1e-9);
        assert!(overlay.boxes.is_empty());

        editor.handle(InputEvent::PointerUp(pt(160.0, 170.0))).unwrap();
        let overlay = build_overlay(&editor).unwrap();
        assert!(overlay.preview.is_none());
        assert_eq!(overlay.boxes.len(), 1);
        assert!(overlay.boxes[0].selected);
        assert_eq!(overlay.boxes[0].label, "person");
        assert_eq!(overlay.handles.len(), 8);
        assert_eq!(overlay.image_rect.min, pt(10.0, 20.0));
        assert_eq!(overlay.image_rect.max, pt(410.0, 320.0));
    }

    #[test]
    fn test_moving_box_drawn_at_current_position() {
        let (_dir, images) = dataset(&[(800, 600)]);
        let mut editor = Editor::new(Session::new(LabelerConfig::default()));
        editor.open_directory(&images).unwrap();
        editor.handle(InputEvent::PointerDown(pt(100.0, 100.0))).unwrap();
        editor.handle(InputEvent::PointerUp(pt(200.0, 200.0))).unwrap();

        editor.handle(InputEvent::PointerDown(pt(150.0, 150.0))).unwrap();
        editor.handle(InputEvent::PointerMove(pt(250.0, 160.0))).unwrap();

        let overlay = build_overlay(&editor).unwrap();
        let rect = overlay.boxes[0].rect;
        assert!((rect.min.x - 200.0).abs() < 1e-6);
        assert!((rect.min.y - 110.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_class_uses_placeholder() {
        let (dir, images) = dataset(&[(100, 100)]);
        let labels = dir.path().join("labels");
        std::fs::create_dir(&labels).unwrap();
        std::fs::write(labels.join("img0.txt"), "7 0.5 0.5 0.2 0.2\n").unwrap();

        let mut editor = Editor::new(Session::new(LabelerConfig::default()));
        editor.open_directory(&images).unwrap();

        let overlay = build_overlay(&editor).unwrap();
        assert_eq!(overlay.boxes.len(), 1);
        assert!(!overlay.boxes[0].known_class);
        assert_eq!(overlay.boxes[0].color, UNKNOWN_CLASS_COLOR);
        assert_eq!(overlay.boxes[0].label, "unknown (7)");
    }
}
