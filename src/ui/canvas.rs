// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image canvas.
//!
//! Shows the active image scaled to fit, paints the box overlay on top and
//! turns egui pointer interaction into editor input events.

use crate::editor::handles::{Handle, Hit};
use crate::editor::{Editor, InputEvent};
use crate::models::classes::Rgb;
use crate::render::{build_overlay, Overlay};
use crate::util::geometry::{CanvasPoint, CanvasRect};

fn to_color(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

fn to_rect(r: CanvasRect) -> egui::Rect {
    egui::Rect::from_min_max(
        egui::pos2(r.min.x as f32, r.min.y as f32),
        egui::pos2(r.max.x as f32, r.max.y as f32),
    )
}

fn to_point(p: egui::Pos2) -> CanvasPoint {
    CanvasPoint::new(p.x as f64, p.y as f64)
}

/// Display the canvas and collect the pointer events of this frame.
pub fn show(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    texture: Option<&egui::TextureHandle>,
) -> Vec<InputEvent> {
    let mut events = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    ui.painter().rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    if !editor.session().is_open() {
        welcome(ui, rect, "Open an image directory to begin labeling");
        return events;
    }
    if editor.session().images().is_empty() {
        welcome(ui, rect, "No images found in this directory");
        return events;
    }

    let display =
        CanvasRect::from_min_size(to_point(rect.min), rect.width() as f64, rect.height() as f64);
    let Some(overlay) = editor.fit_to_display(display).and_then(|_| build_overlay(editor)) else {
        welcome(ui, rect, "This image cannot be read");
        return events;
    };

    let painter = ui.painter_at(rect);
    if let Some(texture) = texture {
        painter.image(
            texture.id(),
            to_rect(overlay.image_rect),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
    paint_overlay(&painter, &overlay);

    if response.drag_started() {
        if let Some(pos) = ui.input(|i| i.pointer.press_origin()) {
            events.push(InputEvent::PointerDown(to_point(pos)));
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(InputEvent::PointerMove(to_point(pos)));
        }
    }
    if response.drag_stopped() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(InputEvent::PointerUp(to_point(pos)));
        }
    }
    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(InputEvent::PointerDown(to_point(pos)));
            events.push(InputEvent::PointerUp(to_point(pos)));
        }
    }

    if let Some(pos) = response.hover_pos() {
        ui.ctx().set_cursor_icon(cursor_for(editor.hit_at(to_point(pos))));
    }

    events
}

fn cursor_for(hit: Hit) -> egui::CursorIcon {
    match hit {
        Hit::Handle(_, Handle::TopLeft | Handle::BottomRight) => egui::CursorIcon::ResizeNwSe,
        Hit::Handle(_, Handle::TopRight | Handle::BottomLeft) => egui::CursorIcon::ResizeNeSw,
        Hit::Handle(_, Handle::Top | Handle::Bottom) => egui::CursorIcon::ResizeVertical,
        Hit::Handle(_, Handle::Left | Handle::Right) => egui::CursorIcon::ResizeHorizontal,
        Hit::Body(_) => egui::CursorIcon::Move,
        Hit::Empty => egui::CursorIcon::Crosshair,
    }
}

fn paint_overlay(painter: &egui::Painter, overlay: &Overlay) {
    let font = egui::FontId::proportional(13.0);

    for b in &overlay.boxes {
        let rect = to_rect(b.rect);
        let color = to_color(b.color);
        let width = if b.selected { 3.0 } else { 2.0 };
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(width, color));
        if !b.known_class {
            painter.rect_filled(rect, 0.0, color.gamma_multiply(0.15));
        }

        // Label tag above the top-left corner
        let text_color = if b.color.is_dark() {
            egui::Color32::WHITE
        } else {
            egui::Color32::BLACK
        };
        let galley = painter.layout_no_wrap(b.label.clone(), font.clone(), text_color);
        let tag = egui::Rect::from_min_size(
            rect.left_top() - egui::vec2(0.0, galley.size().y + 2.0),
            galley.size() + egui::vec2(6.0, 2.0),
        );
        painter.rect_filled(tag, 2.0, color);
        painter.galley(tag.min + egui::vec2(3.0, 1.0), galley, text_color);
    }

    for handle in &overlay.handles {
        let rect = to_rect(*handle);
        painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
    }

    if let Some((rect, color)) = overlay.preview {
        painter.rect_stroke(to_rect(rect), 0.0, egui::Stroke::new(2.0, to_color(color)));
    }
}

fn welcome(ui: &egui::Ui, rect: egui::Rect, hint: &str) {
    let painter = ui.painter_at(rect);
    painter.text(
        rect.center() - egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        "YOLO Labeler",
        egui::FontId::proportional(32.0),
        egui::Color32::from_gray(200),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 16.0),
        egui::Align2::CENTER_CENTER,
        hint,
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(160),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 40.0),
        egui::Align2::CENTER_CENTER,
        "File → Open Directory...",
        egui::FontId::proportional(12.0),
        egui::Color32::from_gray(130),
    );
}
