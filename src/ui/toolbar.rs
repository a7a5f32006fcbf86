// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Navigation bar and active class selection.

use crate::editor::Editor;

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    Previous,
    Next,
    /// Jump to the image at this index
    GoTo(usize),
    Save,
    SelectClass(u32),
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, editor: &Editor) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let session = editor.session();
    let count = session.images().len();
    let index = session.current_index();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let has_previous = index.is_some_and(|i| i > 0);
        let has_next = index.is_some_and(|i| i + 1 < count);
        if ui.add_enabled(has_previous, egui::Button::new("◀ Prev")).clicked() {
            action = ToolbarAction::Previous;
        }
        if ui.add_enabled(has_next, egui::Button::new("Next ▶")).clicked() {
            action = ToolbarAction::Next;
        }

        match (index, session.current_image()) {
            (Some(i), Some(path)) => {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                let modified = session
                    .store()
                    .and_then(|s| s.active())
                    .is_some_and(|set| set.is_dirty());
                let marker = if modified { " *" } else { "" };
                let mut number = i + 1;
                let jump = ui.add(egui::DragValue::new(&mut number).speed(0.1));
                if jump.changed() {
                    let target = number.clamp(1, count) - 1;
                    if target != i {
                        action = ToolbarAction::GoTo(target);
                    }
                }
                ui.label(format!("/{}  {}{}", count, name, marker));
            }
            _ => {
                ui.label(egui::RichText::new("No image").weak());
            }
        }

        ui.separator();

        ui.label("Class:");
        let registry = session.registry();
        let active = editor.active_class().and_then(|id| registry.get(id));
        let selected_text = active
            .map(|c| format!("[{}] {}", c.class_id, c.name))
            .unwrap_or_else(|| "none".to_string());
        egui::ComboBox::from_id_source("active_class")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (position, class) in registry.iter().enumerate() {
                    let text = if position < 9 {
                        format!("{}: [{}] {}", position + 1, class.class_id, class.name)
                    } else {
                        format!("[{}] {}", class.class_id, class.name)
                    };
                    let is_active = editor.active_class() == Some(class.class_id);
                    if ui.selectable_label(is_active, text).clicked() {
                        action = ToolbarAction::SelectClass(class.class_id);
                    }
                }
            });

        ui.separator();

        let dirty = session.store().map(|s| s.dirty_count()).unwrap_or(0);
        if ui.add_enabled(dirty > 0, egui::Button::new("💾 Save")).clicked() {
            action = ToolbarAction::Save;
        }
        if dirty > 0 {
            ui.label(egui::RichText::new(format!("{} unsaved", dirty)).italics());
        }

        ui.separator();
        ui.label(
            egui::RichText::new("Drag to draw, drag a box to move, drag a handle to resize")
                .italics()
                .weak(),
        );
    });

    action
}
