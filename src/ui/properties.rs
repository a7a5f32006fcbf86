// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel with the class list, the boxes of the active image and any
//! problems found when its label file was read.

use crate::editor::Editor;
use crate::models::classes::Rgb;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    SelectClass(u32),
    AddClass(String),
    RemoveClass(u32),
    RenameClass(u32, String),
    SetClassColor(u32, Rgb),
    SetClassId(u32, u32),
    SelectBox(usize),
    AssignClass(u32),
    DeleteSelected,
    ClearAll,
}

/// Text fields that live across frames.
#[derive(Default)]
pub struct PropertiesState {
    new_class: String,
    /// Class being renamed and the edited name
    renaming: Option<(u32, String)>,
    /// Class whose id is being edited and the pending id
    editing_id: Option<(u32, u32)>,
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, editor: &Editor, state: &mut PropertiesState) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.heading("Classes");
        ui.separator();
        classes_section(ui, editor, state, &mut action);

        ui.add_space(12.0);
        ui.heading("Boxes");
        ui.separator();
        boxes_section(ui, editor, &mut action);

        issues_section(ui, editor);
    });

    action
}

fn classes_section(
    ui: &mut egui::Ui,
    editor: &Editor,
    state: &mut PropertiesState,
    action: &mut PropertiesAction,
) {
    let registry = editor.session().registry();

    for class in registry.iter() {
        let id = class.class_id;
        ui.horizontal(|ui| {
            let mut rgb = [class.color.r, class.color.g, class.color.b];
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                *action = PropertiesAction::SetClassColor(id, Rgb::new(rgb[0], rgb[1], rgb[2]));
            }

            match state.editing_id.as_mut() {
                Some((editing, pending)) if *editing == id => {
                    ui.add(egui::DragValue::new(pending));
                    if ui.small_button("✔").clicked() {
                        *action = PropertiesAction::SetClassId(id, *pending);
                        state.editing_id = None;
                    }
                }
                _ => {
                    if ui
                        .small_button(format!("[{}]", id))
                        .on_hover_text("Change class id")
                        .clicked()
                    {
                        state.editing_id = Some((id, id));
                    }
                }
            }

            match state.renaming.as_mut() {
                Some((renaming, name)) if *renaming == id => {
                    let response = ui.text_edit_singleline(name);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        *action = PropertiesAction::RenameClass(id, name.clone());
                        state.renaming = None;
                    }
                }
                _ => {
                    let is_active = editor.active_class() == Some(id);
                    let response = ui.selectable_label(is_active, class.name.as_str());
                    if response.clicked() {
                        *action = PropertiesAction::SelectClass(id);
                    }
                    if response.double_clicked() {
                        state.renaming = Some((id, class.name.clone()));
                    }
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("🗑").on_hover_text("Remove class and its boxes").clicked() {
                    *action = PropertiesAction::RemoveClass(id);
                }
            });
        });
    }

    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.new_class)
                .hint_text("New class")
                .desired_width(140.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.button("Add").clicked() || submitted) && !state.new_class.trim().is_empty() {
            *action = PropertiesAction::AddClass(std::mem::take(&mut state.new_class));
        }
    });
}

fn boxes_section(ui: &mut egui::Ui, editor: &Editor, action: &mut PropertiesAction) {
    let session = editor.session();
    let Some(store) = session.store() else {
        ui.label(egui::RichText::new("No image").weak());
        return;
    };
    let boxes = store.active_boxes();
    if boxes.is_empty() {
        ui.label(egui::RichText::new("No boxes").weak());
        return;
    }

    let registry = session.registry();
    for (index, b) in boxes.iter().enumerate() {
        let name = registry
            .get(b.class_id)
            .map(|c| c.name.as_str())
            .unwrap_or("unknown");
        let text = format!(
            "{}: [{}] {}  ({:.3}, {:.3})",
            index + 1,
            b.class_id,
            name,
            b.x_center,
            b.y_center
        );
        if ui.selectable_label(editor.selection() == Some(index), text).clicked() {
            *action = PropertiesAction::SelectBox(index);
        }
    }

    ui.add_space(6.0);
    if let Some(index) = editor.selection() {
        let current = boxes.get(index).map(|b| b.class_id);
        ui.horizontal(|ui| {
            ui.label("Class:");
            egui::ComboBox::from_id_source("box_class")
                .selected_text(
                    current
                        .and_then(|id| registry.get(id))
                        .map(|c| c.name.as_str())
                        .unwrap_or("unknown"),
                )
                .show_ui(ui, |ui| {
                    for class in registry.iter() {
                        if ui
                            .selectable_label(current == Some(class.class_id), class.name.as_str())
                            .clicked()
                        {
                            *action = PropertiesAction::AssignClass(class.class_id);
                        }
                    }
                });
        });
    }

    ui.horizontal(|ui| {
        if ui
            .add_enabled(editor.selection().is_some(), egui::Button::new("Delete Selected"))
            .clicked()
        {
            *action = PropertiesAction::DeleteSelected;
        }
        if ui.button("Clear All").clicked() {
            *action = PropertiesAction::ClearAll;
        }
    });
}

fn issues_section(ui: &mut egui::Ui, editor: &Editor) {
    let Some(set) = editor.session().store().and_then(|s| s.active()) else {
        return;
    };
    if set.issues.is_empty() {
        return;
    }

    ui.add_space(12.0);
    ui.heading("Label file problems");
    ui.separator();
    if set.unparsable {
        ui.colored_label(
            egui::Color32::from_rgb(230, 120, 40),
            "The label file is corrupt and will be overwritten on the next edit.",
        );
    }
    for issue in &set.issues {
        ui.label(egui::RichText::new(issue.to_string()).small());
    }
}
