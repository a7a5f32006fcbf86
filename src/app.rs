// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the [`Editor`] and is only glue: it forwards menu, keyboard
//! and canvas input to the editor, keeps a texture for the displayed image
//! and reports failures in the status bar.

use crate::config::LabelerConfig;
use crate::editor::{Editor, InputEvent, Key};
use crate::error::Result;
use crate::io::classes::CLASS_LIST_FILE;
use crate::io::media::load_image;
use crate::models::session::Session;
use crate::ui::{canvas, properties, toolbar};
use std::path::{Path, PathBuf};

const CLASS_KEYS: [egui::Key; 9] = [
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

const SHORTCUTS: [(&str, &str); 10] = [
    ("Drag", "Draw a box, or move / resize the box under the pointer"),
    ("Click", "Select the topmost box"),
    ("1-9", "Select the active class"),
    ("Delete", "Delete the selected box"),
    ("Escape", "Cancel the current drag or clear the selection"),
    ("← / →", "Previous / next image"),
    ("Ctrl+S", "Save"),
    ("Ctrl+Z", "Undo"),
    ("Ctrl+Y", "Redo"),
    ("Ctrl+Shift+Z", "Redo"),
];

/// Main application state.
pub struct LabelerApp {
    editor: Editor,

    /// Texture of the displayed image
    texture: Option<egui::TextureHandle>,

    /// Image the texture was loaded for (also set when loading failed)
    texture_source: Option<PathBuf>,

    /// Text fields of the properties panel
    properties: properties::PropertiesState,

    /// Last error, shown in the status bar
    status: Option<String>,

    /// A save failed on close; the next close request exits anyway
    close_despite_errors: bool,

    show_help: bool,
}

impl LabelerApp {
    /// Create the application; repaints are requested whenever the editor changes.
    pub fn new(cc: &eframe::CreationContext<'_>, config: LabelerConfig) -> Self {
        let mut editor = Editor::new(Session::new(config));
        let ctx = cc.egui_ctx.clone();
        editor.set_listener(move || ctx.request_repaint());

        Self {
            editor,
            texture: None,
            texture_source: None,
            properties: properties::PropertiesState::default(),
            status: None,
            close_despite_errors: false,
            show_help: false,
        }
    }

    /// Log and display a failed operation.
    fn report<T>(&mut self, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("{}: {}", what, e);
                self.status = Some(format!("{}: {}", what, e));
                None
            }
        }
    }

    fn open_directory(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        let result = self.editor.open_directory(&dir);
        if let Some(count) = self.report("Cannot open directory", result) {
            self.status = None;
            log::info!("{} images in {}", count, dir.display());
        }
    }

    fn import_classes(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Class list", &["txt"])
            .pick_file()
        else {
            return;
        };
        let result = self.editor.import_class_list(&path);
        if let Some(count) = self.report("Cannot import classes", result) {
            self.status = Some(format!("Imported {} classes from {}", count, path.display()));
        }
    }

    fn export_classes(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Class list", &["txt"])
            .set_file_name(CLASS_LIST_FILE);
        if let Some(store) = self.editor.session().store() {
            dialog = dialog.set_directory(&store.layout().image_dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        let result = self.editor.export_class_list(&path);
        if self.report("Cannot export classes", result).is_some() {
            self.status = Some(format!("Exported classes to {}", path.display()));
        }
    }

    fn save(&mut self) {
        let result = self.editor.save_all();
        if self.report("Save failed", result).is_some() {
            self.status = Some("Saved".to_string());
        }
    }

    fn navigate(&mut self, forward: bool) {
        let result = if forward {
            self.editor.next_image()
        } else {
            self.editor.previous_image()
        };
        self.report("Cannot leave image", result);
    }

    fn go_to(&mut self, index: usize) {
        let result = self.editor.go_to(index);
        self.report("Cannot leave image", result);
    }

    /// Show a failed auto-save from the last edit.
    fn report_save_error(&mut self) {
        if let Some(e) = self.editor.take_save_error() {
            self.report::<()>("Auto-save failed", Err(e));
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let result = self.editor.handle(event);
        self.report("Edit failed", result);
    }

    fn undo(&mut self) {
        let result = self.editor.undo();
        self.report("Undo failed", result);
    }

    fn redo(&mut self) {
        let result = self.editor.redo();
        self.report("Redo failed", result);
    }

    /// Load the texture when the displayed image changed.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let current = self.editor.session().current_image().map(Path::to_path_buf);
        if current == self.texture_source {
            return;
        }
        self.texture = None;
        if let Some(path) = current.as_deref() {
            match load_image(path) {
                Ok(img) => {
                    let size = [img.width as usize, img.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &img.pixels);
                    self.texture = Some(ctx.load_texture(
                        "current_image",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
                Err(e) => {
                    log::error!("Failed to load {}: {}", path.display(), e);
                    self.status = Some(format!("Cannot display {}: {}", path.display(), e));
                }
            }
        }
        self.texture_source = current;
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Typing in a text field must not edit boxes.
        if ctx.wants_keyboard_input() {
            return;
        }

        let command = ctx.input(|i| i.modifiers.command);
        let shift = ctx.input(|i| i.modifiers.shift);
        let pressed = |key: egui::Key| ctx.input(|i| i.key_pressed(key));

        if pressed(egui::Key::ArrowRight) {
            self.navigate(true);
        }
        if pressed(egui::Key::ArrowLeft) {
            self.navigate(false);
        }
        if command && pressed(egui::Key::S) {
            self.save();
        }
        if command && !shift && pressed(egui::Key::Z) {
            self.undo();
        }
        if command && ((shift && pressed(egui::Key::Z)) || pressed(egui::Key::Y)) {
            self.redo();
        }
        if pressed(egui::Key::Delete) || pressed(egui::Key::Backspace) {
            self.dispatch(InputEvent::KeyPress(Key::Delete));
        }
        if pressed(egui::Key::Escape) {
            self.dispatch(InputEvent::KeyPress(Key::Escape));
        }
        if !command {
            for (position, key) in CLASS_KEYS.iter().enumerate() {
                if pressed(*key) {
                    self.dispatch(InputEvent::KeyPress(Key::SelectClass(position)));
                }
            }
        }
    }

    fn apply_toolbar(&mut self, action: toolbar::ToolbarAction) {
        match action {
            toolbar::ToolbarAction::Previous => self.navigate(false),
            toolbar::ToolbarAction::Next => self.navigate(true),
            toolbar::ToolbarAction::GoTo(index) => self.go_to(index),
            toolbar::ToolbarAction::Save => self.save(),
            toolbar::ToolbarAction::SelectClass(id) => {
                let result = self.editor.select_class(id);
                self.report("Cannot select class", result);
            }
            toolbar::ToolbarAction::None => {}
        }
    }

    fn apply_properties(&mut self, action: properties::PropertiesAction) {
        use properties::PropertiesAction;

        match action {
            PropertiesAction::SelectClass(id) => {
                let result = self.editor.select_class(id);
                self.report("Cannot select class", result);
            }
            PropertiesAction::AddClass(name) => {
                let result = self.editor.add_class(&name, None, None);
                self.report("Cannot add class", result);
            }
            PropertiesAction::RemoveClass(id) => {
                let result = self.editor.remove_class(id);
                self.report("Cannot remove class", result);
            }
            PropertiesAction::RenameClass(id, name) => {
                let result = self.editor.rename_class(id, &name);
                self.report("Cannot rename class", result);
            }
            PropertiesAction::SetClassColor(id, color) => {
                let result = self.editor.set_class_color(id, color);
                self.report("Cannot change color", result);
            }
            PropertiesAction::SetClassId(id, new_id) => {
                let result = self.editor.set_class_id(id, new_id);
                self.report("Cannot change class id", result);
            }
            PropertiesAction::SelectBox(index) => {
                self.editor.select_box(index);
            }
            PropertiesAction::AssignClass(id) => {
                let result = self.editor.assign_class_to_selected(id);
                self.report("Cannot change box class", result);
            }
            PropertiesAction::DeleteSelected => {
                let result = self.editor.delete_selected();
                self.report("Delete failed", result);
            }
            PropertiesAction::ClearAll => {
                let result = self.editor.clear_all();
                self.report("Clear failed", result);
            }
            PropertiesAction::None => {}
        }
    }

    /// Save everything when the window is closed.
    ///
    /// A failed save keeps the window open once so nothing is lost silently.
    fn handle_close(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) || self.close_despite_errors {
            return;
        }
        let result = self.editor.shutdown();
        if self.report("Save on exit failed", result).is_none() {
            self.close_despite_errors = true;
            self.status = self
                .status
                .take()
                .map(|s| format!("{} (close again to discard unsaved changes)", s));
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        }
    }
}

impl eframe::App for LabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_close(ctx);
        self.sync_texture(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Directory...").clicked() {
                        self.open_directory();
                        ui.close_menu();
                    }
                    let is_open = self.editor.session().is_open();
                    if ui.add_enabled(is_open, egui::Button::new("Save (Ctrl+S)")).clicked() {
                        self.save();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Import Classes...").clicked() {
                        self.import_classes();
                        ui.close_menu();
                    }
                    if ui.button("Export classes.txt...").clicked() {
                        self.export_classes();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let can_undo = self.editor.can_undo();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.undo();
                        ui.close_menu();
                    }
                    let can_redo = self.editor.can_redo();
                    if ui.add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Y)")).clicked() {
                        self.redo();
                        ui.close_menu();
                    }

                    ui.separator();

                    let has_selection = self.editor.selection().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        let result = self.editor.delete_selected();
                        self.report("Delete failed", result);
                        ui.close_menu();
                    }
                    if ui.button("Clear All Boxes").clicked() {
                        let result = self.editor.clear_all();
                        self.report("Clear failed", result);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Navigate", |ui| {
                    if ui.button("Previous Image (←)").clicked() {
                        self.navigate(false);
                        ui.close_menu();
                    }
                    if ui.button("Next Image (→)").clicked() {
                        self.navigate(true);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("Keyboard Shortcuts").clicked() {
                        self.show_help = true;
                        ui.close_menu();
                    }
                });
            });
        });

        egui::Window::new("Keyboard Shortcuts")
            .open(&mut self.show_help)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                egui::Grid::new("shortcuts").striped(true).show(ui, |ui| {
                    for (keys, action) in SHORTCUTS {
                        ui.label(egui::RichText::new(keys).monospace());
                        ui.label(action);
                        ui.end_row();
                    }
                });
            });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.editor))
            .inner;
        self.apply_toolbar(toolbar_action);

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| match &self.status {
                Some(message) => {
                    ui.label(message);
                }
                None => match self.editor.session().labels_dir() {
                    Some(dir) => {
                        ui.label(format!("Labels: {}", dir.display()));
                    }
                    None => {
                        ui.label("No directory loaded");
                    }
                },
            });
        });

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(280.0)
            .show(ctx, |ui| properties::show(ui, &self.editor, &mut self.properties))
            .inner;
        self.apply_properties(properties_action);

        self.handle_keys(ctx);

        // Main canvas (center)
        let events = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| canvas::show(ui, &mut self.editor, self.texture.as_ref()))
            .inner;
        for event in events {
            self.dispatch(event);
        }
        self.report_save_error();
    }
}
