// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labeling session state.
//!
//! A session is one opened image directory: the discovered images, which of
//! them is displayed, the class registry and the annotation store. Leaving an
//! image writes its labels back before the next one is loaded.

use crate::config::LabelerConfig;
use crate::error::{LabelerError, Result};
use crate::io::classes::{load_registry, read_class_names, save_registry, write_class_names};
use crate::io::layout::DatasetLayout;
use crate::io::media::{discover_images, image_size};
use crate::models::classes::{ClassDefinition, ClassRegistry, Rgb};
use crate::models::store::AnnotationStore;
use crate::util::geometry::ImageSize;
use std::path::{Path, PathBuf};

/// Opened directory state.
struct Workspace {
    images: Vec<PathBuf>,
    current: usize,
    image_size: Option<ImageSize>,
    store: AnnotationStore,
}

pub struct Session {
    config: LabelerConfig,
    registry: ClassRegistry,
    workspace: Option<Workspace>,
}

impl Session {
    /// Create a session with the configured default classes and no directory.
    pub fn new(config: LabelerConfig) -> Self {
        let registry = default_registry(&config);
        Self {
            config,
            registry,
            workspace: None,
        }
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Open an image directory.
    ///
    /// Pending edits of a previously opened directory are written first.
    /// Returns the number of images found.
    pub fn open(&mut self, dir: &Path) -> Result<usize> {
        if self.workspace.is_some() {
            self.save_all()?;
        }

        let layout = DatasetLayout::resolve(dir);
        let images = discover_images(dir)?;
        self.registry = match load_registry(dir)? {
            Some(registry) => registry,
            None => default_registry(&self.config),
        };

        log::info!(
            "Opened {} (labels in {})",
            dir.display(),
            layout.labels_dir.display()
        );

        let count = images.len();
        self.workspace = Some(Workspace {
            images,
            current: 0,
            image_size: None,
            store: AnnotationStore::new(layout, self.config.label_precision),
        });
        if count > 0 {
            self.activate(0)?;
        }
        Ok(count)
    }

    pub fn is_open(&self) -> bool {
        self.workspace.is_some()
    }

    pub fn images(&self) -> &[PathBuf] {
        self.workspace.as_ref().map(|w| w.images.as_slice()).unwrap_or(&[])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.workspace
            .as_ref()
            .filter(|w| !w.images.is_empty())
            .map(|w| w.current)
    }

    pub fn current_image(&self) -> Option<&Path> {
        let w = self.workspace.as_ref()?;
        w.images.get(w.current).map(PathBuf::as_path)
    }

    /// Dimensions of the displayed image, if it could be read.
    pub fn image_size(&self) -> Option<ImageSize> {
        self.workspace.as_ref().and_then(|w| w.image_size)
    }

    pub fn store(&self) -> Option<&AnnotationStore> {
        self.workspace.as_ref().map(|w| &w.store)
    }

    pub fn store_mut(&mut self) -> Result<&mut AnnotationStore> {
        self.workspace
            .as_mut()
            .map(|w| &mut w.store)
            .ok_or(LabelerError::NoActiveImage)
    }

    pub fn labels_dir(&self) -> Option<&Path> {
        self.store().map(|s| s.layout().labels_dir.as_path())
    }

    /// Switch to another image, saving the current one first.
    ///
    /// Returns `Ok(false)` if the index is out of range or already shown. If
    /// the current image cannot be saved the switch does not happen.
    pub fn go_to(&mut self, index: usize) -> Result<bool> {
        let Some(w) = self.workspace.as_mut() else {
            return Ok(false);
        };
        if index >= w.images.len() || (index == w.current && w.store.active_image().is_some()) {
            return Ok(false);
        }

        let leaving = w.images[w.current].clone();
        w.store.save(&leaving)?;
        self.activate(index)?;
        Ok(true)
    }

    pub fn next(&mut self) -> Result<bool> {
        match self.current_index() {
            Some(i) => self.go_to(i + 1),
            None => Ok(false),
        }
    }

    pub fn previous(&mut self) -> Result<bool> {
        match self.current_index() {
            Some(i) if i > 0 => self.go_to(i - 1),
            _ => Ok(false),
        }
    }

    fn activate(&mut self, index: usize) -> Result<()> {
        let w = self.workspace.as_mut().ok_or(LabelerError::NoActiveImage)?;
        let image = w.images[index].clone();
        w.current = index;
        w.store.activate(&image, &self.registry);
        // Without dimensions the image is shown but cannot be edited.
        w.image_size = image_size(&image)
            .map_err(|e| log::error!("Cannot read dimensions of {}: {}", image.display(), e))
            .ok();
        log::debug!("Active image {} ({}/{})", image.display(), index + 1, w.images.len());
        Ok(())
    }

    /// Save the active image if auto-save is enabled.
    pub fn after_commit(&mut self) -> Result<()> {
        if !self.config.auto_save {
            return Ok(());
        }
        let Some(w) = self.workspace.as_mut() else {
            return Ok(());
        };
        if let Some(image) = w.store.active_image().map(Path::to_path_buf) {
            w.store.save(&image)?;
        }
        Ok(())
    }

    /// Write every changed label file and both class files.
    ///
    /// All writes are attempted; the first failure is returned.
    pub fn save_all(&mut self) -> Result<()> {
        let Some(w) = self.workspace.as_mut() else {
            return Ok(());
        };
        let mut failures = w.store.flush_dirty().into_iter();
        let classes = self.persist_classes();
        if let Some((_, e)) = failures.next() {
            return Err(e);
        }
        classes
    }

    /// Flush everything before exit.
    pub fn shutdown(&mut self) -> Result<()> {
        log::info!("Saving session before exit");
        self.save_all()
    }

    fn persist_classes(&self) -> Result<()> {
        match self.workspace.as_ref() {
            Some(w) => save_registry(&w.store.layout().image_dir, &self.registry),
            None => Ok(()),
        }
    }

    pub fn add_class(
        &mut self,
        name: &str,
        color: Option<Rgb>,
        explicit_id: Option<u32>,
    ) -> Result<ClassDefinition> {
        let def = self.registry.add(name, color, explicit_id)?;
        self.persist_classes()?;
        Ok(def)
    }

    /// Remove a class and every loaded box that uses it.
    ///
    /// Label files of images not loaded yet keep their lines; the retired id
    /// is reported as a referential error when they are loaded.
    pub fn remove_class(&mut self, class_id: u32) -> Result<ClassDefinition> {
        let def = self.registry.remove(class_id)?;
        if let Some(w) = self.workspace.as_mut() {
            let removed = w.store.remove_class(class_id);
            log::info!("Removed {} boxes of class [{}] {}", removed, class_id, def.name);
        }
        self.persist_classes()?;
        Ok(def)
    }

    pub fn rename_class(&mut self, class_id: u32, name: &str) -> Result<()> {
        self.registry.rename(class_id, name)?;
        self.persist_classes()
    }

    pub fn set_class_color(&mut self, class_id: u32, color: Rgb) -> Result<()> {
        self.registry.set_color(class_id, color)?;
        self.persist_classes()
    }

    /// Replace the registry with a class list read from any file.
    ///
    /// Line N of the file becomes class N. Pending edits are written first;
    /// the displayed image is read again so boxes of classes the list does not
    /// define are flagged. Returns the number of classes imported.
    pub fn import_class_list(&mut self, path: &Path) -> Result<usize> {
        let names = read_class_names(path)?;
        self.save_all()?;
        self.registry = ClassRegistry::from_names(&names);
        log::info!("Imported {} classes from {}", self.registry.len(), path.display());

        self.persist_classes()?;
        if let Some(w) = self.workspace.as_mut() {
            w.store.unload_clean();
        }
        if let Some(index) = self.current_index() {
            self.activate(index)?;
        }
        Ok(self.registry.len())
    }

    /// Write the class names, one per line in display order.
    pub fn export_class_list(&self, path: &Path) -> Result<()> {
        write_class_names(path, &self.registry)?;
        log::info!("Exported {} classes to {}", self.registry.len(), path.display());
        Ok(())
    }

    /// Change a class id; loaded boxes follow the class.
    pub fn set_class_id(&mut self, class_id: u32, new_id: u32) -> Result<()> {
        self.registry.set_id(class_id, new_id)?;
        if let Some(w) = self.workspace.as_mut() {
            w.store.reassign_class(class_id, new_id);
        }
        self.persist_classes()
    }
}

fn default_registry(config: &LabelerConfig) -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    for c in &config.default_classes {
        if let Err(e) = registry.add(&c.name, Some(c.color), Some(c.id)) {
            log::warn!("Ignoring default class '{}': {}", c.name, e);
        }
    }
    registry
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::labels::read_labels;
    use crate::models::annotation::BoundingBox;
    use crate::util::geometry::NormalizedRect;

    /// Create `<tmp>/images` with blank PNGs of the given sizes.
    pub(crate) fn dataset(sizes: &[(u32, u32)]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        for (i, (w, h)) in sizes.iter().enumerate() {
            image::RgbImage::new(*w, *h)
                .save(images.join(format!("img{}.png", i)))
                .expect("write test image");
        }
        (dir, images)
    }

    fn bbox(class_id: u32) -> BoundingBox {
        BoundingBox::new(class_id, NormalizedRect::new(0.5, 0.5, 0.2, 0.2))
    }

    #[test]
    fn test_open_uses_defaults_and_first_image() {
        let (_dir, images) = dataset(&[(800, 600), (64, 32)]);
        let mut session = Session::new(LabelerConfig::default());

        assert_eq!(session.open(&images).unwrap(), 2);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.image_size(), Some(ImageSize::new(800, 600)));
        assert_eq!(session.registry().len(), 3);
        assert_eq!(session.labels_dir(), Some(images.parent().unwrap().join("labels").as_path()));
    }

    #[test]
    fn test_navigation_flushes_previous_image() {
        let (dir, images) = dataset(&[(800, 600), (64, 32)]);
        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();
        session.store_mut().unwrap().add_box(bbox(1)).unwrap();

        assert!(session.next().unwrap());
        assert_eq!(session.image_size(), Some(ImageSize::new(64, 32)));
        assert!(!session.next().unwrap());

        let labels = read_labels(&dir.path().join("labels").join("img0.txt")).unwrap();
        assert_eq!(labels.boxes.len(), 1);
        assert_eq!(labels.boxes[0].class_id, 1);

        assert!(session.previous().unwrap());
        assert_eq!(session.store().unwrap().active_boxes().len(), 1);
    }

    #[test]
    fn test_remove_class_cascade_and_deferred_flag() {
        let (dir, images) = dataset(&[(100, 100), (100, 100)]);
        let labels = dir.path().join("labels");
        std::fs::create_dir(&labels).unwrap();
        std::fs::write(labels.join("img1.txt"), "2 0.5 0.5 0.1 0.1\n").unwrap();

        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();
        session.store_mut().unwrap().add_box(bbox(2)).unwrap();
        session.store_mut().unwrap().add_box(bbox(0)).unwrap();

        session.remove_class(2).unwrap();
        let active = session.store().unwrap().active_boxes();
        assert!(active.iter().all(|b| b.class_id != 2));

        // classes.txt no longer lists the removed class
        let names = std::fs::read_to_string(images.join("classes.txt")).unwrap();
        assert_eq!(names, "person\ncar\n");

        session.next().unwrap();
        let set = session.store().unwrap().active().unwrap();
        assert!(matches!(
            set.issues[..],
            [LabelerError::Referential { class_id: 2, .. }]
        ));

        // Re-adding a class does not revive the stale id.
        let def = session.add_class("truck", None, None).unwrap();
        assert_ne!(def.class_id, 2);
    }

    #[test]
    fn test_removed_id_stays_unknown() {
        let (dir, images) = dataset(&[(100, 100), (100, 100)]);
        let labels = dir.path().join("labels");
        std::fs::create_dir(&labels).unwrap();
        std::fs::write(labels.join("img1.txt"), "2 0.5 0.5 0.1 0.1\n").unwrap();

        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();
        session.remove_class(2).unwrap();

        assert!(matches!(
            session.set_class_id(0, 2),
            Err(LabelerError::RetiredId(2))
        ));
        assert!(matches!(
            session.add_class("truck", None, Some(2)),
            Err(LabelerError::RetiredId(2))
        ));
        assert_eq!(session.registry().get(0).unwrap().name, "person");

        session.next().unwrap();
        let set = session.store().unwrap().active().unwrap();
        assert_eq!(set.boxes[0].class_id, 2);
        assert!(matches!(
            set.issues[..],
            [LabelerError::Referential { class_id: 2, .. }]
        ));
    }

    #[test]
    fn test_import_class_list_replaces_registry() {
        let (dir, images) = dataset(&[(100, 100)]);
        let labels = dir.path().join("labels");
        std::fs::create_dir(&labels).unwrap();
        std::fs::write(labels.join("img0.txt"), "1 0.5 0.5 0.1 0.1\n0 0.2 0.2 0.1 0.1\n").unwrap();
        let list = dir.path().join("other_classes.txt");
        std::fs::write(&list, "cat\n\ndog\nbird\n").unwrap();

        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();
        assert!(session.store().unwrap().active().unwrap().issues.is_empty());

        assert_eq!(session.import_class_list(&list).unwrap(), 3);
        assert_eq!(session.registry().get(2).unwrap().name, "dog");
        assert_eq!(session.registry().get(3).unwrap().name, "bird");

        // Id 1 was a blank line, so the first box no longer has a class.
        let set = session.store().unwrap().active().unwrap();
        assert!(matches!(
            set.issues[..],
            [LabelerError::Referential { class_id: 1, .. }]
        ));

        let names = std::fs::read_to_string(images.join("classes.txt")).unwrap();
        assert_eq!(names, "cat\ndog\nbird\n");
    }

    #[test]
    fn test_import_missing_list_keeps_registry() {
        let (dir, images) = dataset(&[(10, 10)]);
        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();

        assert!(session.import_class_list(&dir.path().join("nope.txt")).is_err());
        assert_eq!(session.registry().len(), 3);
    }

    #[test]
    fn test_export_class_list() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut session = Session::new(LabelerConfig::default());
        session.set_class_id(1, 7).unwrap();

        let path = dir.path().join("exported.txt");
        session.export_class_list(&path).unwrap();
        let names = std::fs::read_to_string(&path).unwrap();
        assert_eq!(names, "person\ncar\nbicycle\n");
    }

    #[test]
    fn test_reopen_restores_custom_ids() {
        let (_dir, images) = dataset(&[(10, 10)]);
        let mut session = Session::new(LabelerConfig::default());
        session.open(&images).unwrap();
        session.set_class_id(1, 42).unwrap();
        session.save_all().unwrap();

        let mut reopened = Session::new(LabelerConfig::default());
        reopened.open(&images).unwrap();
        assert_eq!(reopened.registry().get(42).unwrap().name, "car");
        assert!(!reopened.registry().contains(1));
    }

    #[test]
    fn test_auto_save_after_commit() {
        let (dir, images) = dataset(&[(10, 10)]);
        let config = LabelerConfig {
            auto_save: true,
            ..Default::default()
        };
        let mut session = Session::new(config);
        session.open(&images).unwrap();
        session.store_mut().unwrap().add_box(bbox(0)).unwrap();
        session.after_commit().unwrap();

        assert!(dir.path().join("labels").join("img0.txt").exists());
        assert_eq!(session.store().unwrap().dirty_count(), 0);
    }
}
