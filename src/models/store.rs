// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-image annotation storage.
//!
//! Sets are loaded lazily the first time an image is activated and stay in
//! memory afterwards. Only the active set is mutated; every mutation marks it
//! dirty and dirty sets are written back on save, navigation and exit.

use crate::error::{LabelerError, Result};
use crate::io::labels::{read_labels, write_labels};
use crate::io::layout::DatasetLayout;
use crate::models::annotation::BoundingBox;
use crate::models::classes::ClassRegistry;
use crate::util::geometry::NormalizedRect;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The boxes of one image.
#[derive(Debug, Default)]
pub struct ImageAnnotations {
    pub boxes: Vec<BoundingBox>,
    /// Problems found when the label file was read
    pub issues: Vec<LabelerError>,
    /// The label file had malformed or out-of-range lines
    pub unparsable: bool,
    dirty: bool,
}

impl ImageAnnotations {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

pub struct AnnotationStore {
    layout: DatasetLayout,
    precision: usize,
    sets: HashMap<PathBuf, ImageAnnotations>,
    active: Option<PathBuf>,
}

impl AnnotationStore {
    pub fn new(layout: DatasetLayout, precision: usize) -> Self {
        Self {
            layout,
            precision,
            sets: HashMap::new(),
            active: None,
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Make an image the active one, loading its labels on first use.
    pub fn activate(&mut self, image: &Path, registry: &ClassRegistry) -> &ImageAnnotations {
        if !self.sets.contains_key(image) {
            let set = self.load(image, registry);
            self.sets.insert(image.to_path_buf(), set);
        }
        self.active = Some(image.to_path_buf());
        &self.sets[image]
    }

    fn load(&self, image: &Path, registry: &ClassRegistry) -> ImageAnnotations {
        let label_path = self.layout.label_path(image);
        match read_labels(&label_path) {
            Ok(mut file) => {
                file.flag_unknown_classes(&label_path, |id| registry.contains(id));
                let unparsable = file.is_unparsable();
                if !file.boxes.is_empty() || !file.issues.is_empty() {
                    log::info!(
                        "Loaded {} boxes from {} ({} issues)",
                        file.boxes.len(),
                        label_path.display(),
                        file.issues.len()
                    );
                }
                ImageAnnotations {
                    boxes: file.boxes,
                    issues: file.issues,
                    unparsable,
                    dirty: false,
                }
            }
            Err(e) => {
                log::error!("Failed to read {}: {}", label_path.display(), e);
                ImageAnnotations {
                    issues: vec![e],
                    unparsable: true,
                    ..Default::default()
                }
            }
        }
    }

    pub fn active_image(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&ImageAnnotations> {
        self.active.as_ref().and_then(|p| self.sets.get(p))
    }

    /// Boxes of the active image, empty if none is active.
    pub fn active_boxes(&self) -> &[BoundingBox] {
        self.active().map(|s| s.boxes.as_slice()).unwrap_or(&[])
    }

    fn active_mut(&mut self) -> Result<&mut ImageAnnotations> {
        let path = self.active.as_ref().ok_or(LabelerError::NoActiveImage)?;
        self.sets.get_mut(path).ok_or(LabelerError::NoActiveImage)
    }

    /// Append a box to the active image. Returns its index.
    pub fn add_box(&mut self, bbox: BoundingBox) -> Result<usize> {
        let set = self.active_mut()?;
        set.boxes.push(BoundingBox::new(bbox.class_id, bbox.geometry()));
        set.dirty = true;
        Ok(set.boxes.len() - 1)
    }

    pub fn remove_box(&mut self, index: usize) -> Result<BoundingBox> {
        let set = self.active_mut()?;
        if index >= set.boxes.len() {
            return Err(LabelerError::NoSuchBox(index));
        }
        set.dirty = true;
        Ok(set.boxes.remove(index))
    }

    /// Replace a box's geometry in place, clamped into [0, 1].
    pub fn update_box(&mut self, index: usize, geometry: NormalizedRect) -> Result<()> {
        let set = self.active_mut()?;
        let bbox = set
            .boxes
            .get_mut(index)
            .ok_or(LabelerError::NoSuchBox(index))?;
        bbox.set_geometry(geometry);
        set.dirty = true;
        Ok(())
    }

    pub fn set_box_class(&mut self, index: usize, class_id: u32) -> Result<()> {
        let set = self.active_mut()?;
        let bbox = set
            .boxes
            .get_mut(index)
            .ok_or(LabelerError::NoSuchBox(index))?;
        bbox.class_id = class_id;
        set.dirty = true;
        Ok(())
    }

    /// Remove every box of the active image. Returns how many were removed.
    pub fn clear_all(&mut self) -> Result<usize> {
        let set = self.active_mut()?;
        let removed = set.boxes.len();
        if removed > 0 {
            set.boxes.clear();
            set.dirty = true;
        }
        Ok(removed)
    }

    /// Replace the active image's boxes wholesale (undo/redo).
    pub fn replace_boxes(&mut self, boxes: Vec<BoundingBox>) -> Result<()> {
        let set = self.active_mut()?;
        set.boxes = boxes;
        set.dirty = true;
        Ok(())
    }

    /// Drop every loaded box of a class. Returns how many were removed.
    pub fn remove_class(&mut self, class_id: u32) -> usize {
        let mut removed = 0;
        for set in self.sets.values_mut() {
            let before = set.boxes.len();
            set.boxes.retain(|b| b.class_id != class_id);
            if set.boxes.len() != before {
                removed += before - set.boxes.len();
                set.dirty = true;
            }
        }
        removed
    }

    /// Rewrite a class id in every loaded box.
    pub fn reassign_class(&mut self, old_id: u32, new_id: u32) -> usize {
        let mut changed = 0;
        for set in self.sets.values_mut() {
            for b in set.boxes.iter_mut().filter(|b| b.class_id == old_id) {
                b.class_id = new_id;
                changed += 1;
                set.dirty = true;
            }
        }
        changed
    }

    /// Write one image's boxes if they changed.
    pub fn save(&mut self, image: &Path) -> Result<()> {
        let Some(set) = self.sets.get_mut(image) else {
            return Ok(());
        };
        if !set.dirty {
            return Ok(());
        }
        if set.unparsable {
            log::warn!(
                "Overwriting label file of {} that had unreadable lines",
                image.display()
            );
        }
        let path = self.layout.label_path(image);
        write_labels(&path, &set.boxes, self.precision)?;
        set.dirty = false;
        set.unparsable = false;
        // The rewritten file holds no bad lines; unknown ids remain while a box still uses them
        let ImageAnnotations { boxes, issues, .. } = set;
        issues.retain(|e| match e {
            LabelerError::Referential { class_id, .. } => {
                boxes.iter().any(|b| b.class_id == *class_id)
            }
            _ => false,
        });
        log::info!("Saved {} boxes to {}", set.boxes.len(), path.display());
        Ok(())
    }

    /// Write every dirty set. Failed sets stay dirty and in memory.
    pub fn flush_dirty(&mut self) -> Vec<(PathBuf, LabelerError)> {
        let dirty: Vec<PathBuf> = self
            .sets
            .iter()
            .filter(|(_, s)| s.dirty)
            .map(|(p, _)| p.clone())
            .collect();

        let mut failures = Vec::new();
        for image in dirty {
            if let Err(e) = self.save(&image) {
                log::error!("Failed to save labels for {}: {}", image.display(), e);
                failures.push((image, e));
            }
        }
        failures
    }

    pub fn dirty_count(&self) -> usize {
        self.sets.values().filter(|s| s.dirty).count()
    }

    /// Drop every set without pending edits so it is read again on next use.
    pub fn unload_clean(&mut self) {
        self.sets.retain(|_, s| s.dirty);
    }
}
