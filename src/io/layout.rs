// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Where label files live relative to the opened image directory.
//!
//! Follows the YOLOv8 dataset layout: images opened from a directory named
//! exactly `images` get a parallel `labels` directory, anything else gets a
//! `labels` subdirectory.

use std::path::{Path, PathBuf};

/// Resolved directories of an opened dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub image_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl DatasetLayout {
    pub fn resolve(image_dir: &Path) -> Self {
        Self {
            image_dir: image_dir.to_path_buf(),
            labels_dir: labels_dir_for(image_dir),
        }
    }

    /// Label file for an image: `<labels_dir>/<stem>.txt`.
    pub fn label_path(&self, image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.labels_dir.join(format!("{}.txt", stem))
    }
}

/// Labels directory for an image directory.
pub fn labels_dir_for(image_dir: &Path) -> PathBuf {
    let is_images = image_dir.file_name().is_some_and(|name| name == "images");
    match image_dir.parent() {
        Some(parent) if is_images => parent.join("labels"),
        _ => image_dir.join("labels"),
    }
}
