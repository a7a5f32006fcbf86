// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image discovery and loading.
//!
//! This module finds the images of an opened directory and decodes them into
//! RGBA pixels suitable for display in egui.

use crate::error::Result;
use crate::util::geometry::ImageSize;
use std::path::{Path, PathBuf};

/// Extensions recognised as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "tiff"];

/// A decoded image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// List the supported images directly inside a directory, sorted by path.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    log::info!("Found {} images in {}", images.len(), dir.display());
    Ok(images)
}

/// Read only the dimensions of an image.
pub fn image_size(path: &Path) -> Result<ImageSize> {
    let (w, h) = image::image_dimensions(path)?;
    Ok(ImageSize::new(w, h))
}

/// Decode an image into RGBA8 pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("a.Tiff")));
        assert!(!is_supported_image(Path::new("a.txt")));
        assert!(!is_supported_image(Path::new("jpg")));
    }

    #[test]
    fn test_discover_images_sorted() {
        let dir = tempfile::tempdir().expect("create temp dir");
        for name in ["b.png", "a.JPEG", "notes.txt", "c.gif"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let found = discover_images(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPEG", "b.png", "c.gif"]);
    }
}
