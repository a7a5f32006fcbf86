// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounding box annotation.
//!
//! Boxes are stored in normalized YOLO space and converted to pixels only
//! while they are being edited or drawn.

use crate::util::geometry::{
    image_to_normalized, normalized_to_image, ImageSize, NormalizedRect, PixelRect,
};
use serde::{Deserialize, Serialize};

/// A labelled box with normalized center, width and height in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a box, clamping its geometry into [0, 1].
    pub fn new(class_id: u32, geometry: NormalizedRect) -> Self {
        let g = geometry.clamped();
        Self {
            class_id,
            x_center: g.x_center,
            y_center: g.y_center,
            width: g.width,
            height: g.height,
        }
    }

    /// Create a box from a pixel rectangle of an image.
    pub fn from_pixels(class_id: u32, rect: PixelRect, size: ImageSize) -> Self {
        Self::new(class_id, image_to_normalized(rect, size))
    }

    pub fn geometry(&self) -> NormalizedRect {
        NormalizedRect::new(self.x_center, self.y_center, self.width, self.height)
    }

    /// Replace the geometry, clamping into [0, 1].
    pub fn set_geometry(&mut self, geometry: NormalizedRect) {
        *self = Self::new(self.class_id, geometry);
    }

    /// The box in pixel coordinates of an image of the given size.
    pub fn to_pixels(&self, size: ImageSize) -> PixelRect {
        normalized_to_image(self.geometry(), size)
    }
}
