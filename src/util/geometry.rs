// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate transformations between canvas, image pixel and normalized space.
//!
//! Three spaces are involved when editing a box:
//! - canvas space: where pointer events arrive and the chrome paints,
//! - image pixel space: where all interaction geometry is computed,
//! - normalized space: what is stored and written to YOLO label files.
//!
//! Each space has its own type and the only way between them is through the
//! functions in this module.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn w(&self) -> f64 {
        self.width as f64
    }

    fn h(&self) -> f64 {
        self.height as f64
    }
}

/// A point in canvas (screen) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub min: CanvasPoint,
    pub max: CanvasPoint,
}

impl CanvasRect {
    pub fn from_min_size(min: CanvasPoint, width: f64, height: f64) -> Self {
        Self {
            min,
            max: CanvasPoint::new(min.x + width, min.y + height),
        }
    }

    /// Rectangle of the given half extent around a center point.
    pub fn around(center: CanvasPoint, half: f64) -> Self {
        Self {
            min: CanvasPoint::new(center.x - half, center.y - half),
            max: CanvasPoint::new(center.x + half, center.y + half),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width] x [0, height]`.
    pub fn clamped(self, size: ImageSize) -> Self {
        Self {
            x: self.x.clamp(0.0, size.w()),
            y: self.y.clamp(0.0, size.h()),
        }
    }
}

/// An axis-aligned rectangle in image pixel space, always with `x1 <= x2`
/// and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl PixelRect {
    /// Build a rectangle from two arbitrary corners.
    pub fn from_corners(a: ImagePoint, b: ImagePoint) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Check if a point is inside the rectangle (edges included).
    pub fn contains(&self, point: ImagePoint) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    /// Move the rectangle so that its top-left corner sits at `origin`, keeping
    /// its size and shifting it back inside the image if it would overhang.
    pub fn moved_to(&self, origin: ImagePoint, size: ImageSize) -> Self {
        let w = self.width().min(size.w());
        let h = self.height().min(size.h());
        let x1 = origin.x.clamp(0.0, size.w() - w);
        let y1 = origin.y.clamp(0.0, size.h() - h);
        Self {
            x1,
            y1,
            x2: x1 + w,
            y2: y1 + h,
        }
    }
}

/// A rectangle in normalized YOLO space (center, width, height in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Clamp all four values into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            x_center: clamp_unit(self.x_center),
            y_center: clamp_unit(self.y_center),
            width: clamp_unit(self.width),
            height: clamp_unit(self.height),
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Scale and offset mapping image pixels onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Scale 1, no offset.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compute the viewport that fits the whole image inside the display area.
///
/// The image is never scaled up; the scaled image is centered in the
/// display rectangle.
pub fn fit_to_display(image: ImageSize, display: CanvasRect) -> Viewport {
    if image.is_empty() || display.width() <= 0.0 || display.height() <= 0.0 {
        return Viewport::new(1.0, display.min.x, display.min.y);
    }

    let scale = (display.width() / image.w())
        .min(display.height() / image.h())
        .min(1.0);

    let offset_x = display.min.x + (display.width() - image.w() * scale) / 2.0;
    let offset_y = display.min.y + (display.height() - image.h() * scale) / 2.0;
    Viewport::new(scale, offset_x, offset_y)
}

/// Convert a canvas point to image pixels, clamped to the image bounds.
pub fn canvas_to_image(point: CanvasPoint, viewport: Viewport, image: ImageSize) -> ImagePoint {
    let scale = if viewport.scale > 0.0 { viewport.scale } else { 1.0 };
    ImagePoint::new(
        (point.x - viewport.offset_x) / scale,
        (point.y - viewport.offset_y) / scale,
    )
    .clamped(image)
}

/// Convert image pixels to a canvas point.
pub fn image_to_canvas(point: ImagePoint, viewport: Viewport) -> CanvasPoint {
    CanvasPoint::new(
        point.x * viewport.scale + viewport.offset_x,
        point.y * viewport.scale + viewport.offset_y,
    )
}

/// Convert a pixel rectangle to its canvas rectangle.
pub fn pixel_rect_to_canvas(rect: PixelRect, viewport: Viewport) -> CanvasRect {
    CanvasRect {
        min: image_to_canvas(ImagePoint::new(rect.x1, rect.y1), viewport),
        max: image_to_canvas(ImagePoint::new(rect.x2, rect.y2), viewport),
    }
}

/// Convert a pixel rectangle to normalized center/size coordinates.
pub fn image_to_normalized(rect: PixelRect, image: ImageSize) -> NormalizedRect {
    if image.is_empty() {
        return NormalizedRect::new(0.0, 0.0, 0.0, 0.0);
    }
    NormalizedRect::new(
        (rect.x1 + rect.x2) / 2.0 / image.w(),
        (rect.y1 + rect.y2) / 2.0 / image.h(),
        rect.width() / image.w(),
        rect.height() / image.h(),
    )
}

/// Convert normalized center/size coordinates to a pixel rectangle.
pub fn normalized_to_image(rect: NormalizedRect, image: ImageSize) -> PixelRect {
    let cx = rect.x_center * image.w();
    let cy = rect.y_center * image.h();
    let half_w = rect.width * image.w() / 2.0;
    let half_h = rect.height * image.h() / 2.0;
    PixelRect {
        x1: cx - half_w,
        y1: cy - half_h,
        x2: cx + half_w,
        y2: cy + half_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-4;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_normalized_roundtrip() {
        let sizes = [(800, 600), (1920, 1080), (1, 1), (37, 4093)];
        let rects = [
            NormalizedRect::new(0.5, 0.5, 1.0, 1.0),
            NormalizedRect::new(0.25, 0.416_667, 0.25, 0.5),
            NormalizedRect::new(0.123_456, 0.987_654, 0.01, 0.02),
        ];

        for (w, h) in sizes {
            let size = ImageSize::new(w, h);
            for r in rects {
                let back = image_to_normalized(normalized_to_image(r, size), size);
                assert!(close(back.x_center, r.x_center), "{:?} at {}x{}", r, w, h);
                assert!(close(back.y_center, r.y_center));
                assert!(close(back.width, r.width));
                assert!(close(back.height, r.height));
            }
        }
    }

    #[test]
    fn test_draw_scenario_800x600() {
        let size = ImageSize::new(800, 600);
        let vp = Viewport::identity();
        let a = canvas_to_image(CanvasPoint::new(100.0, 100.0), vp, size);
        let b = canvas_to_image(CanvasPoint::new(300.0, 400.0), vp, size);

        let n = image_to_normalized(PixelRect::from_corners(a, b), size);
        assert!(close(n.x_center, 0.25));
        assert!(close(n.y_center, 0.4167));
        assert!(close(n.width, 0.25));
        assert!(close(n.height, 0.5));
    }

    #[test]
    fn test_fit_never_upscales() {
        let vp = fit_to_display(
            ImageSize::new(200, 100),
            CanvasRect::from_min_size(CanvasPoint::new(0.0, 0.0), 1000.0, 1000.0),
        );
        assert_eq!(vp.scale, 1.0);
        assert!(close(vp.offset_x, 400.0));
        assert!(close(vp.offset_y, 450.0));
    }

    #[test]
    fn test_fit_preserves_aspect_and_centers() {
        let vp = fit_to_display(
            ImageSize::new(2000, 1000),
            CanvasRect::from_min_size(CanvasPoint::new(10.0, 20.0), 1000.0, 1000.0),
        );
        assert!(close(vp.scale, 0.5));
        assert!(close(vp.offset_x, 10.0));
        assert!(close(vp.offset_y, 20.0 + 250.0));
    }

    #[test]
    fn test_canvas_to_image_clamps_outside_points() {
        let size = ImageSize::new(100, 50);
        let vp = Viewport::new(0.5, 10.0, 10.0);

        let p = canvas_to_image(CanvasPoint::new(-40.0, 500.0), vp, size);
        assert_eq!(p, ImagePoint::new(0.0, 50.0));

        let q = canvas_to_image(CanvasPoint::new(35.0, 20.0), vp, size);
        assert!(close(q.x, 50.0));
        assert!(close(q.y, 20.0));
    }

    #[test]
    fn test_canvas_image_inverse() {
        let vp = Viewport::new(0.75, 12.0, 3.0);
        let p = ImagePoint::new(40.0, 80.0);
        let back = canvas_to_image(image_to_canvas(p, vp), vp, ImageSize::new(1000, 1000));
        assert!(close(back.x, p.x));
        assert!(close(back.y, p.y));
    }

    #[test]
    fn test_moved_to_stays_inside_image() {
        let size = ImageSize::new(100, 100);
        let rect = PixelRect::from_corners(ImagePoint::new(10.0, 10.0), ImagePoint::new(40.0, 30.0));
        let moved = rect.moved_to(ImagePoint::new(90.0, -5.0), size);
        assert_eq!(moved.x2, 100.0);
        assert_eq!(moved.y1, 0.0);
        assert!(close(moved.width(), 30.0));
        assert!(close(moved.height(), 20.0));
    }

    #[test]
    fn test_clamped_normalized_rect() {
        let r = NormalizedRect::new(1.2, -0.1, 0.5, f64::NAN).clamped();
        assert_eq!(r, NormalizedRect::new(1.0, 0.0, 0.5, 0.0));
    }
}
