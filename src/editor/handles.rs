// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hit-testing and resize geometry.
//!
//! Everything here works in image pixels. Callers convert the handle radius
//! from canvas pixels by dividing by the viewport scale.

use crate::util::geometry::{ImagePoint, ImageSize, PixelRect};

/// A resize handle on a box's corner or edge midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// Corners first: they win over edge handles at equal distance.
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
        Handle::Top,
        Handle::Right,
        Handle::Bottom,
        Handle::Left,
    ];

    pub fn position(self, rect: PixelRect) -> ImagePoint {
        let cx = (rect.x1 + rect.x2) / 2.0;
        let cy = (rect.y1 + rect.y2) / 2.0;
        match self {
            Handle::TopLeft => ImagePoint::new(rect.x1, rect.y1),
            Handle::Top => ImagePoint::new(cx, rect.y1),
            Handle::TopRight => ImagePoint::new(rect.x2, rect.y1),
            Handle::Right => ImagePoint::new(rect.x2, cy),
            Handle::BottomRight => ImagePoint::new(rect.x2, rect.y2),
            Handle::Bottom => ImagePoint::new(cx, rect.y2),
            Handle::BottomLeft => ImagePoint::new(rect.x1, rect.y2),
            Handle::Left => ImagePoint::new(rect.x1, cy),
        }
    }

    pub fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::Top => Handle::Bottom,
            Handle::TopRight => Handle::BottomLeft,
            Handle::Right => Handle::Left,
            Handle::BottomRight => Handle::TopLeft,
            Handle::Bottom => Handle::Top,
            Handle::BottomLeft => Handle::TopRight,
            Handle::Left => Handle::Right,
        }
    }

    fn moves_x(self) -> bool {
        !matches!(self, Handle::Top | Handle::Bottom)
    }

    fn moves_y(self) -> bool {
        !matches!(self, Handle::Left | Handle::Right)
    }
}

/// What a pointer press lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A handle of the selected box
    Handle(usize, Handle),
    /// The body of a box
    Body(usize),
    Empty,
}

/// Find what lies under `point`.
///
/// Precedence: handles of the selected box, then the selected box's body,
/// then the topmost (last drawn) box containing the point.
pub fn hit_test(boxes: &[PixelRect], selected: Option<usize>, point: ImagePoint, radius: f64) -> Hit {
    if let Some((index, rect)) = selected.and_then(|i| boxes.get(i).map(|r| (i, *r))) {
        let nearest = Handle::ALL
            .iter()
            .map(|h| {
                let p = h.position(rect);
                (*h, (p.x - point.x).abs().max((p.y - point.y).abs()))
            })
            .filter(|(_, d)| *d <= radius)
            .fold(None, |best: Option<(Handle, f64)>, (h, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((h, d)),
            });
        if let Some((handle, _)) = nearest {
            return Hit::Handle(index, handle);
        }
        if rect.contains(point) {
            return Hit::Body(index);
        }
    }

    match boxes.iter().rposition(|r| r.contains(point)) {
        Some(index) => Hit::Body(index),
        None => Hit::Empty,
    }
}

/// Anchor point that stays fixed while `handle` is dragged.
pub fn resize_anchor(rect: PixelRect, handle: Handle) -> ImagePoint {
    handle.opposite().position(rect)
}

/// Geometry of a box being resized.
///
/// The anchor stays put and the dragged side follows the pointer, flipping
/// through the anchor when dragged past it. Edge handles keep the other axis
/// of `original`. Each resized side is at least `min_size` pixels.
pub fn resize_rect(
    original: PixelRect,
    handle: Handle,
    anchor: ImagePoint,
    pointer: ImagePoint,
    min_size: f64,
    size: ImageSize,
) -> PixelRect {
    let start = handle.position(original);
    let (x1, x2) = if handle.moves_x() {
        span(anchor.x, pointer.x, start.x < anchor.x, min_size, size.width as f64)
    } else {
        (original.x1, original.x2)
    };
    let (y1, y2) = if handle.moves_y() {
        span(anchor.y, pointer.y, start.y < anchor.y, min_size, size.height as f64)
    } else {
        (original.y1, original.y2)
    };
    PixelRect { x1, y1, x2, y2 }
}

/// Interval between a fixed and a moving coordinate, at least `min` long and
/// inside `[0, limit]`. A moving coordinate on the anchor grows toward
/// `prefer_low`.
fn span(anchor: f64, moving: f64, prefer_low: bool, min: f64, limit: f64) -> (f64, f64) {
    let low = moving < anchor || (moving == anchor && prefer_low);
    let (mut lo, mut hi) = if low { (moving, anchor) } else { (anchor, moving) };
    if hi - lo < min {
        if low {
            lo = anchor - min;
            hi = anchor;
        } else {
            lo = anchor;
            hi = anchor + min;
        }
        if hi > limit {
            hi = limit;
            lo = (limit - min).max(0.0);
        }
        if lo < 0.0 {
            lo = 0.0;
            hi = min.min(limit);
        }
    }
    (lo, hi)
}
