//! Geometry types for zoom framing and overlay placement.
//!
//! Three coordinate spaces are in play:
//! - **Reference space:** pixels of the surface an event was recorded
//!   against (full screen or a single window), top-left origin.
//! - **Video space:** output-video pixels, bottom-left origin. Zoom bounding
//!   boxes live here.
//! - **Frame space:** output-video pixels, top-left origin, matching the
//!   row order of image buffers.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a video, frame, or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn w(&self) -> f64 {
        self.width as f64
    }

    pub fn h(&self) -> f64 {
        self.height as f64
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Center point in video space.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.w() / 2.0, self.h() / 2.0)
    }

    /// Map a reference-space point into video space (y flipped).
    ///
    /// A zero reference dimension means the point is already expressed in
    /// video pixels along that axis.
    pub fn reference_to_video(
        &self,
        x: f64,
        y: f64,
        reference_width: u32,
        reference_height: u32,
    ) -> Point2D {
        let sx = if reference_width == 0 {
            1.0
        } else {
            self.w() / reference_width as f64
        };
        let sy = if reference_height == 0 {
            1.0
        } else {
            self.h() / reference_height as f64
        };
        Point2D::new(x * sx, self.h() - y * sy)
    }

    /// Convert a video-space point to frame space (and back; the flip is
    /// its own inverse).
    pub fn flip_y(&self, point: Point2D) -> Point2D {
        Point2D::new(point.x, self.h() - point.y)
    }
}

/// A 2D point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// The rectangle a zoom should frame, in video space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Box spanning the given extents.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            center_x: (min_x + max_x) / 2.0,
            center_y: (min_y + max_y) / 2.0,
            width: (max_x - min_x).abs(),
            height: (max_y - min_y).abs(),
        }
    }

    /// Box covering the whole frame.
    pub fn full_frame(size: Size) -> Self {
        Self::new(size.w() / 2.0, size.h() / 2.0, size.w(), size.h())
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.center_x, self.center_y)
    }

    pub fn min_x(&self) -> f64 {
        self.center_x - self.width / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.center_x + self.width / 2.0
    }

    pub fn min_y(&self) -> f64 {
        self.center_y - self.height / 2.0
    }

    pub fn max_y(&self) -> f64 {
        self.center_y + self.height / 2.0
    }

    /// Half of the box's shorter side.
    pub fn half_extent(&self) -> f64 {
        self.width.min(self.height) / 2.0
    }

    /// Finite, with strictly positive size.
    pub fn is_valid(&self) -> bool {
        self.center_x.is_finite()
            && self.center_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Check if a video-space point lies within this box.
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }

    /// Keep the box inside the frame.
    ///
    /// A box that fits is translated, never shrunk. A box larger than the
    /// frame along an axis is cut down to the frame along that axis.
    pub fn clamp_to(&self, size: Size) -> Self {
        let width = self.width.min(size.w());
        let height = self.height.min(size.h());
        Self {
            center_x: self.center_x.clamp(width / 2.0, size.w() - width / 2.0),
            center_y: self.center_y.clamp(height / 2.0, size.h() - height / 2.0),
            width,
            height,
        }
    }

    /// Magnification that makes this box fill the frame, in `[1, max_zoom]`.
    pub fn zoom_factor(&self, size: Size, max_zoom: f64) -> f64 {
        if !self.is_valid() {
            return 1.0;
        }
        (size.w() / self.width)
            .min(size.h() / self.height)
            .clamp(1.0, max_zoom.max(1.0))
    }

    /// Blend center and size between two boxes.
    pub fn lerp(a: &BoundingBox, b: &BoundingBox, t: f64) -> BoundingBox {
        let t = t.clamp(0.0, 1.0);
        BoundingBox {
            center_x: a.center_x + (b.center_x - a.center_x) * t,
            center_y: a.center_y + (b.center_y - a.center_y) * t,
            width: a.width + (b.width - a.width) * t,
            height: a.height + (b.height - a.height) * t,
        }
    }
}

/// An integer rectangle in frame space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
