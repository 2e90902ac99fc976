use crate::config::GeometryConfig;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

pub const FULL_CIRCLE: f64 = 2.0 * PI;
pub const QUARTER_CIRCLE: f64 = FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

pub fn slots_per_circle(child_count: usize, config: &GeometryConfig) -> usize {
    // never panics, even when min > max
    child_count
        .max(config.min_slots_per_circle)
        .min(config.max_slots_per_circle)
        .max(1)
}

pub fn angle_stride(slots_per_circle: usize) -> f64 {
    FULL_CIRCLE / slots_per_circle.max(1) as f64
}

/// Largest slot of the configured aspect ratio that fits the container minus the vertical
/// insets. Without a configured ratio the container's own ratio is used.
pub fn slot_size(bounds: Size, config: &GeometryConfig) -> Size {
    let available = Size::new(
        bounds.width,
        bounds.height - config.top_bottom_offset * 2.0,
    );
    if bounds.is_empty() || available.is_empty() {
        return Size::ZERO;
    }

    let ratio = config
        .aspect_ratio
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(bounds.width / bounds.height);

    let width = (available.height * ratio).min(available.width);
    Size::new(width, width / ratio)
}

pub fn rotation_radius(slot_width: f64, slots_per_circle: usize) -> f64 {
    if slots_per_circle < 2 || !(slot_width > 0.0) {
        return 0.0;
    }
    slot_width / (angle_stride(slots_per_circle) / 2.0).sin() / 2.0
}

pub fn slot_scale(parallax: f64, angle: f64) -> f64 {
    (1.0 - parallax) + parallax * angle.cos()
}

pub fn hidden_threshold(angle_stride: f64) -> f64 {
    if angle_stride < QUARTER_CIRCLE {
        0.0
    } else {
        -(angle_stride / 2.0).sin()
    }
}

pub fn is_hidden(angle_stride: f64, angle: f64) -> bool {
    angle.cos() < hidden_threshold(angle_stride)
}

pub fn is_frontmost(angle_stride: f64, angle: f64) -> bool {
    angle.cos() > (angle_stride / 2.0).cos()
}

/// Snapshot of the circle for one set of bounds, configuration and child count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotGeometry {
    pub bounds: Size,
    pub slots_per_circle: usize,
    pub angle_stride: f64,
    pub slot_size: Size,
    pub rotation_radius: f64,
    pub parallax: f64,
}

impl SlotGeometry {
    pub fn calculate(bounds: Size, config: &GeometryConfig, child_count: usize) -> Self {
        let slots = slots_per_circle(child_count, config);
        let slot_size = slot_size(bounds, config);

        Self {
            bounds,
            slots_per_circle: slots,
            angle_stride: angle_stride(slots),
            slot_size,
            rotation_radius: rotation_radius(slot_size.width, slots),
            parallax: config.parallax,
        }
    }

    pub fn can_rotate(&self) -> bool {
        self.rotation_radius > 0.0 && self.rotation_radius.is_finite()
    }

    pub fn slot_angle(&self, slot: usize, rotation_angle: f64) -> f64 {
        slot as f64 * self.angle_stride + rotation_angle
    }

    pub fn slot_center(&self, angle: f64) -> Point {
        let center = self.bounds.center();
        Point::new(center.x + angle.sin() * self.rotation_radius, center.y)
    }

    pub fn slot_scale(&self, angle: f64) -> f64 {
        slot_scale(self.parallax, angle)
    }

    pub fn is_hidden(&self, angle: f64) -> bool {
        is_hidden(self.angle_stride, angle)
    }

    pub fn is_frontmost(&self, angle: f64) -> bool {
        is_frontmost(self.angle_stride, angle)
    }

    /// Angle covered by one device pixel of arc length.
    pub fn pixel_angle(&self, one_pixel: f64) -> f64 {
        if self.can_rotate() {
            one_pixel / self.rotation_radius
        } else {
            0.0
        }
    }

    /// Horizontal drag distance in points converted to a rotation angle.
    pub fn angle_for_points(&self, points: f64) -> f64 {
        if self.can_rotate() {
            points / self.rotation_radius
        } else {
            0.0
        }
    }
}
