//! High-density drawing surfaces.
//!
//! A [`Surface`] has a logical size (what layout sees) and a backing store
//! sized for the display's pixel ratio. Drawing code works in logical units
//! and converts through the [`DrawingContext`] scale.

use serde::{Deserialize, Serialize};

/// Uniform scale transform applied to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self { scale: 1.0 };

    fn scaled(self, factor: f64) -> Self {
        Self {
            scale: self.scale * factor,
        }
    }
}

/// Logical size of a mount point, in CSS-like pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    logical: LogicalSize,
    backing: (u32, u32),
    transform: Transform,
}

impl Surface {
    pub fn new(logical: LogicalSize) -> Self {
        Self {
            logical,
            backing: (0, 0),
            transform: Transform::IDENTITY,
        }
    }

    pub fn logical_size(&self) -> LogicalSize {
        self.logical
    }

    /// Change the logical size; takes effect on the next [`prepare_surface`].
    pub fn resize(&mut self, logical: LogicalSize) {
        self.logical = logical;
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }
}

/// Drawing parameters for one render onto a prepared surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawingContext {
    pub logical: LogicalSize,
    pub backing: (u32, u32),
    pub scale: f64,
}

impl DrawingContext {
    /// A context with nothing to draw on.
    pub fn is_empty(&self) -> bool {
        self.backing.0 == 0 || self.backing.1 == 0
    }

    /// Logical length to backing pixels.
    pub fn px(&self, logical: f64) -> i32 {
        (logical * self.scale).round() as i32
    }

    /// Logical font size to backing font size.
    pub fn font(&self, logical: f64) -> f64 {
        logical * self.scale
    }
}

/// Normalize a reported device pixel ratio. Missing or unusable ratios are 1.
pub fn effective_ratio(device_pixel_ratio: Option<f64>) -> f64 {
    device_pixel_ratio
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0)
}

/// Size the backing store for the pixel ratio and reset the transform to a
/// plain scale by that ratio.
///
/// Safe to call repeatedly; every call starts from the current logical size,
/// so resize-then-redraw works. A zero-sized surface gives an empty context.
pub fn prepare_surface(surface: &mut Surface, device_pixel_ratio: Option<f64>) -> DrawingContext {
    let ratio = effective_ratio(device_pixel_ratio);
    let logical = surface.logical;

    surface.backing = (backing_dim(logical.width, ratio), backing_dim(logical.height, ratio));
    surface.transform = Transform::IDENTITY;
    surface.transform = surface.transform.scaled(ratio);

    DrawingContext {
        logical,
        backing: surface.backing,
        scale: surface.transform.scale,
    }
}

fn backing_dim(logical: f64, ratio: f64) -> u32 {
    let physical = logical * ratio;
    if physical.is_finite() && physical > 0.0 {
        physical.round() as u32
    } else {
        0
    }
}
