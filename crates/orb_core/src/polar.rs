//! Polar stage coordinates and origin-relative rectangles.
//!
//! The stage is a disc: positions are `(angle, radius)` about the disc centre.
//! Angles are never normalized, so an entity that walks all the way around
//! keeps accumulating radians.

use glam::DVec2;
use serde::Deserialize;
use std::f64::consts::FRAC_PI_2;

/// A point (or velocity) in polar form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polar {
    /// Radians, unbounded.
    pub angle: f64,
    /// Pixels from the stage centre.
    pub radius: f64,
}

impl Polar {
    pub const fn new(angle: f64, radius: f64) -> Self {
        Self { angle, radius }
    }

    pub fn cartesian(self) -> DVec2 {
        DVec2::new(self.angle.cos() * self.radius, self.angle.sin() * self.radius)
    }

    /// Rotation that stands a sprite upright on the ring at this angle.
    pub fn upright_rotation(self) -> f64 {
        self.angle + FRAC_PI_2
    }
}

/// Axis-aligned rectangle in sprite-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct HitRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl HitRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}
