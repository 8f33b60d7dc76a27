//! Polar motion integration with floor support.
//!
//! `step` is a pure function of the motion state, the floor registry, the
//! elapsed time and the tuning constants. Order within a step:
//!
//!   1. gravity pulls radial velocity toward the centre
//!   2. integrate angle (scaled by 1/radius) and radius
//!   3. when not rising, snap onto the first supporting floor and apply friction
//!   4. a body driven past the centre comes out the other side
//!   5. tiny velocities snap to exactly zero
//!
//! Angular velocity is a tangential speed, so the same value turns a body
//! through a smaller angle on an outer band than on an inner one.

use orb_core::polar::{HitRect, Polar};
use serde::Deserialize;
use std::f64::consts::{PI, TAU};

use crate::floor::{FloorId, FloorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Radial acceleration per millisecond.
    pub gravity: f64,
    /// Angular velocity multiplier applied on every supported step, in [0, 1].
    pub friction: f64,
    /// Velocity components below this magnitude become exactly zero.
    pub velocity_epsilon: f64,
    /// Also require angular containment when searching for support.
    pub check_angular_band: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.003,
            friction: 0.8,
            velocity_epsilon: 0.001,
            check_angular_band: false,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err("Physics validation failed: gravity must be finite".to_string());
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err("Physics validation failed: friction must be within [0, 1]".to_string());
        }
        if self.velocity_epsilon.is_nan() || self.velocity_epsilon < 0.0 {
            return Err("Physics validation failed: velocity_epsilon must be >= 0".to_string());
        }
        Ok(())
    }
}

/// Per-entity spatial state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub position: Polar,
    /// Tangential speed; see the module docs for how it maps to radians.
    pub angular_velocity: f64,
    /// Positive is away from the centre.
    pub radial_velocity: f64,
    /// Origin-relative hitbox. Its height is the reach used for floor support.
    pub hitbox: HitRect,
    pub gravity: bool,
    /// Floor supporting the entity after the last step, if any.
    pub floor: Option<FloorId>,
    pub flip: bool,
}

impl MotionState {
    pub fn new(position: Polar, hitbox: HitRect) -> Self {
        Self {
            position,
            angular_velocity: 0.0,
            radial_velocity: 0.0,
            hitbox,
            gravity: false,
            floor: None,
            flip: false,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.floor.is_some()
    }

    pub fn is_rising(&self) -> bool {
        self.radial_velocity > 0.0
    }
}

pub fn step(motion: &mut MotionState, floors: &FloorRegistry, dt: f64, config: &PhysicsConfig) {
    if motion.gravity {
        motion.radial_velocity -= config.gravity * dt;
    }

    let Polar {
        mut angle,
        mut radius,
    } = motion.position;
    let mut va = motion.angular_velocity;
    let mut vr = motion.radial_velocity;

    // A body sitting exactly on the centre has no tangent to move along.
    if radius > 0.0 {
        angle += (va * TAU / radius) * dt;
    }
    radius += vr * dt;

    motion.floor = None;
    if vr <= 0.0 {
        if let Some(id) =
            floors.find_support(angle, radius, motion.hitbox.h, config.check_angular_band)
        {
            if let Some(floor) = floors.get(id) {
                motion.floor = Some(id);
                radius = floor.top;
                va *= config.friction;
                vr = 0.0;
            }
        }
    }

    if radius < 0.0 {
        radius = -radius;
        angle += PI;
        vr = -vr;
    }

    motion.position = Polar::new(angle, radius);
    motion.angular_velocity = snap(va, config.velocity_epsilon);
    motion.radial_velocity = snap(vr, config.velocity_epsilon);
}

fn snap(v: f64, epsilon: f64) -> f64 {
    if v.abs() < epsilon {
        0.0
    } else {
        v
    }
}
