//! Last-value aggregation of the asynchronous inputs that steer the field.
//!
//! Pointer, touch, and device-tilt events arrive outside the frame loop and
//! land in independent cells here; the frame loop reads one [`FieldDrivers`]
//! snapshot per step. Each cell is idempotent, so no transactional grouping
//! across fields is needed.

use crate::constants::{TILT_DEGREES_FULL_SCALE, TILT_OFFSET_SCALE};
use glam::Vec2;

/// Per-frame snapshot of everything that drives particle forces.
#[derive(Clone, Copy, Debug)]
pub struct FieldDrivers {
    /// Pointer/touch position in surface pixels.
    pub target: Vec2,
    /// Device tilt, each axis in \[-1, 1\].
    pub tilt: Vec2,
    /// Normalized low/mid audio energy in \[0, 1\].
    pub energy: f32,
    /// Frame delta time in seconds.
    pub dt: f32,
}

impl FieldDrivers {
    /// The point particles are attracted to: the pointer target displaced by
    /// the tilt vector at a fixed pixel scale.
    #[inline]
    pub fn steer_point(&self) -> Vec2 {
        self.target + self.tilt * TILT_OFFSET_SCALE
    }
}

/// Merges pointer, touch, and tilt producers into last-known-value cells.
///
/// Absence of input is not an error: the position defaults to the viewport
/// center and tilt to zero until a producer writes something.
#[derive(Clone, Debug)]
pub struct InputAggregator {
    center: Vec2,
    target: Option<Vec2>,
    tilt: Vec2,
}

impl InputAggregator {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(width * 0.5, height * 0.5),
            target: None,
            tilt: Vec2::ZERO,
        }
    }

    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.target = Some(Vec2::new(x, y));
    }

    /// Touch input lands in the same cell as the pointer; whichever producer
    /// wrote last wins.
    pub fn record_touch(&mut self, x: f32, y: f32) {
        self.record_pointer(x, y);
    }

    /// Records device tilt from beta/gamma degrees. A `None` component means
    /// the event was malformed for that axis and the prior value is retained.
    pub fn record_tilt(&mut self, beta: Option<f64>, gamma: Option<f64>) {
        if let (Some(beta), Some(gamma)) = (beta, gamma) {
            self.tilt.x = normalize_tilt(gamma);
            self.tilt.y = normalize_tilt(beta);
        }
    }

    /// Keeps the default target tracking the viewport center across resizes.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.center = Vec2::new(width * 0.5, height * 0.5);
    }

    pub fn snapshot(&self, dt: f32, energy: f32) -> FieldDrivers {
        FieldDrivers {
            target: self.target.unwrap_or(self.center),
            tilt: self.tilt,
            energy,
            dt,
        }
    }
}

#[inline]
pub fn normalize_tilt(degrees: f64) -> f32 {
    (degrees / TILT_DEGREES_FULL_SCALE).clamp(-1.0, 1.0) as f32
}
