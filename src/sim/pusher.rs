//! Oscillating pusher platform
//!
//! The pusher's Z position is a pure function of accumulated simulation time, so two runs
//! with the same step count put it in exactly the same place regardless of frame rate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PusherActuator {
    pub rest_z: f32,
    pub amplitude: f32,
    /// Seconds per full oscillation
    pub period: f32,
    /// Constant X/Y of the platform center
    pub x: f32,
    pub y: f32,
}

impl Default for PusherActuator {
    fn default() -> Self {
        Self {
            rest_z: PUSHER_REST_Z,
            amplitude: PUSHER_AMPLITUDE,
            period: PUSHER_PERIOD,
            x: 0.0,
            y: FLOOR_TOP_Y + PUSHER_HALF_EXTENTS[1],
        }
    }
}

impl PusherActuator {
    /// Z position after `sim_seconds` of simulated time
    #[inline]
    pub fn position_at(&self, sim_seconds: f64) -> f32 {
        let phase = sim_seconds * std::f64::consts::TAU / self.period as f64;
        self.rest_z + self.amplitude * phase.sin() as f32
    }

    /// Full platform center after `sim_seconds`
    #[inline]
    pub fn target_at(&self, sim_seconds: f64) -> Vec3 {
        Vec3::new(self.x, self.y, self.position_at(sim_seconds))
    }
}
