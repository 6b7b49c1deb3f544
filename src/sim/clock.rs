//! Fixed-timestep accumulator

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Converts variable frame deltas into a bounded number of fixed steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    accumulated_time: f64,
    fixed_step: f64,
    max_substeps_per_frame: u32,
    /// Fixed steps taken since the last reset
    elapsed_steps: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl SimulationClock {
    pub fn new(fixed_step: f64, max_substeps_per_frame: u32) -> Self {
        Self {
            accumulated_time: 0.0,
            fixed_step,
            max_substeps_per_frame,
            elapsed_steps: 0,
        }
    }

    /// Add a frame delta (seconds). Negative or non-finite deltas are ignored.
    pub fn accumulate(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.accumulated_time += dt;
        }
    }

    /// Whether another step is owed and the frame still has substep budget.
    pub fn should_step(&self, substeps_this_frame: u32) -> bool {
        self.accumulated_time >= self.fixed_step && substeps_this_frame < self.max_substeps_per_frame
    }

    /// Consume one fixed step of accumulated time.
    pub fn consume_step(&mut self) {
        self.accumulated_time -= self.fixed_step;
        self.elapsed_steps += 1;
    }

    /// Count a step taken without accumulated time (fast-forward mode).
    pub fn force_step(&mut self) {
        self.elapsed_steps += 1;
    }

    /// Drop any time still owed beyond one step. Sustained overload runs in slow motion
    /// instead of spiralling into catch-up.
    pub fn drop_backlog(&mut self) {
        if self.accumulated_time >= self.fixed_step {
            log::trace!(
                "Dropping {:.4}s of simulation backlog",
                self.accumulated_time - self.accumulated_time % self.fixed_step
            );
            self.accumulated_time %= self.fixed_step;
        }
    }

    /// Simulated seconds since reset (step count × fixed step, no float drift)
    pub fn sim_seconds(&self) -> f64 {
        self.elapsed_steps as f64 * self.fixed_step
    }

    pub fn sim_millis(&self) -> f64 {
        self.sim_seconds() * 1000.0
    }

    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }

    pub fn max_substeps(&self) -> u32 {
        self.max_substeps_per_frame
    }

    pub fn elapsed_steps(&self) -> u64 {
        self.elapsed_steps
    }

    pub fn reset(&mut self) {
        self.accumulated_time = 0.0;
        self.elapsed_steps = 0;
    }
}
