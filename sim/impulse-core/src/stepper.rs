//! Fixed-timestep accumulator.
//!
//! Frame times are added to an accumulator and consumed in whole `fixed_dt`
//! slices, at most `max_substeps` per call. Whatever is still owed beyond
//! `fixed_dt * max_substeps` afterwards is dropped, so a long stall (a
//! debugger pause, a slow frame) cannot snowball into ever longer catch-up
//! frames.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a [`World::step`](crate::World::step) call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepStats {
    /// Fixed substeps executed.
    pub substeps: usize,
    /// Contacts alive after the last substep.
    pub contacts: usize,
    /// Simulation time discarded by the catch-up guard (s).
    pub dropped_time: f64,
}

/// Substeps owed for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubstepPlan {
    /// Number of `fixed_dt` substeps to run now.
    pub substeps: usize,
    /// Time discarded by the catch-up guard (s).
    pub dropped_time: f64,
}

/// Accumulator state for fixed-timestep stepping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedTimestep {
    accumulator: f64,
}

impl FixedTimestep {
    /// Start with an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time accumulated but not yet simulated.
    #[must_use]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Discard accumulated time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Add `dt` and take as many whole substeps as allowed.
    ///
    /// `dt` must be finite and non-negative and `fixed_dt` positive; callers
    /// sanitize both.
    pub fn advance(&mut self, dt: f64, fixed_dt: f64, max_substeps: usize) -> SubstepPlan {
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.accumulator -= fixed_dt;
            substeps += 1;
        }

        let mut dropped_time = 0.0;
        if self.accumulator > fixed_dt * max_substeps as f64 {
            dropped_time = self.accumulator;
            self.accumulator = 0.0;
        }

        SubstepPlan {
            substeps,
            dropped_time,
        }
    }
}
