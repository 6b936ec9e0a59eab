//! Adaptive advance intensity.
//!
//! Large jumps can skip rows the view has not rendered yet, so once the run
//! goes stale the controller advances in smaller steps, more often.

use serde::Serialize;

use crate::domain::models::AdvanceConfig;

/// Step size and repetition count for one advance command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvanceIntensity {
    pub step: u32,
    pub repetitions: u32,
}

/// Tracks the current intensity across cycles.
#[derive(Debug, Clone)]
pub struct IntensityController {
    config: AdvanceConfig,
    current: AdvanceIntensity,
}

impl IntensityController {
    /// Start at the configured baseline.
    pub fn new(config: AdvanceConfig) -> Self {
        let current = Self::baseline_of(&config);
        Self { config, current }
    }

    fn baseline_of(config: &AdvanceConfig) -> AdvanceIntensity {
        AdvanceIntensity {
            step: config.baseline_step,
            repetitions: config.baseline_repetitions,
        }
    }

    /// Intensity for the next advance.
    pub fn current(&self) -> AdvanceIntensity {
        self.current
    }

    /// Intensity used while the source keeps producing data.
    pub fn baseline(&self) -> AdvanceIntensity {
        Self::baseline_of(&self.config)
    }

    /// Progress observed: go back to baseline.
    pub fn reset(&mut self) {
        self.current = self.baseline();
    }

    /// A stale cycle was observed; `stale_streak` includes it.
    ///
    /// From `escalate_after` onwards every stale cycle halves the step (not
    /// below the floor) and doubles the repetitions (not above the cap).
    /// Returns true when the intensity changed.
    pub fn on_stale(&mut self, stale_streak: u32) -> bool {
        if stale_streak < self.config.escalate_after {
            return false;
        }

        let next = AdvanceIntensity {
            step: (self.current.step / 2).max(self.config.step_floor),
            repetitions: self
                .current
                .repetitions
                .saturating_mul(2)
                .min(self.config.max_repetitions),
        };
        let changed = next != self.current;
        self.current = next;
        changed
    }
}
