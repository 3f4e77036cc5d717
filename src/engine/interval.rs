// src/engine/interval.rs

use std::time::Duration;

use super::PollerOptions;

/// Adaptive delay between ticks.
///
/// Grows by a fixed step while tasks keep running (capped at the maximum) and
/// snaps back to the minimum as soon as a tick sees nothing in flight. The
/// current value never leaves `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveInterval {
    min: Duration,
    max: Duration,
    step: Duration,
    current: Duration,
}

impl AdaptiveInterval {
    pub fn new(options: &PollerOptions) -> Self {
        // Options are validated upstream, but keep the bounds ordered anyway
        // so `clamp` can never panic.
        let min = options.min_interval.min(options.max_interval);
        let max = options.max_interval.max(min);
        Self {
            min,
            max,
            step: options.step,
            current: min,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Back to the minimum (session start, or a tick with nothing in flight).
    pub fn reset(&mut self) -> Duration {
        self.current = self.min;
        self.current
    }

    /// One step slower, saturating at the maximum.
    pub fn grow(&mut self) -> Duration {
        self.current = self.current.saturating_add(self.step).clamp(self.min, self.max);
        self.current
    }

    /// Apply the policy for a tick that produced observations.
    pub fn adapt(&mut self, any_in_flight: bool) -> Duration {
        if any_in_flight {
            self.grow()
        } else {
            self.reset()
        }
    }
}
