//! Suspension intervals shared by every goal and the scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every fixed wait used by the behaviors, in milliseconds.
///
/// Deserialises from the `[timing]` table of the CLI config; missing fields
/// fall back to the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Virtual time one scheduler pass consumes when a goal yields.
    pub pass_ms: u64,
    /// Delay between discrete turn steps of the `turn` goal.
    pub turn_step_ms: u64,
    /// Hold time after a committed turn (`roam` and `avoid`).
    pub turn_dwell_ms: u64,
    /// Idle period of a goal parked in its terminal state.
    pub idle_ms: u64,
    /// Poll period of the `idle` goal.
    pub idle_poll_ms: u64,
    /// Back-off before retrying after a transient send failure.
    pub retry_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pass_ms: 50,
            turn_step_ms: 500,
            turn_dwell_ms: 2_000,
            idle_ms: 10_000,
            idle_poll_ms: 1_000,
            retry_ms: 100,
        }
    }
}

impl Timing {
    pub fn pass(&self) -> Duration {
        Duration::from_millis(self.pass_ms.max(1))
    }

    pub fn turn_step(&self) -> Duration {
        Duration::from_millis(self.turn_step_ms)
    }

    pub fn turn_dwell(&self) -> Duration {
        Duration::from_millis(self.turn_dwell_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}
