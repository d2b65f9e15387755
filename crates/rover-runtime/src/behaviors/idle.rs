use rover_types::{RoverError, SensorSnapshot};
use tracing::debug;

use crate::goal::{Goal, GoalCore, Resume};
use crate::timing::Timing;

/// Keeps its tracker reconciled and does nothing else.
pub struct Idle {
    core: GoalCore,
    timing: Timing,
}

impl Idle {
    pub fn new(core: GoalCore, timing: Timing) -> Self {
        Self { core, timing }
    }
}

impl Goal for Idle {
    fn core(&self) -> &GoalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GoalCore {
        &mut self.core
    }

    fn step(&mut self, _rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        debug!(goal = %self.core.name(), "doing nothing");
        Ok(Resume::After(self.timing.idle_poll()))
    }

    fn state_label(&self) -> &'static str {
        "idle"
    }
}
