//! [`ForwardStop`] – drive straight until anything shows up on the sensor.

use rover_types::{ActionToken, RoverError, SensorSnapshot};
use tracing::info;

use crate::goal::{Goal, GoalCore, Resume};
use crate::timing::Timing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardStopState {
    Stopped,
    Moving,
    Ended,
}

/// Moves forward until any ray reports a hit, then stops for good.
pub struct ForwardStop {
    core: GoalCore,
    timing: Timing,
    state: ForwardStopState,
}

impl ForwardStop {
    pub fn new(core: GoalCore, timing: Timing) -> Self {
        Self {
            core,
            timing,
            state: ForwardStopState::Stopped,
        }
    }

    pub fn state(&self) -> ForwardStopState {
        self.state
    }

    fn transition(&mut self, next: ForwardStopState) {
        info!(goal = %self.core.name(), from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}

impl Goal for ForwardStop {
    fn core(&self) -> &GoalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GoalCore {
        &mut self.core
    }

    fn step(&mut self, rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        match self.state {
            ForwardStopState::Stopped => {
                self.core.emit(ActionToken::Forward)?;
                self.transition(ForwardStopState::Moving);
                Ok(Resume::Yield)
            }
            ForwardStopState::Moving => {
                if rays.any_hit() {
                    self.core.emit(ActionToken::Stop)?;
                    self.transition(ForwardStopState::Ended);
                }
                Ok(Resume::Yield)
            }
            ForwardStopState::Ended => Ok(Resume::After(self.timing.idle())),
        }
    }

    fn state_label(&self) -> &'static str {
        match self.state {
            ForwardStopState::Stopped => "stopped",
            ForwardStopState::Moving => "moving",
            ForwardStopState::Ended => "ended",
        }
    }

    fn is_terminal(&self) -> bool {
        self.state == ForwardStopState::Ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rover_hal::{SimAgent, SimSensor};
    use rover_types::ActionToken::{Forward, Stop};

    fn setup() -> (ForwardStop, Arc<SimAgent>, Arc<SimSensor>) {
        let agent = Arc::new(SimAgent::new());
        let sensor = Arc::new(SimSensor::new(5));
        let core = GoalCore::new("forward-stop", agent.clone(), sensor.clone());
        (ForwardStop::new(core, Timing::default()), agent, sensor)
    }

    #[test]
    fn clear_sensor_starts_moving_with_one_forward() {
        let (mut goal, agent, _sensor) = setup();
        assert_eq!(goal.update().unwrap(), Resume::Yield);
        assert_eq!(goal.state(), ForwardStopState::Moving);
        assert_eq!(agent.sent(), vec![Forward]);
    }

    #[test]
    fn moving_without_hits_only_yields() {
        let (mut goal, agent, _sensor) = setup();
        goal.update().unwrap();
        for _ in 0..5 {
            assert_eq!(goal.update().unwrap(), Resume::Yield);
        }
        assert_eq!(goal.state(), ForwardStopState::Moving);
        assert_eq!(agent.sent(), vec![Forward]);
    }

    #[test]
    fn hit_while_moving_stops_and_ends() {
        let (mut goal, agent, sensor) = setup();
        goal.update().unwrap();
        agent.take_sent();

        sensor.set_hits([0, 0, 0, 1, 0]);
        goal.update().unwrap();
        assert_eq!(goal.state(), ForwardStopState::Ended);
        assert!(goal.is_terminal());
        assert_eq!(agent.sent(), vec![Stop]);
    }

    #[test]
    fn ended_emits_nothing_regardless_of_sensor() {
        let (mut goal, agent, sensor) = setup();
        goal.update().unwrap();
        sensor.set_hits([1, 1, 1, 1, 1]);
        goal.update().unwrap();
        agent.take_sent();

        for hits in [[0, 0, 0, 0, 0], [1, 0, 1, 0, 1], [1, 1, 1, 1, 1]] {
            sensor.set_hits(hits);
            assert_eq!(
                goal.update().unwrap(),
                Resume::After(Timing::default().idle())
            );
        }
        assert!(agent.sent().is_empty());
        assert_eq!(goal.state(), ForwardStopState::Ended);
    }

    #[test]
    fn failed_start_is_retried_from_stopped() {
        let (mut goal, agent, _sensor) = setup();
        agent.fail_next(1);
        assert!(goal.update().is_err());
        assert_eq!(goal.state(), ForwardStopState::Stopped);
        assert_eq!(goal.core().requested(Forward), 0);

        goal.update().unwrap();
        assert_eq!(goal.state(), ForwardStopState::Moving);
        assert_eq!(agent.sent(), vec![Forward]);
    }
}
