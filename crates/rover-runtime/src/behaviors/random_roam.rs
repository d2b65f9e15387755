//! [`RandomRoam`] – wander by picking random states until something is hit.

use rand::rngs::StdRng;
use rover_types::{ActionToken, RoverError, SensorSnapshot, TurnDirection};
use tracing::{debug, info};

use super::{entropy_rng, pick};
use crate::goal::{Goal, GoalCore, Resume};
use crate::timing::Timing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoamState {
    Stopped,
    Moving,
    Turning,
    /// Transient pause; only chosen when the roam is built with
    /// [`RandomRoam::with_pause_state`].
    Stop,
    Ended,
}

const WANDER: [RoamState; 3] = [RoamState::Turning, RoamState::Stopped, RoamState::Moving];
const WANDER_WITH_PAUSE: [RoamState; 4] = [
    RoamState::Turning,
    RoamState::Stopped,
    RoamState::Moving,
    RoamState::Stop,
];

pub struct RandomRoam {
    core: GoalCore,
    timing: Timing,
    rng: StdRng,
    state: RoamState,
    pause_state: bool,
    last_turn: Option<TurnDirection>,
}

impl RandomRoam {
    pub fn new(core: GoalCore, timing: Timing) -> Self {
        Self::with_rng(core, timing, entropy_rng())
    }

    pub fn with_rng(core: GoalCore, timing: Timing, rng: StdRng) -> Self {
        Self {
            core,
            timing,
            rng,
            state: RoamState::Stopped,
            pause_state: false,
            last_turn: None,
        }
    }

    /// Include [`RoamState::Stop`] in the random choice set.
    pub fn with_pause_state(mut self, enabled: bool) -> Self {
        self.pause_state = enabled;
        self
    }

    pub fn state(&self) -> RoamState {
        self.state
    }

    /// Direction of the most recent turn, if any.
    pub fn last_turn(&self) -> Option<TurnDirection> {
        self.last_turn
    }

    fn choices(&self) -> &'static [RoamState] {
        if self.pause_state {
            &WANDER_WITH_PAUSE
        } else {
            &WANDER
        }
    }

    fn wander(&mut self) {
        let options = self.choices();
        let next = pick(&mut self.rng, options);
        self.transition(next);
    }

    fn transition(&mut self, next: RoamState) {
        if next == self.state {
            debug!(goal = %self.core.name(), state = ?next, "state kept");
        } else {
            info!(goal = %self.core.name(), from = ?self.state, to = ?next, "state transition");
        }
        self.state = next;
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: RoamState) {
        self.state = state;
    }
}

impl Goal for RandomRoam {
    fn core(&self) -> &GoalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GoalCore {
        &mut self.core
    }

    fn step(&mut self, rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        match self.state {
            RoamState::Stopped => {
                self.core.emit(ActionToken::Forward)?;
                self.transition(RoamState::Moving);
                Ok(Resume::Yield)
            }
            RoamState::Moving => {
                if rays.any_hit() {
                    self.core.emit(ActionToken::Stop)?;
                    self.transition(RoamState::Ended);
                } else {
                    self.wander();
                }
                Ok(Resume::Yield)
            }
            RoamState::Stop => {
                self.core.emit(ActionToken::Stop)?;
                self.wander();
                Ok(Resume::Yield)
            }
            RoamState::Turning => {
                let direction = pick(&mut self.rng, &TurnDirection::BOTH);
                self.core.emit(direction.token())?;
                self.last_turn = Some(direction);
                self.wander();
                Ok(Resume::After(self.timing.turn_dwell()))
            }
            RoamState::Ended => Ok(Resume::After(self.timing.idle())),
        }
    }

    fn state_label(&self) -> &'static str {
        match self.state {
            RoamState::Stopped => "stopped",
            RoamState::Moving => "moving",
            RoamState::Turning => "turning",
            RoamState::Stop => "stop",
            RoamState::Ended => "ended",
        }
    }

    fn is_terminal(&self) -> bool {
        self.state == RoamState::Ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use rand::SeedableRng;
    use rover_hal::{SimAgent, SimSensor};
    use rover_types::ActionToken::{Forward, Stop, TurnLeft, TurnRight};

    fn roam(seed: u64, pause: bool) -> (RandomRoam, Arc<SimAgent>, Arc<SimSensor>) {
        let agent = Arc::new(SimAgent::new());
        let sensor = Arc::new(SimSensor::new(5));
        let core = GoalCore::new("roam", agent.clone(), sensor.clone());
        let goal = RandomRoam::with_rng(core, Timing::default(), StdRng::seed_from_u64(seed))
            .with_pause_state(pause);
        (goal, agent, sensor)
    }

    #[test]
    fn starts_by_moving_forward() {
        let (mut goal, agent, _) = roam(1, false);
        assert_eq!(goal.update().unwrap(), Resume::Yield);
        assert_eq!(goal.state(), RoamState::Moving);
        assert_eq!(agent.sent(), vec![Forward]);
    }

    #[test]
    fn hit_while_moving_ends() {
        let (mut goal, agent, sensor) = roam(1, false);
        goal.update().unwrap();
        agent.take_sent();
        sensor.set_hits([0, 1, 0, 0, 0]);
        goal.update().unwrap();
        assert_eq!(goal.state(), RoamState::Ended);
        assert!(goal.is_terminal());
        assert_eq!(agent.sent(), vec![Stop]);
    }

    #[test]
    fn turning_emits_a_side_and_dwells() {
        let (mut goal, agent, _) = roam(5, false);
        goal.force_state(RoamState::Turning);
        let resume = goal.update().unwrap();
        assert_eq!(resume, Resume::After(Timing::default().turn_dwell()));
        let sent = agent.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], TurnLeft | TurnRight));
        assert_eq!(goal.last_turn().map(|d| d.token()), Some(sent[0]));
        assert_ne!(goal.state(), RoamState::Stop);
    }

    #[test]
    fn stop_state_emits_stop_then_wanders() {
        let (mut goal, agent, _) = roam(9, false);
        goal.force_state(RoamState::Stop);
        goal.update().unwrap();
        assert_eq!(agent.sent(), vec![Stop]);
        assert!(WANDER.contains(&goal.state()));
    }

    #[test]
    fn stop_state_is_never_chosen_by_default() {
        let (mut goal, _, _) = roam(21, false);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            goal.update().unwrap();
            seen.insert(goal.state());
        }
        assert!(!seen.contains(&RoamState::Stop));
        assert!(seen.contains(&RoamState::Turning));
        assert!(seen.contains(&RoamState::Moving));
    }

    #[test]
    fn pause_state_makes_stop_reachable() {
        let (mut goal, _, _) = roam(21, true);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            goal.update().unwrap();
            seen.insert(goal.state());
        }
        assert!(seen.contains(&RoamState::Stop));
    }

    #[test]
    fn only_known_tokens_and_sides_are_emitted() {
        let (mut goal, agent, _) = roam(77, true);
        for _ in 0..300 {
            goal.update().unwrap();
        }
        assert!(
            agent
                .sent()
                .iter()
                .all(|t| matches!(t, Forward | Stop | TurnLeft | TurnRight))
        );
    }

    #[test]
    fn ended_is_stable() {
        let (mut goal, agent, sensor) = roam(3, true);
        goal.update().unwrap();
        sensor.set_hits([1, 1, 1, 1, 1]);
        goal.update().unwrap();
        agent.take_sent();
        for hits in [[0, 0, 0, 0, 0], [1, 1, 1, 1, 1]] {
            sensor.set_hits(hits);
            assert_eq!(goal.update().unwrap(), Resume::After(Timing::default().idle()));
        }
        assert!(agent.sent().is_empty());
        assert_eq!(goal.state(), RoamState::Ended);
    }

    #[test]
    fn failed_turn_keeps_turning_state() {
        let (mut goal, agent, _) = roam(4, false);
        goal.force_state(RoamState::Turning);
        agent.fail_next(1);
        assert!(goal.update().is_err());
        assert_eq!(goal.state(), RoamState::Turning);
        assert_eq!(goal.last_turn(), None);
        assert_eq!(goal.core().tracker().pending_total(), 0);
    }
}
