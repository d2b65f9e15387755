//! [`Avoid`] – keep moving forward and steer around whatever gets in the way.
//!
//! The maneuver has four phases once an obstacle shows up while moving:
//!
//! 1. **Deciding** – pick a side.  A lone head-on hit picks at random;
//!    otherwise the goal turns away from the heavier side (ties go Right).
//! 2. **Turning** – one turn token, then a dwell.
//! 3. **AvoidingObstacle** – [`AVOID_DISTANCE`] Forward tokens, one per cycle.
//! 4. **Aligning** – [`ALIGN_DISTANCE`] tokens in the opposite direction, one
//!    per cycle, then back to Moving.
//!
//! A sensor that is hit on every ray means the rover is boxed in.  How the
//! Moving state reacts to that is controlled by [`AvoidMoving`].

use rand::rngs::StdRng;
use rover_types::{ActionToken, RoverError, SensorSnapshot, TurnDirection};
use tracing::info;

use super::{entropy_rng, pick};
use crate::goal::{Goal, GoalCore, Resume};
use crate::timing::Timing;

/// Forward steps taken to get past an obstacle.
pub const AVOID_DISTANCE: u32 = 10;
/// Counter-turn steps taken to restore the heading.
pub const ALIGN_DISTANCE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidState {
    Stopped,
    Moving,
    Deciding,
    Turning,
    AvoidingObstacle,
    Aligning,
    Ended,
}

/// How Moving treats a fully blocked sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AvoidMoving {
    /// The blocked and partially-blocked checks both run: two Stops are sent
    /// and the goal ends up Deciding rather than Ended.
    #[default]
    Literal,
    /// A blocked sensor sends one Stop and ends the goal.
    Exclusive,
}

pub struct Avoid {
    core: GoalCore,
    timing: Timing,
    rng: StdRng,
    moving: AvoidMoving,
    state: AvoidState,
    turn_direction: Option<TurnDirection>,
    avoid_distance: u32,
    align_distance: u32,
}

impl Avoid {
    pub fn new(core: GoalCore, timing: Timing) -> Self {
        Self::with_rng(core, timing, entropy_rng())
    }

    pub fn with_rng(core: GoalCore, timing: Timing, rng: StdRng) -> Self {
        Self {
            core,
            timing,
            rng,
            moving: AvoidMoving::default(),
            state: AvoidState::Stopped,
            turn_direction: None,
            avoid_distance: 0,
            align_distance: 0,
        }
    }

    pub fn with_moving_policy(mut self, moving: AvoidMoving) -> Self {
        self.moving = moving;
        self
    }

    pub fn state(&self) -> AvoidState {
        self.state
    }

    /// Side chosen by the last Deciding step.
    pub fn turn_direction(&self) -> Option<TurnDirection> {
        self.turn_direction
    }

    pub fn avoid_distance(&self) -> u32 {
        self.avoid_distance
    }

    pub fn align_distance(&self) -> u32 {
        self.align_distance
    }

    fn transition(&mut self, next: AvoidState) {
        info!(goal = %self.core.name(), from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    fn decide(&mut self, rays: &SensorSnapshot) -> TurnDirection {
        if rays.only_center_hit() {
            pick(&mut self.rng, &TurnDirection::BOTH)
        } else if rays.left_load() > rays.right_load() {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }

    fn step_moving(&mut self, rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        if rays.all_hit() {
            self.core.emit(ActionToken::Stop)?;
            if self.moving == AvoidMoving::Exclusive {
                self.transition(AvoidState::Ended);
                return Ok(Resume::Yield);
            }
            // Literal: the Ended outcome is overridden by the hit check
            // below within the same step, so only Deciding is recorded.
        }
        if rays.any_hit() {
            self.core.emit(ActionToken::Stop)?;
            self.transition(AvoidState::Deciding);
        }
        Ok(Resume::Yield)
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: AvoidState, direction: Option<TurnDirection>) {
        self.state = state;
        self.turn_direction = direction;
    }
}

impl Goal for Avoid {
    fn core(&self) -> &GoalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GoalCore {
        &mut self.core
    }

    fn step(&mut self, rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        match self.state {
            AvoidState::Stopped => {
                self.core.emit(ActionToken::Forward)?;
                self.transition(AvoidState::Moving);
                Ok(Resume::Yield)
            }
            AvoidState::Moving => self.step_moving(rays),
            AvoidState::Deciding => {
                let direction = self.decide(rays);
                info!(
                    goal = %self.core.name(),
                    %direction,
                    left = rays.left_load(),
                    right = rays.right_load(),
                    "avoidance side chosen"
                );
                self.turn_direction = Some(direction);
                self.avoid_distance = 0;
                self.transition(AvoidState::Turning);
                Ok(Resume::Yield)
            }
            AvoidState::Turning => {
                let Some(direction) = self.turn_direction else {
                    return Err(self.core.unknown_state("turning without a direction"));
                };
                self.core.emit(direction.token())?;
                self.transition(AvoidState::AvoidingObstacle);
                Ok(Resume::After(self.timing.turn_dwell()))
            }
            AvoidState::AvoidingObstacle => {
                if self.avoid_distance < AVOID_DISTANCE {
                    self.core.emit(ActionToken::Forward)?;
                    self.avoid_distance += 1;
                } else {
                    self.avoid_distance = 0;
                    self.align_distance = 0;
                    self.transition(AvoidState::Aligning);
                }
                Ok(Resume::Yield)
            }
            AvoidState::Aligning => {
                let Some(direction) = self.turn_direction else {
                    return Err(self.core.unknown_state("aligning without a direction"));
                };
                if self.align_distance < ALIGN_DISTANCE {
                    self.core.emit(direction.opposite().token())?;
                    self.align_distance += 1;
                } else {
                    self.transition(AvoidState::Moving);
                }
                Ok(Resume::Yield)
            }
            AvoidState::Ended => Ok(Resume::After(self.timing.idle())),
        }
    }

    fn state_label(&self) -> &'static str {
        match self.state {
            AvoidState::Stopped => "stopped",
            AvoidState::Moving => "moving",
            AvoidState::Deciding => "deciding",
            AvoidState::Turning => "turning",
            AvoidState::AvoidingObstacle => "avoiding-obstacle",
            AvoidState::Aligning => "aligning",
            AvoidState::Ended => "ended",
        }
    }

    fn is_terminal(&self) -> bool {
        self.state == AvoidState::Ended
    }
}
