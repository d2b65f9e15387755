//! Concrete goals.
//!
//! | Goal           | States                                                          |
//! |----------------|-----------------------------------------------------------------|
//! | [`ForwardStop`] | Stopped → Moving → Ended                                       |
//! | [`Turn`]        | none; one randomized turn sequence at a time                   |
//! | [`RandomRoam`]  | Stopped, Moving, Turning, Stop, Ended                          |
//! | [`Avoid`]       | Stopped, Moving, Deciding, Turning, AvoidingObstacle, Aligning, Ended |
//! | [`Idle`]        | none                                                           |
//!
//! [`GoalKind`] names each goal for configuration and the command line, and
//! [`GoalKind::build`] constructs one from a [`GoalCore`].

mod avoid;
mod forward_stop;
mod idle;
mod random_roam;
mod turn;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rover_types::RoverError;
use serde::{Deserialize, Serialize};

pub use avoid::{ALIGN_DISTANCE, AVOID_DISTANCE, Avoid, AvoidMoving, AvoidState};
pub use forward_stop::{ForwardStop, ForwardStopState};
pub use idle::Idle;
pub use random_roam::{RandomRoam, RoamState};
pub use turn::{DEGREES_PER_STEP, MAX_DEGREES, Turn, TurnPlan, TurnSteps};

use crate::goal::{Goal, GoalCore};
use crate::timing::Timing;

/// Uniform choice from a non-empty slice.
pub(crate) fn pick<T: Copy>(rng: &mut impl Rng, options: &[T]) -> T {
    options[rng.gen_range(0..options.len())]
}

pub(crate) fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

// ─────────────────────────────────────────────────────────────────────────────
// GoalKind
// ─────────────────────────────────────────────────────────────────────────────

/// Selectable goal, as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalKind {
    ForwardStop,
    Turn,
    Roam,
    Avoid,
    Idle,
}

/// Per-goal switches that do not fit in [`Timing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalOptions {
    /// Seed for the goal's random source; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Let [`RandomRoam`] pick its Stop state.
    pub roam_pause: bool,
    /// Make [`Avoid`]'s fully-blocked branch exclusive.
    pub avoid_exclusive_stop: bool,
}

impl GoalKind {
    pub const ALL: [GoalKind; 5] = [
        GoalKind::ForwardStop,
        GoalKind::Turn,
        GoalKind::Roam,
        GoalKind::Avoid,
        GoalKind::Idle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GoalKind::ForwardStop => "forward-stop",
            GoalKind::Turn => "turn",
            GoalKind::Roam => "roam",
            GoalKind::Avoid => "avoid",
            GoalKind::Idle => "idle",
        }
    }

    /// Construct the goal on top of `core`.
    pub fn build(self, core: GoalCore, timing: Timing, options: GoalOptions) -> Box<dyn Goal> {
        let rng = || options.seed.map_or_else(entropy_rng, StdRng::seed_from_u64);
        match self {
            GoalKind::ForwardStop => Box::new(ForwardStop::new(core, timing)),
            GoalKind::Turn => Box::new(Turn::with_rng(core, timing, rng())),
            GoalKind::Roam => Box::new(
                RandomRoam::with_rng(core, timing, rng()).with_pause_state(options.roam_pause),
            ),
            GoalKind::Avoid => {
                let moving = if options.avoid_exclusive_stop {
                    AvoidMoving::Exclusive
                } else {
                    AvoidMoving::Literal
                };
                Box::new(Avoid::with_rng(core, timing, rng()).with_moving_policy(moving))
            }
            GoalKind::Idle => Box::new(Idle::new(core, timing)),
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalKind {
    type Err = RoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        GoalKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                RoverError::Config(format!(
                    "unknown goal '{s}' (expected one of: forward-stop, turn, roam, avoid, idle)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rover_hal::{SimAgent, SimSensor};

    #[test]
    fn goal_kind_round_trips_through_str() {
        for kind in GoalKind::ALL {
            assert_eq!(kind.as_str().parse::<GoalKind>().unwrap(), kind);
        }
        assert_eq!(" Avoid ".parse::<GoalKind>().unwrap(), GoalKind::Avoid);
        assert!(matches!(
            "teleport".parse::<GoalKind>(),
            Err(RoverError::Config(_))
        ));
    }

    #[test]
    fn goal_kind_serde_uses_kebab_case() {
        let json = serde_json::to_string(&GoalKind::ForwardStop).unwrap();
        assert_eq!(json, "\"forward-stop\"");
    }

    #[test]
    fn build_names_goal_after_core() {
        let agent = Arc::new(SimAgent::new());
        let sensor = Arc::new(SimSensor::new(3));
        for kind in GoalKind::ALL {
            let core = GoalCore::new(kind.as_str(), agent.clone(), sensor.clone());
            let goal = kind.build(core, Timing::default(), GoalOptions::default());
            assert_eq!(goal.name(), kind.as_str());
            assert!(!goal.is_terminal());
        }
    }

    #[test]
    fn pick_only_returns_members() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let v = pick(&mut rng, &[3, 5, 8]);
            assert!([3, 5, 8].contains(&v));
        }
    }
}
