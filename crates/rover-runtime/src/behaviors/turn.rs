//! [`Turn`] – turn a random number of degrees, rest, repeat.
//!
//! Each sequence picks a direction and a signed angle in `[-100, 100]`,
//! turns `floor(|degrees| / 5)` discrete steps with a short pause between
//! them, then idles before the next sequence is drawn.

use rand::Rng;
use rand::rngs::StdRng;
use rover_types::{ActionToken, RoverError, SensorSnapshot, TurnDirection};
use tracing::info;

use super::{entropy_rng, pick};
use crate::goal::{Goal, GoalCore, Resume};
use crate::timing::Timing;

/// Degrees covered by one discrete turn step.
pub const DEGREES_PER_STEP: u32 = 5;
/// Largest angle magnitude a plan may draw.
pub const MAX_DEGREES: i32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Plan and step sequence
// ─────────────────────────────────────────────────────────────────────────────

/// One randomized turn: a direction and a signed angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub direction: TurnDirection,
    pub degrees: i32,
}

impl TurnPlan {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            direction: pick(rng, &TurnDirection::BOTH),
            degrees: rng.gen_range(-MAX_DEGREES..=MAX_DEGREES),
        }
    }

    /// `floor(|degrees| / 5)`.
    pub fn steps(&self) -> usize {
        (self.degrees.unsigned_abs() / DEGREES_PER_STEP) as usize
    }

    /// A fresh tick sequence for this plan.  Calling it again restarts from
    /// the first tick.
    pub fn ticks(&self) -> TurnSteps {
        TurnSteps {
            token: self.direction.token(),
            remaining: self.steps(),
        }
    }
}

/// Lazy, finite sequence of turn tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSteps {
    token: ActionToken,
    remaining: usize,
}

impl TurnSteps {
    /// The next token without consuming it.
    pub fn peek(&self) -> Option<ActionToken> {
        (self.remaining > 0).then_some(self.token)
    }
}

impl Iterator for TurnSteps {
    type Item = ActionToken;

    fn next(&mut self) -> Option<ActionToken> {
        let token = self.peek()?;
        self.remaining -= 1;
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TurnSteps {}

// ─────────────────────────────────────────────────────────────────────────────
// Turn goal
// ─────────────────────────────────────────────────────────────────────────────

struct ActiveTurn {
    plan: TurnPlan,
    ticks: TurnSteps,
}

/// Repeats randomized turns forever.  Has no state machine: the only data it
/// keeps between calls is the sequence currently being stepped through.
pub struct Turn {
    core: GoalCore,
    timing: Timing,
    rng: StdRng,
    active: Option<ActiveTurn>,
}

impl Turn {
    pub fn new(core: GoalCore, timing: Timing) -> Self {
        Self::with_rng(core, timing, entropy_rng())
    }

    pub fn with_rng(core: GoalCore, timing: Timing, rng: StdRng) -> Self {
        Self {
            core,
            timing,
            rng,
            active: None,
        }
    }

    /// The plan being executed, if a sequence is in progress.
    pub fn current_plan(&self) -> Option<TurnPlan> {
        self.active.as_ref().map(|a| a.plan)
    }

    /// Ticks left in the current sequence.
    pub fn remaining_steps(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.ticks.len())
    }
}

impl Goal for Turn {
    fn core(&self) -> &GoalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GoalCore {
        &mut self.core
    }

    fn step(&mut self, _rays: &SensorSnapshot) -> Result<Resume, RoverError> {
        if self.active.is_none() {
            let plan = TurnPlan::random(&mut self.rng);
            info!(
                goal = %self.core.name(),
                degrees = plan.degrees,
                direction = %plan.direction,
                steps = plan.steps(),
                "turning"
            );
            self.active = Some(ActiveTurn {
                plan,
                ticks: plan.ticks(),
            });
        }

        let next = self.active.as_ref().and_then(|a| a.ticks.peek());
        match next {
            Some(token) => {
                // Consume the tick only once the send went through, so a
                // retry re-attempts the same tick.
                self.core.emit(token)?;
                if let Some(active) = self.active.as_mut() {
                    active.ticks.next();
                }
                Ok(Resume::After(self.timing.turn_step()))
            }
            None => {
                info!(goal = %self.core.name(), "done turning");
                self.active = None;
                Ok(Resume::After(self.timing.idle()))
            }
        }
    }

    fn state_label(&self) -> &'static str {
        if self.active.is_some() { "turning" } else { "resting" }
    }
}
