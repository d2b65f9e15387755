//! The [`Goal`] contract and the [`GoalCore`] every behavior is built on.
//!
//! A goal is a resumable state machine.  The scheduler calls
//! [`Goal::update`] repeatedly; each call runs exactly one step and returns a
//! [`Resume`] directive saying when the goal wants to run again.
//!
//! # Cycle ordering
//!
//! [`Goal::update`] is provided by the trait and always runs
//! [`GoalCore::begin_cycle`] before the behavior's own [`Goal::step`]:
//!
//! 1. reconcile the [`RequestTracker`] against the agent's executing list,
//! 2. read and shape-check the sensor,
//! 3. run one state-machine step on that snapshot.
//!
//! # Emitting actions
//!
//! [`GoalCore::emit`] records the request and sends the token as one unit:
//! if the send fails, the speculative request is rolled back before the
//! error reaches the behavior.

use std::sync::Arc;
use std::time::Duration;

use rover_hal::{ActionChannel, SensorView};
use rover_types::{ActionToken, RoverError, SensorSnapshot};
use tracing::{debug, warn};

use crate::tracker::RequestTracker;

// ─────────────────────────────────────────────────────────────────────────────
// Resume
// ─────────────────────────────────────────────────────────────────────────────

/// When a goal wants to be resumed after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Come back on the next scheduler pass.
    Yield,
    /// Come back after at least this long.
    After(Duration),
}

impl Resume {
    pub fn delay(self) -> Duration {
        match self {
            Resume::Yield => Duration::ZERO,
            Resume::After(d) => d,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GoalCore
// ─────────────────────────────────────────────────────────────────────────────

/// Shared plumbing owned by every goal: its handles to the agent and sensor,
/// its request tracker, and the ray count it locked in on the first cycle.
pub struct GoalCore {
    name: String,
    agent: Arc<dyn ActionChannel>,
    sensor: Arc<dyn SensorView>,
    tracker: RequestTracker,
    ray_count: Option<usize>,
    cycles: u64,
}

impl GoalCore {
    pub fn new(
        name: impl Into<String>,
        agent: Arc<dyn ActionChannel>,
        sensor: Arc<dyn SensorView>,
    ) -> Self {
        Self {
            name: name.into(),
            agent,
            sensor,
            tracker: RequestTracker::new(),
            ray_count: None,
            cycles: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Number of cycles begun so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Reconcile the tracker, then read the sensor.
    ///
    /// # Errors
    ///
    /// Returns [`RoverError::SensorShapeMismatch`] when the snapshot has no
    /// rays or its ray count differs from the first one this goal saw.
    pub fn begin_cycle(&mut self) -> Result<SensorSnapshot, RoverError> {
        self.tracker.observe(self.agent.current_actions());
        self.cycles += 1;

        let rays = self.sensor.rays();
        let expected = self.ray_count.unwrap_or(rays.len().max(1));
        if rays.is_empty() || rays.len() != expected {
            return Err(RoverError::SensorShapeMismatch {
                expected,
                actual: rays.len(),
            });
        }
        self.ray_count = Some(expected);
        Ok(rays)
    }

    /// Record a request for `token` and send it.
    ///
    /// # Errors
    ///
    /// Propagates the channel's [`RoverError::TransientSendFailure`] after
    /// rolling the request back.
    pub fn emit(&mut self, token: ActionToken) -> Result<(), RoverError> {
        self.tracker.record_request(token);
        if let Err(e) = self.agent.send_action(token) {
            self.tracker.rollback_request(token);
            warn!(goal = %self.name, %token, error = %e, "send failed; request rolled back");
            return Err(e);
        }
        debug!(goal = %self.name, %token, pending = self.tracker.requested(token), "action requested");
        Ok(())
    }

    /// Pending (requested, not yet executing) count for `token`.
    pub fn requested(&self, token: ActionToken) -> usize {
        self.tracker.requested(token)
    }

    /// `true` if `token` was executing at the start of this cycle.
    pub fn is_executing(&self, token: ActionToken) -> bool {
        self.tracker.is_executing(token)
    }

    /// Build the [`RoverError::UnknownState`] for this goal.
    pub fn unknown_state(&self, state: impl Into<String>) -> RoverError {
        RoverError::UnknownState {
            goal: self.name.clone(),
            state: state.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Goal
// ─────────────────────────────────────────────────────────────────────────────

/// A schedulable behavior.
pub trait Goal: Send {
    fn core(&self) -> &GoalCore;

    fn core_mut(&mut self) -> &mut GoalCore;

    /// Run one state-machine step against this cycle's sensor snapshot.
    fn step(&mut self, rays: &SensorSnapshot) -> Result<Resume, RoverError>;

    /// Human-readable name of the current state.
    fn state_label(&self) -> &'static str;

    /// `true` once the goal has reached a state it never leaves.
    fn is_terminal(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Reconcile, then step.  Behaviors implement [`step`][Self::step], not
    /// this method.
    fn update(&mut self) -> Result<Resume, RoverError> {
        let rays = self.core_mut().begin_cycle()?;
        self.step(&rays)
    }
}
