//! [`GoalScheduler`] – cooperative, single-threaded driver for a set of goals.
//!
//! Every registered goal carries a wake-up time on a virtual clock measured
//! from scheduler start.  One pass ([`GoalScheduler::tick`]) runs each due
//! goal exactly once, in registration order, and records the goal's next wake
//! time from the [`Resume`] it returned.  A goal that yields is due again on
//! the following pass, which the clock places one [`Timing::pass`] later.
//!
//! Step errors are classified here, not in the goals:
//!
//! | Error                          | Handling                                   |
//! |--------------------------------|--------------------------------------------|
//! | `TransientSendFailure`         | `warn!`, retry after [`Timing::retry`]     |
//! | `UnknownState`                 | `error!`, hold for [`Timing::idle`]        |
//! | fatal (`is_fatal()`)           | `error!`, goal aborted for good            |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rover_hal::{SimAgent, SimSensor};
//! use rover_runtime::behaviors::ForwardStop;
//! use rover_runtime::{GoalCore, GoalScheduler, Timing};
//!
//! let agent = Arc::new(SimAgent::new());
//! let sensor = Arc::new(SimSensor::new(5));
//! let core = GoalCore::new("forward-stop", agent.clone(), sensor.clone());
//!
//! let mut scheduler = GoalScheduler::new(Timing::default());
//! scheduler.add(Box::new(ForwardStop::new(core, Timing::default())));
//! scheduler.run_for(Duration::from_millis(200), |_| agent.settle());
//!
//! assert_eq!(agent.sent().len(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rover_types::RoverError;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::goal::{Goal, Resume};
use crate::timing::Timing;

// ─────────────────────────────────────────────────────────────────────────────
// Per-goal bookkeeping
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    /// Stopped after a fatal error; never invoked again.
    Aborted(RoverError),
}

struct Entry {
    goal: Box<dyn Goal>,
    wake_at: Duration,
    status: GoalStatus,
    updates: u64,
}

/// Point-in-time summary of one registered goal.
#[derive(Debug, Clone, Serialize)]
pub struct GoalReport {
    pub name: String,
    pub state: &'static str,
    pub terminal: bool,
    pub aborted: Option<RoverError>,
    pub updates: u64,
    /// Requests sent but not yet seen executing.
    pub pending: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// GoalScheduler
// ─────────────────────────────────────────────────────────────────────────────

pub struct GoalScheduler {
    entries: Vec<Entry>,
    now: Duration,
    timing: Timing,
}

impl GoalScheduler {
    pub fn new(timing: Timing) -> Self {
        Self {
            entries: Vec::new(),
            now: Duration::ZERO,
            timing,
        }
    }

    /// Register `goal`, due immediately.  Returns its index.
    pub fn add(&mut self, goal: Box<dyn Goal>) -> usize {
        info!(goal = %goal.name(), "goal registered");
        self.entries.push(Entry {
            goal,
            wake_at: self.now,
            status: GoalStatus::Active,
            updates: 0,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn goal(&self, index: usize) -> Option<&dyn Goal> {
        self.entries.get(index).map(|e| e.goal.as_ref())
    }

    pub fn status(&self, index: usize) -> Option<&GoalStatus> {
        self.entries.get(index).map(|e| &e.status)
    }

    /// Run every due goal once.  Returns how many goals ran.
    pub fn tick(&mut self) -> usize {
        let now = self.now;
        let timing = self.timing;
        let mut ran = 0;

        for entry in &mut self.entries {
            if entry.status != GoalStatus::Active || entry.wake_at > now {
                continue;
            }
            ran += 1;
            entry.updates += 1;

            match entry.goal.update() {
                Ok(resume) => {
                    entry.wake_at = now + resume.delay();
                    if let Resume::After(delay) = resume {
                        debug!(goal = %entry.goal.name(), ?delay, "goal suspended");
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        goal = %entry.goal.name(),
                        state = entry.goal.state_label(),
                        error = %e,
                        "goal aborted"
                    );
                    entry.status = GoalStatus::Aborted(e);
                }
                Err(e @ RoverError::UnknownState { .. }) => {
                    error!(goal = %entry.goal.name(), error = %e, "holding position");
                    entry.wake_at = now + timing.idle();
                }
                Err(e) => {
                    warn!(
                        goal = %entry.goal.name(),
                        state = entry.goal.state_label(),
                        error = %e,
                        "step failed; retrying"
                    );
                    entry.wake_at = now + timing.retry();
                }
            }
        }
        ran
    }

    /// Move the clock forward to `at` (never backwards), then run one pass.
    pub fn tick_at(&mut self, at: Duration) -> usize {
        self.now = self.now.max(at);
        self.tick()
    }

    /// Virtual time of the next pass, or `None` once every goal is aborted.
    pub fn next_pass_at(&self) -> Option<Duration> {
        let earliest = self
            .entries
            .iter()
            .filter(|e| e.status == GoalStatus::Active)
            .map(|e| e.wake_at)
            .min()?;
        Some(if earliest <= self.now {
            self.now + self.timing.pass()
        } else {
            earliest
        })
    }

    /// Drive passes on virtual time until `horizon` has elapsed.
    ///
    /// `on_pass` runs after every pass with the pass's virtual time; it is
    /// where the outside world (controller, sensors) gets to move.  Returns
    /// the number of passes run.
    pub fn run_for(&mut self, horizon: Duration, mut on_pass: impl FnMut(Duration)) -> u64 {
        let end = self.now + horizon;
        let mut passes = 0;
        loop {
            self.tick();
            passes += 1;
            on_pass(self.now);
            match self.next_pass_at() {
                Some(at) if at <= end => self.now = at,
                _ => break,
            }
        }
        self.now = end;
        passes
    }

    /// Like [`run_for`][Self::run_for], but sleeps on the tokio clock between
    /// passes and stops early once `shutdown` is set.
    pub async fn run_realtime(
        &mut self,
        horizon: Duration,
        shutdown: Arc<AtomicBool>,
        mut on_pass: impl FnMut(Duration),
    ) -> u64 {
        let end = self.now + horizon;
        let mut passes = 0;
        while !shutdown.load(Ordering::Acquire) {
            self.tick();
            passes += 1;
            on_pass(self.now);
            let Some(at) = self.next_pass_at().filter(|&at| at <= end) else {
                break;
            };
            tokio::time::sleep(at - self.now).await;
            self.now = at;
        }
        if shutdown.load(Ordering::Acquire) {
            info!(elapsed = ?self.now, passes, "scheduler shut down");
        }
        passes
    }

    pub fn reports(&self) -> Vec<GoalReport> {
        self.entries
            .iter()
            .map(|e| GoalReport {
                name: e.goal.name().to_string(),
                state: e.goal.state_label(),
                terminal: e.goal.is_terminal(),
                aborted: match &e.status {
                    GoalStatus::Active => None,
                    GoalStatus::Aborted(err) => Some(err.clone()),
                },
                updates: e.updates,
                pending: e.goal.core().tracker().pending_total(),
            })
            .collect()
    }
}
