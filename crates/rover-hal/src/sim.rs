//! In-process simulation drivers for testing goals without a real agent.
//!
//! [`SimSensor`] holds a settable ray array and [`SimAgent`] records every
//! sent token, keeps an executing list that tests (or a tiny world model)
//! mutate explicitly, and can be armed to fail sends.
//!
//! # Example
//!
//! ```rust
//! use rover_hal::{ActionChannel, SimAgent};
//! use rover_types::ActionToken;
//!
//! let agent = SimAgent::new();
//! agent.send_action(ActionToken::Forward).expect("sim send must succeed");
//! assert!(agent.current_actions().is_empty());
//!
//! // The controller picks the token up on its next pass.
//! agent.settle();
//! assert_eq!(agent.current_actions(), vec![ActionToken::Forward]);
//! ```

use std::sync::{Mutex, PoisonError, RwLock};

use rover_types::{ActionToken, RoverError, SensorSnapshot};
use tracing::debug;

use crate::channel::ActionChannel;
use crate::sensor::SensorView;

// ────────────────────────────────────────────────────────────────────────────
// Simulated sensor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated ray-cast sensor whose reading is set by the test or world
/// model that owns it.
pub struct SimSensor {
    snapshot: RwLock<SensorSnapshot>,
}

impl SimSensor {
    /// Create a sensor with `ray_count` clear rays.
    pub fn new(ray_count: usize) -> Self {
        Self {
            snapshot: RwLock::new(SensorSnapshot::clear(ray_count)),
        }
    }

    /// Replace the current reading.
    pub fn set(&self, snapshot: SensorSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Replace the current reading from raw hit values.
    pub fn set_hits(&self, hits: impl IntoIterator<Item = u8>) {
        self.set(SensorSnapshot::from_hits(hits));
    }

    /// Clear every ray, keeping the current ray count.
    pub fn clear(&self) {
        let n = self.rays().len();
        self.set(SensorSnapshot::clear(n));
    }
}

impl SensorView for SimSensor {
    fn rays(&self) -> SensorSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated agent controller
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SimAgentState {
    /// Every token ever accepted, in send order.
    sent: Vec<ActionToken>,
    /// Accepted tokens the controller has not picked up yet.
    unsettled: Vec<ActionToken>,
    executing: Vec<ActionToken>,
    /// Number of upcoming sends that must fail.
    fail_next: usize,
    /// Sends still allowed through before `fail_next` kicks in.
    fail_skip: usize,
}

/// A simulated agent controller.
///
/// Sent tokens do not show up in [`current_actions`][ActionChannel::current_actions]
/// until [`settle`][Self::settle] is called, which mirrors a controller that
/// is slow to reflect new commands.
#[derive(Default)]
pub struct SimAgent {
    state: Mutex<SimAgentState>,
}

impl SimAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimAgentState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Make the next `n` sends fail with [`RoverError::TransientSendFailure`].
    pub fn fail_next(&self, n: usize) {
        self.fail_after(0, n);
    }

    /// Let `skip` sends through, then fail the following `n`.
    pub fn fail_after(&self, skip: usize, n: usize) {
        self.with_state(|s| {
            s.fail_skip = skip;
            s.fail_next = n;
        });
    }

    /// Every token accepted so far, in send order.
    pub fn sent(&self) -> Vec<ActionToken> {
        self.with_state(|s| s.sent.clone())
    }

    /// Drain and return the tokens accepted since the last call.
    pub fn take_sent(&self) -> Vec<ActionToken> {
        self.with_state(|s| std::mem::take(&mut s.sent))
    }

    /// Promote every accepted-but-unsettled token to executing.
    pub fn settle(&self) {
        self.with_state(|s| {
            let fresh = std::mem::take(&mut s.unsettled);
            s.executing.extend(fresh);
        });
    }

    /// Remove one executing copy of `token`.  Returns `false` if it was not
    /// executing.
    pub fn complete(&self, token: ActionToken) -> bool {
        self.with_state(|s| match s.executing.iter().position(|&t| t == token) {
            Some(i) => {
                s.executing.remove(i);
                true
            }
            None => false,
        })
    }

    /// Overwrite the executing list, e.g. to model actions started by
    /// another source.
    pub fn set_executing(&self, actions: Vec<ActionToken>) {
        self.with_state(|s| s.executing = actions);
    }
}

impl ActionChannel for SimAgent {
    fn send_action(&self, token: ActionToken) -> Result<(), RoverError> {
        self.with_state(|s| {
            if s.fail_next > 0 && s.fail_skip > 0 {
                s.fail_skip -= 1;
            } else if s.fail_next > 0 {
                s.fail_next -= 1;
                return Err(RoverError::TransientSendFailure {
                    token,
                    reason: "sim transport not ready".to_string(),
                });
            }
            debug!(%token, "sim agent accepted action");
            s.sent.push(token);
            s.unsettled.push(token);
            Ok(())
        })
    }

    fn current_actions(&self) -> Vec<ActionToken> {
        self.with_state(|s| s.executing.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rover_types::ActionToken::{Forward, Stop, TurnLeft};

    #[test]
    fn sim_sensor_starts_clear() {
        let sensor = SimSensor::new(5);
        let snap = sensor.rays();
        assert_eq!(snap.len(), 5);
        assert!(!snap.any_hit());
    }

    #[test]
    fn sim_sensor_set_and_clear() {
        let sensor = SimSensor::new(3);
        sensor.set_hits([1, 0, 1]);
        assert_eq!(sensor.rays().hits(), &[1, 0, 1]);
        sensor.clear();
        assert_eq!(sensor.rays().hits(), &[0, 0, 0]);
    }

    #[test]
    fn sim_agent_records_sends_in_order() {
        let agent = SimAgent::new();
        agent.send_action(Forward).unwrap();
        agent.send_action(TurnLeft).unwrap();
        agent.send_action(Stop).unwrap();
        assert_eq!(agent.sent(), vec![Forward, TurnLeft, Stop]);
        assert_eq!(agent.take_sent(), vec![Forward, TurnLeft, Stop]);
        assert!(agent.sent().is_empty());
    }

    #[test]
    fn sim_agent_executes_only_after_settle() {
        let agent = SimAgent::new();
        agent.send_action(Forward).unwrap();
        assert!(agent.current_actions().is_empty());
        agent.settle();
        assert_eq!(agent.current_actions(), vec![Forward]);
        // settling twice does not duplicate
        agent.settle();
        assert_eq!(agent.current_actions(), vec![Forward]);
    }

    #[test]
    fn sim_agent_complete_removes_one_copy() {
        let agent = SimAgent::new();
        agent.set_executing(vec![Forward, Forward, Stop]);
        assert!(agent.complete(Forward));
        assert_eq!(agent.current_actions(), vec![Forward, Stop]);
        assert!(!agent.complete(TurnLeft));
    }

    #[test]
    fn sim_agent_fail_next_rejects_then_recovers() {
        let agent = SimAgent::new();
        agent.fail_next(2);
        assert!(matches!(
            agent.send_action(Forward),
            Err(RoverError::TransientSendFailure { token: Forward, .. })
        ));
        assert!(agent.send_action(Forward).is_err());
        agent.send_action(Forward).expect("third send must succeed");
        assert_eq!(agent.sent(), vec![Forward]);
    }

    #[test]
    fn sim_agent_fail_after_skips_first_sends() {
        let agent = SimAgent::new();
        agent.fail_after(1, 1);
        agent.send_action(Stop).unwrap();
        assert!(agent.send_action(Stop).is_err());
        agent.send_action(Stop).unwrap();
        assert_eq!(agent.sent(), vec![Stop, Stop]);
    }
}
