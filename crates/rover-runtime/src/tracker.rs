//! [`RequestTracker`] – per-goal bookkeeping of requested actions.
//!
//! A goal asks for actions through a fire-and-forget channel, so it cannot
//! know when a request took effect.  The tracker keeps a multiset of tokens
//! the goal has requested but not yet seen start executing, and retires
//! entries only on positive evidence: a token whose executing count went up
//! between two consecutive snapshots.
//!
//! # Algorithm
//!
//! Given the previous and current executing snapshots and the requested
//! multiset:
//!
//! 1. `newly = current − previous`, per token, floored at zero.
//! 2. For every token in `newly` with count `c`, subtract
//!    `min(c, requested[token])` from `requested[token]`.
//! 3. Drop entries that reached zero.
//!
//! Tokens that stop executing never touch the requested multiset.
//!
//! # Example
//!
//! ```rust
//! use rover_runtime::tracker::RequestTracker;
//! use rover_types::ActionToken::{Forward, Stop};
//!
//! let mut tracker = RequestTracker::new();
//! tracker.record_request(Forward);
//! tracker.record_request(Forward);
//!
//! // One Forward shows up executing: one request is retired.
//! tracker.observe(vec![Forward, Stop]);
//! assert_eq!(tracker.requested(Forward), 1);
//!
//! // Nothing new started: nothing changes.
//! tracker.observe(vec![Forward, Stop]);
//! assert_eq!(tracker.requested(Forward), 1);
//! ```

use std::collections::HashMap;

use rover_types::ActionToken;

/// Multiset of tokens as a count map.  Zero counts are never stored.
pub type TokenCounts = HashMap<ActionToken, usize>;

/// Count occurrences of each token in `actions`.
pub fn counts(actions: &[ActionToken]) -> TokenCounts {
    let mut out = TokenCounts::new();
    for &token in actions {
        *out.entry(token).or_insert(0) += 1;
    }
    out
}

/// Multiset difference `lhs − rhs`, floored at zero per token.
pub fn difference(lhs: &TokenCounts, rhs: &TokenCounts) -> TokenCounts {
    lhs.iter()
        .filter_map(|(&token, &n)| {
            let remaining = n.saturating_sub(rhs.get(&token).copied().unwrap_or(0));
            (remaining > 0).then_some((token, remaining))
        })
        .collect()
}

/// Reconcile `requested` against two consecutive executing snapshots and
/// return the new requested multiset.
pub fn reconcile(
    previous: &[ActionToken],
    current: &[ActionToken],
    requested: &TokenCounts,
) -> TokenCounts {
    let newly_executing = difference(&counts(current), &counts(previous));
    difference(requested, &newly_executing)
}

// ─────────────────────────────────────────────────────────────────────────────
// RequestTracker
// ─────────────────────────────────────────────────────────────────────────────

/// Pending-request bookkeeping owned by exactly one goal.
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    requested: TokenCounts,
    /// Executing snapshot from the most recent [`observe`][Self::observe].
    executing: Vec<ActionToken>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one reconciliation cycle against the latest executing snapshot,
    /// then remember it as the previous snapshot for the next cycle.
    pub fn observe(&mut self, current: Vec<ActionToken>) {
        self.requested = reconcile(&self.executing, &current, &self.requested);
        self.executing = current;
    }

    /// Add one pending request for `token`.
    pub fn record_request(&mut self, token: ActionToken) {
        *self.requested.entry(token).or_insert(0) += 1;
    }

    /// Undo one pending request for `token` after a failed send.
    ///
    /// No-op when nothing is pending for `token`.
    pub fn rollback_request(&mut self, token: ActionToken) {
        if let Some(n) = self.requested.get_mut(&token) {
            *n -= 1;
            if *n == 0 {
                self.requested.remove(&token);
            }
        }
    }

    /// Number of pending requests for `token`.
    pub fn requested(&self, token: ActionToken) -> usize {
        self.requested.get(&token).copied().unwrap_or(0)
    }

    /// `true` if `token` was in the latest executing snapshot.
    pub fn is_executing(&self, token: ActionToken) -> bool {
        self.executing.contains(&token)
    }

    /// Total pending requests across all tokens.
    pub fn pending_total(&self) -> usize {
        self.requested.values().sum()
    }

    pub fn pending(&self) -> &TokenCounts {
        &self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_types::ActionToken::{Forward, Stop, TurnLeft, TurnRight};

    fn multiset(actions: &[ActionToken]) -> TokenCounts {
        counts(actions)
    }

    #[test]
    fn counts_skips_absent_tokens() {
        let c = counts(&[Forward, Forward, Stop]);
        assert_eq!(c.get(&Forward), Some(&2));
        assert_eq!(c.get(&Stop), Some(&1));
        assert!(!c.contains_key(&TurnLeft));
    }

    #[test]
    fn difference_floors_at_zero_and_drops_empty_entries() {
        let lhs = multiset(&[Forward, Forward, Stop]);
        let rhs = multiset(&[Forward, Stop, Stop, TurnLeft]);
        let d = difference(&lhs, &rhs);
        assert_eq!(d, multiset(&[Forward]));
    }

    #[test]
    fn only_increases_count_as_newly_executing() {
        // Forward went 1 -> 3 (two new), Stop went 1 -> 0 (completed).
        let requested = multiset(&[Forward, Forward, Forward, Stop]);
        let out = reconcile(&[Forward, Stop], &[Forward, Forward, Forward], &requested);
        assert_eq!(out, multiset(&[Forward, Stop]));
    }

    #[test]
    fn retirement_is_capped_by_requested_count() {
        // Three Forwards started but only one was ours.
        let requested = multiset(&[Forward, TurnRight]);
        let out = reconcile(&[], &[Forward, Forward, Forward], &requested);
        assert_eq!(out, multiset(&[TurnRight]));
    }

    #[test]
    fn unchanged_snapshot_leaves_requests_untouched() {
        let requested = multiset(&[Forward, Forward, TurnLeft]);
        let snapshot = [Forward, TurnLeft, Stop];
        assert_eq!(reconcile(&snapshot, &snapshot, &requested), requested);
    }

    #[test]
    fn shrinking_executing_list_does_not_drop_pending() {
        let requested = multiset(&[TurnLeft]);
        let out = reconcile(&[Forward, Stop], &[], &requested);
        assert_eq!(out, requested);
    }

    #[test]
    fn reconcile_never_increases_any_count() {
        let all = [Forward, Stop, TurnLeft, TurnRight];
        // Small exhaustive sweep over short snapshots.
        let snapshots: Vec<Vec<ActionToken>> = vec![
            vec![],
            vec![Forward],
            vec![Forward, Forward],
            vec![Stop, TurnLeft],
            vec![TurnRight, Forward, TurnRight],
        ];
        let requested = multiset(&[Forward, Forward, TurnRight, Stop]);
        for prev in &snapshots {
            for curr in &snapshots {
                let out = reconcile(prev, curr, &requested);
                for token in all {
                    let before = requested.get(&token).copied().unwrap_or(0);
                    let after = out.get(&token).copied().unwrap_or(0);
                    assert!(after <= before, "{token} grew from {before} to {after}");
                }
            }
        }
    }

    #[test]
    fn tracker_first_observation_counts_everything_as_new() {
        let mut tracker = RequestTracker::new();
        tracker.record_request(Stop);
        tracker.observe(vec![Stop]);
        assert_eq!(tracker.requested(Stop), 0);
        assert!(tracker.is_executing(Stop));
    }

    #[test]
    fn tracker_slow_controller_keeps_request_pending() {
        let mut tracker = RequestTracker::new();
        tracker.record_request(Forward);
        tracker.observe(vec![]);
        tracker.observe(vec![]);
        assert_eq!(tracker.requested(Forward), 1);
        tracker.observe(vec![Forward]);
        assert_eq!(tracker.requested(Forward), 0);
        assert_eq!(tracker.pending_total(), 0);
    }

    #[test]
    fn tracker_repeated_identical_requests_retire_one_by_one() {
        let mut tracker = RequestTracker::new();
        tracker.record_request(TurnLeft);
        tracker.record_request(TurnLeft);
        tracker.observe(vec![TurnLeft]);
        assert_eq!(tracker.requested(TurnLeft), 1);
        tracker.observe(vec![TurnLeft, TurnLeft]);
        assert_eq!(tracker.requested(TurnLeft), 0);
    }

    #[test]
    fn rollback_removes_one_entry_and_never_underflows() {
        let mut tracker = RequestTracker::new();
        tracker.record_request(Forward);
        tracker.record_request(Forward);
        tracker.rollback_request(Forward);
        assert_eq!(tracker.requested(Forward), 1);
        tracker.rollback_request(Forward);
        tracker.rollback_request(Forward);
        assert_eq!(tracker.requested(Forward), 0);
        assert!(tracker.pending().is_empty());
    }
}
