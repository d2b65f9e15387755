//! Generic `ActionChannel` trait for anything that can carry action tokens to
//! the agent controller.
//!
//! Sends are fire-and-forget: a successful [`ActionChannel::send_action`]
//! only means the token was handed to the transport.  Whether the agent is
//! actually executing it is learned later from
//! [`ActionChannel::current_actions`].

use rover_types::{ActionToken, RoverError};

/// The write side of the agent controller, shared by every goal.
pub trait ActionChannel: Send + Sync {
    /// Hand `token` to the transport without waiting for execution.
    ///
    /// # Errors
    ///
    /// Returns [`RoverError::TransientSendFailure`] when the transport cannot
    /// take the token right now (e.g. not connected, queue full).
    fn send_action(&self, token: ActionToken) -> Result<(), RoverError>;

    /// Snapshot of the actions the agent is executing right now.
    ///
    /// Order is preserved and duplicates are meaningful.
    fn current_actions(&self) -> Vec<ActionToken>;
}
