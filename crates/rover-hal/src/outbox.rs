//! [`ActionOutbox`] – queue-backed transport for action tokens.
//!
//! Every accepted token is wrapped in an [`ActionMessage`] envelope and
//! pushed onto a bounded [`tokio::sync::mpsc`] queue with `try_send`, so a
//! goal never blocks on the transport.  The actuator side drains the
//! receiver, forwards the JSON frames, and reports what is running through
//! its [`ExecutingHandle`].
//!
//! ```text
//!  goal ──send_action──▶ ActionOutbox ──mpsc──▶ controller task
//!   ▲                                               │
//!   └──── current_actions ◀── ExecutingHandle ◀─────┘
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rover_types::{ActionToken, RoverError};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::channel::ActionChannel;

/// Message kind carried by every action envelope.
pub const ACTION_KIND: &str = "action";

// ─────────────────────────────────────────────────────────────────────────────
// Wire envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Wire envelope for a single action token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Name of the outbox owner, e.g. `"rover-cli"`.
    pub source: String,
    /// Always [`ACTION_KIND`].
    pub kind: String,
    pub token: ActionToken,
}

impl ActionMessage {
    pub fn new(source: impl Into<String>, token: ActionToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            kind: ACTION_KIND.to_string(),
            token,
        }
    }

    /// Encode as a single-line JSON frame.
    pub fn to_json(&self) -> Result<String, RoverError> {
        serde_json::to_string(self).map_err(|e| RoverError::Serialization(e.to_string()))
    }

    /// Decode a JSON frame, rejecting envelopes of any other kind.
    pub fn from_json(raw: &str) -> Result<Self, RoverError> {
        let msg: ActionMessage =
            serde_json::from_str(raw).map_err(|e| RoverError::Serialization(e.to_string()))?;
        if msg.kind != ACTION_KIND {
            return Err(RoverError::Serialization(format!(
                "unexpected message kind '{}'",
                msg.kind
            )));
        }
        Ok(msg)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executing list
// ─────────────────────────────────────────────────────────────────────────────

/// Controller-side handle to the authoritative executing-actions list.
///
/// Cheap to clone; every clone and the owning [`ActionOutbox`] see the same
/// list.
#[derive(Clone, Default)]
pub struct ExecutingHandle {
    executing: Arc<RwLock<Vec<ActionToken>>>,
}

impl ExecutingHandle {
    /// Replace the whole executing list.
    pub fn set(&self, actions: Vec<ActionToken>) {
        *self.executing.write().unwrap_or_else(PoisonError::into_inner) = actions;
    }

    /// Mark one more copy of `token` as executing.
    pub fn start(&self, token: ActionToken) {
        self.executing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(token);
    }

    /// Remove one executing copy of `token`.  Returns `false` if none was
    /// executing.
    pub fn finish(&self, token: ActionToken) -> bool {
        let mut list = self.executing.write().unwrap_or_else(PoisonError::into_inner);
        match list.iter().position(|&t| t == token) {
            Some(i) => {
                list.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<ActionToken> {
        self.executing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionOutbox
// ─────────────────────────────────────────────────────────────────────────────

/// An [`ActionChannel`] that enqueues [`ActionMessage`]s for a controller task.
pub struct ActionOutbox {
    source: String,
    tx: mpsc::Sender<ActionMessage>,
    executing: ExecutingHandle,
}

impl ActionOutbox {
    /// Create an outbox with room for `capacity` in-flight messages.
    ///
    /// Returns the outbox, the receiver the controller drains, and the
    /// controller's handle to the executing list.
    pub fn new(
        source: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ActionMessage>, ExecutingHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let executing = ExecutingHandle::default();
        let outbox = Self {
            source: source.into(),
            tx,
            executing: executing.clone(),
        };
        (outbox, rx, executing)
    }
}

impl ActionChannel for ActionOutbox {
    fn send_action(&self, token: ActionToken) -> Result<(), RoverError> {
        let msg = ActionMessage::new(self.source.clone(), token);
        let id = msg.id;
        match self.tx.try_send(msg) {
            Ok(()) => {
                debug!(%token, %id, "action queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%token, "action outbox full");
                Err(RoverError::TransientSendFailure {
                    token,
                    reason: "outbox full".to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RoverError::TransientSendFailure {
                token,
                reason: "controller disconnected".to_string(),
            }),
        }
    }

    fn current_actions(&self) -> Vec<ActionToken> {
        self.executing.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_json_carries_wire_character() {
        let msg = ActionMessage::new("test", ActionToken::Forward);
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"token\":\"W\""));
        assert!(json.contains("\"kind\":\"action\""));
        let back = ActionMessage::from_json(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn message_with_foreign_kind_is_rejected() {
        let mut msg = ActionMessage::new("test", ActionToken::Stop);
        msg.kind = "telemetry".to_string();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(matches!(
            ActionMessage::from_json(&json),
            Err(RoverError::Serialization(_))
        ));
    }

    #[test]
    fn malformed_frame_is_a_serialization_error() {
        assert!(matches!(
            ActionMessage::from_json("{not json"),
            Err(RoverError::Serialization(_))
        ));
    }

    #[test]
    fn send_enqueues_message_for_controller() {
        let (outbox, mut rx, _exec) = ActionOutbox::new("rover", 4);
        outbox.send_action(ActionToken::TurnLeft).unwrap();
        let msg = rx.try_recv().expect("message must be queued");
        assert_eq!(msg.token, ActionToken::TurnLeft);
        assert_eq!(msg.source, "rover");
    }

    #[test]
    fn full_queue_is_a_transient_failure() {
        let (outbox, _rx, _exec) = ActionOutbox::new("rover", 1);
        outbox.send_action(ActionToken::Forward).unwrap();
        let err = outbox.send_action(ActionToken::Stop).unwrap_err();
        assert!(matches!(
            err,
            RoverError::TransientSendFailure { token: ActionToken::Stop, .. }
        ));
    }

    #[test]
    fn closed_queue_is_a_transient_failure() {
        let (outbox, rx, _exec) = ActionOutbox::new("rover", 4);
        drop(rx);
        assert!(matches!(
            outbox.send_action(ActionToken::Forward),
            Err(RoverError::TransientSendFailure { .. })
        ));
    }

    #[test]
    fn executing_handle_is_shared_with_outbox() {
        let (outbox, _rx, exec) = ActionOutbox::new("rover", 4);
        exec.start(ActionToken::Forward);
        exec.start(ActionToken::Forward);
        assert_eq!(
            outbox.current_actions(),
            vec![ActionToken::Forward, ActionToken::Forward]
        );
        assert!(exec.finish(ActionToken::Forward));
        assert_eq!(outbox.current_actions(), vec![ActionToken::Forward]);
        assert!(!exec.finish(ActionToken::Stop));
        exec.set(vec![ActionToken::Stop]);
        assert_eq!(outbox.current_actions(), vec![ActionToken::Stop]);
    }
}
