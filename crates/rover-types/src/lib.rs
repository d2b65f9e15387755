//! `rover-types` – shared vocabulary for the rover goal stack.
//!
//! Every crate in the workspace speaks in terms of the types defined here:
//! the wire-level [`ActionToken`] set, the [`TurnDirection`] used by the
//! turning behaviors, the ray-cast [`SensorSnapshot`], and the global
//! [`RoverError`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// ActionToken
// ─────────────────────────────────────────────────────────────────────────────

/// A single control command understood by the agent controller.
///
/// On the wire each token is one character: `W` forward, `S` stop,
/// `A` turn left, `D` turn right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionToken {
    #[serde(rename = "W")]
    Forward,
    #[serde(rename = "S")]
    Stop,
    #[serde(rename = "A")]
    TurnLeft,
    #[serde(rename = "D")]
    TurnRight,
}

impl ActionToken {
    /// Every token, in wire order.
    pub const ALL: [ActionToken; 4] = [
        ActionToken::Forward,
        ActionToken::Stop,
        ActionToken::TurnLeft,
        ActionToken::TurnRight,
    ];

    /// The wire character for this token.
    pub fn as_char(self) -> char {
        match self {
            ActionToken::Forward => 'W',
            ActionToken::Stop => 'S',
            ActionToken::TurnLeft => 'A',
            ActionToken::TurnRight => 'D',
        }
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for ActionToken {
    type Error = RoverError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'W' => Ok(ActionToken::Forward),
            'S' => Ok(ActionToken::Stop),
            'A' => Ok(ActionToken::TurnLeft),
            'D' => Ok(ActionToken::TurnRight),
            other => Err(RoverError::InvalidToken(other.to_string())),
        }
    }
}

impl FromStr for ActionToken {
    type Err = RoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ActionToken::try_from(c),
            _ => Err(RoverError::InvalidToken(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TurnDirection
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a discrete turn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Both directions; random choices draw uniformly from this array.
    pub const BOTH: [TurnDirection; 2] = [TurnDirection::Left, TurnDirection::Right];

    /// The token that turns the agent in this direction.
    pub fn token(self) -> ActionToken {
        match self {
            TurnDirection::Left => ActionToken::TurnLeft,
            TurnDirection::Right => ActionToken::TurnRight,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => write!(f, "left"),
            TurnDirection::Right => write!(f, "right"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SensorSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// One reading of the ray-cast sensor: an ordered array of hit flags, left to
/// right, where `1` means the ray hit an obstacle and `0` means clear.
///
/// Any non-zero input value is normalised to `1` on construction, so the
/// load sums below are plain hit counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    hits: Vec<u8>,
}

impl SensorSnapshot {
    /// Build a snapshot from raw hit values.
    pub fn from_hits(hits: impl IntoIterator<Item = u8>) -> Self {
        Self {
            hits: hits.into_iter().map(|h| u8::from(h != 0)).collect(),
        }
    }

    /// A snapshot with `n` clear rays.
    pub fn clear(n: usize) -> Self {
        Self { hits: vec![0; n] }
    }

    /// The normalised hit flags.
    pub fn hits(&self) -> &[u8] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Index of the head-on ray (`len / 2`).
    pub fn center_index(&self) -> usize {
        self.hits.len() / 2
    }

    /// `true` if at least one ray reads hit.
    pub fn any_hit(&self) -> bool {
        self.hits.iter().any(|&h| h == 1)
    }

    /// `true` if every ray reads hit.  An empty snapshot is never "all hit".
    pub fn all_hit(&self) -> bool {
        !self.hits.is_empty() && self.hits.iter().all(|&h| h == 1)
    }

    /// `true` if the center ray is hit and every other ray is clear.
    pub fn only_center_hit(&self) -> bool {
        let center = self.center_index();
        self.hits.get(center) == Some(&1)
            && self
                .hits
                .iter()
                .enumerate()
                .all(|(i, &h)| i == center || h == 0)
    }

    /// Number of hits strictly left of the center ray.
    pub fn left_load(&self) -> usize {
        let center = self.center_index().min(self.hits.len());
        self.hits[..center].iter().map(|&h| usize::from(h)).sum()
    }

    /// Number of hits strictly right of the center ray.
    pub fn right_load(&self) -> usize {
        let start = (self.center_index() + 1).min(self.hits.len());
        self.hits[start..].iter().map(|&h| usize::from(h)).sum()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RoverError
// ─────────────────────────────────────────────────────────────────────────────

/// Global error type spanning transport failures, goal invariants, and sensor
/// configuration faults.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoverError {
    #[error("Transient send failure for action '{token}': {reason}")]
    TransientSendFailure { token: ActionToken, reason: String },

    #[error("Unknown state in goal '{goal}': {state}")]
    UnknownState { goal: String, state: String },

    #[error("Sensor shape mismatch: expected {expected} rays, got {actual}")]
    SensorShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid action token: {0:?}")]
    InvalidToken(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RoverError {
    /// `true` for errors after which a goal must not be invoked again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RoverError::SensorShapeMismatch { .. } | RoverError::Config(_)
        )
    }
}
