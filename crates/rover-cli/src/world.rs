//! A one-corridor world that plays the agent controller for `rover run`.
//!
//! After every scheduler pass the world drains the [`ActionOutbox`] queue and
//! applies the tokens it received:
//!
//! - every received token starts executing and stays executing until a
//!   pass delivers a different token (repeats of one token stack up, so
//!   each repeat is a visible start to the goals' trackers),
//! - Forward starts the rover moving and Stop halts it,
//! - a turn faces the rover down a clear corridor.
//!
//! While the rover moves, the next obstacle gets closer by one step per pass.
//! When it arrives, the sensor shows a random hit pattern until the rover
//! turns away.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use rover_hal::{ActionMessage, ExecutingHandle, SimSensor};
use rover_types::ActionToken;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Hit patterns an obstacle can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Obstacle {
    /// Only the center ray.
    HeadOn,
    /// Every ray left of center.
    Left,
    /// Every ray right of center.
    Right,
    /// Every ray.
    Wall,
}

impl Obstacle {
    const ALL: [Obstacle; 4] = [Obstacle::HeadOn, Obstacle::Left, Obstacle::Right, Obstacle::Wall];

    pub fn hits(self, ray_count: usize) -> Vec<u8> {
        let center = ray_count / 2;
        (0..ray_count)
            .map(|i| {
                let hit = match self {
                    Obstacle::HeadOn => i == center,
                    Obstacle::Left => i < center,
                    Obstacle::Right => i > center,
                    Obstacle::Wall => true,
                };
                u8::from(hit)
            })
            .collect()
    }
}

/// One token as the controller received it.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedAction {
    pub at_ms: u128,
    pub source: String,
    pub token: ActionToken,
}

pub struct SimWorld {
    sensor: Arc<SimSensor>,
    ray_count: usize,
    rx: mpsc::Receiver<ActionMessage>,
    executing: ExecutingHandle,
    rng: StdRng,
    /// Passes of forward motion between obstacles.
    spacing: (u32, u32),
    moving: bool,
    until_obstacle: u32,
    blocked: Option<Obstacle>,
    log: Vec<LoggedAction>,
}

impl SimWorld {
    pub fn new(
        sensor: Arc<SimSensor>,
        ray_count: usize,
        rx: mpsc::Receiver<ActionMessage>,
        executing: ExecutingHandle,
        mut rng: StdRng,
        spacing: (u32, u32),
    ) -> Self {
        let spacing = (spacing.0.max(1), spacing.1.max(spacing.0.max(1)));
        let until_obstacle = rng.gen_range(spacing.0..=spacing.1);
        Self {
            sensor,
            ray_count,
            rx,
            executing,
            rng,
            spacing,
            moving: false,
            until_obstacle,
            blocked: None,
            log: Vec::new(),
        }
    }

    /// Advance the world by one scheduler pass.
    pub fn on_pass(&mut self, now: Duration) {
        let mut received = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            match msg.to_json() {
                Ok(frame) => debug!(%frame, "controller received"),
                Err(e) => warn!(error = %e, "unencodable action frame"),
            }
            self.log.push(LoggedAction {
                at_ms: now.as_millis(),
                source: msg.source.clone(),
                token: msg.token,
            });
            self.apply(msg.token);
            received.push(msg.token);
        }
        self.execute(&received);

        if self.moving && self.blocked.is_none() {
            self.until_obstacle = self.until_obstacle.saturating_sub(1);
            if self.until_obstacle == 0 {
                let obstacle = Obstacle::ALL[self.rng.gen_range(0..Obstacle::ALL.len())];
                info!(?obstacle, at = ?now, "obstacle ahead");
                self.sensor.set_hits(obstacle.hits(self.ray_count));
                self.blocked = Some(obstacle);
            }
        }
    }

    /// Retire superseded tokens, then start everything received this pass.
    ///
    /// A token kind received this pass is never finished in the same pass,
    /// so its executing count rises by exactly the number received.
    fn execute(&mut self, received: &[ActionToken]) {
        if received.is_empty() {
            return;
        }
        for token in ActionToken::ALL {
            if !received.contains(&token) {
                while self.executing.finish(token) {}
            }
        }
        for &token in received {
            self.executing.start(token);
        }
    }

    fn apply(&mut self, token: ActionToken) {
        match token {
            ActionToken::Forward => self.moving = true,
            ActionToken::Stop => self.moving = false,
            ActionToken::TurnLeft | ActionToken::TurnRight => {
                if self.blocked.take().is_some() {
                    debug!(%token, "turned away from obstacle");
                }
                self.sensor.clear();
                self.until_obstacle = self.rng.gen_range(self.spacing.0..=self.spacing.1);
            }
        }
    }

    pub fn log(&self) -> &[LoggedAction] {
        &self.log
    }

    /// Obstacle currently in front of the rover, if any.
    pub fn blocked(&self) -> Option<Obstacle> {
        self.blocked
    }
}
