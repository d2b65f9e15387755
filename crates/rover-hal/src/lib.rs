//! `rover-hal` – the agent's hardware boundary.
//!
//! Goals never talk to a transport or a sensor driver directly.  They hold
//! trait objects for the two seams defined here and the rest of the stack
//! stays agnostic of what sits behind them.
//!
//! # Modules
//!
//! - [`sensor`] – [`SensorView`][sensor::SensorView]: read-only access to the
//!   latest ray-cast [`SensorSnapshot`][rover_types::SensorSnapshot].
//! - [`channel`] – [`ActionChannel`][channel::ActionChannel]: fire-and-forget
//!   action sends plus the authoritative list of executing actions.
//! - [`outbox`] – [`ActionOutbox`][outbox::ActionOutbox]: a queue-backed
//!   [`ActionChannel`][channel::ActionChannel] that wraps every token in a
//!   JSON [`ActionMessage`][outbox::ActionMessage] for the actuator side.
//! - [`sim`] – [`SimAgent`][sim::SimAgent] and [`SimSensor`][sim::SimSensor]:
//!   in-process stand-ins for headless tests and demos.

pub mod channel;
pub mod outbox;
pub mod sensor;
pub mod sim;

pub use channel::ActionChannel;
pub use outbox::{ActionMessage, ActionOutbox, ExecutingHandle};
pub use sensor::SensorView;
pub use sim::{SimAgent, SimSensor};
