//! `rover-runtime` – behavior goals and the cooperative scheduler that runs
//! them.
//!
//! A goal reads a ray-cast sensor, decides on navigation tokens, and sends
//! them to an agent controller that only reports back which actions are
//! currently executing.  Each goal is a synchronous, resumable state machine:
//! one [`Goal::update`] call runs one step and returns a [`Resume`] directive,
//! so every behavior can be tested without a real clock.
//!
//! # Modules
//!
//! - [`tracker`] – [`RequestTracker`]: pending-request bookkeeping,
//!   reconciled every cycle against the controller's executing list.
//! - [`goal`] – the [`Goal`] trait and [`GoalCore`], the plumbing every
//!   behavior is composed with.  [`Goal::update`] always reconciles before
//!   stepping.
//! - [`behaviors`] – [`ForwardStop`][behaviors::ForwardStop],
//!   [`Turn`][behaviors::Turn], [`RandomRoam`][behaviors::RandomRoam],
//!   [`Avoid`][behaviors::Avoid] and [`Idle`][behaviors::Idle], plus
//!   [`GoalKind`][behaviors::GoalKind] for selecting them by name.
//! - [`scheduler`] – [`GoalScheduler`]: virtual-clock driver that runs due
//!   goals in registration order and classifies step errors.
//! - [`timing`] – [`Timing`]: every suspension interval in one place.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod behaviors;
pub mod goal;
pub mod scheduler;
pub mod telemetry;
pub mod timing;
pub mod tracker;

pub use behaviors::{GoalKind, GoalOptions};
pub use goal::{Goal, GoalCore, Resume};
pub use scheduler::{GoalReport, GoalScheduler, GoalStatus};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use timing::Timing;
pub use tracker::RequestTracker;
