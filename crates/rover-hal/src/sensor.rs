//! Generic `SensorView` trait for ray-cast sensors.
//!
//! The sensor subsystem refreshes its readings out-of-band; goals only ever
//! take a read-only [`SensorSnapshot`] once per control cycle.

use rover_types::SensorSnapshot;

/// Read-only view of the latest ray-cast reading.
pub trait SensorView: Send + Sync {
    /// The most recent reading.  The ray count is expected to stay fixed for
    /// the lifetime of the agent.
    fn rays(&self) -> SensorSnapshot;
}
