//! Flowstate Clock Infrastructure
//!
//! - [`SystemClock`]: wall time, used by the running service
//! - [`ManualClock`]: frozen time advanced explicitly, used by tests that
//!   exercise cache validity windows

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use flowstate_ports::Clock;
