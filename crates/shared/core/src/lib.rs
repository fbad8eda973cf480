//! Flowstate Core Domain
//!
//! Pure domain types for the flowstate focus monitor: signal kinds, samples,
//! per-signal health, the sink payload, and the focus scoring function.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod calibration;
pub mod entities;
pub mod notifications;
pub mod scoring;
pub mod values;

// Re-export commonly used types at crate root
pub use calibration::CalibrationConfig;
pub use entities::{FocusPayload, RawSample, SignalKind, SignalStatus};
pub use notifications::{NotificationFilter, NotificationKind, NotificationWindow, window_span};
pub use scoring::{FocusScore, ScoringConfig, score};
pub use values::Timestamp;
