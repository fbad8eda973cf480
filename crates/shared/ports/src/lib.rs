//! Flowstate Ports
//!
//! Port definitions (traits) for the flowstate focus monitor.
//! These define the boundaries between the collection engine and the
//! outside world: time, signal providers, and the downstream sink.

mod clock;
mod error;
mod sink;
mod source;

pub use clock::Clock;
pub use error::{SinkError, SinkResult, SourceError, SourceResult};
pub use sink::FocusSink;
pub use source::SignalSource;
