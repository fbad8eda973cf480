mod payload;
mod sample;
mod signal_kind;
mod signal_status;

pub use payload::FocusPayload;
pub use sample::RawSample;
pub use signal_kind::SignalKind;
pub use signal_status::SignalStatus;
