use thiserror::Error;

/// Why a source adapter could not produce a sample
///
/// Every provider-level failure is reported through this type at the adapter
/// boundary; none of them is fatal to the collector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Invalid adapter configuration: {0}")]
    ConfigurationInvalid(String),
}

impl SourceError {
    /// Whether retrying the same adapter later can succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SourceError::ConfigurationInvalid(_))
    }
}

/// Why a payload could not be delivered downstream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink unreachable: {0}")]
    Unreachable(String),

    #[error("Sink request timed out")]
    Timeout,

    #[error("Sink rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
pub type SinkResult<T> = std::result::Result<T, SinkError>;
