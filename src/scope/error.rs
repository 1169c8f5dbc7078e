use thiserror::Error;
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("invalid range token `{0}`; expected one of 10mV, 50mV, 100mV, 500mV, 1V, 5V, 10V")]
    InvalidRangeToken(String),
    #[error("buffer length mismatch: expected {expected} samples, got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },
    #[error("coordinate conversion unavailable: {0}")]
    CoordinateConversionFailure(&'static str),
    #[error("channel index {index} out of range")]
    ChannelOutOfRange { index: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
