use st_dsp::DspError;
use thiserror::Error;

/// Errors surfaced while routing and mixing stems into a speaker bed
#[derive(Debug, Error)]
pub enum MixError {
    #[error("stem '{stem}' runs at {got} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        stem: &'static str,
        expected: u32,
        got: u32,
    },

    #[error("stem '{stem}' holds {got} frames, expected {expected}")]
    BufferLengthMismatch {
        stem: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid routing configuration: {0}")]
    InvalidRoutingConfig(String),

    #[error("mix cancelled")]
    Cancelled,

    #[error(transparent)]
    Dsp(#[from] DspError),
}

pub type MixResult<T> = Result<T, MixError>;
