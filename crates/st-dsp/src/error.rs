//! Error types for DSP primitives

use thiserror::Error;

/// DSP design/processing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// Crossover cutoff outside (0, Nyquist)
    #[error("Invalid cutoff: {cutoff_hz} Hz (must be within 0..{nyquist_hz} Hz exclusive)")]
    InvalidCutoff { cutoff_hz: f64, nyquist_hz: f64 },

    /// Allpass coefficient outside the stable region
    #[error("Unstable allpass coefficient: |{coefficient}| >= 1")]
    UnstableFilterCoefficient { coefficient: f64 },

    /// FFT processing failure inside the overlap-add convolver
    #[error("FFT processing failed: {0}")]
    Fft(String),
}

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;
