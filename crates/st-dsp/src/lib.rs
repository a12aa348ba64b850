//! st-dsp: DSP primitives for the Stratus spatial mixing engine
//!
//! ## Modules
//! - `fir` - Linear-phase windowed-sinc crossover filters (FFT overlap-add)
//! - `decorrelate` - Deterministic Schroeder allpass decorrelation chains
//! - `delay` - Sample-accurate circular delay lines
//! - `limiter` - Peak normalization and linked soft-knee limiting
//!
//! All processing runs offline on whole finite buffers in f64; nothing
//! here depends on wall-clock time or OS entropy, so identical inputs
//! always produce identical masters.

pub mod decorrelate;
pub mod delay;
pub mod fir;
pub mod limiter;

mod error;

pub use decorrelate::{AllpassStage, DecorrelationChain};
pub use delay::DelayLine;
pub use error::{DspError, DspResult};
pub use fir::{Crossover, FilterKind, FilterSpec, FirFilter};
pub use limiter::{limit_soft_knee, normalize, DEFAULT_KNEE_DB, DEFAULT_TARGET_DBFS};
