//! Offline rendering: drives the spatial engine end to end.
//!
//! - [`config`] holds the serializable render settings
//! - [`job`] names the work units and progress events
//! - [`pipeline`] runs routing, mixing, normalization and the 5.1 fold
//! - [`encoder`] turns finished beds into 24-bit WAV masters

pub mod config;
pub mod encoder;
pub mod job;
pub mod pipeline;

mod error;

pub use config::{OutputSelector, RenderConfig, DEFAULT_DECORR_SEED};
pub use encoder::{write_wav, MasterBuffer, PcmDescriptor};
pub use error::{OfflineError, OfflineResult};
pub use job::{ProgressEvent, Stage, UpmixJob};
pub use pipeline::{render, BatchRenderer, RenderOutput, RenderPipeline};
