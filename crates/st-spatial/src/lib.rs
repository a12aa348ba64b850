//! Spatial placement engine: routes four stereo stems into a
//! phase-coherent 7.1.4 bed and folds it to 5.1 when asked.
//!
//! - [`routing`] builds the per-track placement plan
//! - [`mixer`] renders the plan into a [`st_core::MixBuffer`]
//! - [`downmix`] folds 7.1.4 down to 5.1
//! - [`params`] carries the analysis measurements that steer the plan

pub mod downmix;
pub mod mixer;
pub mod params;
pub mod routing;

mod error;

pub use downmix::fold_to_51;
pub use error::{MixError, MixResult};
pub use mixer::mix;
pub use params::AnalysisParams;
pub use routing::{
    EntryRole, QualityPreset, RoutingEntry, RoutingMatrix, StemSource, HAAS_MAX_MS, HAAS_MIN_MS,
    HEIGHT_CROSSOVER_HZ, LFE_CROSSOVER_HZ, SECONDARY_GAIN_CAP,
};
