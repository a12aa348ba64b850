//! Render configuration.
//!
//! A [`RenderConfig`] is a plain serde value so front-ends can persist
//! it as JSON; [`RenderConfig::validate`] gates it at the pipeline
//! boundary.

use serde::{Deserialize, Serialize};
use st_dsp::{DEFAULT_KNEE_DB, DEFAULT_TARGET_DBFS};
use st_spatial::{AnalysisParams, QualityPreset};

use crate::error::{OfflineError, OfflineResult};

/// Default decorrelation seed; fixed so re-renders are reproducible
pub const DEFAULT_DECORR_SEED: u64 = 42;

/// Which deliverables a render produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputSelector {
    Surround714,
    Surround51,
    Both,
}

impl OutputSelector {
    pub fn wants_714(&self) -> bool {
        matches!(self, Self::Surround714 | Self::Both)
    }

    pub fn wants_51(&self) -> bool {
        matches!(self, Self::Surround51 | Self::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub quality: QualityPreset,
    pub outputs: OutputSelector,
    /// Master peak target (dBFS); must be at or below full scale
    pub target_peak_dbfs: f64,
    /// Limiter knee width (dB)
    pub knee_db: f64,
    /// Seed for the per-channel decorrelation chains
    pub decorr_seed: u64,
    pub analysis: AnalysisParams,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            outputs: OutputSelector::Both,
            target_peak_dbfs: DEFAULT_TARGET_DBFS,
            knee_db: DEFAULT_KNEE_DB,
            decorr_seed: DEFAULT_DECORR_SEED,
            analysis: AnalysisParams::default(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> OfflineResult<()> {
        if !self.target_peak_dbfs.is_finite() || self.target_peak_dbfs > 0.0 {
            return Err(OfflineError::InvalidConfig(format!(
                "target peak {} dBFS is above full scale",
                self.target_peak_dbfs
            )));
        }
        if !self.knee_db.is_finite() || self.knee_db < 0.0 {
            return Err(OfflineError::InvalidConfig(format!(
                "knee width {} dB is negative",
                self.knee_db
            )));
        }
        Ok(())
    }
}
