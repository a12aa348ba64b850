//! Per-track analysis measurements that steer routing decisions.
//!
//! Values typically arrive from an upstream analysis pass serialized as
//! JSON; any field the producer omits falls back to a neutral default,
//! and out-of-range values are clamped before they reach the router.

use serde::{Deserialize, Serialize};

const CENTROID_HZ_RANGE: (f64, f64) = (20.0, 12_000.0);
const UNIT_RANGE: (f64, f64) = (0.0, 1.0);
const DYNAMIC_RANGE_DB_RANGE: (f64, f64) = (0.0, 60.0);

/// Summary measurements of the source track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Energy-weighted mean frequency of the full mix (Hz)
    pub spectral_centroid_hz: f64,
    /// Fraction of total energy below the LFE crossover, 0..=1
    pub bass_energy_ratio: f64,
    /// Onset rate normalized to 0..=1
    pub transient_density: f64,
    /// Stereo side/mid energy balance, 0 mono..=1 fully wide
    pub stereo_width: f64,
    /// Crest-style loudness range (dB)
    pub dynamic_range_db: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            spectral_centroid_hz: 2_000.0,
            bass_energy_ratio: 0.25,
            transient_density: 0.10,
            stereo_width: 0.30,
            dynamic_range_db: 18.0,
        }
    }
}

impl AnalysisParams {
    /// Returns a copy with every field forced into its documented range.
    /// Non-finite values fall back to the field default.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            spectral_centroid_hz: clamp_field(
                "spectral_centroid_hz",
                self.spectral_centroid_hz,
                CENTROID_HZ_RANGE,
                d.spectral_centroid_hz,
            ),
            bass_energy_ratio: clamp_field(
                "bass_energy_ratio",
                self.bass_energy_ratio,
                UNIT_RANGE,
                d.bass_energy_ratio,
            ),
            transient_density: clamp_field(
                "transient_density",
                self.transient_density,
                UNIT_RANGE,
                d.transient_density,
            ),
            stereo_width: clamp_field(
                "stereo_width",
                self.stereo_width,
                UNIT_RANGE,
                d.stereo_width,
            ),
            dynamic_range_db: clamp_field(
                "dynamic_range_db",
                self.dynamic_range_db,
                DYNAMIC_RANGE_DB_RANGE,
                d.dynamic_range_db,
            ),
        }
    }
}

fn clamp_field(name: &str, value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if !value.is_finite() {
        log::warn!("analysis field {name} is not finite, using default {fallback}");
        return fallback;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        log::warn!("analysis field {name}={value} outside [{lo}, {hi}], clamped to {clamped}");
    }
    clamped
}
