//! Stem-to-speaker routing.
//!
//! A [`RoutingMatrix`] is the complete placement plan for one track:
//! every send from a stem to a bed channel, with its gain, band filter,
//! precedence delay and decorrelation flag. Matrices are built from an
//! [`AnalysisParams`] snapshot so the plan adapts to the material, but
//! adaptation is bounded: secondary sends never exceed the gain cap and
//! delays always stay inside the Haas window.

use serde::{Deserialize, Serialize};
use st_core::{ChannelId, Sample, StemKind};
use st_dsp::FilterSpec;

use crate::error::{MixError, MixResult};
use crate::params::AnalysisParams;

/// Crossover between the LFE feed and the full-range bed (Hz)
pub const LFE_CROSSOVER_HZ: f64 = 80.0;
/// Height feeds carry only content above this split (Hz)
pub const HEIGHT_CROSSOVER_HZ: f64 = 500.0;
/// Hard ceiling for secondary (bleed) send gains
pub const SECONDARY_GAIN_CAP: Sample = 0.4;
/// Precedence delays are confined to the Haas window
pub const HAAS_MIN_MS: f64 = 10.0;
pub const HAAS_MAX_MS: f64 = 35.0;

// ============================================================
// Quality presets
// ============================================================

/// Render quality, expressed as FIR crossover length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityPreset {
    Low,
    Medium,
    High,
}

impl QualityPreset {
    pub fn fir_taps(&self) -> usize {
        match self {
            Self::Low => 65,
            Self::Medium => 129,
            Self::High => 257,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ============================================================
// Routing entries
// ============================================================

/// How a stereo stem is collapsed for one send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemSource {
    /// (L + R) / 2
    Mono,
    Left,
    Right,
    /// Mid of the mid/side decomposition, identical to `Mono`
    Mid,
    /// Side of the mid/side decomposition, (L - R) / 2
    Side,
}

/// Primary sends define where a stem lives; secondary sends are bleed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryRole {
    Primary,
    Secondary,
}

/// One send from a stem to a bed channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub stem: StemKind,
    pub source: StemSource,
    pub target: ChannelId,
    pub role: EntryRole,
    pub gain: Sample,
    pub filter: Option<FilterSpec>,
    pub delay_samples: usize,
    pub decorrelate: bool,
}

impl RoutingEntry {
    pub fn send(
        stem: StemKind,
        source: StemSource,
        target: ChannelId,
        role: EntryRole,
        gain: Sample,
    ) -> Self {
        Self {
            stem,
            source,
            target,
            role,
            gain,
            filter: None,
            delay_samples: 0,
            decorrelate: false,
        }
    }

    pub fn with_filter(mut self, spec: FilterSpec) -> Self {
        self.filter = Some(spec);
        self
    }

    pub fn with_delay(mut self, delay_samples: usize) -> Self {
        self.delay_samples = delay_samples;
        self
    }

    pub fn decorrelated(mut self) -> Self {
        self.decorrelate = true;
        self
    }
}

/// Ear-level placement class of a bed channel; LFE has none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlacementGroup {
    Center,
    Front,
    Side,
    Back,
    Height,
}

fn placement_group(channel: ChannelId) -> Option<PlacementGroup> {
    match channel {
        ChannelId::Fc => Some(PlacementGroup::Center),
        ChannelId::Fl | ChannelId::Fr => Some(PlacementGroup::Front),
        ChannelId::Sl | ChannelId::Sr => Some(PlacementGroup::Side),
        ChannelId::Bl | ChannelId::Br => Some(PlacementGroup::Back),
        ChannelId::Tfl | ChannelId::Tfr | ChannelId::Tbl | ChannelId::Tbr => {
            Some(PlacementGroup::Height)
        }
        ChannelId::Lfe => None,
    }
}

// ============================================================
// The matrix
// ============================================================

/// Validated placement plan for one track
#[derive(Debug, Clone)]
pub struct RoutingMatrix {
    preset: QualityPreset,
    sample_rate: u32,
    entries: Vec<RoutingEntry>,
    max_delay_samples: usize,
}

impl RoutingMatrix {
    /// Builds the standard plan for the given material.
    ///
    /// Adaptation rules, all monotonic in their driving parameter:
    /// - wider material raises bleed sends (under the cap)
    /// - bass-heavy material raises the LFE feeds
    /// - brighter material raises the height layer
    /// - denser transients shorten the precedence delays
    pub fn build(
        preset: QualityPreset,
        params: &AnalysisParams,
        sample_rate: u32,
    ) -> MixResult<Self> {
        use ChannelId::*;
        use EntryRole::{Primary, Secondary};
        use StemKind::{Bass, Drums, Other, Vocals};
        use StemSource::{Left, Mid, Mono, Right};

        let p = params.sanitized();
        let taps = preset.fir_taps();
        let hp_bed = FilterSpec::highpass(LFE_CROSSOVER_HZ, taps);
        let lp_lfe = FilterSpec::lowpass(LFE_CROSSOVER_HZ, taps);
        let hp_height = FilterSpec::highpass(HEIGHT_CROSSOVER_HZ, taps);

        let width_scale = 1.0 + 0.35 * (p.stereo_width - 0.3);
        let secondary = |g: Sample| (g * width_scale).min(SECONDARY_GAIN_CAP - 1e-3);

        let bass_lfe = (0.80 + 0.25 * (p.bass_energy_ratio - 0.25)).clamp(0.55, 0.95);
        let drum_lfe = (0.60 + 0.20 * (p.bass_energy_ratio - 0.25)).clamp(0.40, 0.75);

        let brightness = ((p.spectral_centroid_hz - 1_200.0) / 2_300.0).clamp(0.0, 1.0);
        let height_scale = 0.8 + 0.4 * brightness;

        let surround_ms = (20.0 - 10.0 * p.transient_density).clamp(HAAS_MIN_MS, HAAS_MAX_MS);
        let rear_ms = (surround_ms + 8.0).clamp(HAAS_MIN_MS, HAAS_MAX_MS);
        let surround_delay = ms_to_samples(surround_ms, sample_rate);
        let rear_delay = ms_to_samples(rear_ms, sample_rate);

        let entries = vec![
            // Vocals anchor the center, with a decorrelated front bleed
            // that restores a sense of width without smearing the image.
            RoutingEntry::send(Vocals, Mid, Fc, Primary, 0.90).with_filter(hp_bed),
            RoutingEntry::send(Vocals, Mid, Fl, Secondary, secondary(0.12)).decorrelated(),
            RoutingEntry::send(Vocals, Mid, Fr, Secondary, secondary(0.12)).decorrelated(),
            // Bass splits at the LFE crossover: lows to the sub, the
            // rest reinforces the center.
            RoutingEntry::send(Bass, Mono, Lfe, Primary, bass_lfe).with_filter(lp_lfe),
            RoutingEntry::send(Bass, Mono, Fc, Primary, 0.70).with_filter(hp_bed),
            // Drums keep their stereo image up front, kick weight in the
            // sub, and a faint delayed shimmer in the front heights.
            RoutingEntry::send(Drums, Left, Fl, Primary, 0.85).with_filter(hp_bed),
            RoutingEntry::send(Drums, Right, Fr, Primary, 0.85).with_filter(hp_bed),
            RoutingEntry::send(Drums, Mono, Lfe, Primary, drum_lfe).with_filter(lp_lfe),
            RoutingEntry::send(Drums, Mono, Tfl, Secondary, secondary(0.08 * height_scale))
                .with_filter(hp_height)
                .with_delay(surround_delay)
                .decorrelated(),
            RoutingEntry::send(Drums, Mono, Tfr, Secondary, secondary(0.08 * height_scale))
                .with_filter(hp_height)
                .with_delay(surround_delay)
                .decorrelated(),
            // Everything else wraps around the listener: sides primary,
            // delayed rears behind them, heights above, and a touch of
            // decorrelated front bleed to tie the field together.
            RoutingEntry::send(Other, Left, Sl, Primary, 0.65)
                .with_filter(hp_bed)
                .with_delay(surround_delay),
            RoutingEntry::send(Other, Right, Sr, Primary, 0.65)
                .with_filter(hp_bed)
                .with_delay(surround_delay),
            RoutingEntry::send(Other, Left, Bl, Secondary, secondary(0.36))
                .with_filter(hp_bed)
                .with_delay(rear_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Right, Br, Secondary, secondary(0.36))
                .with_filter(hp_bed)
                .with_delay(rear_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Mono, Tfl, Secondary, secondary(0.22 * height_scale))
                .with_filter(hp_height)
                .with_delay(surround_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Mono, Tfr, Secondary, secondary(0.22 * height_scale))
                .with_filter(hp_height)
                .with_delay(surround_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Mono, Tbl, Secondary, secondary(0.18 * height_scale))
                .with_filter(hp_height)
                .with_delay(rear_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Mono, Tbr, Secondary, secondary(0.18 * height_scale))
                .with_filter(hp_height)
                .with_delay(rear_delay)
                .decorrelated(),
            RoutingEntry::send(Other, Left, Fl, Secondary, secondary(0.15))
                .with_filter(hp_bed)
                .decorrelated(),
            RoutingEntry::send(Other, Right, Fr, Secondary, secondary(0.15))
                .with_filter(hp_bed)
                .decorrelated(),
        ];

        Self::from_entries(preset, sample_rate, entries)
    }

    /// Wraps an explicit entry list, rejecting plans that break the
    /// placement contract.
    pub fn from_entries(
        preset: QualityPreset,
        sample_rate: u32,
        entries: Vec<RoutingEntry>,
    ) -> MixResult<Self> {
        let haas_min = ms_to_samples(HAAS_MIN_MS, sample_rate);
        let haas_max = ms_to_samples(HAAS_MAX_MS, sample_rate);

        for entry in &entries {
            if !entry.gain.is_finite() || entry.gain <= 0.0 {
                return Err(MixError::InvalidRoutingConfig(format!(
                    "send {} -> {} has non-positive gain {}",
                    entry.stem.name(),
                    entry.target.label(),
                    entry.gain
                )));
            }
            if entry.role == EntryRole::Secondary && entry.gain >= SECONDARY_GAIN_CAP {
                return Err(MixError::InvalidRoutingConfig(format!(
                    "secondary send {} -> {} gain {} is not below cap {}",
                    entry.stem.name(),
                    entry.target.label(),
                    entry.gain,
                    SECONDARY_GAIN_CAP
                )));
            }
            if entry.delay_samples != 0
                && !(haas_min..=haas_max).contains(&entry.delay_samples)
            {
                return Err(MixError::InvalidRoutingConfig(format!(
                    "send {} -> {} delay {} samples outside the Haas window",
                    entry.stem.name(),
                    entry.target.label(),
                    entry.delay_samples
                )));
            }
        }

        // Each stem must have exactly one ear-level home; LFE sends are
        // exempt from the placement rule.
        for stem in StemKind::ALL {
            let mut group: Option<PlacementGroup> = None;
            let mut has_entries = false;
            for entry in entries.iter().filter(|e| e.stem == stem) {
                has_entries = true;
                if entry.role != EntryRole::Primary {
                    continue;
                }
                let Some(g) = placement_group(entry.target) else {
                    continue;
                };
                match group {
                    None => group = Some(g),
                    Some(prev) if prev != g => {
                        return Err(MixError::InvalidRoutingConfig(format!(
                            "stem '{}' has primary sends in two placement groups",
                            stem.name()
                        )));
                    }
                    Some(_) => {}
                }
            }
            if has_entries && group.is_none() {
                return Err(MixError::InvalidRoutingConfig(format!(
                    "stem '{}' has no primary bed placement",
                    stem.name()
                )));
            }
        }

        let max_delay_samples = entries.iter().map(|e| e.delay_samples).max().unwrap_or(0);
        Ok(Self {
            preset,
            sample_rate,
            entries,
            max_delay_samples,
        })
    }

    pub fn preset(&self) -> QualityPreset {
        self.preset
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    /// All sends landing on one bed channel, in declaration order
    pub fn entries_for(&self, target: ChannelId) -> impl Iterator<Item = &RoutingEntry> {
        self.entries.iter().filter(move |e| e.target == target)
    }

    pub fn max_delay_samples(&self) -> usize {
        self.max_delay_samples
    }
}

fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (ms * sample_rate as f64 / 1_000.0).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_core::DELIVERY_SAMPLE_RATE;

    #[test]
    fn test_preset_taps() {
        assert_eq!(QualityPreset::Low.fir_taps(), 65);
        assert_eq!(QualityPreset::Medium.fir_taps(), 129);
        assert_eq!(QualityPreset::High.fir_taps(), 257);
    }

    #[test]
    fn test_default_plan_validates() {
        let m = RoutingMatrix::build(
            QualityPreset::Medium,
            &AnalysisParams::default(),
            DELIVERY_SAMPLE_RATE,
        )
        .unwrap();
        assert!(!m.entries().is_empty());
        assert!(m.max_delay_samples() > 0);
    }

    #[test]
    fn test_every_stem_routed() {
        let m = RoutingMatrix::build(
            QualityPreset::Low,
            &AnalysisParams::default(),
            DELIVERY_SAMPLE_RATE,
        )
        .unwrap();
        for stem in StemKind::ALL {
            assert!(
                m.entries().iter().any(|e| e.stem == stem),
                "{} has no sends",
                stem.name()
            );
        }
    }

    #[test]
    fn test_split_placement_rejected() {
        let entries = vec![
            RoutingEntry::send(
                StemKind::Vocals,
                StemSource::Mid,
                ChannelId::Fc,
                EntryRole::Primary,
                0.9,
            ),
            RoutingEntry::send(
                StemKind::Vocals,
                StemSource::Mid,
                ChannelId::Sl,
                EntryRole::Primary,
                0.5,
            ),
        ];
        let err = RoutingMatrix::from_entries(QualityPreset::Medium, DELIVERY_SAMPLE_RATE, entries)
            .unwrap_err();
        assert!(matches!(err, MixError::InvalidRoutingConfig(_)));
    }

    #[test]
    fn test_missing_primary_rejected() {
        let entries = vec![RoutingEntry::send(
            StemKind::Drums,
            StemSource::Mono,
            ChannelId::Tfl,
            EntryRole::Secondary,
            0.1,
        )];
        let err = RoutingMatrix::from_entries(QualityPreset::Medium, DELIVERY_SAMPLE_RATE, entries)
            .unwrap_err();
        assert!(matches!(err, MixError::InvalidRoutingConfig(_)));
    }

    #[test]
    fn test_secondary_cap_enforced() {
        let entries = vec![
            RoutingEntry::send(
                StemKind::Other,
                StemSource::Left,
                ChannelId::Sl,
                EntryRole::Primary,
                0.65,
            ),
            RoutingEntry::send(
                StemKind::Other,
                StemSource::Left,
                ChannelId::Bl,
                EntryRole::Secondary,
                0.55,
            ),
        ];
        let err = RoutingMatrix::from_entries(QualityPreset::Medium, DELIVERY_SAMPLE_RATE, entries)
            .unwrap_err();
        assert!(matches!(err, MixError::InvalidRoutingConfig(_)));
    }

    #[test]
    fn test_secondary_gain_at_cap_rejected() {
        // The cap is strict; a send sitting exactly on it is invalid.
        let entries = vec![
            RoutingEntry::send(
                StemKind::Other,
                StemSource::Left,
                ChannelId::Sl,
                EntryRole::Primary,
                0.65,
            ),
            RoutingEntry::send(
                StemKind::Other,
                StemSource::Left,
                ChannelId::Bl,
                EntryRole::Secondary,
                SECONDARY_GAIN_CAP,
            ),
        ];
        let err = RoutingMatrix::from_entries(QualityPreset::Medium, DELIVERY_SAMPLE_RATE, entries)
            .unwrap_err();
        assert!(matches!(err, MixError::InvalidRoutingConfig(_)));
    }

    #[test]
    fn test_delay_outside_haas_window_rejected() {
        let entries = vec![RoutingEntry::send(
            StemKind::Other,
            StemSource::Left,
            ChannelId::Sl,
            EntryRole::Primary,
            0.65,
        )
        .with_delay(ms_to_samples(60.0, DELIVERY_SAMPLE_RATE))];
        let err = RoutingMatrix::from_entries(QualityPreset::Medium, DELIVERY_SAMPLE_RATE, entries)
            .unwrap_err();
        assert!(matches!(err, MixError::InvalidRoutingConfig(_)));
    }

    #[test]
    fn test_adaptation_stays_bounded() {
        let extremes = [
            AnalysisParams {
                spectral_centroid_hz: 12_000.0,
                bass_energy_ratio: 1.0,
                transient_density: 1.0,
                stereo_width: 1.0,
                dynamic_range_db: 60.0,
            },
            AnalysisParams {
                spectral_centroid_hz: 20.0,
                bass_energy_ratio: 0.0,
                transient_density: 0.0,
                stereo_width: 0.0,
                dynamic_range_db: 0.0,
            },
        ];
        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High] {
            for params in &extremes {
                let m = RoutingMatrix::build(preset, params, DELIVERY_SAMPLE_RATE).unwrap();
                for e in m.entries() {
                    if e.role == EntryRole::Secondary {
                        assert!(e.gain < SECONDARY_GAIN_CAP);
                    }
                }
            }
        }
    }

    #[test]
    fn test_wider_material_raises_bleed() {
        let narrow = RoutingMatrix::build(
            QualityPreset::Medium,
            &AnalysisParams {
                stereo_width: 0.1,
                ..AnalysisParams::default()
            },
            DELIVERY_SAMPLE_RATE,
        )
        .unwrap();
        let wide = RoutingMatrix::build(
            QualityPreset::Medium,
            &AnalysisParams {
                stereo_width: 0.9,
                ..AnalysisParams::default()
            },
            DELIVERY_SAMPLE_RATE,
        )
        .unwrap();
        let bleed = |m: &RoutingMatrix| {
            m.entries_for(ChannelId::Fl)
                .find(|e| e.stem == StemKind::Vocals)
                .unwrap()
                .gain
        };
        assert!(bleed(&wide) > bleed(&narrow));
    }
}
