//! Parallel stem-to-bed mixdown.
//!
//! Channels render independently: each bed channel owns its accumulator
//! and walks only the sends that land on it, so the rayon fan-out needs
//! no shared mutable state. Every filtered send is group-delay aligned,
//! which keeps the bed phase-coherent across channels.

use rayon::prelude::*;
use st_core::{CancelToken, ChannelId, MixBuffer, OutputLayout, Sample, StemSet, CHANNELS_714};
use st_dsp::{DecorrelationChain, DelayLine, FirFilter};

use crate::error::{MixError, MixResult};
use crate::routing::{RoutingEntry, RoutingMatrix, StemSource};

/// Renders the full 7.1.4 bed for one track.
///
/// `decorr_seed` fixes the per-channel decorrelation chains; the same
/// stems, matrix and seed always produce a bit-identical bed.
pub fn mix(
    stems: &StemSet,
    matrix: &RoutingMatrix,
    decorr_seed: u64,
    cancel: &CancelToken,
) -> MixResult<MixBuffer> {
    validate_stems(stems, matrix)?;

    let frames = stems.frames();
    let max_delay = matrix.max_delay_samples();

    let channels = CHANNELS_714
        .par_iter()
        .map(|&target| render_channel(target, stems, matrix, decorr_seed, max_delay, frames, cancel))
        .collect::<MixResult<Vec<_>>>()?;

    log::debug!(
        "mixed {} frames into {} bed channels",
        frames,
        channels.len()
    );
    Ok(MixBuffer::from_channels(OutputLayout::Surround714, channels))
}

fn validate_stems(stems: &StemSet, matrix: &RoutingMatrix) -> MixResult<()> {
    let expected_rate = matrix.sample_rate();
    let expected_frames = stems.frames();
    for stem in stems.iter() {
        if stem.sample_rate() != expected_rate {
            return Err(MixError::SampleRateMismatch {
                stem: stem.kind().name(),
                expected: expected_rate,
                got: stem.sample_rate(),
            });
        }
        if stem.frames() != expected_frames {
            return Err(MixError::BufferLengthMismatch {
                stem: stem.kind().name(),
                expected: expected_frames,
                got: stem.frames(),
            });
        }
    }
    Ok(())
}

fn render_channel(
    target: ChannelId,
    stems: &StemSet,
    matrix: &RoutingMatrix,
    decorr_seed: u64,
    max_delay: usize,
    frames: usize,
    cancel: &CancelToken,
) -> MixResult<Vec<Sample>> {
    if cancel.is_cancelled() {
        return Err(MixError::Cancelled);
    }

    let sample_rate = matrix.sample_rate();
    let mut acc = vec![0.0; frames];
    // All decorrelated sends on a channel share that channel's chain.
    let mut chain: Option<DecorrelationChain> = None;

    for entry in matrix.entries_for(target) {
        if cancel.is_cancelled() {
            return Err(MixError::Cancelled);
        }

        let mut signal = source_signal(stems, entry);
        if let Some(spec) = entry.filter {
            let filter = FirFilter::design(spec, sample_rate)?;
            signal = filter.apply_aligned(&signal)?;
        }
        if entry.decorrelate {
            let chain =
                chain.get_or_insert_with(|| DecorrelationChain::generate(target, decorr_seed));
            signal = chain.apply(&signal)?;
        }
        if entry.delay_samples > 0 {
            let mut line = DelayLine::new(entry.delay_samples, max_delay);
            line.process_block(&mut signal);
        }

        for (out, s) in acc.iter_mut().zip(&signal) {
            *out += s * entry.gain;
        }
    }

    Ok(acc)
}

fn source_signal(stems: &StemSet, entry: &RoutingEntry) -> Vec<Sample> {
    let stem = stems.get(entry.stem);
    match entry.source {
        StemSource::Mono => stem.mono(),
        StemSource::Left => stem.left().to_vec(),
        StemSource::Right => stem.right().to_vec(),
        StemSource::Mid => stem.mid(),
        StemSource::Side => stem.side(),
    }
}
