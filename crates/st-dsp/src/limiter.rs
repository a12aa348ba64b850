//! Peak normalization and linked soft-knee limiting
//!
//! Normalization applies one uniform scalar gain across every channel
//! so the spatial image is untouched. The limiter is equally linked:
//! at each sample instant a single gain value, driven by the loudest
//! channel, is applied to all channels. Per-channel-independent
//! limiting would shift the perceived image and is deliberately not
//! offered.

use st_core::{db_to_linear, linear_to_db, MixBuffer, Sample};

/// Default normalization target
pub const DEFAULT_TARGET_DBFS: f64 = -1.0;
/// Default soft-knee width
pub const DEFAULT_KNEE_DB: f64 = 2.0;

/// Below this peak the buffer is treated as silence
const SILENCE_FLOOR: Sample = 1e-10;

/// Peak-normalize to `target_dbfs`, then soft-knee limit residual
/// transients at the same ceiling. Silence is left untouched.
///
/// Post-condition: peak <= target within numeric tolerance, for any
/// finite input including full-scale impulses.
pub fn normalize(buffer: &mut MixBuffer, target_dbfs: f64, knee_db: f64) {
    let peak = buffer.peak();
    if peak < SILENCE_FLOOR {
        return;
    }

    let target = db_to_linear(target_dbfs);
    buffer.apply_gain(target / peak);

    limit_soft_knee(buffer, target_dbfs, knee_db);
}

/// Channel-linked soft-knee limiter at `ceiling_dbfs`.
///
/// The gain curve is an infinite-ratio compressor with a quadratic
/// knee of `knee_db` total width centered on the ceiling, so gain
/// reduction ramps in smoothly and output never exceeds the ceiling.
pub fn limit_soft_knee(buffer: &mut MixBuffer, ceiling_dbfs: f64, knee_db: f64) {
    let frames = buffer.frames();
    let channels = buffer.channel_count();

    for frame in 0..frames {
        let mut frame_peak: Sample = 0.0;
        for ch in 0..channels {
            frame_peak = frame_peak.max(buffer.channel(ch)[frame].abs());
        }

        let gain = knee_gain(frame_peak, ceiling_dbfs, knee_db);
        if gain < 1.0 {
            for ch in 0..channels {
                buffer.channel_mut(ch)[frame] *= gain;
            }
        }
    }
}

/// Static soft-knee gain for one linked peak value
fn knee_gain(peak: Sample, ceiling_dbfs: f64, knee_db: f64) -> Sample {
    if peak < SILENCE_FLOOR {
        return 1.0;
    }

    let input_db = linear_to_db(peak);
    let half_knee = knee_db * 0.5;

    let output_db = if input_db < ceiling_dbfs - half_knee {
        input_db
    } else if input_db > ceiling_dbfs + half_knee {
        ceiling_dbfs
    } else {
        let over = input_db - ceiling_dbfs + half_knee;
        input_db - over * over / (2.0 * knee_db.max(1e-9))
    };

    db_to_linear(output_db - input_db)
}
