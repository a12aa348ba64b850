//! 7.1.4 to 5.1 channel fold.
//!
//! A pure gain fold in the ITU downmix tradition; no filtering, no
//! level normalization. Peaks may rise where folded channels add in
//! phase, so callers re-normalize after folding.
//!
//! Fold table (mirrored left/right, FC and LFE pass through):
//!
//! | into | from | gain  |
//! |------|------|-------|
//! | FL   | SL   | 0.707 |
//! | FL   | BL   | 0.50  |
//! | FL   | TFL  | 0.50  |
//! | FL   | TBL  | 0.35  |
//! | SL   | BL   | 0.707 |
//! | SL   | TBL  | 0.50  |

use st_core::{ChannelId, MixBuffer, OutputLayout, Sample, CHANNELS_51};

const SURROUND_TO_FRONT: Sample = 0.707;
const BACK_TO_FRONT: Sample = 0.5;
const TOP_FRONT_TO_FRONT: Sample = 0.5;
const TOP_BACK_TO_FRONT: Sample = 0.35;
const BACK_TO_SIDE: Sample = 0.707;
const TOP_BACK_TO_SIDE: Sample = 0.5;

/// Folds a 7.1.4 bed down to 5.1. A bed already in 5.1 passes through.
pub fn fold_to_51(input: &MixBuffer) -> MixBuffer {
    use ChannelId::*;

    if input.layout() == OutputLayout::Surround51 {
        return input.clone();
    }

    let plan: [(ChannelId, &[(ChannelId, Sample)]); 6] = [
        (
            Fl,
            &[
                (Fl, 1.0),
                (Sl, SURROUND_TO_FRONT),
                (Bl, BACK_TO_FRONT),
                (Tfl, TOP_FRONT_TO_FRONT),
                (Tbl, TOP_BACK_TO_FRONT),
            ],
        ),
        (
            Fr,
            &[
                (Fr, 1.0),
                (Sr, SURROUND_TO_FRONT),
                (Br, BACK_TO_FRONT),
                (Tfr, TOP_FRONT_TO_FRONT),
                (Tbr, TOP_BACK_TO_FRONT),
            ],
        ),
        (Fc, &[(Fc, 1.0)]),
        (Lfe, &[(Lfe, 1.0)]),
        (Sl, &[(Sl, 1.0), (Bl, BACK_TO_SIDE), (Tbl, TOP_BACK_TO_SIDE)]),
        (Sr, &[(Sr, 1.0), (Br, BACK_TO_SIDE), (Tbr, TOP_BACK_TO_SIDE)]),
    ];

    let mut out = MixBuffer::new(OutputLayout::Surround51, input.frames());
    for (idx, (target, sources)) in plan.iter().enumerate() {
        debug_assert_eq!(CHANNELS_51[idx], *target);
        let dst = out.channel_mut(idx);
        for &(src, gain) in *sources {
            for (d, s) in dst.iter_mut().zip(input.channel_by_id(src)) {
                *d += s * gain;
            }
        }
    }
    out
}
