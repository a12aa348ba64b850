//! st-core: shared primitives for the Stratus spatial mixing engine
//!
//! Everything the DSP, routing, and offline crates agree on lives here:
//! - `Sample` — f64 processing precision throughout the engine
//! - `ChannelId` / `OutputLayout` — 7.1.4 and 5.1 channel identities
//! - `StemKind` / `StemBuffer` / `StemSet` — separated stereo stems
//! - `MixBuffer` — planar multichannel accumulator
//! - `CancelToken` — coarse-grained cooperative cancellation

pub mod buffer;
pub mod cancel;
pub mod channel;
pub mod stem;

pub use buffer::MixBuffer;
pub use cancel::CancelToken;
pub use channel::{ChannelId, OutputLayout, CHANNELS_51, CHANNELS_714};
pub use stem::{StemBuffer, StemKind, StemSet};

/// Audio sample type — f64 end to end, converted only at the encoder boundary
pub type Sample = f64;

/// Project delivery sample rate (Hz)
pub const DELIVERY_SAMPLE_RATE: u32 = 48_000;

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels (-inf for silence)
#[inline]
pub fn linear_to_db(amp: f64) -> f64 {
    if amp <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * amp.log10()
    }
}
