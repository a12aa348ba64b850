//! Deterministic allpass decorrelation chains
//!
//! When a stem bleeds into surround or height channels, identical
//! copies comb-filter against each other once the playback device
//! convolves per-channel HRTFs. Passing each bleed copy through a
//! unique cascade of Schroeder allpass sections scrambles phase per
//! frequency while leaving the magnitude spectrum untouched, so the
//! copies sound alike but no longer interfere.
//!
//! Chain generation is a pure function of (channel, seed): the RNG is
//! a seeded ChaCha8 stream and every channel draws its stage delays
//! from a disjoint slice of a prime table. No wall-clock or OS entropy
//! is involved anywhere — masters must be reproducible run to run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use st_core::{ChannelId, Sample};

use crate::error::{DspError, DspResult};

/// Minimum allpass sections per chain
pub const MIN_STAGES: usize = 2;
/// Maximum allpass sections per chain
pub const MAX_STAGES: usize = 4;
/// Generated coefficients stay well inside the stable region
const MAX_GENERATED_G: f64 = 0.7;

/// Stage delays in samples, prime so cascades never phase-lock.
/// Each channel owns a disjoint slice of MAX_STAGES entries, which
/// guarantees chains for distinct channels are never identical.
const STAGE_DELAY_PRIMES: [usize; 48] = [
    101, 127, 149, 173, 199, 211, 239, 257, 283, 307, 331, 353, 379, 401, 421, 443, 467, 491,
    509, 541, 563, 587, 613, 631, 653, 677, 701, 727, 751, 773, 797, 821, 839, 863, 887, 911,
    929, 953, 977, 997, 1019, 1039, 1061, 1087, 1103, 1129, 1151, 1171,
];

/// One Schroeder allpass section: y[n] = -g·x[n] + x[n-d] + g·y[n-d]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllpassStage {
    /// Delay line length in samples
    pub delay_samples: usize,
    /// Feedback/feedforward coefficient; |g| < 1 for stability
    pub g: f64,
}

/// Ordered cascade of 2-4 allpass sections assigned to one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorrelationChain {
    channel: ChannelId,
    stages: Vec<AllpassStage>,
}

impl DecorrelationChain {
    /// Generate the chain for a channel. Pure: the same (channel, seed)
    /// always yields the same chain, and distinct channels always yield
    /// distinct chains (disjoint delay primes).
    pub fn generate(channel: ChannelId, seed: u64) -> Self {
        let idx = channel.index();
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ ((idx as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)));

        let num_stages = rng.random_range(MIN_STAGES..=MAX_STAGES);
        let stages = (0..num_stages)
            .map(|s| AllpassStage {
                delay_samples: STAGE_DELAY_PRIMES[idx * MAX_STAGES + s],
                g: rng.random_range(0.35..MAX_GENERATED_G),
            })
            .collect();

        Self { channel, stages }
    }

    /// Build a chain by hand (tests, experiments). Validated on apply.
    pub fn from_stages(channel: ChannelId, stages: Vec<AllpassStage>) -> Self {
        Self { channel, stages }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn stages(&self) -> &[AllpassStage] {
        &self.stages
    }

    /// Reject coefficients outside the stable region
    pub fn validate(&self) -> DspResult<()> {
        for stage in &self.stages {
            if stage.g.abs() >= 1.0 {
                return Err(DspError::UnstableFilterCoefficient {
                    coefficient: stage.g,
                });
            }
        }
        Ok(())
    }

    /// Run the cascade over a whole buffer. Output length equals input
    /// length; the magnitude spectrum is preserved exactly (allpass).
    pub fn apply(&self, input: &[Sample]) -> DspResult<Vec<Sample>> {
        self.validate()?;

        let mut current = input.to_vec();
        for stage in &self.stages {
            let d = stage.delay_samples;
            let g = stage.g;
            let mut out = vec![0.0; current.len()];
            for i in 0..current.len() {
                let x_d = if i >= d { current[i - d] } else { 0.0 };
                let y_d = if i >= d { out[i - d] } else { 0.0 };
                out[i] = -g * current[i] + x_d + g * y_d;
            }
            current = out;
        }
        Ok(current)
    }
}
