//! Separated stem buffers
//!
//! A `StemBuffer` is what the external separator hands us: one stereo
//! PCM buffer per stem, all four at the same sample rate and length.
//! Buffers are immutable once built — the mixer only reads them.

use serde::{Deserialize, Serialize};

use crate::Sample;

/// The four separation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemKind {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl StemKind {
    /// All stems in separator output order
    pub const ALL: [StemKind; 4] = [Self::Vocals, Self::Drums, Self::Bass, Self::Other];

    /// Stem name for logs and file naming
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vocals => "vocals",
            Self::Drums => "drums",
            Self::Bass => "bass",
            Self::Other => "other",
        }
    }
}

/// Immutable stereo stem buffer (planar)
#[derive(Debug, Clone)]
pub struct StemBuffer {
    kind: StemKind,
    sample_rate: u32,
    left: Vec<Sample>,
    right: Vec<Sample>,
}

impl StemBuffer {
    /// Create from planar channels. Channels of unequal length are
    /// truncated to the shorter one.
    pub fn new(kind: StemKind, sample_rate: u32, mut left: Vec<Sample>, mut right: Vec<Sample>) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            kind,
            sample_rate,
            left,
            right,
        }
    }

    /// Create from interleaved stereo samples
    pub fn from_interleaved(kind: StemKind, sample_rate: u32, interleaved: &[Sample]) -> Self {
        let frames = interleaved.len() / 2;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        Self {
            kind,
            sample_rate,
            left,
            right,
        }
    }

    /// Silent stem of the given length
    pub fn silent(kind: StemKind, sample_rate: u32, frames: usize) -> Self {
        Self {
            kind,
            sample_rate,
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    pub fn kind(&self) -> StemKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn left(&self) -> &[Sample] {
        &self.left
    }

    pub fn right(&self) -> &[Sample] {
        &self.right
    }

    /// Mono sum: (L + R) / 2
    pub fn mono(&self) -> Vec<Sample> {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| (l + r) * 0.5)
            .collect()
    }

    /// Mid component — same as mono, named for M/S routing intent
    pub fn mid(&self) -> Vec<Sample> {
        self.mono()
    }

    /// Side component: (L − R) / 2, the stereo-width content
    pub fn side(&self) -> Vec<Sample> {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| (l - r) * 0.5)
            .collect()
    }
}

/// The four stems of one track, as produced by the separator
#[derive(Debug, Clone)]
pub struct StemSet {
    vocals: StemBuffer,
    drums: StemBuffer,
    bass: StemBuffer,
    other: StemBuffer,
}

impl StemSet {
    pub fn new(vocals: StemBuffer, drums: StemBuffer, bass: StemBuffer, other: StemBuffer) -> Self {
        Self {
            vocals,
            drums,
            bass,
            other,
        }
    }

    pub fn get(&self, kind: StemKind) -> &StemBuffer {
        match kind {
            StemKind::Vocals => &self.vocals,
            StemKind::Drums => &self.drums,
            StemKind::Bass => &self.bass,
            StemKind::Other => &self.other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StemBuffer> {
        StemKind::ALL.iter().map(|k| self.get(*k))
    }

    /// Sample rate of the vocals stem; the mixer verifies the others agree
    pub fn sample_rate(&self) -> u32 {
        self.vocals.sample_rate()
    }

    /// Frame count of the vocals stem; the mixer verifies the others agree
    pub fn frames(&self) -> usize {
        self.vocals.frames()
    }
}
