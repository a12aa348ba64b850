//! Planar multichannel mix buffer

use crate::channel::{ChannelId, OutputLayout};
use crate::Sample;

/// Fixed channel-count × frame-count accumulator, planar f64
#[derive(Debug, Clone)]
pub struct MixBuffer {
    layout: OutputLayout,
    frames: usize,
    channels: Vec<Vec<Sample>>,
}

impl MixBuffer {
    /// Allocate a silent buffer for the layout
    pub fn new(layout: OutputLayout, frames: usize) -> Self {
        let channels = (0..layout.channel_count())
            .map(|_| vec![0.0; frames])
            .collect();
        Self {
            layout,
            frames,
            channels,
        }
    }

    /// Build from per-channel data in the layout's delivery order.
    /// Data lengths must already agree; debug-asserted.
    pub fn from_channels(layout: OutputLayout, channels: Vec<Vec<Sample>>) -> Self {
        debug_assert_eq!(channels.len(), layout.channel_count());
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        debug_assert!(channels.iter().all(|c| c.len() == frames));
        Self {
            layout,
            frames,
            channels,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel data by delivery-order index
    pub fn channel(&self, index: usize) -> &[Sample] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [Sample] {
        &mut self.channels[index]
    }

    /// Channel data by identity; panics if the channel is not in the layout
    pub fn channel_by_id(&self, id: ChannelId) -> &[Sample] {
        let idx = self
            .layout
            .channels()
            .iter()
            .position(|c| *c == id)
            .expect("channel present in layout");
        &self.channels[idx]
    }

    /// True peak: maximum |sample| across all channels
    pub fn peak(&self) -> Sample {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0, |acc, s| acc.max(s.abs()))
    }

    /// Apply one scalar gain to every channel
    pub fn apply_gain(&mut self, gain: Sample) {
        for ch in &mut self.channels {
            for s in ch.iter_mut() {
                *s *= gain;
            }
        }
    }

    /// RMS of one channel — used by tests and analysis reporting
    pub fn channel_rms(&self, index: usize) -> Sample {
        let ch = &self.channels[index];
        if ch.is_empty() {
            return 0.0;
        }
        let sum: f64 = ch.iter().map(|s| s * s).sum();
        (sum / ch.len() as f64).sqrt()
    }

    /// Interleave for the encoder boundary
    pub fn interleaved(&self) -> Vec<Sample> {
        let n_ch = self.channels.len();
        let mut out = vec![0.0; self.frames * n_ch];
        for (ch_idx, ch) in self.channels.iter().enumerate() {
            for (frame, &s) in ch.iter().enumerate() {
                out[frame * n_ch + ch_idx] = s;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_silent() {
        let buf = MixBuffer::new(OutputLayout::Surround714, 128);
        assert_eq!(buf.channel_count(), 12);
        assert_eq!(buf.frames(), 128);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn test_peak_across_channels() {
        let mut buf = MixBuffer::new(OutputLayout::Surround51, 4);
        buf.channel_mut(5)[2] = -0.8;
        buf.channel_mut(0)[0] = 0.3;
        assert!((buf.peak() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_gain() {
        let mut buf = MixBuffer::new(OutputLayout::Surround51, 2);
        buf.channel_mut(0)[0] = 0.5;
        buf.channel_mut(3)[1] = -0.25;
        buf.apply_gain(2.0);
        assert!((buf.channel(0)[0] - 1.0).abs() < 1e-12);
        assert!((buf.channel(3)[1] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_interleave_order() {
        let mut buf = MixBuffer::new(OutputLayout::Surround51, 2);
        buf.channel_mut(0)[0] = 1.0;
        buf.channel_mut(5)[1] = -1.0;
        let inter = buf.interleaved();
        assert_eq!(inter.len(), 12);
        assert_eq!(inter[0], 1.0);
        assert_eq!(inter[11], -1.0);
    }
}
