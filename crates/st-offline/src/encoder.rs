//! Master buffers and WAV delivery.
//!
//! A [`MasterBuffer`] is a finished deliverable: normalized audio plus
//! the channel order tag and PCM format the container will carry.
//! Masters are written as 24-bit integer WAV with channels interleaved
//! in tag order.

use std::path::Path;

use st_core::{ChannelId, MixBuffer, OutputLayout, Sample};

use crate::error::{OfflineError, OfflineResult};

const MASTER_BITS_PER_SAMPLE: u16 = 24;
const I24_FULL_SCALE: Sample = 8_388_607.0;

/// PCM format of a deliverable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmDescriptor {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

/// One finished deliverable, ready to encode
#[derive(Debug, Clone)]
pub struct MasterBuffer {
    audio: MixBuffer,
    channel_order: Vec<ChannelId>,
    pcm: PcmDescriptor,
}

impl MasterBuffer {
    pub fn new(audio: MixBuffer, sample_rate: u32) -> Self {
        let channel_order = audio.layout().channels().to_vec();
        Self {
            audio,
            channel_order,
            pcm: PcmDescriptor {
                bits_per_sample: MASTER_BITS_PER_SAMPLE,
                sample_rate,
            },
        }
    }

    pub fn audio(&self) -> &MixBuffer {
        &self.audio
    }

    pub fn layout(&self) -> OutputLayout {
        self.audio.layout()
    }

    /// Channel identities in interleave order
    pub fn channel_order(&self) -> &[ChannelId] {
        &self.channel_order
    }

    pub fn pcm(&self) -> PcmDescriptor {
        self.pcm
    }
}

/// Writes a master as an interleaved 24-bit WAV file.
pub fn write_wav(master: &MasterBuffer, path: &Path) -> OfflineResult<()> {
    let spec = hound::WavSpec {
        channels: master.channel_order.len() as u16,
        sample_rate: master.pcm.sample_rate,
        bits_per_sample: master.pcm.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let encode_err = |source| OfflineError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(encode_err)?;
    let audio = master.audio();
    for frame in 0..audio.frames() {
        for ch in 0..audio.channel_count() {
            let sample = audio.channel(ch)[frame].clamp(-1.0, 1.0);
            writer
                .write_sample((sample * I24_FULL_SCALE).round() as i32)
                .map_err(encode_err)?;
        }
    }
    writer.finalize().map_err(encode_err)?;

    log::info!(
        "wrote {} ({} ch, {} frames)",
        path.display(),
        master.channel_order.len(),
        audio.frames()
    );
    Ok(())
}
