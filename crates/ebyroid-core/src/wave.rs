//! PCM result envelope and its RIFF/WAVE serialization.

/// Size of the canonical RIFF/WAVE header emitted by [`WaveObject::to_wav_bytes`].
pub const WAV_HEADER_LEN: usize = 44;

/// A synthesis result: raw 16-bit PCM plus its format information.
///
/// Immutable once produced; the caller that receives it owns it exclusively.
#[derive(Debug, Clone)]
pub struct WaveObject {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl WaveObject {
    /// Bit depth of the PCM data. Fixed — no VOICEROID outputs anything
    /// but 16-bit.
    pub const BIT_DEPTH: u16 = 16;

    /// Wrap mono PCM samples produced at `sample_rate` Hz.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bit_depth(&self) -> u16 {
        Self::BIT_DEPTH
    }

    /// Byte length of the PCM payload.
    pub fn data_len(&self) -> usize {
        self.samples.len() * 2
    }

    /// Raw little-endian PCM bytes, no header.
    pub fn pcm_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_len());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Serialize into a complete RIFF/WAVE byte stream.
    ///
    /// Emits the canonical 44-byte header: `RIFF`, file size = data + 36,
    /// `WAVE`, a 16-byte `fmt ` subchunk with PCM code 1, then the `data`
    /// chunk followed by the raw samples.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let data_len = self.data_len() as u32;
        let byte_rate = self.sample_rate * u32::from(self.channels) * 2;
        let block_align = self.channels * 2;

        let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(data_len + 36).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes()); // fmt subchunk size
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&Self::BIT_DEPTH.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}
