use crate::{domain::Envelope, error::ExtractError};
use rodio::{Decoder, Source};
use std::io::Cursor;

/// Analysis convention for decoded streams. The exact rate does not affect
/// envelope correctness; it only has to match wherever durations are derived
/// from frame counts.
pub const ANALYSIS_SAMPLE_RATE: u32 = 44_100;

/// Decoded multi-channel sample data, interleaved by frame.
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            ch => self.samples.len() / ch,
        }
    }
}

/// The opaque decode collaborator. One call, may take a while, may fail.
pub trait DecodeBackend: Send {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, ExtractError>;
}

/// Default backend on top of the rodio/symphonia decoders.
pub struct RodioBackend;

impl DecodeBackend for RodioBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, ExtractError> {
        let decoder = Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| ExtractError::Decode(e.to_string()))?;

        let channels = decoder.channels() as usize;
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.collect();

        if channels == 0 || samples.is_empty() {
            return Err(ExtractError::Decode("stream decoded to no audio".into()));
        }

        Ok(DecodedAudio {
            samples,
            channels,
            sample_rate,
        })
    }
}

/// Decodes raw bytes and folds them down to the fixed-length envelope.
pub fn extract(bytes: &[u8], backend: &dyn DecodeBackend) -> Result<Envelope, ExtractError> {
    let decoded = backend.decode(bytes)?;
    Ok(Envelope::from_interleaved(&decoded.samples, decoded.channels))
}
