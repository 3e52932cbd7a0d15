use std::sync::Arc;

/// Number of amplitude points in every envelope, fixed for the process
/// lifetime. Partial envelopes are never produced.
pub const ENVELOPE_LEN: usize = 320;

/// Fixed-length peak-amplitude summary of an audio stream, every value in
/// [0, 1]. Immutable once produced; a new source replaces it wholesale.
///
/// Peak detection rather than RMS: this is a visual cue, not a loudness
/// measure, and peaks keep transients visible.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope(Arc<[f32]>);

impl Envelope {
    /// Downsamples interleaved sample frames into an envelope.
    ///
    /// `block = max(1, frames / ENVELOPE_LEN)`; point `i` is the maximum
    /// absolute sample across all channels within frames
    /// `[i*block, min(frames, i*block + block))`. The last window may be
    /// truncated; windows past the end of the stream yield 0.
    pub fn from_interleaved(samples: &[f32], channels: usize) -> Self {
        let mut points = vec![0.0f32; ENVELOPE_LEN];

        if channels > 0 {
            let frames = samples.len() / channels;
            let block = (frames / ENVELOPE_LEN).max(1);

            for (i, point) in points.iter_mut().enumerate() {
                let start = i * block;
                let end = (start + block).min(frames);
                if start >= end {
                    break;
                }

                let window = &samples[start * channels..end * channels];
                let peak = window.iter().fold(0.0f32, |max, s| max.max(s.abs()));
                *point = peak.min(1.0);
            }
        }

        Envelope(points.into())
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_fixed_length_and_in_range() {
        for frames in [0usize, 1, 7, 319, 320, 321, 100_000] {
            let samples: Vec<f32> = (0..frames).map(|i| ((i % 13) as f32 / 6.0) - 1.0).collect();
            let env = Envelope::from_interleaved(&samples, 1);

            assert_eq!(env.len(), ENVELOPE_LEN, "frames={frames}");
            assert!(env.values().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn silence_maps_to_all_zeros() {
        let samples = vec![0.0f32; 44_100];
        let env = Envelope::from_interleaved(&samples, 2);
        assert!(env.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn full_scale_maps_to_all_ones() {
        let samples = vec![1.0f32; ENVELOPE_LEN * 4];
        let env = Envelope::from_interleaved(&samples, 1);
        assert!(env.values().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn peak_is_max_across_channels() {
        // Stereo, right channel louder; the envelope must report the max.
        let mut samples = vec![0.0f32; ENVELOPE_LEN * 2];
        for frame in samples.chunks_mut(2) {
            frame[0] = 0.25;
            frame[1] = -0.75;
        }
        let env = Envelope::from_interleaved(&samples, 2);
        assert!(env.values().iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    #[test]
    fn single_spike_lands_in_first_block_only() {
        let mut samples = vec![0.0f32; ENVELOPE_LEN * 10];
        samples[0] = 0.9;

        let env = Envelope::from_interleaved(&samples, 1);
        assert!(env.values()[0] > 0.0);
        assert!(env.values()[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn short_input_truncates_instead_of_padding() {
        // Fewer frames than points: block is 1 and trailing windows are
        // empty, so trailing values stay 0 while the head reflects input.
        let samples = vec![0.5f32; 10];
        let env = Envelope::from_interleaved(&samples, 1);

        assert!(env.values()[..10].iter().all(|&v| (v - 0.5).abs() < 1e-6));
        assert!(env.values()[10..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let samples = vec![3.2f32; 640];
        let env = Envelope::from_interleaved(&samples, 1);
        assert!(env.values().iter().all(|&v| v == 1.0));
    }
}
