use std::time::Duration;

/// Signed 16-bit PCM sample
pub type Sample = i16;
/// Stereo frame: left and right samples
pub type Stereo = [Sample; 2];

/// Convert a mono sample to a [`Stereo`] frame
pub fn stereo(sample: Sample) -> Stereo {
    [sample; 2]
}

/// A finite buffer of stereo PCM frames at a known sample rate
///
/// Buffers are produced by the tone synthesizer and consumed by an
/// [`AudioSink`](crate::AudioSink).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PcmBuffer {
    sample_rate: u32,
    frames: Vec<Stereo>,
}

impl PcmBuffer {
    /// Create a buffer from frames at the given sample rate
    pub fn new(sample_rate: u32, frames: Vec<Stereo>) -> Self {
        PcmBuffer {
            sample_rate,
            frames,
        }
    }
    /// Create a stereo buffer by duplicating each mono sample to both channels
    pub fn from_mono<I>(sample_rate: u32, samples: I) -> Self
    where
        I: IntoIterator<Item = Sample>,
    {
        PcmBuffer::new(sample_rate, samples.into_iter().map(stereo).collect())
    }
    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    /// Get the frames
    pub fn frames(&self) -> &[Stereo] {
        &self.frames
    }
    /// Get the number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    /// Check if the buffer has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    /// Get the playback duration of the buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames.len() as f64 / self.sample_rate as f64)
    }
    /// Iterate over the samples in channel-interleaved order
    pub fn interleaved(&self) -> impl Iterator<Item = Sample> + '_ {
        self.frames.iter().flatten().copied()
    }
    /// Get the largest absolute sample value
    pub fn peak(&self) -> u16 {
        self.interleaved()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
    /// Consume the buffer, returning its frames
    pub fn into_frames(self) -> Vec<Stereo> {
        self.frames
    }
}
