//! Tone generation

use std::f64::consts::TAU;

use crate::{lerp, stereo, PcmBuffer, Sample};

/// The default length of the fade-out applied to the end of every tone, in seconds
pub const DEFAULT_FADE_SECS: f64 = 0.02;

/// The longest tone that will be rendered, in seconds
pub const MAX_TONE_SECS: f64 = 3600.0;

const I16_MAX: f64 = i16::MAX as f64;
const I16_MIN: f64 = i16::MIN as f64;

/// An error encountered when a tone's parameters cannot be rendered
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    /// The frequency is not a positive, finite number
    #[error("frequency must be a positive number of Hz, got {0}")]
    InvalidFrequency(f64),
    /// The duration is not a positive, finite number
    #[error("duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
    /// The volume is outside of [0.0, 1.0]
    #[error("volume must be between 0 and 1, got {0}")]
    InvalidVolume(f64),
    /// The sample rate is zero
    #[error("sample rate must be positive")]
    InvalidSampleRate,
    /// The duration is shorter than a single sample
    #[error("a {duration}s tone at {sample_rate} Hz has no samples")]
    EmptyBuffer {
        /// The requested duration in seconds
        duration: f64,
        /// The sample rate
        sample_rate: u32,
    },
    /// The tone has more frames than can be held in memory
    #[error("a {duration}s tone at {sample_rate} Hz is too long to render")]
    TooLong {
        /// The requested duration in seconds
        duration: f64,
        /// The sample rate
        sample_rate: u32,
    },
}

/// A sine tone of fixed frequency, length, and volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// The frequency in Hz
    pub frequency: f64,
    /// The length in seconds
    pub duration: f64,
    /// The volume in the range [0.0, 1.0]
    pub volume: f64,
}

impl Tone {
    /// Create a new tone
    pub const fn new(frequency: f64, duration: f64, volume: f64) -> Self {
        Tone {
            frequency,
            duration,
            volume,
        }
    }
    /// Check that the tone can be rendered
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(SynthesisError::InvalidFrequency(self.frequency));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(SynthesisError::InvalidDuration(self.duration));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(SynthesisError::InvalidVolume(self.volume));
        }
        Ok(())
    }
}

/**
Renders [`Tone`]s to stereo PCM at a fixed sample rate

Each tone is a sine wave starting at phase zero. The last
[`fade`](ToneSynth::fade) seconds are faded out linearly to silence
so that playback does not end with a click.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSynth {
    sample_rate: u32,
    fade_secs: f64,
}

impl ToneSynth {
    /// Create a synthesizer with the given sample rate and the default fade
    pub const fn new(sample_rate: u32) -> Self {
        ToneSynth {
            sample_rate,
            fade_secs: DEFAULT_FADE_SECS,
        }
    }
    /// Set the length of the fade-out in seconds
    pub fn fade(self, secs: f64) -> Self {
        ToneSynth {
            fade_secs: secs.max(0.0),
            ..self
        }
    }
    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    /// Get the number of frames in a tone of the given duration
    pub fn frame_count(&self, duration: f64) -> usize {
        (self.sample_rate as f64 * duration).floor() as usize
    }
    /// Get the number of faded frames at the end of a buffer of `frames` frames
    pub fn fade_len(&self, frames: usize) -> usize {
        ((self.sample_rate as f64 * self.fade_secs).floor() as usize).min(frames)
    }
    /// Render a tone
    pub fn render(&self, tone: &Tone) -> Result<PcmBuffer, SynthesisError> {
        if self.sample_rate == 0 {
            return Err(SynthesisError::InvalidSampleRate);
        }
        tone.validate()?;
        let sample_rate = self.sample_rate as f64;
        let too_long = SynthesisError::TooLong {
            duration: tone.duration,
            sample_rate: self.sample_rate,
        };
        let frames = (sample_rate * tone.duration).floor();
        if frames > sample_rate * MAX_TONE_SECS {
            return Err(too_long);
        }
        let len = frames as usize;
        if len == 0 {
            return Err(SynthesisError::EmptyBuffer {
                duration: tone.duration,
                sample_rate: self.sample_rate,
            });
        }
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| too_long)?;
        let fade_len = self.fade_len(len);
        buffer.extend((0..len).map(|i| {
            let time = i as f64 / sample_rate;
            let wave = (TAU * tone.frequency * time).sin();
            stereo(quantize(wave * fade_envelope(i, len, fade_len) * tone.volume))
        }));
        Ok(PcmBuffer::new(self.sample_rate, buffer))
    }
}

/// Render a sine tone to a stereo PCM buffer
///
/// The buffer holds `floor(sample_rate * duration_secs)` frames and ends
/// with a [`DEFAULT_FADE_SECS`] linear fade-out.
pub fn synthesize(
    frequency_hz: f64,
    duration_secs: f64,
    volume: f64,
    sample_rate: u32,
) -> Result<PcmBuffer, SynthesisError> {
    ToneSynth::new(sample_rate).render(&Tone::new(frequency_hz, duration_secs, volume))
}

/// Get the fade-out gain of frame `index` in a buffer of `len` frames
///
/// Gain is 1.0 until the last `fade_len` frames, which ramp linearly from
/// 1.0 down to 0.0, both ends included.
pub fn fade_envelope(index: usize, len: usize, fade_len: usize) -> f64 {
    let fade_start = len.saturating_sub(fade_len);
    if index < fade_start || fade_len < 2 {
        return 1.0;
    }
    let t = (index - fade_start) as f64 / (fade_len - 1) as f64;
    lerp(1.0, 0.0, t.min(1.0))
}

/// Convert an amplitude in [-1.0, 1.0] to a 16-bit sample
fn quantize(amplitude: f64) -> Sample {
    (amplitude * I16_MAX).round().clamp(I16_MIN, I16_MAX) as Sample
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a() {
        let buffer = synthesize(440.0, 1.0, 1.0, 44100).unwrap();
        assert_eq!(buffer.len(), 44100);
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.frames()[0], [0, 0]);
        assert_eq!(buffer.frames()[44099], [0, 0]);
        assert!(buffer.frames().iter().all(|[l, r]| l == r));
        assert!(buffer.peak() > 32700);
    }

    #[test]
    fn motif_note_is_scaled_by_volume() {
        let buffer = synthesize(392.00, 0.12, 0.7, 44100).unwrap();
        assert_eq!(buffer.len(), 5292);
        let limit = (32767.0f64 * 0.7).round() as u16;
        assert!(buffer.peak() <= limit);
        assert!(buffer.peak() > limit - 100);
    }

    #[test]
    fn fanfare_durations() {
        let synth = ToneSynth::new(44100);
        assert_eq!(synth.frame_count(0.08), 3528);
        assert_eq!(synth.frame_count(0.50), 22050);
        assert_eq!(synth.fade_len(3528), 882);
    }

    #[test]
    fn fade_envelope_ramp() {
        let len = 10;
        let fade_len = 5;
        let gains: Vec<f64> = (0..len).map(|i| fade_envelope(i, len, fade_len)).collect();
        assert_eq!(
            gains,
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.75, 0.5, 0.25, 0.0]
        );
    }

    #[test]
    fn fade_envelope_degenerate_windows() {
        assert!((0..4).all(|i| fade_envelope(i, 4, 0) == 1.0));
        assert!((0..4).all(|i| fade_envelope(i, 4, 1) == 1.0));
    }

    #[test]
    fn fade_is_clamped_to_short_tones() {
        // 10ms is half the fade window
        let synth = ToneSynth::new(44100);
        assert_eq!(synth.fade_len(441), 441);
        let buffer = synth.render(&Tone::new(1000.0, 0.01, 1.0)).unwrap();
        assert_eq!(buffer.len(), 441);
        assert_eq!(buffer.frames()[440], [0, 0]);
    }

    #[test]
    fn custom_fade() {
        let synth = ToneSynth::new(1000).fade(0.1);
        assert_eq!(synth.fade_len(1000), 100);
        assert_eq!(ToneSynth::new(1000).fade(-1.0).fade_len(1000), 0);
        let buffer = ToneSynth::new(1000)
            .fade(0.0)
            .render(&Tone::new(250.0, 1.0, 1.0))
            .unwrap();
        // 250 Hz at 1 kHz hits the positive peak every fourth frame
        assert_eq!(buffer.frames()[995], [-32767, -32767]);
        assert_eq!(buffer.frames()[993], [32767, 32767]);
    }

    #[test]
    fn rejects_invalid_tones() {
        assert_eq!(
            synthesize(0.0, 1.0, 0.5, 44100),
            Err(SynthesisError::InvalidFrequency(0.0))
        );
        assert_eq!(
            synthesize(440.0, 0.0, 0.5, 44100),
            Err(SynthesisError::InvalidDuration(0.0))
        );
        assert_eq!(
            synthesize(440.0, -1.0, 0.5, 44100),
            Err(SynthesisError::InvalidDuration(-1.0))
        );
        assert_eq!(
            synthesize(440.0, 1.0, 1.5, 44100),
            Err(SynthesisError::InvalidVolume(1.5))
        );
        assert!(matches!(
            synthesize(440.0, 1.0, f64::NAN, 44100),
            Err(SynthesisError::InvalidVolume(_))
        ));
        assert!(matches!(
            synthesize(f64::INFINITY, 1.0, 0.5, 44100),
            Err(SynthesisError::InvalidFrequency(_))
        ));
        assert_eq!(
            synthesize(440.0, 1.0, 0.5, 0),
            Err(SynthesisError::InvalidSampleRate)
        );
        assert_eq!(
            synthesize(440.0, 1e-6, 0.5, 44100),
            Err(SynthesisError::EmptyBuffer {
                duration: 1e-6,
                sample_rate: 44100
            })
        );
    }

    #[test]
    fn rejects_tones_too_long_to_render() {
        for duration in [1e300, MAX_TONE_SECS + 1.0] {
            assert_eq!(
                synthesize(440.0, duration, 0.5, 44100),
                Err(SynthesisError::TooLong {
                    duration,
                    sample_rate: 44100
                })
            );
        }
        assert_eq!(
            ToneSynth::new(1).render(&Tone::new(0.25, MAX_TONE_SECS, 0.5)).map(|b| b.len()),
            Ok(3600)
        );
    }

    #[test]
    fn silent_volume() {
        let buffer = synthesize(440.0, 0.1, 0.0, 44100).unwrap();
        assert_eq!(buffer.peak(), 0);
    }
}
