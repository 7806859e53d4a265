#[cfg(feature = "output")]
mod output;

use std::{thread, time::Duration};

use crate::PcmBuffer;
#[cfg(feature = "output")]
pub use output::*;

#[cfg(feature = "output")]
pub use cpal;

/// How often [`AudioSink::block`] checks whether playback has finished
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An error encountered when handing a buffer to an [`AudioSink`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The buffer was rendered at a different sample rate than the sink plays at
    #[error("buffer sample rate {buffer} Hz does not match output sample rate {sink} Hz")]
    SampleRateMismatch {
        /// The buffer's sample rate
        buffer: u32,
        /// The sink's sample rate
        sink: u32,
    },
    /// The output stream reported an error
    #[error("output stream failed: {0}")]
    Stream(String),
}

/**
Something that can play [`PcmBuffer`]s

Playback started by [`AudioSink::play`] runs in the background.
Use [`AudioSink::is_playing`] or [`AudioSink::block`] to find out when it is done.
*/
pub trait AudioSink {
    /// Get the sample rate buffers must be rendered at
    fn sample_rate(&self) -> u32;
    /// Begin playing a buffer
    fn play(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError>;
    /// Check whether a buffer is still playing
    fn is_playing(&self) -> bool;
    /// Block the thread until the current buffer has finished playing
    fn block(&self) {
        while self.is_playing() {
            thread::sleep(POLL_INTERVAL);
        }
    }
    /// Report any error that occurred while the last buffer was playing
    ///
    /// Called once playback has finished.
    fn finish(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }
}

impl<S> AudioSink for &mut S
where
    S: AudioSink + ?Sized,
{
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
    fn play(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
        (**self).play(buffer)
    }
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
    fn block(&self) {
        (**self).block()
    }
    fn finish(&mut self) -> Result<(), PlaybackError> {
        (**self).finish()
    }
}

/// Stream parameters for opening an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkConfig {
    /// Frames per second
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Frames per device buffer
    pub buffer_frames: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            sample_rate: 44100,
            channels: 2,
            buffer_frames: 512,
        }
    }
}

impl SinkConfig {
    /// Set the sample rate
    pub fn sample_rate(self, sample_rate: u32) -> Self {
        SinkConfig {
            sample_rate,
            ..self
        }
    }
    /// Set the number of frames per device buffer
    pub fn buffer_frames(self, buffer_frames: u32) -> Self {
        SinkConfig {
            buffer_frames,
            ..self
        }
    }
}
