use std::{collections::VecDeque, sync::Arc};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, BuildStreamError, PlayStreamError, SampleFormat, SampleRate, SizedSample,
    StreamConfig, SupportedBufferSize, SupportedStreamConfigRange, SupportedStreamConfigsError,
};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::{AudioSink, PcmBuffer, PlaybackError, Sample, SinkConfig};

/// Get the default output device
pub fn default_output_device() -> Option<cpal::Device> {
    cpal::default_host().default_output_device()
}

/// An error encountered when trying to open an output device
#[derive(Debug, thiserror::Error)]
pub enum DeviceInitError {
    /// An error building the audio stream
    #[error("{0}")]
    Stream(#[from] BuildStreamError),
    /// An error starting the audio stream
    #[error("{0}")]
    Play(#[from] PlayStreamError),
    /// An error querying stream configurations
    #[error("{0}")]
    SupportedConfigs(#[from] SupportedStreamConfigsError),
    /// No default output device is available
    #[error("No output device available")]
    NoDevice,
    /// The device has no stream configuration with the requested channels and sample rate
    #[error("output device does not support {channels} channels at {sample_rate} Hz")]
    UnsupportedConfig {
        /// The requested sample rate
        sample_rate: u32,
        /// The requested channel count
        channels: u16,
    },
    /// The device's sample format cannot be written
    #[error("unsupported sample format {0:?}")]
    UnsupportedSampleFormat(SampleFormat),
}

trait Amplitude: SizedSample + Send + 'static {
    const MIDPOINT: Self;
    fn from_i16(s: Sample) -> Self;
}

impl Amplitude for f32 {
    const MIDPOINT: Self = 0.0;
    fn from_i16(s: Sample) -> Self {
        s as f32 / 32768.0
    }
}

impl Amplitude for u16 {
    const MIDPOINT: Self = 1 << 15;
    fn from_i16(s: Sample) -> Self {
        (s as i32 + (1 << 15)) as u16
    }
}

impl Amplitude for i16 {
    const MIDPOINT: Self = 0;
    fn from_i16(s: Sample) -> Self {
        s
    }
}

/// State shared with the output callback
#[derive(Default)]
struct Playback {
    samples: VecDeque<Sample>,
    playing: bool,
    error: Option<String>,
}

impl Playback {
    fn take_error(&mut self) -> Result<(), PlaybackError> {
        match self.error.take() {
            Some(err) => Err(PlaybackError::Stream(err)),
            None => Ok(()),
        }
    }
}

/**
An [`AudioSink`] that plays buffers on a system output device

The device is held open for as long as the sink exists and
is released when the sink is dropped.
*/
pub struct DeviceSink {
    config: SinkConfig,
    playback: Arc<Mutex<Playback>>,
    _stream: cpal::Stream,
}

impl DeviceSink {
    /// Open the default output device with the default [`SinkConfig`]
    pub fn with_default_device() -> Result<Self, DeviceInitError> {
        DeviceSink::new(SinkConfig::default())
    }
    /// Open the default output device with the given config
    pub fn new(config: SinkConfig) -> Result<Self, DeviceInitError> {
        let device = default_output_device().ok_or(DeviceInitError::NoDevice)?;
        DeviceSink::with_device(device, config)
    }
    /// Open the given output device with the given config
    pub fn with_device(
        device: cpal::Device,
        config: SinkConfig,
    ) -> Result<Self, DeviceInitError> {
        if let Ok(name) = device.name() {
            debug!("opening output device {name}");
        }
        let range = device
            .supported_output_configs()?
            .filter(|range| supports(range, &config))
            .max_by_key(|range| range.sample_format() == SampleFormat::I16)
            .ok_or(DeviceInitError::UnsupportedConfig {
                sample_rate: config.sample_rate,
                channels: config.channels,
            })?;
        let sample_format = range.sample_format();
        let buffer_size = buffer_size(range.buffer_size(), config.buffer_frames);
        let mut stream_config: StreamConfig =
            range.with_sample_rate(SampleRate(config.sample_rate)).into();
        stream_config.buffer_size = buffer_size;
        debug!(?sample_format, ?stream_config, "building output stream");
        let playback = Arc::new(Mutex::new(Playback::default()));
        macro_rules! output_stream {
            ($sample:ty) => {
                build_stream::<$sample>(&device, &stream_config, &playback)
            };
        }
        let stream = match sample_format {
            SampleFormat::I16 => output_stream!(i16),
            SampleFormat::F32 => output_stream!(f32),
            SampleFormat::U16 => output_stream!(u16),
            format => return Err(DeviceInitError::UnsupportedSampleFormat(format)),
        }?;
        stream.play()?;
        debug!("output stream started");
        Ok(DeviceSink {
            config,
            playback,
            _stream: stream,
        })
    }
    /// Get the config the device was opened with
    pub fn config(&self) -> SinkConfig {
        self.config
    }
}

fn supports(range: &SupportedStreamConfigRange, config: &SinkConfig) -> bool {
    range.channels() == config.channels
        && range.min_sample_rate().0 <= config.sample_rate
        && config.sample_rate <= range.max_sample_rate().0
}

fn buffer_size(supported: &SupportedBufferSize, frames: u32) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
            BufferSize::Fixed(frames)
        }
        SupportedBufferSize::Range { min, max } => {
            warn!("device buffer size must be between {min} and {max} frames, using default");
            BufferSize::Default
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

fn build_stream<A>(
    device: &cpal::Device,
    config: &StreamConfig,
    playback: &Arc<Mutex<Playback>>,
) -> Result<cpal::Stream, BuildStreamError>
where
    A: Amplitude,
{
    let write_playback = Arc::clone(playback);
    let error_playback = Arc::clone(playback);
    device.build_output_stream(
        config,
        move |buffer: &mut [A], _: &cpal::OutputCallbackInfo| {
            let mut playback = write_playback.lock();
            // The last samples were handed to the device on the previous callback
            if playback.samples.is_empty() {
                playback.playing = false;
            }
            for out in buffer.iter_mut() {
                *out = playback
                    .samples
                    .pop_front()
                    .map_or(A::MIDPOINT, A::from_i16);
            }
        },
        move |err| {
            error!("an error occurred on the output audio stream: {err}");
            let mut playback = error_playback.lock();
            playback.error = Some(err.to_string());
            playback.playing = false;
        },
        None,
    )
}

impl AudioSink for DeviceSink {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
    fn play(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
        if buffer.sample_rate() != self.config.sample_rate {
            return Err(PlaybackError::SampleRateMismatch {
                buffer: buffer.sample_rate(),
                sink: self.config.sample_rate,
            });
        }
        let mut playback = self.playback.lock();
        playback.take_error()?;
        playback.samples.extend(buffer.interleaved());
        playback.playing = !playback.samples.is_empty();
        Ok(())
    }
    fn is_playing(&self) -> bool {
        self.playback.lock().playing
    }
    fn finish(&mut self) -> Result<(), PlaybackError> {
        self.playback.lock().take_error()
    }
}
