use std::time::Duration;

use crate::{Tone, ToDuration};

/// A single tone in a phrase, with an optional rest after it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    /// The frequency in Hz
    pub frequency: f64,
    /// The length of the tone in seconds
    pub duration: f64,
    /// The volume in the range [0.0, 1.0]
    pub volume: f64,
    /// How long to wait after this note, in seconds
    ///
    /// If not set, the phrase's gap is used.
    #[cfg_attr(feature = "serde", serde(default))]
    pub gap_after: Option<f64>,
}

impl Note {
    /// Make a new note that uses its phrase's gap
    pub const fn new(frequency: f64, duration: f64, volume: f64) -> Self {
        Note {
            frequency,
            duration,
            volume,
            gap_after: None,
        }
    }
    /// Set the rest after this note
    pub const fn gap_after(self, secs: f64) -> Self {
        Note {
            gap_after: Some(secs),
            ..self
        }
    }
    /// Get the tone this note sounds
    pub fn tone(&self) -> Tone {
        Tone::new(self.frequency, self.duration, self.volume)
    }
    /// Get the rest after this note, falling back to the given default
    pub fn gap_or(&self, default: Duration) -> Duration {
        self.gap_after.map_or(default, ToDuration::to_duration)
    }
}
