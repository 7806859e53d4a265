#![warn(missing_docs)]

/*!
This crate synthesizes short sine tones and plays them back one at a time,
forming simple melodic phrases.

A [`Note`] is rendered to a [`PcmBuffer`] by the tone synthesizer in [`gen`],
and a [`Sequencer`] hands each buffer to an [`AudioSink`], waiting for it to
finish before moving on to the next note.
*/

mod frame;
pub mod gen;
mod io;
mod note;
pub mod phrase;
pub mod sequencer;

pub use io::*;
#[doc(inline)]
pub use phrase::Phrase;
#[doc(inline)]
pub use sequencer::{SequenceError, Sequencer, Stage};
use std::time::Duration;
pub use {frame::*, gen::*, note::*};

/// Linearly interpolate two numbers
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

/// A trait for converting to a [`Duration`]
pub trait ToDuration {
    /// Convert to a duration
    fn to_duration(self) -> Duration;
}

/// Interprets a number as seconds
///
/// Negative or non-finite values are treated as zero.
impl ToDuration for f32 {
    fn to_duration(self) -> Duration {
        (self as f64).to_duration()
    }
}

/// Interprets a number as seconds
///
/// Negative or non-finite values are treated as zero.
impl ToDuration for f64 {
    fn to_duration(self) -> Duration {
        Duration::try_from_secs_f64(self).unwrap_or_default()
    }
}

/// Interprets a number as seconds
impl ToDuration for u64 {
    fn to_duration(self) -> Duration {
        Duration::from_secs(self)
    }
}

impl ToDuration for Duration {
    fn to_duration(self) -> Duration {
        self
    }
}
