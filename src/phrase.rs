//! Melodic phrases and the built-in sound effects

use std::time::Duration;

use crate::{Note, ToDuration};

/// G4
pub const G4: f64 = 392.00;
/// Eb4
pub const EB4: f64 = 311.13;
/// C5
pub const C5: f64 = 523.25;
/// E5
pub const E5: f64 = 659.25;
/// G5
pub const G5: f64 = 783.99;
/// C6
pub const C6: f64 = 1046.50;

const VOLUME: f64 = 0.7;

/// An ordered sequence of notes played one after another
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phrase {
    /// The name of the phrase
    pub name: String,
    /// The notes, in playing order
    pub notes: Vec<Note>,
    /// The default rest after each note, in seconds
    pub gap: f64,
    /// The rest after the whole phrase, in seconds
    #[cfg_attr(feature = "serde", serde(default))]
    pub rest: f64,
}

impl Phrase {
    /// Create a new phrase with no gaps
    pub fn new(name: impl Into<String>, notes: impl IntoIterator<Item = Note>) -> Self {
        Phrase {
            name: name.into(),
            notes: notes.into_iter().collect(),
            gap: 0.0,
            rest: 0.0,
        }
    }
    /// Set the default rest after each note
    pub fn gap(self, secs: f64) -> Self {
        Phrase { gap: secs, ..self }
    }
    /// Set the rest after the whole phrase
    pub fn rest(self, secs: f64) -> Self {
        Phrase { rest: secs, ..self }
    }
    /// Get the default rest after each note
    pub fn gap_duration(&self) -> Duration {
        self.gap.to_duration()
    }
    /// Get the rest after the whole phrase
    pub fn rest_duration(&self) -> Duration {
        self.rest.to_duration()
    }
    /// Get the total time spent sounding notes, not counting rests
    pub fn sounding_duration(&self) -> Duration {
        self.notes.iter().map(|note| note.duration.to_duration()).sum()
    }
}

/// The opening motif of Beethoven's Fifth Symphony
///
/// Three short G4s followed by a long Eb4.
pub fn beethoven_fifth() -> Phrase {
    let short = 0.12;
    let gap = 0.03;
    Phrase::new(
        "beethoven",
        [
            Note::new(G4, short, VOLUME),
            Note::new(G4, short, VOLUME),
            Note::new(G4, short, VOLUME).gap_after(gap * 2.0),
            Note::new(EB4, 1.0, VOLUME).gap_after(0.0),
        ],
    )
    .gap(gap)
    .rest(2.0)
}

/// A short, bright, ascending victory fanfare ending on a held G5
pub fn triumph() -> Phrase {
    Phrase::new(
        "triumph",
        [
            Note::new(C5, 0.08, VOLUME),
            Note::new(E5, 0.08, VOLUME),
            Note::new(G5, 0.08, VOLUME),
            Note::new(C6, 0.08, VOLUME),
            Note::new(G5, 0.50, VOLUME),
        ],
    )
    .gap(0.02)
    .rest(1.0)
}

/// A short, sharp laser blip
pub fn fire() -> Phrase {
    Phrase::new("fire", [Note::new(2200.0, 0.04, VOLUME)])
}

/// A low buzz
pub fn miss() -> Phrase {
    Phrase::new("miss", [Note::new(42.0, 0.8, VOLUME)])
}

/// Get all of the built-in phrases
pub fn all() -> Vec<Phrase> {
    vec![beethoven_fifth(), triumph(), fire(), miss()]
}

/// Look up a built-in phrase by name
pub fn by_name(name: &str) -> Option<Phrase> {
    all().into_iter().find(|phrase| phrase.name == name)
}
