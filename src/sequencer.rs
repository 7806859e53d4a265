//! Blocking, one-note-at-a-time phrase playback

use std::{thread, time::Duration};

use tracing::{debug, info};

use crate::{AudioSink, Phrase, PlaybackError, SynthesisError, ToDuration, ToneSynth};

/// An error encountered while playing a phrase
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequenceError {
    /// A note could not be rendered
    #[error("note {index} of {phrase:?}: {source}")]
    Synthesis {
        /// The name of the phrase
        phrase: String,
        /// The position of the note in the phrase
        index: usize,
        /// The underlying error
        source: SynthesisError,
    },
    /// A rendered note could not be played
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// What a [`Sequencer`] is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// Not playing a phrase
    #[default]
    Idle,
    /// Rendering a note
    Synthesizing,
    /// Waiting for a note to finish playing
    Playing,
    /// Resting between notes
    Waiting,
}

/**
Plays [`Phrase`]s on an [`AudioSink`], one note at a time

Each note is rendered, handed to the sink, and played to completion
before the note's gap is waited out and the next note begins.
Notes never overlap.
*/
pub struct Sequencer<S> {
    sink: S,
    synth: ToneSynth,
    stage: Stage,
    on_stage: Option<Box<dyn FnMut(Stage)>>,
}

impl<S> Sequencer<S>
where
    S: AudioSink,
{
    /// Create a sequencer that renders notes at the sink's sample rate
    pub fn new(sink: S) -> Self {
        let synth = ToneSynth::new(sink.sample_rate());
        Sequencer::with_synth(sink, synth)
    }
    /// Create a sequencer that renders notes with the given synthesizer
    pub fn with_synth(sink: S, synth: ToneSynth) -> Self {
        Sequencer {
            sink,
            synth,
            stage: Stage::Idle,
            on_stage: None,
        }
    }
    /// Call a function every time the sequencer changes stage
    pub fn on_stage_change(self, f: impl FnMut(Stage) + 'static) -> Self {
        Sequencer {
            on_stage: Some(Box::new(f)),
            ..self
        }
    }
    /// Get the current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }
    /// Get a reference to the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }
    /// Consume the sequencer, returning the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
    /// Play a phrase, blocking until its last note has finished
    ///
    /// Returns the number of notes played. The phrase's trailing rest is not waited out.
    pub fn play_phrase(&mut self, phrase: &Phrase) -> Result<usize, SequenceError> {
        self.play_notes(phrase, None)
    }
    /// Play a phrase, resting for `gap` after every note instead of the phrase's gaps
    pub fn play_phrase_with_gap(
        &mut self,
        phrase: &Phrase,
        gap: impl ToDuration,
    ) -> Result<usize, SequenceError> {
        self.play_notes(phrase, Some(gap.to_duration()))
    }
    /// Play phrases in order, resting after each one
    ///
    /// Returns the total number of notes played.
    pub fn play_all<'a, I>(&mut self, phrases: I) -> Result<usize, SequenceError>
    where
        I: IntoIterator<Item = &'a Phrase>,
    {
        let mut played = 0;
        for phrase in phrases {
            info!("Playing {}", phrase.name);
            played += self.play_phrase(phrase)?;
            self.wait(phrase.rest_duration());
            self.set_stage(Stage::Idle);
        }
        Ok(played)
    }
    fn play_notes(
        &mut self,
        phrase: &Phrase,
        gap_override: Option<Duration>,
    ) -> Result<usize, SequenceError> {
        let result = self.try_play_notes(phrase, gap_override);
        self.set_stage(Stage::Idle);
        result
    }
    fn try_play_notes(
        &mut self,
        phrase: &Phrase,
        gap_override: Option<Duration>,
    ) -> Result<usize, SequenceError> {
        let default_gap = phrase.gap_duration();
        for (index, note) in phrase.notes.iter().enumerate() {
            self.set_stage(Stage::Synthesizing);
            let buffer =
                self.synth
                    .render(&note.tone())
                    .map_err(|source| SequenceError::Synthesis {
                        phrase: phrase.name.clone(),
                        index,
                        source,
                    })?;
            debug!(
                phrase = %phrase.name,
                index,
                frequency = note.frequency,
                frames = buffer.len(),
                "playing note"
            );
            self.set_stage(Stage::Playing);
            self.sink.play(buffer)?;
            self.sink.block();
            self.sink.finish()?;
            self.wait(gap_override.unwrap_or_else(|| note.gap_or(default_gap)));
        }
        Ok(phrase.notes.len())
    }
    fn wait(&mut self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.set_stage(Stage::Waiting);
        thread::sleep(duration);
    }
    fn set_stage(&mut self, stage: Stage) {
        if stage == self.stage {
            return;
        }
        debug!(from = ?self.stage, to = ?stage, "sequencer stage");
        self.stage = stage;
        if let Some(f) = &mut self.on_stage {
            f(stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::{phrase, Note, PcmBuffer};

    /// Plays instantly, reporting busy for a few polls after each buffer
    #[derive(Default)]
    struct RecordingSink {
        played: Vec<PcmBuffer>,
        polls_left: Cell<u32>,
        overlapped: bool,
    }

    impl AudioSink for RecordingSink {
        fn sample_rate(&self) -> u32 {
            44100
        }
        fn play(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
            if self.polls_left.get() > 0 {
                self.overlapped = true;
            }
            self.played.push(buffer);
            self.polls_left.set(2);
            Ok(())
        }
        fn is_playing(&self) -> bool {
            let left = self.polls_left.get();
            self.polls_left.set(left.saturating_sub(1));
            left > 0
        }
    }

    #[test]
    fn fanfare_plays_every_note_in_order() {
        let mut sequencer = Sequencer::new(RecordingSink::default());
        let played = sequencer.play_phrase(&phrase::triumph()).unwrap();
        assert_eq!(played, 5);
        assert_eq!(sequencer.stage(), Stage::Idle);
        let sink = sequencer.into_sink();
        assert!(!sink.overlapped);
        let lens: Vec<usize> = sink.played.iter().map(PcmBuffer::len).collect();
        assert_eq!(lens, vec![3528, 3528, 3528, 3528, 22050]);
    }

    #[test]
    fn gap_override() {
        let mut sequencer = Sequencer::new(RecordingSink::default());
        let phrase = phrase::beethoven_fifth();
        assert_eq!(sequencer.play_phrase_with_gap(&phrase, Duration::ZERO).unwrap(), 4);
        assert_eq!(sequencer.sink().played.len(), 4);
        assert_eq!(sequencer.sink().played[3].len(), 44100);
    }

    #[test]
    fn invalid_note_stops_the_phrase() {
        let phrase = Phrase::new(
            "broken",
            [
                Note::new(440.0, 0.01, 0.5),
                Note::new(440.0, 0.01, 2.0),
                Note::new(440.0, 0.01, 0.5),
            ],
        );
        let mut sequencer = Sequencer::new(RecordingSink::default());
        let err = sequencer.play_phrase(&phrase).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Synthesis {
                phrase: "broken".into(),
                index: 1,
                source: SynthesisError::InvalidVolume(2.0),
            }
        );
        assert_eq!(sequencer.stage(), Stage::Idle);
        assert_eq!(sequencer.sink().played.len(), 1);
    }

    #[test]
    fn playback_errors_are_not_retried() {
        struct FailingSink {
            attempts: usize,
        }
        impl AudioSink for FailingSink {
            fn sample_rate(&self) -> u32 {
                8000
            }
            fn play(&mut self, _buffer: PcmBuffer) -> Result<(), PlaybackError> {
                self.attempts += 1;
                Err(PlaybackError::Stream("device unplugged".into()))
            }
            fn is_playing(&self) -> bool {
                false
            }
        }
        let mut sequencer = Sequencer::new(FailingSink { attempts: 0 });
        let err = sequencer.play_phrase(&phrase::triumph()).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Playback(PlaybackError::Stream("device unplugged".into()))
        );
        assert_eq!(sequencer.into_sink().attempts, 1);
    }

    #[test]
    fn stream_failure_on_last_note_is_reported() {
        /// Reports a stream failure once the given number of buffers have played
        struct DroppingSink {
            played: usize,
            fail_after: usize,
        }
        impl AudioSink for DroppingSink {
            fn sample_rate(&self) -> u32 {
                8000
            }
            fn play(&mut self, _buffer: PcmBuffer) -> Result<(), PlaybackError> {
                self.played += 1;
                Ok(())
            }
            fn is_playing(&self) -> bool {
                false
            }
            fn finish(&mut self) -> Result<(), PlaybackError> {
                if self.played == self.fail_after {
                    return Err(PlaybackError::Stream("underrun".into()));
                }
                Ok(())
            }
        }
        let fanfare = phrase::triumph().rest(0.0);
        let mut sequencer = Sequencer::new(DroppingSink {
            played: 0,
            fail_after: 5,
        });
        let err = sequencer.play_all([&fanfare]).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Playback(PlaybackError::Stream("underrun".into()))
        );
        assert_eq!(sequencer.stage(), Stage::Idle);
        assert_eq!(sequencer.into_sink().played, 5);
    }

    #[test]
    fn stage_transitions() {
        let stages = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&stages);
        let phrase = Phrase::new(
            "two",
            [
                Note::new(440.0, 0.01, 0.5).gap_after(0.01),
                Note::new(440.0, 0.01, 0.5),
            ],
        );
        let mut sequencer = Sequencer::new(RecordingSink::default())
            .on_stage_change(move |stage| seen.borrow_mut().push(stage));
        sequencer.play_phrase(&phrase).unwrap();
        use Stage::*;
        assert_eq!(
            *stages.borrow(),
            vec![Synthesizing, Playing, Waiting, Synthesizing, Playing, Idle]
        );
    }

    #[test]
    fn renders_at_sink_rate() {
        let mut sink = RecordingSink::default();
        let mut sequencer = Sequencer::new(&mut sink);
        let short = Phrase::new("beep", [Note::new(1000.0, 0.05, 0.5)]);
        assert_eq!(sequencer.play_all([&short, &short]).unwrap(), 2);
        assert_eq!(sequencer.stage(), Stage::Idle);
        assert!(sink.played.iter().all(|b| b.sample_rate() == 44100));
        assert_eq!(sink.played.len(), 2);
    }
}
