// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Playing notes, arpeggios and chords on a sink.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use snafu::{ResultExt, Snafu};

use crate::distortion::{distortion_curve, Oversample};
use crate::envelope::EnvelopePlan;
use crate::note::{NoteError, NoteName};
use crate::options::{NoteOptions, OptionsError, PlayerDefaults, ResolvedOptions};
use crate::sink::{OutputSink, SinkError};
use crate::tone::{Shaper, ToneInstance};
use crate::tuning::Tuning;

#[derive(Debug, PartialEq, Snafu)]
pub enum PlayError {
    #[snafu(display("Invalid note: {}", source))]
    InvalidNote { source: NoteError },
    #[snafu(display("Invalid playback options: {}", source))]
    InvalidOptions { source: OptionsError },
    #[snafu(display("Output sink failed: {}", source))]
    Sink { source: SinkError },
}

/// Schedules notes on a shared sink.
///
/// Scheduling never blocks: every call computes the complete plan of its notes from the
/// current time of the sink and hands it over. Once handed over, a note plays to its end.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use toneplay::options::*;
/// use toneplay::player::TonePlayer;
/// use toneplay::sink::RecordingSink;
///
/// let sink = Rc::new(RefCell::new(RecordingSink::new()));
/// let player = TonePlayer::new(Rc::clone(&sink), PlayerDefaults::default()).unwrap();
///
/// let options = NoteOptions { delay: Some(1.0), distance: Some(0.5), ..Default::default() };
/// player.play_notes(&["a4", "c#4", "e4"], &options).unwrap();
/// assert_eq!(sink.borrow().start_times(), vec![1.0, 1.5, 2.0]);
///
/// assert!(player.play_note("h4", &NoteOptions::default()).is_err());
/// ```
pub struct TonePlayer<S> {
    defaults: PlayerDefaults,
    tuning: Tuning,
    sink: Rc<RefCell<S>>,
    /// Distortion curves by the bits of their intensity.
    curves: RefCell<HashMap<u64, Rc<[f32]>>>,
}

impl<S: OutputSink> TonePlayer<S> {
    /// Create a player with fixed defaults. Fails if the defaults are out of range.
    pub fn new(sink: Rc<RefCell<S>>, defaults: PlayerDefaults) -> Result<Self, PlayError> {
        defaults.validate().context(InvalidOptions)?;
        Ok(Self {
            defaults,
            tuning: Tuning::default(),
            sink,
            curves: RefCell::new(HashMap::new()),
        })
    }

    /// Play a single note.
    pub fn play_note(&self, note: &str, options: &NoteOptions) -> Result<(), PlayError> {
        let name = NoteName::parse(note).context(InvalidNote)?;
        let resolved = options.resolve(&self.defaults).context(InvalidOptions)?;
        self.schedule(name, &resolved)
    }

    /// Play the notes one after another, each `distance` seconds after the previous one.
    ///
    /// The first note starts after the delay of the options. All other options are shared.
    /// Nothing is scheduled if any of the notes or options are invalid.
    pub fn play_notes<I>(&self, notes: I, options: &NoteOptions) -> Result<(), PlayError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let names = parse_all(notes)?;
        let distance = options
            .distance_or(&self.defaults)
            .context(InvalidOptions)?;
        let base_delay = options.delay.unwrap_or(self.defaults.delay);

        let plans = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let note_options = NoteOptions {
                    delay: Some(base_delay + i as f64 * distance),
                    ..options.clone()
                };
                let resolved = note_options.resolve(&self.defaults)?;
                Ok((name, resolved))
            })
            .collect::<Result<Vec<_>, OptionsError>>()
            .context(InvalidOptions)?;

        for (name, resolved) in plans.iter() {
            self.schedule(*name, resolved)?;
        }
        Ok(())
    }

    /// Play all notes at the same time.
    /// Nothing is scheduled if any of the notes or the options are invalid.
    pub fn play_chord<I>(&self, notes: I, options: &NoteOptions) -> Result<(), PlayError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let names = parse_all(notes)?;
        let resolved = options.resolve(&self.defaults).context(InvalidOptions)?;
        for name in names {
            self.schedule(name, &resolved)?;
        }
        Ok(())
    }

    fn schedule(&self, name: NoteName, options: &ResolvedOptions) -> Result<(), PlayError> {
        let mut sink = self.sink.borrow_mut();
        let envelope = EnvelopePlan::new(options, sink.current_time());
        let tone = ToneInstance {
            frequency: self.tuning.frequency(name),
            waveform: options.waveform,
            envelope,
            shaper: options.distortion.map(|intensity| Shaper {
                curve: self.curve(intensity),
                oversample: Oversample::X4,
            }),
        };
        debug!(
            "{} ({:.2} Hz, {}) from {:.3}s to {:.3}s",
            name, tone.frequency, tone.waveform, tone.envelope.start_time, tone.envelope.stop_time
        );
        tone.schedule(&mut *sink).context(Sink)
    }

    fn curve(&self, intensity: f64) -> Rc<[f32]> {
        let mut curves = self.curves.borrow_mut();
        let curve = curves
            .entry(intensity.to_bits())
            .or_insert_with(|| Rc::from(distortion_curve(Some(intensity))));
        Rc::clone(curve)
    }
}

fn parse_all<I>(notes: I) -> Result<Vec<NoteName>, PlayError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    notes
        .into_iter()
        .map(|note| NoteName::parse(note.as_ref()))
        .collect::<Result<Vec<_>, _>>()
        .context(InvalidNote)
}
