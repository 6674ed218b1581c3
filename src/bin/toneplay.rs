// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `toneplay` - play notes, chords and arpeggios from the command line.

use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

use log::{error, info};
use structopt::StructOpt;

use toneplay::options::{NoteOptions, PlayerDefaults, Waveform};
use toneplay::output;
use toneplay::player::{PlayError, TonePlayer};
use toneplay::sink::{OfflineSink, OutputSink, RecordingSink};

#[derive(Debug, StructOpt)]
#[structopt(name = "toneplay", about = "Playing notes as synthesized tones")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Output file (any sox-supported format). Tones are played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(long, default_value = "44100")]
    sample_rate: u32,

    /// Print what would be scheduled instead of producing audio.
    #[structopt(long)]
    dry_run: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Play a single note, e.g. `c#4`.
    Note {
        note: String,
        #[structopt(flatten)]
        options: CallOptions,
    },
    /// Play all notes at once.
    Chord {
        #[structopt(required = true)]
        notes: Vec<String>,
        #[structopt(flatten)]
        options: CallOptions,
    },
    /// Play the notes one after another.
    Arpeggio {
        #[structopt(required = true)]
        notes: Vec<String>,
        /// Seconds between consecutive notes.
        #[structopt(long)]
        distance: Option<f64>,
        #[structopt(flatten)]
        options: CallOptions,
    },
    /// Two distorted chords on a sawtooth keyboard.
    Demo,
}

/// Overrides of the player defaults for a single call.
#[derive(Debug, StructOpt)]
struct CallOptions {
    /// One of sine, square, sawtooth, triangle.
    #[structopt(long = "type")]
    waveform: Option<Waveform>,
    #[structopt(long)]
    volume: Option<f64>,
    /// Seconds from the start of a note to its release.
    #[structopt(long)]
    duration: Option<f64>,
    #[structopt(long)]
    delay: Option<f64>,
    #[structopt(long)]
    attack: Option<f64>,
    #[structopt(long)]
    decay: Option<f64>,
    /// Waveshaping intensity, no distortion if not given.
    #[structopt(long)]
    distortion: Option<f64>,
}

impl CallOptions {
    fn to_note_options(&self, distance: Option<f64>) -> NoteOptions {
        NoteOptions {
            waveform: self.waveform,
            volume: self.volume,
            duration: self.duration,
            delay: self.delay,
            attack: self.attack,
            decay: self.decay,
            distortion: self.distortion,
            distance,
        }
    }
}

fn keyboard() -> PlayerDefaults {
    PlayerDefaults {
        waveform: Waveform::Sawtooth,
        volume: 0.1,
        duration: 1.0,
        attack: 0.5,
        decay: 0.1,
        ..PlayerDefaults::default()
    }
}

fn perform<S: OutputSink>(command: &Command, sink: Rc<RefCell<S>>) -> Result<(), PlayError> {
    match command {
        Command::Note { note, options } => {
            let player = TonePlayer::new(sink, PlayerDefaults::default())?;
            player.play_note(note, &options.to_note_options(None))
        }
        Command::Chord { notes, options } => {
            let player = TonePlayer::new(sink, PlayerDefaults::default())?;
            player.play_chord(notes, &options.to_note_options(None))
        }
        Command::Arpeggio {
            notes,
            distance,
            options,
        } => {
            let player = TonePlayer::new(sink, PlayerDefaults::default())?;
            player.play_notes(notes, &options.to_note_options(*distance))
        }
        Command::Demo => {
            let player = TonePlayer::new(sink, keyboard())?;
            let distorted = NoteOptions {
                distortion: Some(25500.0),
                ..NoteOptions::default()
            };
            player.play_chord(&["a", "c", "e"], &distorted)?;
            let later = NoteOptions {
                delay: Some(1.0),
                ..NoteOptions::default()
            };
            player.play_chord(&["e", "g", "a"], &later)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)?;

    if opt.dry_run {
        let sink = Rc::new(RefCell::new(RecordingSink::new()));
        perform(&opt.command, Rc::clone(&sink))?;
        println!("{}", sink.borrow().transcript());
        return Ok(());
    }

    let sink = Rc::new(RefCell::new(OfflineSink::new(opt.sample_rate as f64)));
    perform(&opt.command, Rc::clone(&sink))?;

    let target = match opt.output.as_deref() {
        None => output::sox::SoxTarget::Play,
        Some(path) => output::sox::SoxTarget::File(path),
    };
    let mut sink = sink.borrow_mut();
    let result = output::sox::with_sox(opt.sample_rate, target, |audio_stream| {
        output::render_to(&mut sink, audio_stream)
    });
    match result {
        Ok(samples) => {
            info!("done after {} samples", samples);
            Ok(())
        }
        Err(err) => {
            error!("audio output failed: {}", err);
            Err(err.into())
        }
    }
}
