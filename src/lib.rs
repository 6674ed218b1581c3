// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turning note names into shaped, scheduled tones.
//!
//! A [`player::TonePlayer`] resolves note names to frequencies, plans the volume envelope of
//! every note and wires an oscillator, a gain and an optional waveshaper into an
//! [`sink::OutputSink`].

pub mod distortion;
pub mod envelope;
pub mod note;
pub mod options;
pub mod output;
pub mod player;
pub mod sink;
pub mod tone;
pub mod tuning;
pub mod wave;

// Building blocks of the offline sink
pub mod automation;
pub mod oscillator;
