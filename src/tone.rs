// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The signal plan of a single note and its wiring into a sink.

use std::rc::Rc;

use log::{trace, warn};

use crate::distortion::Oversample;
use crate::envelope::{EnvelopePlan, GainBreakpoint};
use crate::options::Waveform;
use crate::sink::{NodeId, OutputSink, SinkError};

/// Transfer function and oversampling of the optional distortion stage.
#[derive(Debug, Clone)]
pub struct Shaper {
    pub curve: Rc<[f32]>,
    pub oversample: Oversample,
}

/// Everything needed to play one note: oscillator → gain (→ waveshaper) → destination.
#[derive(Debug, Clone)]
pub struct ToneInstance {
    pub frequency: f64,
    pub waveform: Waveform,
    pub envelope: EnvelopePlan,
    pub shaper: Option<Shaper>,
}

impl ToneInstance {
    /// Create and wire all nodes of the tone.
    ///
    /// Either the whole tone is scheduled or, if the sink fails on the way,
    /// every node created so far is released again before the error is returned.
    pub fn schedule<S: OutputSink + ?Sized>(&self, sink: &mut S) -> Result<(), SinkError> {
        let mut created = Vec::with_capacity(3);
        let result = self.wire(sink, &mut created);
        if result.is_err() {
            for node in created.into_iter().rev() {
                if let Err(err) = sink.release(node) {
                    warn!("Failed to release {} of an unfinished tone: {}", node, err);
                }
            }
        }
        result
    }

    fn wire<S: OutputSink + ?Sized>(
        &self,
        sink: &mut S,
        created: &mut Vec<NodeId>,
    ) -> Result<(), SinkError> {
        let envelope = &self.envelope;

        let oscillator = sink.create_oscillator()?;
        created.push(oscillator);
        let gain = sink.create_gain()?;
        created.push(gain);

        sink.set_waveform(oscillator, self.waveform)?;
        sink.set_frequency_at(oscillator, self.frequency, envelope.start_time)?;

        for point in envelope.breakpoints() {
            trace!("{} {:?}", gain, point);
            match point {
                GainBreakpoint::Set { level, at } => sink.set_gain_at(gain, level, at)?,
                GainBreakpoint::Ramp { level, at } => sink.ramp_gain_to(gain, level, at)?,
            }
        }

        let mut chain = vec![(oscillator, gain)];
        let last = match &self.shaper {
            Some(shaper) => {
                let node = sink.create_waveshaper()?;
                created.push(node);
                sink.set_curve(node, Rc::clone(&shaper.curve), shaper.oversample)?;
                chain.push((gain, node));
                node
            }
            None => gain,
        };
        chain.push((last, sink.destination()));

        for (from, to) in chain.iter() {
            sink.connect(*from, *to)?;
        }
        sink.start(oscillator, envelope.start_time)?;
        sink.stop(oscillator, envelope.stop_time)?;
        sink.on_ended(oscillator, chain)
    }
}
