// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A sink is the audio equipment that turns scheduled tones into sound.
//! Tones are built from oscillators, gain controls and waveshapers that are wired in series
//! and end at the destination of the sink.
//! All instants are absolute seconds on the clock of the sink.

use std::fmt;
use std::rc::Rc;

use snafu::Snafu;

use crate::distortion::Oversample;
use crate::options::Waveform;

mod offline;
mod recording;

pub use offline::OfflineSink;
pub use recording::{RecordingSink, SinkCall};

/// Handle of a node inside a sink.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Every sink has its destination at index zero.
    pub const DESTINATION: NodeId = NodeId(0);

    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of nodes a caller may create.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum NodeKind {
    Gain,
    Oscillator,
    WaveShaper,
}

/// Possible errors when talking to a sink.
#[derive(Debug, PartialEq, Snafu)]
pub enum SinkError {
    #[snafu(display("The sink has been closed"))]
    Closed,
    #[snafu(display("Referenced node {} does not exist", node))]
    UnknownNode { node: NodeId },
    #[snafu(display("Node {} is not a {:?} node", node, expected))]
    WrongKind { node: NodeId, expected: NodeKind },
    #[snafu(display("Cannot connect {} to {}", from, to))]
    InvalidConnection { from: NodeId, to: NodeId },
    #[snafu(display("The sink cannot hold more than {} nodes", limit))]
    Exhausted { limit: usize },
    #[snafu(display("There is a cycle in the graph"))]
    Cycle,
}

/// The capabilities a tone player needs from the audio equipment.
pub trait OutputSink {
    /// Current instant of the monotonic clock of the sink.
    fn current_time(&self) -> f64;

    /// The node all signal chains end at.
    fn destination(&self) -> NodeId {
        NodeId::DESTINATION
    }

    fn create_gain(&mut self) -> Result<NodeId, SinkError>;

    fn create_oscillator(&mut self) -> Result<NodeId, SinkError>;

    fn create_waveshaper(&mut self) -> Result<NodeId, SinkError>;

    /// Let the gain jump to `level` at `at`.
    fn set_gain_at(&mut self, gain: NodeId, level: f64, at: f64) -> Result<(), SinkError>;

    /// Let the gain move linearly from the previous event, reaching `level` at `at`.
    fn ramp_gain_to(&mut self, gain: NodeId, level: f64, at: f64) -> Result<(), SinkError>;

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) -> Result<(), SinkError>;

    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f64, at: f64)
        -> Result<(), SinkError>;

    fn start(&mut self, oscillator: NodeId, at: f64) -> Result<(), SinkError>;

    fn stop(&mut self, oscillator: NodeId, at: f64) -> Result<(), SinkError>;

    fn set_curve(
        &mut self,
        shaper: NodeId,
        curve: Rc<[f32]>,
        oversample: Oversample,
    ) -> Result<(), SinkError>;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError>;

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError>;

    /// Once `oscillator` has stopped, remove the `detach` connections and release
    /// the nodes they connected, except for the destination.
    fn on_ended(
        &mut self,
        oscillator: NodeId,
        detach: Vec<(NodeId, NodeId)>,
    ) -> Result<(), SinkError>;

    /// Drop a node together with all of its connections.
    fn release(&mut self, node: NodeId) -> Result<(), SinkError>;
}
