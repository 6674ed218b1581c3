// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A sink that makes no sound but writes down everything it is asked to do.

use super::*;

/// One operation performed on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    CreateGain(NodeId),
    CreateOscillator(NodeId),
    CreateWaveShaper(NodeId),
    SetGain { node: NodeId, level: f64, at: f64 },
    RampGain { node: NodeId, level: f64, at: f64 },
    SetWaveform { node: NodeId, waveform: Waveform },
    SetFrequency { node: NodeId, hz: f64, at: f64 },
    Start { node: NodeId, at: f64 },
    Stop { node: NodeId, at: f64 },
    SetCurve {
        node: NodeId,
        samples: usize,
        oversample: Oversample,
    },
    Connect { from: NodeId, to: NodeId },
    Disconnect { from: NodeId, to: NodeId },
    OnEnded { node: NodeId, detach: usize },
    Release(NodeId),
}

impl fmt::Display for SinkCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkCall::CreateGain(node) => write!(f, "create gain {}", node),
            SinkCall::CreateOscillator(node) => write!(f, "create oscillator {}", node),
            SinkCall::CreateWaveShaper(node) => write!(f, "create waveshaper {}", node),
            SinkCall::SetGain { node, level, at } => {
                write!(f, "{} gain = {:.3} @ {:.3}", node, level, at)
            }
            SinkCall::RampGain { node, level, at } => {
                write!(f, "{} gain ramp -> {:.3} @ {:.3}", node, level, at)
            }
            SinkCall::SetWaveform { node, waveform } => write!(f, "{} type = {}", node, waveform),
            SinkCall::SetFrequency { node, hz, at } => {
                write!(f, "{} frequency = {:.2} Hz @ {:.3}", node, hz, at)
            }
            SinkCall::Start { node, at } => write!(f, "{} start @ {:.3}", node, at),
            SinkCall::Stop { node, at } => write!(f, "{} stop @ {:.3}", node, at),
            SinkCall::SetCurve {
                node,
                samples,
                oversample,
            } => write!(
                f,
                "{} curve = {} samples, oversample {}",
                node, samples, oversample
            ),
            SinkCall::Connect { from, to } => write!(f, "connect {} -> {}", from, to),
            SinkCall::Disconnect { from, to } => write!(f, "disconnect {} -> {}", from, to),
            SinkCall::OnEnded { node, detach } => {
                write!(f, "{} on ended: detach {} connections", node, detach)
            }
            SinkCall::Release(node) => write!(f, "release {}", node),
        }
    }
}

/// Records the calls made to it. The clock only moves when told to.
#[derive(Debug, Default)]
pub struct RecordingSink {
    time: f64,
    /// Index of the most recently created node.
    last_index: usize,
    live: usize,
    limit: Option<usize>,
    closed: bool,
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails to create more than `limit` nodes at a time.
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Refuse all further operations.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Number of nodes created but not released.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    /// Instants at which oscillators were started, in the order of the calls.
    pub fn start_times(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Start { at, .. } => Some(*at),
                _ => None,
            })
            .collect()
    }

    /// All calls, one per line.
    pub fn transcript(&self) -> String {
        self.calls
            .iter()
            .map(|call| call.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn record(&mut self, call: SinkCall) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.calls.push(call);
        Ok(())
    }

    fn create(&mut self, call: fn(NodeId) -> SinkCall) -> Result<NodeId, SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if let Some(limit) = self.limit {
            if self.live >= limit {
                return Err(SinkError::Exhausted { limit });
            }
        }
        self.last_index += 1;
        self.live += 1;
        let node = NodeId(self.last_index);
        self.calls.push(call(node));
        Ok(node)
    }
}

impl OutputSink for RecordingSink {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn create_gain(&mut self) -> Result<NodeId, SinkError> {
        self.create(SinkCall::CreateGain)
    }

    fn create_oscillator(&mut self) -> Result<NodeId, SinkError> {
        self.create(SinkCall::CreateOscillator)
    }

    fn create_waveshaper(&mut self) -> Result<NodeId, SinkError> {
        self.create(SinkCall::CreateWaveShaper)
    }

    fn set_gain_at(&mut self, node: NodeId, level: f64, at: f64) -> Result<(), SinkError> {
        self.record(SinkCall::SetGain { node, level, at })
    }

    fn ramp_gain_to(&mut self, node: NodeId, level: f64, at: f64) -> Result<(), SinkError> {
        self.record(SinkCall::RampGain { node, level, at })
    }

    fn set_waveform(&mut self, node: NodeId, waveform: Waveform) -> Result<(), SinkError> {
        self.record(SinkCall::SetWaveform { node, waveform })
    }

    fn set_frequency_at(&mut self, node: NodeId, hz: f64, at: f64) -> Result<(), SinkError> {
        self.record(SinkCall::SetFrequency { node, hz, at })
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<(), SinkError> {
        self.record(SinkCall::Start { node, at })
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), SinkError> {
        self.record(SinkCall::Stop { node, at })
    }

    fn set_curve(
        &mut self,
        node: NodeId,
        curve: Rc<[f32]>,
        oversample: Oversample,
    ) -> Result<(), SinkError> {
        self.record(SinkCall::SetCurve {
            node,
            samples: curve.len(),
            oversample,
        })
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError> {
        self.record(SinkCall::Connect { from, to })
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError> {
        self.record(SinkCall::Disconnect { from, to })
    }

    fn on_ended(&mut self, node: NodeId, detach: Vec<(NodeId, NodeId)>) -> Result<(), SinkError> {
        self.record(SinkCall::OnEnded {
            node,
            detach: detach.len(),
        })
    }

    fn release(&mut self, node: NodeId) -> Result<(), SinkError> {
        self.record(SinkCall::Release(node))?;
        self.live = self.live.saturating_sub(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_limit() {
        let mut sink = RecordingSink::with_node_limit(1);
        let gain = sink.create_gain().unwrap();
        assert_eq!(gain, NodeId::new(1));
        assert_eq!(
            sink.create_oscillator(),
            Err(SinkError::Exhausted { limit: 1 })
        );
        sink.release(gain).unwrap();
        assert_eq!(sink.create_oscillator(), Ok(NodeId::new(2)));
        assert_eq!(sink.live_nodes(), 1);
    }

    #[test]
    fn transcript_lines() {
        let mut sink = RecordingSink::new();
        sink.set_time(2.5);
        let osc = sink.create_oscillator().unwrap();
        sink.start(osc, sink.current_time()).unwrap();
        sink.connect(osc, sink.destination()).unwrap();
        assert_eq!(
            sink.transcript(),
            "create oscillator #1\n#1 start @ 2.500\nconnect #1 -> #0"
        );
        assert_eq!(sink.start_times(), vec![2.5]);

        sink.close();
        assert_eq!(sink.stop(osc, 3.0), Err(SinkError::Closed));
    }
}
