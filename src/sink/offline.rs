// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A sink rendering scheduled tones into sampled audio, one buffer at a time.

use std::rc::Rc;

use log::{debug, trace};

use super::*;
use crate::automation::ParamTimeline;
use crate::distortion;
use crate::oscillator::Oscillator;
use crate::wave::Stereo;

/// Gain of a gain control before its first event.
const DEFAULT_GAIN: f64 = 1.0;

/// Frequency of an oscillator before its first event.
const DEFAULT_FREQUENCY: f64 = 440.0;

enum Slot {
    Destination,
    Gain(ParamTimeline),
    Oscillator(Voice),
    WaveShaper {
        curve: Option<Rc<[f32]>>,
        oversample: Oversample,
    },
}

struct Voice {
    oscillator: Oscillator,
    frequency: ParamTimeline,
    start: Option<f64>,
    stop: Option<f64>,
}

impl Voice {
    fn sample(&mut self, time: f64, sample_rate: f64) -> f64 {
        let started = self.start.map_or(false, |start| time >= start);
        let stopped = self.stop.map_or(false, |stop| time >= stop);
        if started && !stopped {
            let frequency = self.frequency.value_at(time);
            self.oscillator.next_sample(frequency, sample_rate)
        } else {
            0.0
        }
    }
}

/// Renders the node graph sample by sample on its own clock, which only advances while rendering.
pub struct OfflineSink {
    sample_rate: f64,
    /// Number of samples rendered so far.
    position: u64,
    nodes: Vec<Option<Slot>>,
    /// Released slots, reused by the next created node.
    free: Vec<usize>,
    edges: Vec<(NodeId, NodeId)>,
    /// Connections to detach once the oscillator has stopped.
    ended: Vec<(NodeId, Vec<(NodeId, NodeId)>)>,
    closed: bool,
}

impl OfflineSink {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            position: 0,
            nodes: vec![Some(Slot::Destination)],
            free: Vec::new(),
            edges: Vec::new(),
            ended: Vec::new(),
            closed: false,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Refuse all further operations.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Number of nodes besides the destination.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().skip(1).filter(|slot| slot.is_some()).count()
    }

    /// The latest instant at which any oscillator stops, or the current time if none will.
    pub fn scheduled_until(&self) -> f64 {
        self.nodes
            .iter()
            .filter_map(|slot| match slot {
                Some(Slot::Oscillator(voice)) => voice.stop,
                _ => None,
            })
            .fold(self.current_time(), f64::max)
    }

    /// Mix the next `out.len()` samples of all tones into `out`, advancing the clock.
    pub fn render_into(&mut self, out: &mut [Stereo<f64>]) -> Result<(), SinkError> {
        self.ensure_open()?;
        let order = self.evaluation_order()?;

        let mut inputs: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (from, to) in self.edges.iter() {
            inputs[to.0].push(from.0);
        }

        let sample_rate = self.sample_rate;
        let mut values = vec![0.0; self.nodes.len()];
        for frame in out.iter_mut() {
            let time = self.position as f64 / sample_rate;
            for id in order.iter() {
                let input: f64 = inputs[id.0].iter().map(|from| values[*from]).sum();
                values[id.0] = match &mut self.nodes[id.0] {
                    Some(Slot::Destination) => input,
                    Some(Slot::Gain(gain)) => input * gain.value_at(time),
                    Some(Slot::Oscillator(voice)) => voice.sample(time, sample_rate),
                    Some(Slot::WaveShaper {
                        curve: Some(curve), ..
                    }) => distortion::shape(curve, input),
                    Some(Slot::WaveShaper { curve: None, .. }) => input,
                    None => 0.0,
                };
            }
            *frame += Stereo::mono(values[NodeId::DESTINATION.0]);
            self.position += 1;
        }

        self.finish_ended();
        Ok(())
    }

    /// Topological order of the live nodes using Kahn's algorithm.
    fn evaluation_order(&self) -> Result<Vec<NodeId>, SinkError> {
        let mut incoming = vec![0usize; self.nodes.len()];
        for (_, to) in self.edges.iter() {
            incoming[to.0] += 1;
        }

        let mut sorted_nodes = Vec::with_capacity(self.nodes.len());
        let mut nodes_without_incoming_edges: Vec<_> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(id, slot)| slot.is_some() && incoming[*id] == 0)
            .map(|(id, _)| NodeId(id))
            .collect();

        while let Some(n) = nodes_without_incoming_edges.pop() {
            sorted_nodes.push(n);
            for (_, to) in self.edges.iter().filter(|(from, _)| *from == n) {
                incoming[to.0] -= 1;
                if incoming[to.0] == 0 {
                    nodes_without_incoming_edges.push(*to);
                }
            }
        }

        if incoming.iter().any(|count| *count > 0) {
            Err(SinkError::Cycle)
        } else {
            Ok(sorted_nodes)
        }
    }

    /// Run the cleanup of all tones whose oscillator has stopped by now.
    fn finish_ended(&mut self) {
        let now = self.current_time();
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.ended)
            .into_iter()
            .partition(|(oscillator, _)| self.has_stopped(*oscillator, now));
        self.ended = pending;

        for (oscillator, detach) in done {
            debug!(
                "tone on {} ended at {:.3}s, detaching {} connections",
                oscillator,
                now,
                detach.len()
            );
            for edge in detach.iter() {
                self.edges.retain(|e| e != edge);
            }
            for (from, to) in detach {
                self.drop_node(from);
                self.drop_node(to);
            }
        }
    }

    fn has_stopped(&self, oscillator: NodeId, now: f64) -> bool {
        match self.nodes.get(oscillator.0) {
            Some(Some(Slot::Oscillator(voice))) => voice.stop.map_or(false, |stop| stop <= now),
            // released in the meantime, nothing left to wait for
            _ => true,
        }
    }

    fn drop_node(&mut self, node: NodeId) {
        if node == NodeId::DESTINATION {
            return;
        }
        if let Some(slot) = self.nodes.get_mut(node.0) {
            if slot.take().is_some() {
                self.free.push(node.0);
            }
        }
        self.edges.retain(|(from, to)| *from != node && *to != node);

        // The slot may be reused, so a pending cleanup must not outlive its oscillator.
        if let Some(pos) = self.ended.iter().position(|(osc, _)| *osc == node) {
            let (_, detach) = self.ended.remove(pos);
            for (from, to) in detach {
                self.drop_node(from);
                self.drop_node(to);
            }
        }
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        if self.closed {
            Err(SinkError::Closed)
        } else {
            Ok(())
        }
    }

    fn add(&mut self, slot: Slot) -> Result<NodeId, SinkError> {
        self.ensure_open()?;
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(slot);
                Ok(NodeId(index))
            }
            None => {
                self.nodes.push(Some(slot));
                Ok(NodeId(self.nodes.len() - 1))
            }
        }
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut Slot, SinkError> {
        self.ensure_open()?;
        self.nodes
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or(SinkError::UnknownNode { node })
    }

    fn slot(&self, node: NodeId) -> Result<&Slot, SinkError> {
        self.nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or(SinkError::UnknownNode { node })
    }

    fn gain_mut(&mut self, node: NodeId) -> Result<&mut ParamTimeline, SinkError> {
        match self.slot_mut(node)? {
            Slot::Gain(gain) => Ok(gain),
            _ => Err(SinkError::WrongKind {
                node,
                expected: NodeKind::Gain,
            }),
        }
    }

    fn voice_mut(&mut self, node: NodeId) -> Result<&mut Voice, SinkError> {
        match self.slot_mut(node)? {
            Slot::Oscillator(voice) => Ok(voice),
            _ => Err(SinkError::WrongKind {
                node,
                expected: NodeKind::Oscillator,
            }),
        }
    }
}

impl OutputSink for OfflineSink {
    fn current_time(&self) -> f64 {
        self.position as f64 / self.sample_rate
    }

    fn create_gain(&mut self) -> Result<NodeId, SinkError> {
        self.add(Slot::Gain(ParamTimeline::new(DEFAULT_GAIN)))
    }

    fn create_oscillator(&mut self) -> Result<NodeId, SinkError> {
        self.add(Slot::Oscillator(Voice {
            oscillator: Oscillator::new(Waveform::Sine),
            frequency: ParamTimeline::new(DEFAULT_FREQUENCY),
            start: None,
            stop: None,
        }))
    }

    fn create_waveshaper(&mut self) -> Result<NodeId, SinkError> {
        self.add(Slot::WaveShaper {
            curve: None,
            oversample: Oversample::None,
        })
    }

    fn set_gain_at(&mut self, gain: NodeId, level: f64, at: f64) -> Result<(), SinkError> {
        self.gain_mut(gain)?.set_value_at(level, at);
        Ok(())
    }

    fn ramp_gain_to(&mut self, gain: NodeId, level: f64, at: f64) -> Result<(), SinkError> {
        self.gain_mut(gain)?.linear_ramp_to(level, at);
        Ok(())
    }

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) -> Result<(), SinkError> {
        self.voice_mut(oscillator)?.oscillator.set_waveform(waveform);
        Ok(())
    }

    fn set_frequency_at(
        &mut self,
        oscillator: NodeId,
        hz: f64,
        at: f64,
    ) -> Result<(), SinkError> {
        self.voice_mut(oscillator)?.frequency.set_value_at(hz, at);
        Ok(())
    }

    fn start(&mut self, oscillator: NodeId, at: f64) -> Result<(), SinkError> {
        self.voice_mut(oscillator)?.start = Some(at);
        Ok(())
    }

    fn stop(&mut self, oscillator: NodeId, at: f64) -> Result<(), SinkError> {
        self.voice_mut(oscillator)?.stop = Some(at);
        Ok(())
    }

    fn set_curve(
        &mut self,
        shaper: NodeId,
        curve: Rc<[f32]>,
        oversample: Oversample,
    ) -> Result<(), SinkError> {
        match self.slot_mut(shaper)? {
            Slot::WaveShaper {
                curve: current,
                oversample: current_oversample,
            } => {
                // Rendering happens at the base rate, the hint is only kept.
                trace!("{} oversampling hint {}", shaper, oversample);
                *current = Some(curve);
                *current_oversample = oversample;
                Ok(())
            }
            _ => Err(SinkError::WrongKind {
                node: shaper,
                expected: NodeKind::WaveShaper,
            }),
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError> {
        self.ensure_open()?;
        let has_output = !matches!(self.slot(from)?, Slot::Destination);
        let has_input = !matches!(self.slot(to)?, Slot::Oscillator(_));
        if !has_output || !has_input || from == to {
            return Err(SinkError::InvalidConnection { from, to });
        }
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), SinkError> {
        self.ensure_open()?;
        let before = self.edges.len();
        self.edges.retain(|edge| *edge != (from, to));
        if self.edges.len() == before {
            Err(SinkError::InvalidConnection { from, to })
        } else {
            Ok(())
        }
    }

    fn on_ended(
        &mut self,
        oscillator: NodeId,
        detach: Vec<(NodeId, NodeId)>,
    ) -> Result<(), SinkError> {
        self.voice_mut(oscillator)?;
        self.ended.push((oscillator, detach));
        Ok(())
    }

    /// The destination cannot be released, releasing it does nothing.
    fn release(&mut self, node: NodeId) -> Result<(), SinkError> {
        self.slot_mut(node)?;
        self.drop_node(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_tone(sink: &mut OfflineSink) -> (NodeId, NodeId) {
        let osc = sink.create_oscillator().unwrap();
        let gain = sink.create_gain().unwrap();
        sink.set_waveform(osc, Waveform::Square).unwrap();
        sink.set_frequency_at(osc, 1.0, 0.0).unwrap();
        sink.set_gain_at(gain, 0.5, 0.0).unwrap();
        sink.connect(osc, gain).unwrap();
        sink.start(osc, 0.25).unwrap();
        sink.stop(osc, 0.75).unwrap();
        (osc, gain)
    }

    fn render(sink: &mut OfflineSink, frames: usize) -> Vec<f64> {
        let mut out = vec![Stereo::mono(0.0); frames];
        sink.render_into(&mut out).unwrap();
        out.iter().map(|s| s.left).collect()
    }

    #[test]
    fn renders_between_start_and_stop() {
        let mut sink = OfflineSink::new(8.0);
        let (_, gain) = square_tone(&mut sink);
        sink.connect(gain, sink.destination()).unwrap();

        assert_eq!(sink.scheduled_until(), 0.75);
        assert_eq!(
            render(&mut sink, 8),
            vec![0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.0, 0.0]
        );
        assert_eq!(sink.current_time(), 1.0);
        // nobody asked for a cleanup
        assert_eq!(sink.live_nodes(), 2);
    }

    #[test]
    fn unconnected_tones_are_silent() {
        let mut sink = OfflineSink::new(8.0);
        square_tone(&mut sink);
        assert!(render(&mut sink, 8).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn cleanup_after_stop() {
        let mut sink = OfflineSink::new(8.0);
        let (osc, gain) = square_tone(&mut sink);
        let dest = sink.destination();
        sink.connect(gain, dest).unwrap();
        sink.on_ended(osc, vec![(osc, gain), (gain, dest)]).unwrap();

        render(&mut sink, 4);
        assert_eq!(sink.live_nodes(), 2);
        render(&mut sink, 4);
        assert_eq!(sink.live_nodes(), 0);
        assert_eq!(sink.set_gain_at(gain, 1.0, 2.0), Err(SinkError::UnknownNode { node: gain }));
        // the destination survives
        assert_eq!(render(&mut sink, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn reuses_released_slots() {
        let mut sink = OfflineSink::new(8.0);
        let dest = sink.destination();
        for _ in 0..100 {
            let (osc, gain) = square_tone(&mut sink);
            sink.connect(gain, dest).unwrap();
            sink.on_ended(osc, vec![(osc, gain), (gain, dest)]).unwrap();
            render(&mut sink, 8);
            assert_eq!(sink.live_nodes(), 0);
        }
        // the destination and the two slots of a single tone
        assert_eq!(sink.nodes.len(), 3);
    }

    #[test]
    fn releasing_a_pending_oscillator_drops_its_tone() {
        let mut sink = OfflineSink::new(8.0);
        let (osc, gain) = square_tone(&mut sink);
        let dest = sink.destination();
        sink.connect(gain, dest).unwrap();
        sink.on_ended(osc, vec![(osc, gain), (gain, dest)]).unwrap();

        sink.release(osc).unwrap();
        assert_eq!(sink.live_nodes(), 0);
        assert!(sink.ended.is_empty());

        // a new tone in the same slots is not cleaned up on behalf of the old one
        let (osc, _) = square_tone(&mut sink);
        assert!(osc.index() <= 2);
        render(&mut sink, 8);
        assert_eq!(sink.live_nodes(), 2);
    }

    #[test]
    fn waveshaper_maps_through_curve() {
        let mut sink = OfflineSink::new(8.0);
        let (_, gain) = square_tone(&mut sink);
        let shaper = sink.create_waveshaper().unwrap();
        let curve: Rc<[f32]> = Rc::from(vec![-1.0f32, 0.0, 0.25]);
        sink.set_curve(shaper, curve, Oversample::X4).unwrap();
        sink.connect(gain, shaper).unwrap();
        sink.connect(shaper, sink.destination()).unwrap();

        assert_eq!(render(&mut sink, 4), vec![0.0, 0.0, 0.125, 0.125]);
    }

    #[test]
    fn rejects_invalid_wiring() {
        let mut sink = OfflineSink::new(8.0);
        let (osc, gain) = square_tone(&mut sink);
        let dest = sink.destination();

        assert_eq!(
            sink.connect(dest, gain),
            Err(SinkError::InvalidConnection { from: dest, to: gain })
        );
        assert_eq!(
            sink.connect(gain, osc),
            Err(SinkError::InvalidConnection { from: gain, to: osc })
        );
        assert_eq!(
            sink.set_gain_at(osc, 1.0, 0.0),
            Err(SinkError::WrongKind {
                node: osc,
                expected: NodeKind::Gain
            })
        );
        assert_eq!(
            sink.start(NodeId::new(42), 0.0),
            Err(SinkError::UnknownNode {
                node: NodeId::new(42)
            })
        );
        assert!(sink.disconnect(gain, dest).is_err());
    }

    #[test]
    fn detects_cycles() {
        let mut sink = OfflineSink::new(8.0);
        let a = sink.create_gain().unwrap();
        let b = sink.create_gain().unwrap();
        sink.connect(a, b).unwrap();
        sink.connect(b, a).unwrap();
        let mut out = vec![Stereo::mono(0.0); 1];
        assert_eq!(sink.render_into(&mut out), Err(SinkError::Cycle));

        sink.release(b).unwrap();
        assert_eq!(sink.render_into(&mut out), Ok(()));
    }

    #[test]
    fn closed_sink_refuses_work() {
        let mut sink = OfflineSink::new(8.0);
        sink.close();
        assert_eq!(sink.create_gain(), Err(SinkError::Closed));
        let mut out = vec![Stereo::mono(0.0); 1];
        assert_eq!(sink.render_into(&mut out), Err(SinkError::Closed));
    }
}
