// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Automation of numeric parameters (gain, frequency) over the clock of a sink.

/// A change of a parameter scheduled at an absolute instant in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    Set { value: f64, time: f64 },
    /// Move linearly from the previous event to `value`, arriving at `time`.
    LinearRamp { value: f64, time: f64 },
}

impl ParamEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::Set { time, .. } => time,
            ParamEvent::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            ParamEvent::Set { value, .. } => value,
            ParamEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// Chronological list of parameter events.
///
/// # Example
///
/// ```
/// use toneplay::automation::*;
/// let mut gain = ParamTimeline::new(1.0);
/// gain.set_value_at(0.0, 1.0);
/// gain.linear_ramp_to(0.5, 2.0);
///
/// assert_eq!(gain.value_at(0.5), 1.0);
/// assert_eq!(gain.value_at(1.0), 0.0);
/// assert_eq!(gain.value_at(1.5), 0.25);
/// assert_eq!(gain.value_at(3.0), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    default: f64,
    events: Vec<ParamEvent>,
}

impl ParamTimeline {
    /// A timeline holding `default` until the first event.
    pub fn new(default: f64) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    pub fn set_value_at(&mut self, value: f64, time: f64) {
        self.insert(ParamEvent::Set { value, time });
    }

    pub fn linear_ramp_to(&mut self, value: f64, time: f64) {
        self.insert(ParamEvent::LinearRamp { value, time });
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Events at the same instant keep the order in which they were scheduled.
    fn insert(&mut self, event: ParamEvent) {
        let index = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or_else(|| self.events.len());
        self.events.insert(index, event);
    }

    /// Evaluate the parameter at an instant.
    ///
    /// A ramp without any preceding event holds the current value until its end.
    pub fn value_at(&self, time: f64) -> f64 {
        let mut value = self.default;
        let mut anchor = None;
        for event in self.events.iter() {
            if event.time() <= time {
                value = event.value();
                anchor = Some((event.time(), value));
                continue;
            }
            if let (ParamEvent::LinearRamp { value: target, time: end }, Some((start, from))) =
                (*event, anchor)
            {
                let progress = (time - start) / (end - start);
                value = from + (target - from) * progress;
            }
            break;
        }
        value
    }

    /// Instant of the last scheduled event, if any.
    pub fn last_event_time(&self) -> Option<f64> {
        self.events.last().map(ParamEvent::time)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn holds_default_without_events() {
        let p = ParamTimeline::new(440.0);
        assert_eq!(p.value_at(-1.0), 440.0);
        assert_eq!(p.value_at(100.0), 440.0);
    }

    #[test]
    fn steps() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(0.3, 1.0);
        p.set_value_at(0.6, 2.0);
        assert_eq!(p.value_at(0.999), 0.0);
        assert_eq!(p.value_at(1.0), 0.3);
        assert_eq!(p.value_at(1.5), 0.3);
        assert_eq!(p.value_at(2.5), 0.6);
    }

    #[test]
    fn attack_and_release_ramps() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(0.0, 1.0);
        p.linear_ramp_to(0.8, 1.5);
        p.set_value_at(0.8, 3.0);
        p.linear_ramp_to(0.0, 4.0);

        assert_eq!(p.value_at(1.25), 0.4);
        assert_eq!(p.value_at(2.0), 0.8);
        assert_eq!(p.value_at(3.0), 0.8);
        assert!((p.value_at(3.5) - 0.4).abs() < 1e-12);
        assert_eq!(p.value_at(4.0), 0.0);
        assert_eq!(p.value_at(10.0), 0.0);
    }

    #[test]
    fn out_of_order_scheduling() {
        let mut p = ParamTimeline::new(0.0);
        p.linear_ramp_to(1.0, 2.0);
        p.set_value_at(0.0, 1.0);
        assert_eq!(p.events()[0], ParamEvent::Set { value: 0.0, time: 1.0 });
        assert_eq!(p.value_at(1.5), 0.5);
        assert_eq!(p.last_event_time(), Some(2.0));
    }

    #[test]
    fn ramp_without_anchor_holds() {
        let mut p = ParamTimeline::new(0.25);
        p.linear_ramp_to(1.0, 2.0);
        assert_eq!(p.value_at(1.0), 0.25);
        assert_eq!(p.value_at(2.0), 1.0);
    }
}
