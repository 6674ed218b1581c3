// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use crate::automation::ParamTimeline;
use crate::options::ResolvedOptions;

/// A point of the gain curve, in absolute seconds on the clock of the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainBreakpoint {
    /// The gain jumps to `level`.
    Set { level: f64, at: f64 },
    /// The gain moves linearly from the previous breakpoint and reaches `level`.
    Ramp { level: f64, at: f64 },
}

/// An attack-sustain-decay envelope laid out on an absolute timeline.
///
/// The tone starts `delay` seconds after scheduling. With a non-zero attack the gain rises from
/// zero to `volume` over `attack` seconds, otherwise it starts at `volume` right away.
/// The tone is released `duration` seconds after its start. With a non-zero decay the gain then
/// falls back to zero over `decay` seconds, otherwise the tone stops at the release.
///
/// # Example
///
/// ```
/// use toneplay::envelope::*;
/// use toneplay::options::*;
/// let options = NoteOptions {
///     volume: Some(0.5),
///     duration: Some(1.0),
///     delay: Some(1.0),
///     attack: Some(0.5),
///     decay: Some(0.25),
///     ..Default::default()
/// };
/// let options = options.resolve(&PlayerDefaults::default()).unwrap();
/// let plan = EnvelopePlan::new(&options, 2.0);
///
/// assert_eq!(plan.start_time, 3.0);
/// assert_eq!(plan.attack_end_time, 3.5);
/// assert_eq!(plan.end_time, 4.0);
/// assert_eq!(plan.stop_time, 4.25);
///
/// assert_eq!(plan.level_at(3.0), 0.0);
/// assert_eq!(plan.level_at(3.25), 0.25);
/// assert_eq!(plan.level_at(3.75), 0.5);
/// assert_eq!(plan.level_at(4.125), 0.25);
/// assert_eq!(plan.level_at(4.25), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopePlan {
    /// Instant at which the oscillator starts.
    pub start_time: f64,
    /// Instant at which the gain reaches `sustain_level`. Equals `start_time` without attack.
    pub attack_end_time: f64,
    pub sustain_level: f64,
    /// Instant of the release, where the decay begins.
    pub release_start_time: f64,
    /// Equals `release_start_time`.
    pub end_time: f64,
    /// Instant at which the oscillator stops, after the decay if there is one.
    pub stop_time: f64,
}

impl EnvelopePlan {
    /// Lay out the envelope of a note scheduled at `now`.
    pub fn new(options: &ResolvedOptions, now: f64) -> Self {
        let start_time = now + options.delay;
        let end_time = start_time + options.duration;
        Self {
            start_time,
            attack_end_time: start_time + options.attack,
            sustain_level: options.volume,
            release_start_time: end_time,
            end_time,
            stop_time: end_time + options.decay,
        }
    }

    pub fn has_attack(&self) -> bool {
        self.attack_end_time > self.start_time
    }

    pub fn has_decay(&self) -> bool {
        self.stop_time > self.end_time
    }

    /// The gain curve as at most four breakpoints, in chronological order of scheduling.
    pub fn breakpoints(&self) -> Vec<GainBreakpoint> {
        let mut points = Vec::with_capacity(4);
        if self.has_attack() {
            points.push(GainBreakpoint::Set {
                level: 0.0,
                at: self.start_time,
            });
            points.push(GainBreakpoint::Ramp {
                level: self.sustain_level,
                at: self.attack_end_time,
            });
        } else {
            points.push(GainBreakpoint::Set {
                level: self.sustain_level,
                at: self.start_time,
            });
        }
        if self.has_decay() {
            points.push(GainBreakpoint::Set {
                level: self.sustain_level,
                at: self.end_time,
            });
            points.push(GainBreakpoint::Ramp {
                level: 0.0,
                at: self.stop_time,
            });
        }
        points
    }

    /// The gain curve as an automation timeline starting from silence.
    pub fn timeline(&self) -> ParamTimeline {
        let mut timeline = ParamTimeline::new(0.0);
        for point in self.breakpoints() {
            match point {
                GainBreakpoint::Set { level, at } => timeline.set_value_at(level, at),
                GainBreakpoint::Ramp { level, at } => timeline.linear_ramp_to(level, at),
            }
        }
        timeline
    }

    /// Audible gain at an instant, which is zero outside of `start_time..stop_time`.
    pub fn level_at(&self, time: f64) -> f64 {
        if time < self.start_time || time >= self.stop_time {
            0.0
        } else {
            self.timeline().value_at(time)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Waveform;

    fn options(delay: f64, attack: f64, decay: f64) -> ResolvedOptions {
        ResolvedOptions {
            waveform: Waveform::Sine,
            volume: 0.8,
            duration: 1.0,
            delay,
            attack,
            decay,
            distortion: None,
        }
    }

    #[test]
    fn start_follows_delay() {
        for delay in &[0.0, 0.25, 3.0] {
            let plan = EnvelopePlan::new(&options(*delay, 0.0, 0.0), 10.0);
            assert_eq!(plan.start_time, 10.0 + delay);
            assert_eq!(plan.end_time, plan.start_time + 1.0);
            assert_eq!(plan.release_start_time, plan.end_time);
        }
    }

    #[test]
    fn no_attack_is_a_step() {
        let plan = EnvelopePlan::new(&options(0.5, 0.0, 0.0), 0.0);
        assert!(!plan.has_attack());
        assert_eq!(
            plan.breakpoints(),
            vec![GainBreakpoint::Set {
                level: 0.8,
                at: 0.5
            }]
        );
        assert_eq!(plan.level_at(0.5), 0.8);
        assert_eq!(plan.level_at(0.49), 0.0);
    }

    #[test]
    fn attack_ramps_from_silence() {
        let plan = EnvelopePlan::new(&options(0.0, 0.5, 0.0), 1.0);
        assert_eq!(
            plan.breakpoints(),
            vec![
                GainBreakpoint::Set { level: 0.0, at: 1.0 },
                GainBreakpoint::Ramp { level: 0.8, at: 1.5 },
            ]
        );
        assert_eq!(plan.level_at(1.0), 0.0);
        assert_eq!(plan.level_at(1.25), 0.4);
        assert_eq!(plan.level_at(1.5), 0.8);
    }

    #[test]
    fn stop_depends_on_decay() {
        let plan = EnvelopePlan::new(&options(0.0, 0.0, 0.0), 0.0);
        assert_eq!(plan.stop_time, plan.end_time);
        assert_eq!(plan.breakpoints().len(), 1);

        let plan = EnvelopePlan::new(&options(0.0, 0.0, 0.5), 0.0);
        assert_eq!(plan.stop_time, plan.end_time + 0.5);
        assert_eq!(
            plan.breakpoints()[1..],
            [
                GainBreakpoint::Set { level: 0.8, at: 1.0 },
                GainBreakpoint::Ramp { level: 0.0, at: 1.5 },
            ]
        );
        assert_eq!(plan.level_at(1.25), 0.4);
    }

    #[test]
    fn full_envelope_has_four_breakpoints() {
        let plan = EnvelopePlan::new(&options(0.0, 0.25, 0.25), 0.0);
        assert_eq!(plan.breakpoints().len(), 4);
        assert_eq!(plan.level_at(0.75), 0.8);
        assert_eq!(plan.level_at(1.25), 0.0);
    }
}
