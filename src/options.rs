// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Playback options: player-wide defaults, per-call overrides and their resolution.

use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

/// Shape of the oscillator wave.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl FromStr for Waveform {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" => Ok(Waveform::Triangle),
            _ => Err(OptionsError::UnknownWaveform { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Snafu)]
pub enum OptionsError {
    #[snafu(display("Option `{}` must be {}, got {}", field, expected, value))]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[snafu(display("Unknown waveform {:?}", name))]
    UnknownWaveform { name: String },
}

/// Defaults of a player, fixed when the player is created.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDefaults {
    pub waveform: Waveform,
    /// Gain of the sustained tone, between 0.0 and 1.0.
    pub volume: f64,
    /// Seconds between the start of a note and its release.
    pub duration: f64,
    /// Seconds between scheduling a note and its start.
    pub delay: f64,
    /// Seconds to rise from silence to `volume`.
    pub attack: f64,
    /// Seconds to fall from `volume` to silence after the release.
    pub decay: f64,
    /// Waveshaping intensity. `None` leaves the distortion stage out of the signal chain.
    pub distortion: Option<f64>,
    /// Seconds between consecutive notes of an arpeggio.
    pub distance: f64,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            volume: 0.5,
            duration: 0.5,
            delay: 0.0,
            attack: 0.0,
            decay: 0.0,
            distortion: None,
            distance: 0.5,
        }
    }
}

impl PlayerDefaults {
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_volume(self.volume)?;
        check_duration(self.duration)?;
        check_non_negative("delay", self.delay)?;
        check_non_negative("attack", self.attack)?;
        check_non_negative("decay", self.decay)?;
        check_non_negative("distance", self.distance)?;
        if let Some(distortion) = self.distortion {
            check_non_negative("distortion", distortion)?;
        }
        Ok(())
    }
}

/// Options for a single call. Every field left as `None` falls back to the player default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteOptions {
    pub waveform: Option<Waveform>,
    pub volume: Option<f64>,
    pub duration: Option<f64>,
    pub delay: Option<f64>,
    pub attack: Option<f64>,
    pub decay: Option<f64>,
    pub distortion: Option<f64>,
    /// Only used when playing arpeggios.
    pub distance: Option<f64>,
}

/// The effective options of one note after falling back to the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub waveform: Waveform,
    pub volume: f64,
    pub duration: f64,
    pub delay: f64,
    pub attack: f64,
    pub decay: f64,
    pub distortion: Option<f64>,
}

impl NoteOptions {
    /// Fill in the missing fields from `defaults` and validate the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use toneplay::options::*;
    ///
    /// let options = NoteOptions { volume: Some(0.0), ..Default::default() };
    /// let resolved = options.resolve(&PlayerDefaults::default()).unwrap();
    /// assert_eq!(resolved.volume, 0.0);
    /// assert_eq!(resolved.duration, 0.5);
    /// ```
    pub fn resolve(&self, defaults: &PlayerDefaults) -> Result<ResolvedOptions, OptionsError> {
        let resolved = ResolvedOptions {
            waveform: self.waveform.unwrap_or(defaults.waveform),
            volume: check_volume(self.volume.unwrap_or(defaults.volume))?,
            duration: check_duration(self.duration.unwrap_or(defaults.duration))?,
            delay: check_non_negative("delay", self.delay.unwrap_or(defaults.delay))?,
            attack: check_non_negative("attack", self.attack.unwrap_or(defaults.attack))?,
            decay: check_non_negative("decay", self.decay.unwrap_or(defaults.decay))?,
            distortion: match self.distortion.or(defaults.distortion) {
                Some(k) => Some(check_non_negative("distortion", k)?),
                None => None,
            },
        };
        check_finite_sum(
            "delay + duration + decay",
            resolved.delay + resolved.duration + resolved.decay,
        )?;
        check_finite_sum("delay + attack", resolved.delay + resolved.attack)?;
        Ok(resolved)
    }

    /// Spacing between arpeggio notes, falling back to the player default.
    pub fn distance_or(&self, defaults: &PlayerDefaults) -> Result<f64, OptionsError> {
        check_non_negative("distance", self.distance.unwrap_or(defaults.distance))
    }
}

fn check_volume(value: f64) -> Result<f64, OptionsError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(OptionsError::OutOfRange {
            field: "volume",
            expected: "between 0 and 1",
            value,
        })
    }
}

fn check_duration(value: f64) -> Result<f64, OptionsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(OptionsError::OutOfRange {
            field: "duration",
            expected: "positive",
            value,
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<f64, OptionsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(OptionsError::OutOfRange {
            field,
            expected: "non-negative",
            value,
        })
    }
}

/// Each part may be finite while their sum overflows.
fn check_finite_sum(field: &'static str, value: f64) -> Result<(), OptionsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OptionsError::OutOfRange {
            field,
            expected: "finite",
            value,
        })
    }
}
