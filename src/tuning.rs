// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Mapping note names to frequencies.

use crate::note::*;

/// Frequency ratio between two adjacent semitones (the twelfth root of two).
pub const SEMITONE_RATIO: f64 = 1.059463094359;

/// Frequency of A4 in concert tuning.
pub const CONCERT_A: f64 = 440.0;

/// Defines the tuning of an instrument by assigning a frequency to the A of a certain octave.
/// This defines the frequencies of all other notes at a standard tuning of 12 half-tones
/// per octave.
///
/// # Examples
///
/// ```
/// use toneplay::note::*;
/// use toneplay::tuning::*;
/// let a4 = NoteName::new(PitchClass::A, Some(4));
/// assert_eq!(Tuning::default().frequency(a4), 440.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    pub reference_octave: u32,
    pub reference_frequency: f64,
}

impl Tuning {
    /// Return the frequency of a note relative to this tuning.
    ///
    /// Notes without an octave are played in the reference octave.
    pub fn frequency(&self, note: NoteName) -> f64 {
        let base = self.reference_frequency * SEMITONE_RATIO.powi(note.class.distance_from_a());
        match note.octave {
            Some(octave) => {
                let octaves = octave as i32 - self.reference_octave as i32;
                base * SEMITONE_RATIO.powi(octaves * 12)
            }
            None => base,
        }
    }
}

/// Default concert tuning, where A4 corresponds to 440 Hz.
impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            reference_octave: REFERENCE_OCTAVE,
            reference_frequency: CONCERT_A,
        }
    }
}

/// Frequency in Hz of a note name in concert tuning.
///
/// # Examples
///
/// ```
/// use toneplay::tuning::frequency;
///
/// assert_eq!(frequency("a4"), Ok(440.0));
/// assert!((frequency("a5").unwrap() - 880.0).abs() < 1e-6);
/// assert!(frequency("h4").is_err());
/// ```
pub fn frequency(name: &str) -> Result<f64, NoteError> {
    Ok(Tuning::default().frequency(NoteName::parse(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn reference_pitch() {
        assert_eq!(frequency("a4").unwrap(), 440.0);
        assert_eq!(frequency("a").unwrap(), 440.0);
    }

    #[test]
    fn octaves_double_and_halve() {
        assert!((frequency("a5").unwrap() - 880.0).abs() < EPSILON);
        assert!((frequency("a3").unwrap() - 220.0).abs() < EPSILON);
        assert!((frequency("e6").unwrap() / frequency("e5").unwrap() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn adjacent_semitones() {
        let ratio = frequency("d4").unwrap() / frequency("c#4").unwrap();
        assert!((ratio - SEMITONE_RATIO).abs() < EPSILON);
    }

    #[test]
    fn middle_c() {
        assert!((frequency("c4").unwrap() - 523.2511).abs() < 1e-3);
        assert!((frequency("c3").unwrap() - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn frequencies_are_positive() {
        for class in PitchClass::ALL.iter() {
            for octave in 0..=MAX_OCTAVE {
                let f = Tuning::default().frequency(NoteName::new(*class, Some(octave)));
                assert!(f > 0.0 && f.is_finite(), "{}{} -> {}", class.token(), octave, f);
            }
        }
    }

    #[test]
    fn custom_reference() {
        let tuning = Tuning {
            reference_octave: 4,
            reference_frequency: 432.0,
        };
        assert_eq!(tuning.frequency(NoteName::new(PitchClass::A, Some(4))), 432.0);
    }
}
