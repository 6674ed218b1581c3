// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note name is.

use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

/// Octave assumed when a note name does not carry one.
pub const REFERENCE_OCTAVE: u32 = 4;

/// Highest octave accepted in a note name.
pub const MAX_OCTAVE: u32 = 10;

/// One of the twelve chromatic letter classes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PitchClass {
    A,
    ASharp,
    B,
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
}

impl PitchClass {
    /// All letter classes, starting at A.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
    ];

    /// Signed number of semitones between A and this letter class.
    ///
    /// All letters are kept within six semitones of A, so that C to D♯ lie above
    /// the A of the same octave and E to G♯ lie below it.
    pub fn distance_from_a(self) -> i32 {
        match self {
            PitchClass::A => 0,
            PitchClass::ASharp => 1,
            PitchClass::B => 2,
            PitchClass::C => 3,
            PitchClass::CSharp => 4,
            PitchClass::D => 5,
            PitchClass::DSharp => 6,
            PitchClass::E => -5,
            PitchClass::F => -4,
            PitchClass::FSharp => -3,
            PitchClass::G => -2,
            PitchClass::GSharp => -1,
        }
    }

    /// Look up a letter class token such as `"c#"`. Matching ignores case.
    pub fn from_token(token: &str) -> Option<PitchClass> {
        let class = match token.to_ascii_lowercase().as_str() {
            "a" => PitchClass::A,
            "a#" => PitchClass::ASharp,
            "b" => PitchClass::B,
            "c" => PitchClass::C,
            "c#" => PitchClass::CSharp,
            "d" => PitchClass::D,
            "d#" => PitchClass::DSharp,
            "e" => PitchClass::E,
            "f" => PitchClass::F,
            "f#" => PitchClass::FSharp,
            "g" => PitchClass::G,
            "g#" => PitchClass::GSharp,
            _ => return None,
        };
        Some(class)
    }

    pub fn token(self) -> &'static str {
        match self {
            PitchClass::A => "a",
            PitchClass::ASharp => "a#",
            PitchClass::B => "b",
            PitchClass::C => "c",
            PitchClass::CSharp => "c#",
            PitchClass::D => "d",
            PitchClass::DSharp => "d#",
            PitchClass::E => "e",
            PitchClass::F => "f",
            PitchClass::FSharp => "f#",
            PitchClass::G => "g",
            PitchClass::GSharp => "g#",
        }
    }
}

/// A note in the `<letter>[#][octave]` notation, e.g. `c#4` or `e`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NoteName {
    pub class: PitchClass,
    /// `None` when the name did not carry an octave.
    pub octave: Option<u32>,
}

/// Reasons why a string is not a note name.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum NoteError {
    #[snafu(display("Note name is empty"))]
    Empty,
    #[snafu(display("Unknown letter class {:?} in note {:?}", token, name))]
    UnknownLetter { name: String, token: String },
    #[snafu(display("Octave of note {:?} is out of range (0 - {})", name, MAX_OCTAVE))]
    OctaveOutOfRange { name: String },
}

impl NoteName {
    pub fn new(class: PitchClass, octave: Option<u32>) -> Self {
        Self { class, octave }
    }

    /// The octave of the note, falling back to the reference octave.
    pub fn octave_or_default(&self) -> u32 {
        self.octave.unwrap_or(REFERENCE_OCTAVE)
    }

    /// Parse a name string of the format `<letter>[#][octave]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use toneplay::note::*;
    ///
    /// assert_eq!(NoteName::parse("c#4"), Ok(NoteName::new(PitchClass::CSharp, Some(4))));
    /// assert_eq!(NoteName::parse("A"), Ok(NoteName::new(PitchClass::A, None)));
    /// assert!(NoteName::parse("h4").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<NoteName, NoteError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NoteError::Empty);
        }

        let token = name.trim_end_matches(|ch: char| ch.is_ascii_digit());
        let class = PitchClass::from_token(token).ok_or_else(|| NoteError::UnknownLetter {
            name: name.to_string(),
            token: token.to_string(),
        })?;

        let octave_str = &name[token.len()..];
        let octave = if octave_str.is_empty() {
            None
        } else {
            match octave_str.parse::<u32>() {
                Ok(octave) if octave <= MAX_OCTAVE => Some(octave),
                _ => {
                    return Err(NoteError::OctaveOutOfRange {
                        name: name.to_string(),
                    })
                }
            }
        };

        Ok(NoteName { class, octave })
    }
}

impl FromStr for NoteName {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteName::parse(s)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class.token())?;
        if let Some(octave) = self.octave {
            write!(f, "{}", octave)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_letter_class() {
        for class in PitchClass::ALL.iter() {
            let name = format!("{}3", class.token());
            assert_eq!(NoteName::parse(&name), Ok(NoteName::new(*class, Some(3))));
        }
    }

    #[test]
    fn parse_without_octave() {
        let note: NoteName = "g#".parse().unwrap();
        assert_eq!(note.octave, None);
        assert_eq!(note.octave_or_default(), REFERENCE_OCTAVE);
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!(NoteName::parse("C#5"), NoteName::parse("c#5"));
    }

    #[test]
    fn reject_unknown_letters() {
        assert_eq!(
            NoteName::parse("h4"),
            Err(NoteError::UnknownLetter {
                name: "h4".to_string(),
                token: "h".to_string()
            })
        );
        // flats are not part of the notation
        assert!(NoteName::parse("bb3").is_err());
        assert!(NoteName::parse("4").is_err());
        assert_eq!(NoteName::parse("  "), Err(NoteError::Empty));
    }

    #[test]
    fn reject_huge_octaves() {
        assert_eq!(
            NoteName::parse("a11"),
            Err(NoteError::OctaveOutOfRange {
                name: "a11".to_string()
            })
        );
        assert!(NoteName::parse("a99999999999").is_err());
    }

    #[test]
    fn display_round_trips_the_notation() {
        assert_eq!(NoteName::parse("D#2").unwrap().to_string(), "d#2");
        assert_eq!(NoteName::parse("f").unwrap().to_string(), "f");
    }

    #[test]
    fn distances_stay_within_six_semitones() {
        for class in PitchClass::ALL.iter() {
            assert!(class.distance_from_a().abs() <= 6);
        }
    }
}
