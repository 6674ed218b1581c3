// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Waveshaping transfer functions.

use std::f64::consts::PI;
use std::fmt;

/// Number of entries in a distortion curve.
pub const CURVE_SAMPLES: usize = 44100;

/// Intensity used when none is given.
pub const DEFAULT_INTENSITY: f64 = 50.0;

/// Oversampling a waveshaper should apply to reduce aliasing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Oversample {
    None,
    X2,
    X4,
}

impl fmt::Display for Oversample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Oversample::None => "none",
            Oversample::X2 => "2x",
            Oversample::X4 => "4x",
        })
    }
}

/// Build the transfer function of a soft-saturating waveshaper.
///
/// Entry `i` holds the output for the input `x = 2i / n - 1`, so the table covers the input
/// range from -1 to 1. Higher intensities saturate harder. Even an intensity of zero yields a
/// mildly shaped curve rather than the identity.
///
/// # Examples
///
/// ```
/// use toneplay::distortion::*;
/// let curve = distortion_curve(Some(0.0));
/// assert_eq!(curve.len(), CURVE_SAMPLES);
/// assert_eq!(curve[CURVE_SAMPLES / 2], 0.0);
/// ```
pub fn distortion_curve(intensity: Option<f64>) -> Vec<f32> {
    let k = intensity.unwrap_or(DEFAULT_INTENSITY);
    let deg = PI / 180.0;
    (0..CURVE_SAMPLES)
        .map(|i| {
            let x = (i * 2) as f64 / CURVE_SAMPLES as f64 - 1.0;
            ((3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())) as f32
        })
        .collect()
}

/// Look up `input` in a transfer function, interpolating linearly between table entries.
/// Inputs outside of -1 to 1 are clamped to the ends of the table.
pub fn shape(curve: &[f32], input: f64) -> f64 {
    match curve.len() {
        0 => return input,
        1 => return curve[0] as f64,
        _ => {}
    }
    let last = curve.len() - 1;
    let position = (input + 1.0) / 2.0 * last as f64;
    if !(position > 0.0) {
        return curve[0] as f64;
    }
    if position >= last as f64 {
        return curve[last] as f64;
    }
    let index = position.floor() as usize;
    let fraction = position - index as f64;
    let low = curve[index] as f64;
    let high = curve[index + 1] as f64;
    low + (high - low) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(curve: &[f32]) -> Vec<u32> {
        curve.iter().map(|x| x.to_bits()).collect()
    }

    #[test]
    fn same_intensity_same_table() {
        assert_eq!(
            bits(&distortion_curve(Some(400.0))),
            bits(&distortion_curve(Some(400.0)))
        );
    }

    #[test]
    fn default_intensity() {
        assert_eq!(
            bits(&distortion_curve(None)),
            bits(&distortion_curve(Some(DEFAULT_INTENSITY)))
        );
        assert_ne!(
            bits(&distortion_curve(None)),
            bits(&distortion_curve(Some(0.0)))
        );
    }

    #[test]
    fn curve_is_odd_and_monotonic() {
        let curve = distortion_curve(Some(25.0));
        assert!((curve[1] + curve[CURVE_SAMPLES - 1]).abs() < 1e-6);
        for pair in curve.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // the very first entry corresponds to x = -1
        let expected = -(28.0 * 20.0 * PI / 180.0) / (PI + 25.0);
        assert!((curve[0] as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn shape_interpolates() {
        let curve = [-1.0, 0.0, 0.5];
        assert_eq!(shape(&curve, -1.0), -1.0);
        assert_eq!(shape(&curve, -0.5), -0.5);
        assert_eq!(shape(&curve, 0.0), 0.0);
        assert_eq!(shape(&curve, 0.5), 0.25);
        assert_eq!(shape(&curve, 1.0), 0.5);
        assert_eq!(shape(&curve, 3.0), 0.5);
        assert_eq!(shape(&curve, -3.0), -1.0);
        assert_eq!(shape(&curve, f64::NAN), -1.0);
    }
}
