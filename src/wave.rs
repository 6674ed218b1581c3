// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This is the namespace for all parts dealing with data in sampled waves.

use std::ops;

/// A buffer holding floating point audio data.
pub struct AudioBuffer {
    samples: Vec<Stereo<f64>>,
}

#[allow(clippy::len_without_is_empty)]
impl AudioBuffer {
    pub fn new(sample_count: usize) -> Self {
        Self {
            samples: vec![Stereo::mono(0.0); sample_count],
        }
    }

    /// Set all samples to zero.
    pub fn fill_zero(&mut self) {
        self.samples
            .iter_mut()
            .for_each(|s| *s = Stereo::mono(0.0));
    }

    /// Size of the buffer in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Size of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * 2 * std::mem::size_of::<f64>()
    }

    pub fn samples(&self) -> &[Stereo<f64>] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Stereo<f64>] {
        &mut self.samples
    }

    /// Largest absolute sample value on either channel.
    pub fn peak(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.left.abs().max(s.right.abs()))
            .fold(0.0, f64::max)
    }

    /// Copy the stereo `f64` samples to bytes, interleaving the left and right samples.
    ///
    /// Returns the number of samples that were actually copied.
    /// Might be less than the number of input samples if the output buffer was not large enough.
    pub fn copy_bytes_to(&self, bytes: &mut [u8]) -> usize {
        let mut processed = 0;
        for (sample, target) in self.samples.iter().zip(bytes.chunks_exact_mut(16)) {
            target[0..8].copy_from_slice(&sample.left.to_le_bytes());
            target[8..16].copy_from_slice(&sample.right.to_le_bytes());
            processed += 1;
        }
        processed
    }
}

/// Convenience type for making things stereo, e.g. individual samples or whole buffers.
///
/// ```
/// use toneplay::wave::*;
///
/// let mut stereo = Stereo::new(0.25, 0.5);
/// stereo += Stereo::mono(0.5);
/// assert_eq!(stereo * 2.0, Stereo::new(1.5, 2.0));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stereo<T> {
    pub left: T,
    pub right: T,
}

impl<T> Stereo<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn mono(mono: T) -> Self
    where
        T: Copy,
    {
        Self::new(mono, mono)
    }
}

impl<T: ops::Add> ops::Add for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn add(self, rhs: Self) -> Self::Output {
        Stereo {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl<T: ops::AddAssign> ops::AddAssign for Stereo<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl<T: ops::Mul + Copy> ops::Mul<T> for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Stereo {
            left: self.left * rhs,
            right: self.right * rhs,
        }
    }
}
