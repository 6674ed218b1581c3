// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Getting rendered tones out of the process.

use std::io;

use log::info;

use crate::sink::{OfflineSink, SinkError};
use crate::wave::AudioBuffer;

pub mod sox;

/// Silence rendered after the last tone has stopped, in seconds.
pub const TAIL_SECONDS: f64 = 0.25;

/// Render everything scheduled on `sink` in blocks of 10 ms and write the samples to `out`
/// as interleaved little-endian stereo `f64`.
///
/// Returns the number of samples written.
pub fn render_to(sink: &mut OfflineSink, out: &mut dyn io::Write) -> io::Result<usize> {
    let sample_rate = sink.sample_rate();
    let total = ((sink.scheduled_until() + TAIL_SECONDS) * sample_rate).ceil() as usize;
    info!(
        "rendering {} samples ({:.2} seconds) at {} Hz",
        total,
        total as f64 / sample_rate,
        sample_rate
    );

    let block_size = ((sample_rate / 100.0).ceil() as usize).max(1);
    let mut audio_buffer = AudioBuffer::new(block_size);
    let mut byte_buffer = vec![0u8; audio_buffer.byte_len()];
    let mut peak: f64 = 0.0;

    let mut samples_total = 0;
    while samples_total < total {
        audio_buffer.fill_zero();
        sink.render_into(audio_buffer.samples_mut())
            .map_err(sink_error)?;
        peak = peak.max(audio_buffer.peak());

        let n = audio_buffer.copy_bytes_to(&mut byte_buffer);
        out.write_all(&byte_buffer[..n * 16])?;
        samples_total += n;
    }

    info!("peak level {:.3}", peak);
    Ok(samples_total)
}

fn sink_error(err: SinkError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Waveform;
    use crate::sink::OutputSink;

    #[test]
    fn renders_until_the_tail() {
        let mut sink = OfflineSink::new(800.0);
        let osc = sink.create_oscillator().unwrap();
        sink.set_waveform(osc, Waveform::Square).unwrap();
        sink.connect(osc, sink.destination()).unwrap();
        sink.start(osc, 0.0).unwrap();
        sink.stop(osc, 0.5).unwrap();
        sink.on_ended(osc, vec![(osc, sink.destination())]).unwrap();

        let mut bytes = Vec::new();
        let written = render_to(&mut sink, &mut bytes).unwrap();
        // 0.75 seconds, in blocks of 8 samples
        assert_eq!(written, 600);
        assert_eq!(bytes.len(), 600 * 16);
        assert_eq!(sink.live_nodes(), 0);
    }

    #[test]
    fn nothing_scheduled_is_just_the_tail() {
        let mut sink = OfflineSink::new(800.0);
        let mut bytes = Vec::new();
        assert_eq!(render_to(&mut sink, &mut bytes).unwrap(), 200);
        assert!(bytes.iter().all(|b| *b == 0));
    }
}
