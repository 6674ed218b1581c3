// toneplay -- note-to-tone synthesis for interactive keyboards
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Easy interface for getting sound to play using a sox subprocess.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

/// Where sox sends the audio.
#[derive(Debug, Clone, Copy)]
pub enum SoxTarget<'a> {
    /// The default speakers, via `play`.
    Play,
    /// Any file format sox supports, inferred from the extension.
    File(&'a Path),
}

/// The arguments describing the raw stereo `f64` stream sox reads from stdin.
fn input_args(sample_rate: u32) -> Vec<String> {
    vec![
        "-R".into(), // make the output reproducible
        "--channels".into(),
        "2".into(),
        "--rate".into(),
        sample_rate.to_string(),
        "--type".into(),
        "f64".into(),
        "/dev/stdin".into(),
    ]
}

fn sox_binaries() -> (PathBuf, PathBuf) {
    if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
        debug!("using sox from nix store {}", sox_bin);
        let bin = Path::new(sox_bin);
        (bin.join("play"), bin.join("sox"))
    } else {
        ("play".into(), "sox".into())
    }
}

/// Run `callback` with a stream that is fed to sox, and wait for sox to finish afterwards.
///
/// Fails if sox could not be started or did not exit successfully.
pub fn with_sox<R, F: FnOnce(&mut dyn io::Write) -> io::Result<R>>(
    sample_rate: u32,
    target: SoxTarget,
    callback: F,
) -> io::Result<R> {
    let (play, sox) = sox_binaries();
    let args = input_args(sample_rate);

    let mut command = match target {
        SoxTarget::Play => {
            let mut command = Command::new(&play);
            command.args(&args).stdout(Stdio::null()).stderr(Stdio::null());
            command
        }
        SoxTarget::File(outfile) => {
            let mut command = Command::new(&sox);
            command.args(&args).arg(outfile);
            command
        }
    };
    feed_command(&mut command, callback)
}

/// Spawn `command`, hand its stdin to `callback`, and wait for it to exit.
fn feed_command<R, F: FnOnce(&mut dyn io::Write) -> io::Result<R>>(
    command: &mut Command,
    callback: F,
) -> io::Result<R> {
    let mut player = command.stdin(Stdio::piped()).spawn()?;

    let mut audio_stream = player
        .stdin
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sox has no stdin"))?;

    let result = callback(&mut audio_stream);

    // sox exits once its input is closed
    drop(audio_stream);
    let status = player.wait()?;
    let value = result?;
    if status.success() {
        Ok(value)
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("sox exited with {}", status),
        ))
    }
}
