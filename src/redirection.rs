//! Component C: the Redirection Planner.
//!
//! For a pipeline of length `n`, decides which descriptors each child at
//! index `i` inherits: pipe ends for interior stages, the pipeline-level
//! redirection files at the two ends, inherited streams everywhere else.
//! Applied through `std::process::Command`'s stdio builders, so closing
//! every descriptor that isn't part of a given child's wiring falls out
//! of Rust's ownership rules rather than needing manual `close` calls: a
//! `ChildStdout` not threaded into the next command's `stdin` is simply
//! dropped.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::{ChildStdout, Command, Stdio};

use crate::error::ShellError;
use crate::parse::ParsedLine;

/// Applies stdin/stdout/stderr wiring for pipeline stage `index` of `n`.
/// `prev_stdout` is the previous stage's piped stdout (`None` for stage 0).
/// Returns the `ChildStdout` this stage should hand to the next stage, if
/// this stage isn't last.
pub fn plan_and_apply(
    command: &mut Command,
    line: &ParsedLine,
    index: usize,
    n: usize,
    prev_stdout: Option<ChildStdout>,
) -> Result<(), ShellError> {
    // stdin
    if index == 0 {
        if let Some(ref path) = line.redirect_input {
            command.stdin(open_for_read(path)?);
        }
    } else if let Some(stdout) = prev_stdout {
        command.stdin(Stdio::from(stdout));
    }

    // stdout
    if index + 1 < n {
        command.stdout(Stdio::piped());
    } else if let Some(ref path) = line.redirect_output {
        command.stdout(open_for_write(path)?);
    }

    // stderr, applied to every child when present
    if let Some(ref path) = line.redirect_error {
        command.stderr(open_for_write(path)?);
    }

    Ok(())
}

fn open_for_read(path: &Path) -> Result<Stdio, ShellError> {
    OpenOptions::new()
        .read(true)
        .open(path)
        .map(Stdio::from)
        .map_err(|err| redirection_failed(path, err))
}

fn open_for_write(path: &Path) -> Result<Stdio, ShellError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map(Stdio::from)
        .map_err(|err| redirection_failed(path, err))
}

fn redirection_failed(path: &Path, err: io::Error) -> ShellError {
    ShellError::redirection(format!("{}: {}", path.display(), err))
}
