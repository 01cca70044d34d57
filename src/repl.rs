//! Component G: the REPL Driver.
//!
//! Owns the shell's whole mutable state across one interactive session:
//! the job table, the last exit status, the two job-id trackers the
//! built-ins need, and the `exit` confirmation latch. `run` is the
//! read-parse-dispatch loop; everything it touches lives on `ShellState`
//! so tests can drive one iteration at a time without a real terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::builtins::dispatch;
use crate::config;
use crate::job::JobTable;
use crate::parse::parse_line;
use crate::prompt;
use crate::waiter::reap_background;

/// `exit`'s one-shot confirmation when stopped jobs exist: the first
/// `exit` warns and arms the latch; any other command disarms it; a
/// second consecutive `exit` actually terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitLatch {
    Normal,
    ExitPending,
}

pub struct ShellState {
    pub jobs: JobTable,
    pub last_status: i32,
    pub last_stopped_job_id: Option<usize>,
    pub bg_count: usize,
    pub exit_latch: ExitLatch,
}

impl ShellState {
    pub fn new(job_capacity: usize) -> Self {
        ShellState {
            jobs: JobTable::new(job_capacity),
            last_status: 0,
            last_stopped_job_id: None,
            bg_count: 0,
            exit_latch: ExitLatch::Normal,
        }
    }

    /// Parses and dispatches one input line, draining any background
    /// jobs that finished since the previous call first.
    pub fn run_once(&mut self, line: &str) {
        reap_background(&mut self.jobs);
        match parse_line(line) {
            Ok(parsed) => {
                if let Err(err) = dispatch(self, &parsed, line.trim()) {
                    eprintln!("Error: {err}");
                }
            }
            Err(err) => {
                eprintln!("Error: {err}");
                self.exit_latch = ExitLatch::Normal;
                self.last_status = 2;
            }
        }
    }
}

/// Runs the interactive loop until `exit` terminates the process or the
/// input stream closes (`Ctrl-D`).
pub fn run(sigchld_flag: Arc<AtomicBool>) -> rustyline::Result<()> {
    let mut state = ShellState::new(config::job_table_capacity());
    let mut editor = DefaultEditor::new()?;
    let history_path = config::history_path();
    let _ = editor.load_history(&history_path);

    loop {
        if sigchld_flag.swap(false, Ordering::SeqCst) {
            reap_background(&mut state.jobs);
        }

        let cwd = std::env::current_dir().unwrap_or_default();
        let prompt_text = prompt::render(&cwd);

        match editor.readline(&prompt_text) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                state.run_once(&line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = editor.save_history(&history_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_external_command_reports_error_and_keeps_prompting() {
        let mut state = ShellState::new(8);
        state.run_once("definitely-not-a-real-binary-xyz");
        assert_eq!(state.last_status, 0); // pre-launch rejection leaves status untouched
    }

    #[test]
    fn exit_without_stopped_jobs_terminates_the_process() {
        // Exercised indirectly: dispatch() calls std::process::exit when
        // stopped_count == 0, so we only assert the latch stays Normal
        // along every other path (process::exit would kill the test
        // harness here, so this test never actually calls "exit").
        let state = ShellState::new(8);
        assert_eq!(state.exit_latch, ExitLatch::Normal);
    }

    #[test]
    fn bad_syntax_resets_latch_and_sets_nonzero_status() {
        let mut state = ShellState::new(8);
        state.exit_latch = ExitLatch::ExitPending;
        state.run_once("echo 'unterminated");
        assert_eq!(state.exit_latch, ExitLatch::Normal);
        assert_eq!(state.last_status, 2);
    }

    #[test]
    fn successful_command_updates_last_status() {
        let mut state = ShellState::new(8);
        state.run_once("sh -c \"exit 0\"");
        assert_eq!(state.last_status, 0);
    }
}
