//! Component F: the Built-in Dispatcher.
//!
//! Classifies `argv[0]` of a single-command line into one of the
//! trivial built-ins (`cd`, `exit`, `jobs`, `umask`, `bg`) or routes it
//! (together with any multi-command pipeline) to the Pipeline Launcher.

use std::env;
use std::io::{self, Write};

use log::debug;

use crate::error::ShellError;
use crate::job::JobState;
use crate::launcher::{launch, LaunchOutcome};
use crate::parse::ParsedLine;
use crate::repl::{ExitLatch, ShellState};
use crate::signals::{clear_foreground_pgid, set_foreground_pgid};
use crate::waiter::{wait_foreground, WaitOutcome};

pub fn is_builtin(name: &str) -> bool {
    matches!(name, "cd" | "exit" | "jobs" | "umask" | "bg")
}

/// Dispatches one already-parsed line. `command_text` is the original
/// input, used for job-table display and notices.
pub fn dispatch(state: &mut ShellState, line: &ParsedLine, command_text: &str) -> io::Result<()> {
    if line.ncommands() == 0 {
        return Ok(());
    }

    let first = line.commands[0].argv[0].as_str();
    if line.ncommands() == 1 && is_builtin(first) {
        if first != "exit" {
            state.exit_latch = ExitLatch::Normal;
        }
        return execute_builtin(state, line, command_text);
    }

    state.exit_latch = ExitLatch::Normal;

    if line.commands.iter().any(|cmd| cmd.filename.is_none()) {
        eprintln!("Command not found");
        return Ok(());
    }

    run_pipeline(state, line, command_text)
}

fn run_pipeline(state: &mut ShellState, line: &ParsedLine, command_text: &str) -> io::Result<()> {
    match launch(&mut state.jobs, line, command_text) {
        Ok(LaunchOutcome::Launched(index)) => {
            let job_id = state.jobs.get(index).unwrap().id;
            let pgid = state.jobs.get(index).unwrap().pgid();

            if line.background {
                println!("[{job_id}] {pgid}");
                return Ok(());
            }

            set_foreground_pgid(pgid);
            let outcome = wait_foreground(&mut state.jobs, index);
            clear_foreground_pgid();
            match outcome {
                Ok(WaitOutcome::Exited { status }) => {
                    state.last_status = status;
                }
                Ok(WaitOutcome::Stopped) => {
                    state.last_stopped_job_id = Some(job_id);
                    println!("[{job_id}]+  Stopped    {command_text}");
                    state.last_status = 128 + libc::SIGTSTP;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    state.last_status = 1;
                }
            }
        }
        Err(err) => report_launch_error(state, &err),
    }
    Ok(())
}

fn report_launch_error(state: &mut ShellState, err: &ShellError) {
    match err.kind {
        crate::error::ErrorKind::JobControl => {
            eprintln!("{}", err.message);
        }
        crate::error::ErrorKind::Redirection => {
            eprintln!("Error: {}", err.message);
            state.last_status = 1;
        }
        _ => {
            eprintln!("Command Error: {}", err.message);
            state.last_status = 127;
        }
    }
}

fn execute_builtin(state: &mut ShellState, line: &ParsedLine, command_text: &str) -> io::Result<()> {
    let argv = &line.commands[0].argv;
    match argv[0].as_str() {
        "cd" => builtin_cd(state, argv),
        "exit" => builtin_exit(state),
        "jobs" => builtin_jobs(state, line),
        "umask" => builtin_umask(state, argv),
        "bg" => builtin_bg(state, argv),
        _ => unreachable!("is_builtin guarantees one of the above"),
    }
    Ok(())
}

fn builtin_cd(state: &mut ShellState, argv: &[String]) {
    let target = match argv.get(1) {
        Some(path) => path.clone(),
        None => match env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                eprintln!("Directory not found");
                state.last_status = 1;
                return;
            }
        },
    };
    match env::set_current_dir(&target) {
        Ok(()) => state.last_status = 0,
        Err(_) => {
            eprintln!("Directory not found");
            state.last_status = 1;
        }
    }
}

fn builtin_exit(state: &mut ShellState) {
    if state.jobs.stopped_count() == 0 {
        std::process::exit(0);
    }
    match state.exit_latch {
        ExitLatch::ExitPending => std::process::exit(0),
        ExitLatch::Normal => {
            eprintln!("There are stopped jobs.");
            state.exit_latch = ExitLatch::ExitPending;
        }
    }
}

fn builtin_jobs(state: &mut ShellState, line: &ParsedLine) {
    let mut buf = String::new();
    for (display_idx, index) in state.jobs.snapshot_sorted_by_id().into_iter().enumerate() {
        let job = state.jobs.get(index).unwrap();
        let status = match job.state {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => continue,
        };
        buf.push_str(&format!(
            "[{}]  {}    {}\n",
            display_idx + 1,
            status,
            job.command_text
        ));
    }
    write_builtin_output(state, line, &buf);
    state.last_status = 0;
}

fn write_builtin_output(state: &mut ShellState, line: &ParsedLine, buf: &str) {
    if let Some(ref path) = line.redirect_output {
        match std::fs::write(path, buf) {
            Ok(()) => {}
            Err(err) => {
                eprintln!("Error: {}: {err}", path.display());
                state.last_status = 1;
            }
        }
    } else {
        let _ = io::stdout().write_all(buf.as_bytes());
    }
}

fn builtin_umask(state: &mut ShellState, argv: &[String]) {
    match argv.get(1) {
        None => {
            let current = read_current_umask();
            println!("{:04o}", current);
            state.last_status = 0;
        }
        Some(value) => match u32::from_str_radix(value, 8) {
            Ok(mask) => {
                unsafe {
                    libc::umask(mask as libc::mode_t);
                }
                state.last_status = 0;
            }
            Err(_) => {
                eprintln!("umask: invalid octal mask: {value}");
                state.last_status = 1;
            }
        },
    }
}

/// `umask(2)` has no pure read; the conventional trick is to set a
/// throwaway mask, read the old value back, then immediately restore it.
fn read_current_umask() -> libc::mode_t {
    unsafe {
        let current = libc::umask(0o022);
        libc::umask(current);
        current
    }
}

fn builtin_bg(state: &mut ShellState, argv: &[String]) {
    let job_id = match parse_job_id(argv.get(1)) {
        Ok(id) => id,
        Err(msg) => {
            eprintln!("bg: {msg}");
            state.last_status = 1;
            return;
        }
    };

    let target_id = match job_id.or(state.last_stopped_job_id) {
        Some(id) => id,
        None => {
            eprintln!("bg: no such job");
            state.last_status = 1;
            return;
        }
    };

    let Some(index) = state.jobs.find_by_id(target_id) else {
        eprintln!("bg: no such job");
        state.last_status = 1;
        return;
    };

    let job = state.jobs.get(index).unwrap();
    if job.state != JobState::Stopped {
        eprintln!("bg: job {target_id} is not stopped");
        state.last_status = 1;
        return;
    }
    let pgid = job.pgid();
    let command_text = job.command_text.clone();

    if let Err(err) = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(-pgid),
        nix::sys::signal::Signal::SIGCONT,
    ) {
        eprintln!("bg: {err}");
        state.last_status = 1;
        return;
    }

    let job = state.jobs.get_mut(index).unwrap();
    job.state = JobState::Running;
    job.background = true;
    state.bg_count += 1;
    debug!("bg event=resume id={} total_backgrounded={}", target_id, state.bg_count);
    if state.last_stopped_job_id == Some(target_id) {
        state.last_stopped_job_id = None;
    }
    println!("[{target_id}]+ {command_text} &");
    state.last_status = 0;
}

fn parse_job_id(arg: Option<&String>) -> Result<Option<usize>, String> {
    match arg {
        None => Ok(None),
        Some(value) => {
            let trimmed = value.strip_prefix('%').unwrap_or(value);
            trimmed
                .parse::<usize>()
                .map(Some)
                .map_err(|_| "job id must be a number".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_line;
    use crate::repl::ShellState;

    #[test]
    fn cd_with_no_argument_uses_home() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("HOME", dir.path());
        }
        let mut state = ShellState::new(8);
        let line = parse_line("cd").unwrap();
        dispatch(&mut state, &line, "cd").unwrap();
        assert_eq!(state.last_status, 0);
        assert_eq!(std::env::current_dir().unwrap(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn cd_to_missing_directory_fails() {
        let mut state = ShellState::new(8);
        let line = parse_line("cd /no/such/directory/at/all").unwrap();
        dispatch(&mut state, &line, "cd /no/such/directory/at/all").unwrap();
        assert_eq!(state.last_status, 1);
    }

    #[test]
    fn bg_rejects_a_job_that_was_never_stopped() {
        let mut state = ShellState::new(8);
        state
            .jobs
            .allocate(vec![999999], true, "sleep 5".into())
            .unwrap();
        let line = parse_line("bg 1").unwrap();
        dispatch(&mut state, &line, "bg 1").unwrap();
        assert_eq!(state.last_status, 1);
    }

    #[test]
    fn umask_round_trips_through_octal() {
        let mut state = ShellState::new(8);
        let set_line = parse_line("umask 027").unwrap();
        dispatch(&mut state, &set_line, "umask 027").unwrap();
        assert_eq!(state.last_status, 0);
        assert_eq!(read_current_umask(), 0o027);
    }
}
