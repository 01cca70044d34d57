//! Component D: the Waiter / Reaper.
//!
//! `wait_foreground` blocks the main thread for one job and is the
//! single place a job transitions into `Stopped` (see `signals.rs` for
//! why the signal handlers themselves never touch job state).
//! `reap_background` is the asynchronous half: a non-blocking sweep
//! triggered whenever `SIGCHLD` has fired since the last checkpoint
//! (see `repl.rs`), walking jobs in ascending id order so that
//! simultaneous events print in a deterministic order.

use std::io;

use log::debug;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::job::{JobState, JobTable};

pub enum WaitOutcome {
    Exited { status: i32 },
    Stopped,
}

/// Blocks on the job at `index` until every process in it has exited, or
/// until the group stops. A stop suspends every process in the group at
/// once, so once one is observed stopped there's no need to keep
/// waiting on the rest.
///
/// On normal termination the slot is freed — once every pid has been
/// reaped there is nothing left to hold onto. On a stop, the job is left
/// in the table with state `Stopped` and the caller is expected to record
/// `last_stopped_job_id`.
pub fn wait_foreground(jobs: &mut JobTable, index: usize) -> io::Result<WaitOutcome> {
    let pgid = jobs.get(index).unwrap().pgid();
    let expected = jobs.get(index).unwrap().pids.len();
    debug!("wait event=foreground pgid={} expected={}", pgid, expected);

    let mut exited = 0usize;
    let mut last_status = 0;

    loop {
        match waitpid(Pid::from_raw(-pgid), Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(pid, code)) => {
                last_status = code;
                exited += 1;
                debug!("wait event=exit pgid={} pid={} code={}", pgid, pid, code);
                if exited >= expected {
                    jobs.free(index);
                    return Ok(WaitOutcome::Exited { status: last_status });
                }
            }
            Ok(WaitStatus::Signaled(pid, sig, _)) => {
                last_status = 128 + sig as i32;
                exited += 1;
                debug!("wait event=signal pgid={} pid={} signal={}", pgid, pid, sig as i32);
                if exited >= expected {
                    jobs.free(index);
                    return Ok(WaitOutcome::Exited { status: last_status });
                }
            }
            Ok(WaitStatus::Stopped(_, _)) => {
                debug!("wait event=stopped pgid={}", pgid);
                jobs.get_mut(index).unwrap().state = JobState::Stopped;
                return Ok(WaitOutcome::Stopped);
            }
            Ok(WaitStatus::Continued(_))
            | Ok(WaitStatus::StillAlive)
            | Ok(WaitStatus::PtraceEvent(_, _, _))
            | Ok(WaitStatus::PtraceSyscall(_)) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(nix::errno::Errno::ECHILD) => {
                // Every child already reaped (e.g. by the async reaper
                // racing us); treat as a clean exit with the last status
                // we observed.
                jobs.free(index);
                return Ok(WaitOutcome::Exited { status: last_status });
            }
            Err(err) => return Err(io::Error::other(err.to_string())),
        }
    }
}

enum Poll {
    Done,
    Stopped,
    Running,
    NoChange,
}

fn poll_pgid(pgid: i32) -> Poll {
    let mut outcome = Poll::NoChange;
    loop {
        match waitpid(
            Pid::from_raw(-pgid),
            Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED),
        ) {
            Ok(WaitStatus::Exited(_, _)) | Ok(WaitStatus::Signaled(_, _, _)) => {
                outcome = Poll::Done;
                continue;
            }
            Ok(WaitStatus::Stopped(_, _)) => {
                outcome = Poll::Stopped;
                break;
            }
            Ok(WaitStatus::Continued(_)) => {
                outcome = Poll::Running;
                continue;
            }
            Ok(WaitStatus::PtraceEvent(_, _, _)) | Ok(WaitStatus::PtraceSyscall(_)) => continue,
            Ok(WaitStatus::StillAlive) => break,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(nix::errno::Errno::ECHILD) => {
                if matches!(outcome, Poll::NoChange) {
                    outcome = Poll::Done;
                }
                break;
            }
            Err(_) => break,
        }
    }
    outcome
}

/// Non-blocking sweep over every live job, driven by the `SIGCHLD` dirty
/// flag. Background jobs that finish print `[id] Done` and are freed;
/// foreground-stopped transitions observed here (rather than inside
/// `wait_foreground`) are rare but handled identically.
pub fn reap_background(jobs: &mut JobTable) {
    for index in jobs.snapshot_sorted_by_id() {
        let Some(job) = jobs.get(index) else { continue };
        let pgid = job.pgid();
        let id = job.id;
        let command_text = job.command_text.clone();
        let current_state = job.state;

        match poll_pgid(pgid) {
            Poll::Done => {
                debug!("reap event=done pgid={} id={}", pgid, id);
                jobs.free(index);
                println!("[{id}]+  Done    {command_text}");
            }
            Poll::Stopped => {
                if current_state != JobState::Stopped {
                    jobs.get_mut(index).unwrap().state = JobState::Stopped;
                    println!("[{id}]+  Stopped    {command_text}");
                }
            }
            Poll::Running => {
                if current_state != JobState::Running {
                    jobs.get_mut(index).unwrap().state = JobState::Running;
                }
            }
            Poll::NoChange => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{launch, LaunchOutcome};
    use crate::parse::parse_line;

    #[test]
    fn wait_foreground_reports_exit_status_and_frees_slot() {
        let line = parse_line("sh -c \"exit 3\"").unwrap();
        let mut jobs = JobTable::new(8);
        let LaunchOutcome::Launched(index) = launch(&mut jobs, &line, "sh").unwrap();
        match wait_foreground(&mut jobs, index).unwrap() {
            WaitOutcome::Exited { status } => assert_eq!(status, 3),
            WaitOutcome::Stopped => panic!("expected exit"),
        }
        assert!(jobs.get(index).is_none());
    }

    #[test]
    fn reap_background_frees_finished_job_and_prints_done() {
        let line = parse_line("true &").unwrap();
        let mut jobs = JobTable::new(8);
        let LaunchOutcome::Launched(index) = launch(&mut jobs, &line, "true &").unwrap();
        // give the child a moment to exit
        std::thread::sleep(std::time::Duration::from_millis(200));
        reap_background(&mut jobs);
        assert!(jobs.get(index).is_none());
    }
}
