//! Low-level process-group primitives shared by the launcher and waiter.
//!
//! The shell never hands the controlling terminal to a job's process
//! group (see `signals.rs` for why): children keep their own pgid purely
//! so `kill(-pgid, ...)` can target a whole pipeline at once, not so the
//! kernel's terminal-signal delivery bypasses the shell.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{setpgid, Pid};

/// Installs a `pre_exec` hook that places the child into process group
/// `target` (0 meaning "start a new group led by myself") and restores
/// default dispositions for the terminal-generated signals, before exec.
///
/// This is the only place the group gets assigned. `Command::spawn`
/// doesn't return to the parent until the child has already called
/// `execve` (it waits on the CLOEXEC error pipe closing), so by the
/// time the parent could act, the child has long since exec'd — a
/// parent-side `setpgid` at that point just gets `EACCES`. Doing it
/// here, before exec, is both correct and sufficient.
pub fn set_process_group(command: &mut Command, target: i32) {
    unsafe {
        command.pre_exec(move || {
            reset_terminal_signals()?;
            setpgid(Pid::from_raw(0), Pid::from_raw(target))
                .map_err(|err| io::Error::other(err.to_string()))?;
            Ok(())
        });
    }
}

fn reset_terminal_signals() -> io::Result<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for &sig in &[
        Signal::SIGINT,
        Signal::SIGTSTP,
        Signal::SIGQUIT,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
    ] {
        unsafe { sigaction(sig, &action) }.map_err(|err| io::Error::other(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::wait::waitpid;

    #[test]
    fn pipeline_members_share_one_pgid() {
        let mut leader = Command::new("sh");
        leader.args(["-c", "sleep 1"]);
        set_process_group(&mut leader, 0);
        let leader_child = leader.spawn().unwrap();
        let leader_pid = leader_child.id() as i32;

        let mut follower = Command::new("sh");
        follower.args(["-c", "exit 0"]);
        set_process_group(&mut follower, leader_pid);
        let _follower_child = follower.spawn().unwrap();

        let _ = nix::sys::signal::kill(Pid::from_raw(-leader_pid), Signal::SIGKILL);
        loop {
            match waitpid(Pid::from_raw(-leader_pid), None) {
                Err(nix::errno::Errno::EINTR) => continue,
                Err(nix::errno::Errno::ECHILD) => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }
}
