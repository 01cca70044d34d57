//! Component E: the Signal Router.
//!
//! The shell process remains the terminal's controlling process group at
//! all times — it never calls `tcsetpgrp` to hand the terminal to a job.
//! That is a deliberate choice, not an omission: this router *intercepts*
//! SIGINT/SIGTSTP in the shell and *forwards* them to the foreground
//! job's process group. If the shell handed the terminal away, the
//! kernel would deliver those signals to the job directly and this
//! component would never run. Keeping the shell as the terminal's pgid
//! is what makes the router load-bearing.
//!
//! Both real signal handlers below do nothing but read one atomic and,
//! if it's non-zero, call `kill()` — no allocation, no locks, no
//! non-async-signal-safe I/O, so they're safe to run at any point the
//! main thread might be interrupted.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;

/// 0 means "no foreground job"; otherwise the pgid terminal signals
/// should be forwarded to. Leaked for the process lifetime so the
/// `extern "C"` handlers below can reach it without a capture.
static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(0);

pub fn set_foreground_pgid(pgid: i32) {
    FOREGROUND_PGID.store(pgid, Ordering::SeqCst);
}

pub fn clear_foreground_pgid() {
    FOREGROUND_PGID.store(0, Ordering::SeqCst);
}

extern "C" fn forward_sigint(_signum: libc::c_int) {
    forward(Signal::SIGINT);
}

extern "C" fn forward_sigtstp(_signum: libc::c_int) {
    forward(Signal::SIGTSTP);
}

fn forward(signal: Signal) {
    let pgid = FOREGROUND_PGID.load(Ordering::SeqCst);
    if pgid != 0 {
        let _ = nix::sys::signal::kill(Pid::from_raw(-pgid), signal);
    }
}

/// Installs the interrupt/suspend handlers and registers the SIGCHLD
/// dirty flag via `signal-hook`. Returns the flag the main loop should
/// poll before each prompt to drive the asynchronous reaper.
pub fn install() -> io::Result<Arc<AtomicBool>> {
    install_forwarder(Signal::SIGINT, forward_sigint)?;
    install_forwarder(Signal::SIGTSTP, forward_sigtstp)?;

    let sigchld_flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::signal::SIGCHLD, Arc::clone(&sigchld_flag))
        .map_err(io::Error::other)?;
    Ok(sigchld_flag)
}

fn install_forwarder(signal: Signal, handler: extern "C" fn(libc::c_int)) -> io::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(signal, &action) }
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}
