//! Component B: the Pipeline Launcher.
//!
//! Given a `ParsedLine`, allocates a job slot, spawns every stage with its
//! descriptors wired by the Redirection Planner, places every child in one
//! process group, and records the resulting pids into the job table.

use std::process::Command;

use log::debug;

use crate::error::{ErrorKind, ShellError};
use crate::job::JobTable;
use crate::parse::ParsedLine;
use crate::process::set_process_group;
use crate::redirection::plan_and_apply;

#[derive(Debug)]
pub enum LaunchOutcome {
    /// The job slot index the pipeline was recorded under.
    Launched(usize),
}

/// Forks and execs every stage of `line` left to right, wiring them
/// into one pipeline and one process group, then records the result as
/// a new job. `command_text` is the original input line, retained on
/// the `Job` for display by `jobs`.
pub fn launch(
    jobs: &mut JobTable,
    line: &ParsedLine,
    command_text: &str,
) -> Result<LaunchOutcome, ShellError> {
    if line.ncommands() == 0 {
        return Err(ShellError::new(ErrorKind::Execution, "empty pipeline"));
    }
    if line.commands.iter().any(|cmd| cmd.filename.is_none()) {
        return Err(ShellError::new(ErrorKind::Execution, "Command not found"));
    }

    let n = line.ncommands();
    let mut pids = Vec::with_capacity(n);
    let mut pgid: Option<i32> = None;
    let mut prev_stdout = None;

    for (index, cmd) in line.commands.iter().enumerate() {
        let filename = cmd.filename.as_ref().unwrap();
        let mut command = Command::new(filename);
        command.args(&cmd.argv[1..]);

        plan_and_apply(&mut command, line, index, n, prev_stdout.take())?;

        let target = pgid.unwrap_or(0);
        set_process_group(&mut command, target);

        let mut child = command.spawn().map_err(|err| {
            ShellError::new(
                ErrorKind::Execution,
                format!("{}: {err}", cmd.argv[0]),
            )
        })?;
        let pid = child.id() as i32;
        let group_target = pgid.unwrap_or(pid);

        debug!(
            "job event=spawn index={} pid={} pgid={}",
            index, pid, group_target
        );

        if pgid.is_none() {
            pgid = Some(pid);
        }
        pids.push(pid);
        // Dropping any stdout we don't carry forward closes it in the
        // parent immediately instead of leaking it into the next stage.
        prev_stdout = child.stdout.take();
    }
    drop(prev_stdout);

    let index = jobs
        .allocate(pids, line.background, command_text.to_string())
        .map_err(|msg| ShellError::new(ErrorKind::JobControl, msg))?;

    Ok(LaunchOutcome::Launched(index))
}
