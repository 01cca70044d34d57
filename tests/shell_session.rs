//! End-to-end exercises of the job-control core through the same
//! `ShellState` surface the REPL driver uses, without a real terminal.

use std::fs;
use std::thread::sleep;
use std::time::Duration;

use msh::repl::ShellState;

#[test]
fn pipeline_output_is_captured_via_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");

    let mut state = ShellState::new(8);
    state.run_once(&format!("echo hello world > {}", out.display()));

    let contents = fs::read_to_string(&out).unwrap();
    assert_eq!(contents, "hello world\n");
    assert_eq!(state.last_status, 0);
}

#[test]
fn two_stage_pipeline_counts_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let out = dir.path().join("out.txt");
    fs::write(&input, "a\nb\nc\n").unwrap();

    let mut state = ShellState::new(8);
    state.run_once(&format!(
        "cat {} | wc -l > {}",
        input.display(),
        out.display()
    ));

    let contents = fs::read_to_string(&out).unwrap();
    assert_eq!(contents.trim(), "3");
}

#[test]
fn background_job_appears_in_jobs_then_clears_once_done() {
    let dir = tempfile::tempdir().unwrap();
    let jobs_out = dir.path().join("jobs.txt");

    let mut state = ShellState::new(8);
    state.run_once("sleep 1 &");
    assert_eq!(state.jobs.snapshot_sorted_by_id().len(), 1);

    state.run_once(&format!("jobs > {}", jobs_out.display()));
    let listing = fs::read_to_string(&jobs_out).unwrap();
    assert!(listing.contains("Running"));
    assert!(listing.contains("sleep 1"));

    sleep(Duration::from_millis(1200));
    state.run_once(&format!("jobs > {}", jobs_out.display()));
    let listing = fs::read_to_string(&jobs_out).unwrap();
    assert!(listing.is_empty());
}

#[test]
fn cd_then_pwd_reflects_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();

    let mut state = ShellState::new(8);
    state.run_once(&format!("cd {}", dir.path().display()));
    assert_eq!(state.last_status, 0);
    assert_eq!(std::env::current_dir().unwrap(), canonical);
}

#[test]
fn stopping_and_resuming_a_job_with_bg_requires_it_was_actually_stopped() {
    let mut state = ShellState::new(8);
    state.run_once("bg 1");
    assert_eq!(state.last_status, 1);
}

#[test]
fn redirecting_input_from_a_missing_file_surfaces_an_error_without_aborting_the_session() {
    let mut state = ShellState::new(8);
    state.run_once("cat < /no/such/file/for/msh-tests");
    assert_eq!(state.last_status, 1);

    // The session keeps running: a later well-formed command still works.
    state.run_once("true");
    assert_eq!(state.last_status, 0);
}

#[test]
fn unknown_command_does_not_crash_the_session() {
    let mut state = ShellState::new(8);
    state.run_once("this-binary-does-not-exist-anywhere");
    assert_eq!(state.last_status, 0);
    state.run_once("true");
    assert_eq!(state.last_status, 0);
}
