//! Ambient configuration: environment-driven knobs and logging setup.
//! Deliberately small — this shell has no config file, no aliases, no
//! prompt themes; those are non-goals. What's here is the minimum every
//! complete binary needs: where to log, how big the job table is, and
//! where history lives.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_JOB_CAPACITY: usize = 20;

pub fn job_table_capacity() -> usize {
    env::var("MSH_JOB_CAPACITY")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_JOB_CAPACITY)
}

pub fn history_path() -> PathBuf {
    if let Ok(path) = env::var("MSH_HISTORY_FILE") {
        return PathBuf::from(path);
    }
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".msh_history")
}

pub fn init_logging() {
    let env = env_logger::Env::default().filter_or("MSH_LOG", "warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
