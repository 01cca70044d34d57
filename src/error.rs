//! Error types and reporting for the shell core.
//!
//! Functions in this crate return `ShellError` rather than bare strings so
//! callers can distinguish parse failures from redirection failures from
//! execution failures without string-matching.

use std::fmt;

/// Categorized error kinds, matching the error taxonomy the core commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntax error during tokenization/parsing.
    Parse,
    /// A redirection target could not be opened.
    Redirection,
    /// Spawning or waiting on a pipeline failed.
    Execution,
    /// Job-table or job-control bookkeeping failed.
    JobControl,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "Parse error"),
            ErrorKind::Redirection => write!(f, "Redirection error"),
            ErrorKind::Execution => write!(f, "Execution error"),
            ErrorKind::JobControl => write!(f, "Job control error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ShellError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ShellError {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn redirection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Redirection, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ShellError {}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::new(ErrorKind::Execution, err.to_string())
    }
}

pub type ShellResult<T> = Result<T, ShellError>;
