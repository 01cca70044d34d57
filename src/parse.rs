//! The lexer/parser: an external collaborator to the job-control core.
//!
//! Turns one raw input line into a `ParsedLine`. Handles
//! whitespace/quote tokenizing, `|`, the pipeline-level redirections
//! `<`, `>`, `>>`, `2>`, `2>>`, a trailing `&`, and PATH resolution of
//! each command's `argv[0]`. No variable expansion, no globbing, no
//! command substitution, no nested subshells — those are non-goals.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::ShellError;

#[derive(Debug, Clone)]
pub struct Command {
    /// Resolved absolute path to the executable, or `None` if PATH lookup
    /// failed. `argv[0]` is left as the user-typed name either way.
    pub filename: Option<PathBuf>,
    pub argv: Vec<String>,
}

impl Command {
    pub fn argc(&self) -> usize {
        self.argv.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLine {
    pub commands: Vec<Command>,
    pub redirect_input: Option<PathBuf>,
    pub redirect_output: Option<PathBuf>,
    pub redirect_error: Option<PathBuf>,
    pub background: bool,
}

impl ParsedLine {
    pub fn ncommands(&self) -> usize {
        self.commands.len()
    }
}

/// Tokenizes `line` respecting single and double quotes (no escapes or
/// expansion inside either, matching a minimal shell's quoting rules).
fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                in_token = true;
                let quote = ch;
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => current.push(c),
                        None => {
                            return Err(ShellError::parse(format!(
                                "unterminated {} quote",
                                if quote == '\'' { "single" } else { "double" }
                            )))
                        }
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '|' | '<' | '>' | '&' => {
                // "2>" / "2>>" is the stderr-redirect fd prefix: only
                // special-cased when the '2' is a bare pending token with
                // nothing else attached, matching shell fd-dup syntax.
                let fd_prefix = ch == '>' && in_token && current == "2";
                if in_token {
                    if fd_prefix {
                        current.clear();
                    } else {
                        tokens.push(std::mem::take(&mut current));
                    }
                    in_token = false;
                }
                let mut op = String::new();
                if fd_prefix {
                    op.push('2');
                }
                op.push(ch);
                if ch == '>' && chars.peek() == Some(&'>') {
                    op.push(chars.next().unwrap());
                }
                tokens.push(op);
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Resolves `name` to an absolute executable path via `$PATH`, matching
/// the data model's contract that `filename` is `None` when lookup fails.
pub fn resolve_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.is_absolute() || name.contains('/') {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let full = dir.join(name);
        if is_executable(&full) {
            return Some(full);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Parses one input line into a `ParsedLine`. An empty or whitespace-only
/// line yields `ncommands == 0`, which the core treats as a silent no-op.
pub fn parse_line(line: &str) -> Result<ParsedLine, ShellError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(ParsedLine::default());
    }

    let mut parsed = ParsedLine::default();
    let mut commands: Vec<Vec<String>> = vec![Vec::new()];
    let mut iter = tokens.into_iter().peekable();

    while let Some(tok) = iter.next() {
        match tok.as_str() {
            "|" => {
                if commands.last().unwrap().is_empty() {
                    return Err(ShellError::parse("expected command before '|'"));
                }
                commands.push(Vec::new());
            }
            "<" => {
                let path = iter
                    .next()
                    .ok_or_else(|| ShellError::parse("expected filename after '<'"))?;
                if parsed.redirect_input.is_some() {
                    return Err(ShellError::parse("multiple input redirections"));
                }
                parsed.redirect_input = Some(PathBuf::from(path));
            }
            ">" | ">>" => {
                let path = iter
                    .next()
                    .ok_or_else(|| ShellError::parse("expected filename after '>'"))?;
                if parsed.redirect_output.is_some() {
                    return Err(ShellError::parse("multiple output redirections"));
                }
                parsed.redirect_output = Some(PathBuf::from(path));
            }
            "2>" | "2>>" => {
                let path = iter
                    .next()
                    .ok_or_else(|| ShellError::parse("expected filename after '2>'"))?;
                if parsed.redirect_error.is_some() {
                    return Err(ShellError::parse("multiple error redirections"));
                }
                parsed.redirect_error = Some(PathBuf::from(path));
            }
            "&" => {
                if iter.peek().is_some() {
                    return Err(ShellError::parse("'&' must terminate the line"));
                }
                parsed.background = true;
            }
            word => commands.last_mut().unwrap().push(word.to_string()),
        }
    }

    if commands.last().map_or(false, Vec::is_empty) && commands.len() > 1 {
        return Err(ShellError::parse("expected command after '|'"));
    }
    if commands.len() == 1 && commands[0].is_empty() {
        return Ok(parsed);
    }

    for argv in commands {
        if argv.is_empty() {
            return Err(ShellError::parse("empty command in pipeline"));
        }
        let filename = resolve_path(&argv[0]);
        parsed.commands.push(Command { filename, argv });
    }

    Ok(parsed)
}
