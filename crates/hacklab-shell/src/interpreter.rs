//! Tokenizer, variable expansion, and the command executor.
//!
//! Each input line is a single command: there are no pipelines, chains, or
//! redirections in the lab terminal. A line passes through variable
//! expansion, tokenization, registry lookup, and argument validation
//! before its handler runs; the current directory only changes after a
//! handler succeeds.

use hacklab_types::{Result, SimError};
use hacklab_vfs::Vfs;

use crate::commands;
use crate::registry;
use crate::session::SessionState;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal output buffer.
    Clear,
    /// Signal to re-provision the session from its scenario.
    Reset,
}

/// Execute one raw input line against a session and its filesystem.
///
/// Every non-empty line is appended to history, including lines that go on
/// to fail; a failing command never moves the cursor.
pub fn execute(line: &str, session: &mut SessionState, vfs: &mut Vfs) -> Result<CommandOutput> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(CommandOutput::None);
    }
    session.push_history(trimmed);

    let expanded = expand_variables(trimmed, session);
    let tokens = tokenize(&expanded)?;
    let Some((name, rest)) = tokens.split_first() else {
        return Ok(CommandOutput::None);
    };

    let spec =
        registry::lookup(name).ok_or_else(|| SimError::UnknownCommand(name.clone()))?;
    check_arity(spec, rest.len())?;

    log::debug!("dispatch {} ({} args)", spec.name, rest.len());
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    commands::dispatch(spec.builtin, &args, session, vfs)
}

fn check_arity(spec: &registry::CommandSpec, given: usize) -> Result<()> {
    if given < spec.min_args || spec.max_args.is_some_and(|max| given > max) {
        return Err(SimError::InvalidArguments(format!("usage: {}", spec.usage)));
    }
    Ok(())
}

/// Expand `$VAR` and `${VAR}` against the session environment. Unknown
/// variables expand to the empty string. Expansion runs before
/// tokenization, so quoted text is expanded too.
fn expand_variables(input: &str, session: &SessionState) -> String {
    let mut result = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{'
                && let Some(end) = chars[i + 2..].iter().position(|&c| c == '}')
            {
                let name: String = chars[i + 2..i + 2 + end].iter().collect();
                result.push_str(session.var(&name).unwrap_or_default());
                i += 3 + end;
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end > start {
                let name: String = chars[start..end].iter().collect();
                result.push_str(session.var(&name).unwrap_or_default());
                i = end;
                continue;
            }
            result.push('$');
            i += 1;
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }
    result
}

/// Tokenize a command line respecting quotes and backslash escapes.
///
/// - Single-quoted strings preserve all characters literally.
/// - Double quotes group words; `\"`, `\\`, and `\$` escape inside them.
/// - Backslash escapes the next character outside of quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(&next) = chars.peek()
            {
                match next {
                    '"' | '\\' | '$' => {
                        current.push(chars.next().unwrap());
                    },
                    _ => {
                        current.push('\\');
                    },
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(SimError::InvalidArguments(
            "unterminated single quote".to_string(),
        ));
    }
    if in_double {
        return Err(SimError::InvalidArguments(
            "unterminated double quote".to_string(),
        ));
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}
