//! Command interpreter for the hacklab terminal.
//!
//! The command set is closed: every command is a variant of
//! [`registry::Builtin`] with a static [`registry::CommandSpec`] describing
//! its argument grammar, and the executor dispatches with an exhaustive
//! match. A new command that lacks a handler fails to compile.

mod commands;
pub mod complete;
pub mod interpreter;
pub mod registry;
pub mod session;

/// A suggested continuation for a partially typed line.
pub use complete::{CompletionCandidate, complete};
/// Output produced by a command (text or terminal signals).
pub use interpreter::CommandOutput;
/// Execute one raw input line against a session and its filesystem.
pub use interpreter::execute;
/// Static command catalogue and name lookup.
pub use registry::{COMMANDS, Builtin, CommandSpec};
/// Per-session cursor, history, and environment.
pub use session::SessionState;
