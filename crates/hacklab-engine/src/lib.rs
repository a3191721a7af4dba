//! Session engine for the hacklab terminal.
//!
//! The web layer talks to one [`Simulator`]: it opens a session per
//! authenticated lab user, sends raw command lines, and asks for
//! completions. Each session owns its own filesystem and shell state;
//! nothing is shared between sessions, and all access to one session is
//! serialized behind its own lock.

pub mod scenario;
pub mod simulator;

pub use scenario::Scenario;
pub use simulator::{ExecuteResponse, LabSession, Simulator};
