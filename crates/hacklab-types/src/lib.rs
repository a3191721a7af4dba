//! Foundation types for the hacklab shell engine.
//!
//! This crate contains the types shared by every other hacklab crate: the
//! error enum, the wire-facing error kind, and the common result alias.

pub mod error;

pub use error::{ErrorKind, Result, SimError};
