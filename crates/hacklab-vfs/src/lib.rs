//! Simulated filesystem for hacklab sessions.
//!
//! Two layers: `path` is pure syntax (turning typed input into an
//! [`AbsolutePath`] without ever touching a tree), `tree` is the in-memory
//! filesystem itself. Keeping them apart means resolution rules are
//! testable without a filesystem and the tree never sees `.` or `..`.

pub mod path;
pub mod tree;

pub use path::{AbsolutePath, SEPARATOR, resolve};
pub use tree::{DirEntry, EntryKind, FileKind, FileMeta, Metadata, Vfs};
