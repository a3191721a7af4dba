//! Syntactic path resolution.
//!
//! Everything here is pure string work: no lookup against the filesystem
//! tree happens during resolution. Existence checking is a separate step
//! performed by the caller, which keeps these rules unit-testable without
//! building a tree first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hacklab_types::{Result, SimError};

/// The path separator. The root directory's name is the separator itself.
pub const SEPARATOR: char = '/';

/// A fully resolved, root-anchored path.
///
/// Never contains `.` or `..` segments. Two paths are equal iff their
/// segment sequences are equal; comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbsolutePath {
    segments: Vec<String>,
}

impl AbsolutePath {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The ordered name segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, or `None` for root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory. The parent of root is root.
    pub fn parent(&self) -> AbsolutePath {
        let mut segments = self.segments.clone();
        segments.pop();
        AbsolutePath { segments }
    }

    /// Append one validated name segment.
    pub fn join(&self, name: &str) -> Result<AbsolutePath> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(AbsolutePath { segments })
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{SEPARATOR}");
        }
        for seg in &self.segments {
            write!(f, "{SEPARATOR}{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for AbsolutePath {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        resolve(&AbsolutePath::root(), s)
    }
}

/// Resolve typed input against a base directory.
///
/// - empty input or `.` resolves to `base` unchanged;
/// - a leading separator starts resolution at root, ignoring `base`;
/// - `..` pops the last accumulated segment; popping past root is a no-op,
///   matching conventional shell behavior;
/// - consecutive separators collapse and a trailing separator is ignored.
///
/// Fails with `InvalidSegment` when a segment contains a character outside
/// the permitted name charset.
pub fn resolve(base: &AbsolutePath, input: &str) -> Result<AbsolutePath> {
    let mut segments: Vec<String> = if input.starts_with(SEPARATOR) {
        Vec::new()
    } else {
        base.segments.clone()
    };

    for raw in input.split(SEPARATOR) {
        match raw {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            name => {
                validate_segment(name)?;
                segments.push(name.to_string());
            },
        }
    }

    Ok(AbsolutePath { segments })
}

/// Validate a single name for use as a new child entry.
///
/// Rejects everything `validate_segment` rejects plus names a resolved
/// path can never contain (`.`, `..`, empty, embedded separator), so a
/// mutating tree operation cannot be handed a name that would break the
/// sibling-uniqueness or acyclicity invariants.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATOR) {
        return Err(SimError::InvalidSegment(name.to_string()));
    }
    validate_segment(name)
}

/// Permitted name charset: anything except the separator and ASCII control
/// characters. Spaces, dots, and non-ASCII names are all legal.
fn validate_segment(name: &str) -> Result<()> {
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err(SimError::InvalidSegment(name.to_string()));
    }
    Ok(())
}
