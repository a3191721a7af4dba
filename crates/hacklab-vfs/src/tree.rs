//! The in-memory filesystem tree.
//!
//! One tree per lab session. Children are owned exclusively by their
//! parent directory, which makes cycles unrepresentable; sibling names are
//! unique because children live in a map. `BTreeMap` keeps listings in
//! lexicographic order, which completion and test output rely on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hacklab_types::{Result, SimError};

use crate::path::{self, AbsolutePath};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// What a file means to the lab around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    #[default]
    Regular,
    /// A planted challenge flag. Indistinguishable from a regular file to
    /// shell commands; the scoring collaborator checks for it.
    Flag,
}

/// Per-file metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMeta {
    pub kind: FileKind,
}

/// Metadata for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    pub size: u64,
}

/// One listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

impl DirEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FsNode {
    Dir {
        children: BTreeMap<String, FsNode>,
    },
    File {
        content: String,
        #[serde(default)]
        meta: FileMeta,
    },
}

impl FsNode {
    fn empty_dir() -> Self {
        FsNode::Dir {
            children: BTreeMap::new(),
        }
    }

    fn size(&self) -> u64 {
        match self {
            FsNode::Dir { .. } => 0,
            FsNode::File { content, .. } => content.len() as u64,
        }
    }
}

/// The simulated filesystem for one lab session.
///
/// Mutating operations only ever touch the owning directory's children
/// map, so a failed operation leaves the tree untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vfs {
    root: FsNode,
}

impl Vfs {
    /// A filesystem containing only the root directory.
    pub fn new() -> Self {
        Self {
            root: FsNode::empty_dir(),
        }
    }

    /// Walk from root to the node at `path`.
    fn node(&self, path: &AbsolutePath) -> Result<&FsNode> {
        let mut current = &self.root;
        for seg in path.segments() {
            match current {
                FsNode::Dir { children } => {
                    current = children
                        .get(seg)
                        .ok_or_else(|| SimError::NotFound(path.to_string()))?;
                },
                FsNode::File { .. } => {
                    return Err(SimError::NotADirectory(path.to_string()));
                },
            }
        }
        Ok(current)
    }

    /// Walk to the directory at `path` and hand back its children map.
    fn children_mut(&mut self, path: &AbsolutePath) -> Result<&mut BTreeMap<String, FsNode>> {
        let mut current = &mut self.root;
        for seg in path.segments() {
            match current {
                FsNode::Dir { children } => {
                    current = children
                        .get_mut(seg)
                        .ok_or_else(|| SimError::NotFound(path.to_string()))?;
                },
                FsNode::File { .. } => {
                    return Err(SimError::NotADirectory(path.to_string()));
                },
            }
        }
        match current {
            FsNode::Dir { children } => Ok(children),
            FsNode::File { .. } => Err(SimError::NotADirectory(path.to_string())),
        }
    }

    pub fn exists(&self, path: &AbsolutePath) -> bool {
        self.node(path).is_ok()
    }

    pub fn is_dir(&self, path: &AbsolutePath) -> bool {
        matches!(self.node(path), Ok(FsNode::Dir { .. }))
    }

    /// Node metadata, or `NotFound`/`NotADirectory` when the walk fails.
    pub fn stat(&self, path: &AbsolutePath) -> Result<Metadata> {
        let node = self.node(path)?;
        Ok(Metadata {
            kind: match node {
                FsNode::Dir { .. } => EntryKind::Directory,
                FsNode::File { .. } => EntryKind::File,
            },
            size: node.size(),
        })
    }

    /// List the children of a directory, lexicographically by name.
    pub fn list(&self, path: &AbsolutePath) -> Result<Vec<DirEntry>> {
        match self.node(path)? {
            FsNode::Dir { children } => Ok(children
                .iter()
                .map(|(name, node)| DirEntry {
                    name: name.clone(),
                    kind: match node {
                        FsNode::Dir { .. } => EntryKind::Directory,
                        FsNode::File { .. } => EntryKind::File,
                    },
                    size: node.size(),
                })
                .collect()),
            FsNode::File { .. } => Err(SimError::NotADirectory(path.to_string())),
        }
    }

    /// Read a file's text content.
    pub fn read_file(&self, path: &AbsolutePath) -> Result<&str> {
        match self.node(path)? {
            FsNode::File { content, .. } => Ok(content),
            FsNode::Dir { .. } => Err(SimError::IsADirectory(path.to_string())),
        }
    }

    /// Metadata of a file, including its lab-facing kind.
    pub fn file_meta(&self, path: &AbsolutePath) -> Result<FileMeta> {
        match self.node(path)? {
            FsNode::File { meta, .. } => Ok(*meta),
            FsNode::Dir { .. } => Err(SimError::IsADirectory(path.to_string())),
        }
    }

    /// Create an empty directory under `parent`.
    pub fn create_dir(&mut self, parent: &AbsolutePath, name: &str) -> Result<AbsolutePath> {
        path::validate_name(name)?;
        let created = parent.join(name)?;
        let children = self.children_mut(parent)?;
        if children.contains_key(name) {
            return Err(SimError::AlreadyExists(created.to_string()));
        }
        children.insert(name.to_string(), FsNode::empty_dir());
        Ok(created)
    }

    /// Create a file under `parent`.
    pub fn create_file(
        &mut self,
        parent: &AbsolutePath,
        name: &str,
        content: impl Into<String>,
        meta: FileMeta,
    ) -> Result<AbsolutePath> {
        path::validate_name(name)?;
        let created = parent.join(name)?;
        let children = self.children_mut(parent)?;
        if children.contains_key(name) {
            return Err(SimError::AlreadyExists(created.to_string()));
        }
        children.insert(
            name.to_string(),
            FsNode::File {
                content: content.into(),
                meta,
            },
        );
        Ok(created)
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}
