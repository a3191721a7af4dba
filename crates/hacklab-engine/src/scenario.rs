//! Lab scenario provisioning.
//!
//! A scenario is a TOML document describing the lab user plus the
//! directories and files (including planted flags) to seed into a fresh
//! filesystem. The provisioning collaborator hands a scenario to the
//! engine at session start; `reset` rebuilds from the same scenario.

use serde::{Deserialize, Serialize};

use hacklab_types::{Result, SimError};
use hacklab_vfs::{AbsolutePath, FileKind, FileMeta, Vfs};

/// A challenge image: who the user is and what their filesystem holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub user: String,
    #[serde(default, rename = "dir")]
    pub dirs: Vec<DirSpec>,
    #[serde(default, rename = "file")]
    pub files: Vec<FileSpec>,
}

/// A directory to create, parents included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirSpec {
    pub path: String,
}

/// A file to plant. `flag = true` marks it for the scoring collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub flag: bool,
}

impl Scenario {
    /// Parse a scenario document.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// A scenario with nothing but a home directory, for labs that bring
    /// their own provisioning.
    pub fn bare(user: &str) -> Self {
        Self {
            name: "bare".to_string(),
            user: user.to_string(),
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Build a fresh filesystem image for this scenario.
    ///
    /// `/home/<user>` always exists. Parent directories of declared
    /// entries are created on demand, so a file entry doesn't need its
    /// whole chain spelled out. Declaring the same path twice is an
    /// authoring error and fails with `AlreadyExists`.
    pub fn build_vfs(&self) -> Result<Vfs> {
        let mut vfs = Vfs::new();
        ensure_dir_chain(&mut vfs, &format!("/home/{}", self.user).parse()?)?;

        for dir in &self.dirs {
            ensure_dir_chain(&mut vfs, &dir.path.parse()?)?;
        }
        for file in &self.files {
            let path: AbsolutePath = file.path.parse()?;
            let Some(name) = path.file_name() else {
                return Err(SimError::Scenario(format!(
                    "file entry has no name: {}",
                    file.path
                )));
            };
            ensure_dir_chain(&mut vfs, &path.parent())?;
            let meta = FileMeta {
                kind: if file.flag {
                    FileKind::Flag
                } else {
                    FileKind::Regular
                },
            };
            vfs.create_file(&path.parent(), name, file.content.clone(), meta)?;
        }
        Ok(vfs)
    }
}

/// Create every missing directory along `path`.
fn ensure_dir_chain(vfs: &mut Vfs, path: &AbsolutePath) -> Result<()> {
    let mut current = AbsolutePath::root();
    for seg in path.segments() {
        let next = current.join(seg)?;
        if !vfs.exists(&next) {
            vfs.create_dir(&current, seg)?;
        } else if !vfs.is_dir(&next) {
            return Err(SimError::NotADirectory(next.to_string()));
        }
        current = next;
    }
    Ok(())
}
