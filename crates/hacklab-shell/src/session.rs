//! Per-session shell state.
//!
//! One instance per active lab session. The current directory is stored as
//! a resolved path and validated against the filesystem lazily at use
//! time, since challenge setup may reshape the tree between calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hacklab_vfs::AbsolutePath;

/// Maximum number of history entries to retain.
const MAX_HISTORY: usize = 500;

/// Cursor, history, and environment for one lab session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    cwd: AbsolutePath,
    history: Vec<String>,
    env: BTreeMap<String, String>,
}

impl SessionState {
    /// Fresh state for `user`, with the cursor at `$HOME`.
    pub fn new(user: &str) -> Self {
        let home = format!("/home/{user}");
        let mut env = BTreeMap::new();
        env.insert("USER".to_string(), user.to_string());
        env.insert("HOME".to_string(), home.clone());
        env.insert("SHELL".to_string(), "/bin/labsh".to_string());
        Self {
            cwd: home.parse().unwrap_or_else(|_| AbsolutePath::root()),
            history: Vec::new(),
            env,
        }
    }

    pub fn cwd(&self) -> &AbsolutePath {
        &self.cwd
    }

    pub(crate) fn set_cwd(&mut self, cwd: AbsolutePath) {
        self.cwd = cwd;
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Append a raw input line. Every executed line lands here, including
    /// ones that go on to fail.
    pub(crate) fn push_history(&mut self, line: &str) {
        self.history.push(line.to_string());
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.env.insert(name.to_string(), value.to_string());
    }

    /// Environment entries in name order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn user(&self) -> &str {
        self.var("USER").unwrap_or("user")
    }

    /// `$HOME` as a resolved path; falls back to root if unset or mangled.
    pub fn home(&self) -> AbsolutePath {
        self.var("HOME")
            .and_then(|h| h.parse().ok())
            .unwrap_or_else(AbsolutePath::root)
    }

    /// Return the cursor to `$HOME` and drop accumulated history. Identity
    /// variables survive a reset.
    pub fn reset(&mut self) {
        self.cwd = self.home();
        self.history.clear();
    }
}
