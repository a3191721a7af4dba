//! Per-session simulators and the multi-session facade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use hacklab_shell::{CommandOutput, CompletionCandidate, SessionState};
use hacklab_types::{ErrorKind, Result, SimError};
use hacklab_vfs::{AbsolutePath, FileKind, FileMeta, Vfs};

use crate::scenario::Scenario;

/// Result of one command line, shaped for transport to the lab UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub output: String,
    pub current_directory: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorKind>,
    pub clear_screen: bool,
}

/// One user's lab terminal: a filesystem plus shell state, provisioned
/// from a scenario and never shared with another session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSession {
    scenario: Scenario,
    vfs: Vfs,
    state: SessionState,
}

impl LabSession {
    /// Provision a fresh session from a scenario.
    pub fn new(scenario: Scenario) -> Result<Self> {
        let vfs = scenario.build_vfs()?;
        let state = SessionState::new(&scenario.user);
        Ok(Self {
            scenario,
            vfs,
            state,
        })
    }

    /// Execute one raw input line. Command failures are folded into the
    /// response; they never tear down the session.
    pub fn execute(&mut self, line: &str) -> ExecuteResponse {
        match hacklab_shell::execute(line, &mut self.state, &mut self.vfs) {
            Ok(CommandOutput::Text(output)) => self.response(output, None, false),
            Ok(CommandOutput::None) => self.response(String::new(), None, false),
            Ok(CommandOutput::Clear) => self.response(String::new(), None, true),
            Ok(CommandOutput::Reset) => match self.reset() {
                Ok(()) => self.response(String::new(), None, true),
                Err(e) => self.response(e.to_string(), Some(e.kind()), false),
            },
            Err(e) => self.response(e.to_string(), Some(e.kind()), false),
        }
    }

    fn response(
        &self,
        output: String,
        error: Option<ErrorKind>,
        clear_screen: bool,
    ) -> ExecuteResponse {
        ExecuteResponse {
            output,
            current_directory: self.state.cwd().to_string(),
            error,
            clear_screen,
        }
    }

    /// Ranked completion candidates for a partially typed line.
    pub fn completions(&self, partial: &str) -> Vec<CompletionCandidate> {
        hacklab_shell::complete(partial, &self.state, &self.vfs)
    }

    pub fn current_directory(&self) -> String {
        self.state.cwd().to_string()
    }

    /// Rebuild the filesystem from the scenario and return the cursor
    /// home, as if the lab had just started.
    pub fn reset(&mut self) -> Result<()> {
        self.vfs = self.scenario.build_vfs()?;
        self.state.reset();
        Ok(())
    }

    /// The session's filesystem, for challenge setup between commands.
    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        &mut self.vfs
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

/// The multi-session engine the web layer talks to.
///
/// Sessions are independent instances; operations for one session are
/// serialized behind that session's own lock, so two requests for the
/// same session never interleave while separate sessions proceed in
/// parallel.
pub struct Simulator {
    scenario: Scenario,
    sessions: RwLock<HashMap<String, Arc<Mutex<LabSession>>>>,
}

impl Simulator {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session under a caller-chosen identifier.
    pub fn open_session(&self, id: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(id) {
            return Err(SimError::Session(format!("session already open: {id}")));
        }
        let session = LabSession::new(self.scenario.clone())?;
        sessions.insert(id.to_string(), Arc::new(Mutex::new(session)));
        log::info!("opened session {id} (scenario {})", self.scenario.name);
        Ok(())
    }

    pub fn close_session(&self, id: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .remove(id)
            .map(|_| log::info!("closed session {id}"))
            .ok_or_else(|| SimError::Session(format!("no such session: {id}")))
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<LabSession>>> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| SimError::Session(format!("no such session: {id}")))
    }

    /// Execute one raw input line in a session.
    pub fn execute_command(&self, id: &str, line: &str) -> Result<ExecuteResponse> {
        let session = self.session(id)?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.execute(line))
    }

    /// Completion candidate strings for a partially typed line, ranked.
    pub fn get_completions(&self, id: &str, partial: &str) -> Result<Vec<String>> {
        let session = self.session(id)?;
        let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard
            .completions(partial)
            .into_iter()
            .map(|c| c.text)
            .collect())
    }

    pub fn current_directory(&self, id: &str) -> Result<String> {
        let session = self.session(id)?;
        let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.current_directory())
    }

    /// Plant a file in a session's filesystem, for challenge setup after
    /// the session has started.
    pub fn create_file(&self, id: &str, path: &str, content: &str, flag: bool) -> Result<()> {
        let session = self.session(id)?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        let path: AbsolutePath = path.parse()?;
        let name = path
            .file_name()
            .ok_or_else(|| SimError::AlreadyExists(path.to_string()))?;
        let meta = FileMeta {
            kind: if flag { FileKind::Flag } else { FileKind::Regular },
        };
        guard
            .vfs_mut()
            .create_file(&path.parent(), name, content, meta)?;
        Ok(())
    }

    /// Create a directory in a session's filesystem, for challenge setup
    /// after the session has started.
    pub fn create_directory(&self, id: &str, path: &str) -> Result<()> {
        let session = self.session(id)?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        let path: AbsolutePath = path.parse()?;
        let name = path
            .file_name()
            .ok_or_else(|| SimError::AlreadyExists(path.to_string()))?;
        guard.vfs_mut().create_dir(&path.parent(), name)?;
        Ok(())
    }

    /// Re-provision a session from its scenario.
    pub fn reset_session(&self, id: &str) -> Result<()> {
        let session = self.session(id)?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        guard.reset()
    }

    /// Serialize a session (filesystem and shell state) to JSON.
    pub fn snapshot(&self, id: &str) -> Result<String> {
        let session = self.session(id)?;
        let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(serde_json::to_string(&*guard)?)
    }

    /// Restore a session from a snapshot, replacing any session already
    /// open under that identifier.
    pub fn restore(&self, id: &str, snapshot: &str) -> Result<()> {
        let session: LabSession = serde_json::from_str(snapshot)?;
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(id.to_string(), Arc::new(Mutex::new(session)));
        log::info!("restored session {id}");
        Ok(())
    }
}
