//! In-memory session state
//!
//! The session store is the single source of truth for "is an activity
//! currently running". It is owned by one orchestrator, mutated only by
//! that orchestrator and its process-event callbacks, and never touched
//! directly by callers above the orchestrator API.

use parking_lot::{Mutex, RwLock};
use scenably_common::{Error, Result, SessionInfo, SessionKind, SessionStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Captured child output, split by stream
#[derive(Debug, Default)]
pub struct SessionLog {
    pub stdout: String,
    pub stderr: String,
}

impl SessionLog {
    pub fn push_stdout(&mut self, line: &str) {
        self.stdout.push_str(line);
        self.stdout.push('\n');
    }

    pub fn push_stderr(&mut self, line: &str) {
        self.stderr.push_str(line);
        self.stderr.push('\n');
    }
}

/// One in-flight recording, debug, or execution activity
#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    pub status: SessionStatus,
    pub url: Option<String>,
    pub pid: Option<u32>,
    pub spec_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub started_at: i64,
    pub log: Arc<Mutex<SessionLog>>,
    /// Stop handle; cancelling it asks the supervisor to terminate the
    /// owned process
    pub cancel: CancellationToken,
    cleaned: Arc<AtomicBool>,
}

impl Session {
    pub fn new(id: impl Into<String>, kind: SessionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: SessionStatus::Starting,
            url: None,
            pid: None,
            spec_path: None,
            config_path: None,
            output_path: None,
            started_at: chrono::Utc::now().timestamp(),
            log: Arc::new(Mutex::new(SessionLog::default())),
            cancel: CancellationToken::new(),
            cleaned: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_run_files(mut self, spec: PathBuf, config: PathBuf) -> Self {
        self.spec_path = Some(spec);
        self.config_path = Some(config);
        self
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output_path = Some(output);
        self
    }

    /// Claim the one-shot right to delete this session's temp files.
    ///
    /// Returns true exactly once across all clones of the session, so a
    /// close handler and a concurrent stop cannot double-delete.
    pub fn try_claim_cleanup(&self) -> bool {
        !self.cleaned.swap(true, Ordering::SeqCst)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            kind: self.kind,
            status: self.status,
            url: self.url.clone(),
            pid: self.pid,
            spec_path: self.spec_path.clone(),
            started_at: self.started_at,
        }
    }
}

/// Mapping from session id to session state, one per orchestrator
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session, rejecting duplicate ids
    pub fn insert(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id) {
            return Err(Error::SessionActive {
                kind: session.kind.to_string(),
                id: session.id,
            });
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().remove(id)
    }

    pub fn update_status(&self, id: &str, status: SessionStatus) {
        if let Some(session) = self.sessions.write().get_mut(id) {
            session.status = status;
        }
    }

    pub fn set_pid(&self, id: &str, pid: u32) {
        if let Some(session) = self.sessions.write().get_mut(id) {
            session.pid = Some(pid);
        }
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        self.sessions.read().values().map(Session::info).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
