//! Core types for Scenably sessions and executions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of browser-automation activity a session performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Recording,
    Debug,
    Execution,
}

impl SessionKind {
    /// Short name used in temp-directory and file names
    pub fn prefix(&self) -> &'static str {
        match self {
            SessionKind::Recording => "recording",
            SessionKind::Debug => "debug",
            SessionKind::Execution => "exec",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Session lifecycle state
///
/// Transitions are ordered: `Starting` -> `Recording`/`Running` ->
/// `Stopping` -> `Completed`/`Error`. Terminal states are immediately
/// followed by removal from the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Recording,
    Running,
    Stopping,
    Completed,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Recording | SessionStatus::Running)
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Starting
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Starting => write!(f, "starting"),
            SessionStatus::Recording => write!(f, "recording"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Stopping => write!(f, "stopping"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

/// Final status of a background execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Failure,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Captured result of an execution, serialized into the persisted record
///
/// A run that reached process exit carries the exit code and captured
/// output; a run that never spawned carries only the error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionOutcome {
    Completed {
        #[serde(rename = "exitCode")]
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Failed {
        error: String,
    },
}

/// Update pushed to the execution persistence collaborator on completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionUpdate {
    pub status: ExecutionStatus,
    /// JSON-encoded [`ExecutionOutcome`]
    pub result: String,
    pub completed_at: i64,
}

/// Change notification pushed to listening UI surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub result: String,
}

/// Introspection snapshot of an active session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub kind: SessionKind,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<PathBuf>,
    pub started_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Error.is_terminal());
        assert!(!SessionStatus::Stopping.is_terminal());
        assert!(SessionStatus::Running.is_active());
        assert!(!SessionStatus::Starting.is_active());
    }

    #[test]
    fn outcome_serializes_camel_case() {
        let outcome = ExecutionOutcome::Completed {
            exit_code: Some(0),
            stdout: "1 passed".to_string(),
            stderr: String::new(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"exitCode\":0"));
        assert!(json.contains("1 passed"));

        let failed = ExecutionOutcome::Failed {
            error: "ENOENT".to_string(),
        };
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(json, "{\"error\":\"ENOENT\"}");
    }
}
