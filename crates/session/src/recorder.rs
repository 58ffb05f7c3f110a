//! Recording orchestrator
//!
//! Drives `playwright codegen` against a target URL. Recording is the
//! most environment-fragile activity in the system (it needs a real,
//! visible browser), so every failure path degrades to a generated
//! template rather than an error: the user always gets something
//! runnable.

use crate::config::SessionConfig;
use crate::locator::BinaryLocator;
use crate::materialize::remove_best_effort;
use crate::store::{Session, SessionLog, SessionStore};
use crate::supervisor::{playwright_env, playwright_invocation, CommandSpec, ProcessSupervisor};
use crate::template::recording_template;
use parking_lot::Mutex;
use scenably_common::{Error, Result, SessionInfo, SessionKind, SessionStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of starting a recording: the call returns before the codegen
/// process completes.
#[derive(Debug, Clone)]
pub struct RecorderStart {
    pub session_id: String,
    pub message: String,
}

/// Result of stopping a recording: always carries runnable code.
#[derive(Debug, Clone)]
pub struct RecorderStop {
    pub session_id: String,
    pub code: String,
    pub message: String,
}

/// Orchestrates interactive recording sessions
#[derive(Clone)]
pub struct Recorder {
    config: SessionConfig,
    store: SessionStore,
    locator: BinaryLocator,
    supervisor: ProcessSupervisor,
    temp_dir: PathBuf,
}

impl Recorder {
    pub fn new(config: SessionConfig, store: SessionStore) -> Result<Self> {
        let temp_dir = config.temp_dir_for(SessionKind::Recording);
        std::fs::create_dir_all(&temp_dir)?;
        let locator = BinaryLocator::new(config.clone());
        let supervisor = ProcessSupervisor::new(config.stop_grace());
        Ok(Self {
            config,
            store,
            locator,
            supervisor,
            temp_dir,
        })
    }

    /// Expected codegen output path for a session id
    fn output_path_for(&self, session_id: &str) -> PathBuf {
        self.temp_dir
            .join(format!("recording-{}.spec.ts", session_id))
    }

    /// Start recording against a URL. Non-blocking: returns once the
    /// session is registered; the codegen process runs asynchronously.
    pub async fn start(&self, url: &str, session_id: &str) -> Result<RecorderStart> {
        if self.store.contains(session_id) {
            return Err(Error::SessionActive {
                kind: SessionKind::Recording.to_string(),
                id: session_id.to_string(),
            });
        }

        let output = self.output_path_for(session_id);
        let session = Session::new(session_id, SessionKind::Recording)
            .with_url(url)
            .with_output(output.clone());
        let log = session.log.clone();
        let cancel = session.cancel.clone();
        self.store.insert(session)?;

        info!("Recording {} started for {}", session_id, url);

        let this = self.clone();
        let id = session_id.to_string();
        let url = url.to_string();
        tokio::spawn(async move {
            this.run_codegen(id, url, output, log, cancel).await;
        });

        Ok(RecorderStart {
            session_id: session_id.to_string(),
            message: "recording started".to_string(),
        })
    }

    async fn run_codegen(
        &self,
        session_id: String,
        url: String,
        output: PathBuf,
        log: Arc<Mutex<SessionLog>>,
        cancel: CancellationToken,
    ) {
        let cli = self.locator.find_playwright_cli();
        let (program, mut args) = playwright_invocation(&cli, &self.config);
        args.push("codegen".to_string());
        args.push(url.clone());
        args.push("--output".to_string());
        args.push(
            output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let spec = CommandSpec {
            program,
            args,
            cwd: self.temp_dir.clone(),
            env: playwright_env(&self.locator, &self.config),
        };

        let store = self.store.clone();
        let id = session_id.clone();
        let result = self
            .supervisor
            .run(spec, log, cancel, move |pid| {
                store.set_pid(&id, pid);
                store.update_status(&id, SessionStatus::Recording);
            })
            .await;

        let (terminal, write_fallback) = match result {
            Ok(exit) => {
                if exit.success() {
                    debug!("Codegen for {} completed", session_id);
                } else if !exit.stopped {
                    warn!(
                        "Codegen for {} exited with code {:?}",
                        session_id, exit.code
                    );
                }
                // After an explicit stop the stop() call owns the output
                // file; writing here would race its harvest-and-delete.
                (SessionStatus::Completed, !exit.stopped)
            }
            Err(e) => {
                warn!("Codegen for {} failed to start: {}", session_id, e);
                (SessionStatus::Error, true)
            }
        };

        // The user must end up with something runnable even when codegen
        // never produced output.
        if write_fallback && !output_is_readable(&output) {
            if let Err(e) = std::fs::write(&output, recording_template(&url)) {
                warn!(
                    "Failed to write fallback template for {}: {}",
                    session_id, e
                );
            }
        }

        self.store.update_status(&session_id, terminal);
        self.store.remove(&session_id);
    }

    /// Stop a recording and return the captured code.
    ///
    /// Never fails for unknown sessions: the store may have lost track
    /// after a crash or reload, so an orphaned output file at the
    /// expected path is still harvested, and when nothing is recoverable
    /// a template is returned.
    pub async fn stop(&self, session_id: &str) -> Result<RecorderStop> {
        let expected = self.output_path_for(session_id);

        let Some(session) = self.store.get(session_id) else {
            return Ok(self.harvest_orphan(session_id, &expected));
        };

        info!("Stopping recording {}", session_id);
        self.store
            .update_status(session_id, SessionStatus::Stopping);
        session.cancel.cancel();

        let code = self.poll_output(&expected).await;
        // The codegen task removes the session itself; this covers a stop
        // arriving before the process ever spawned.
        self.store.remove(session_id);
        remove_best_effort(&expected);

        match code {
            Some(code) => Ok(RecorderStop {
                session_id: session_id.to_string(),
                code,
                message: "recording captured".to_string(),
            }),
            None => {
                let url = session.url.as_deref().unwrap_or("about:blank");
                Ok(RecorderStop {
                    session_id: session_id.to_string(),
                    code: recording_template(url),
                    message: "recording produced no output, generated a template".to_string(),
                })
            }
        }
    }

    fn harvest_orphan(&self, session_id: &str, expected: &Path) -> RecorderStop {
        match std::fs::read_to_string(expected) {
            Ok(code) if !code.trim().is_empty() => {
                debug!(
                    "Recovered orphaned recording output for {}",
                    session_id
                );
                remove_best_effort(expected);
                RecorderStop {
                    session_id: session_id.to_string(),
                    code,
                    message: "recovered output from a previous session".to_string(),
                }
            }
            _ => RecorderStop {
                session_id: session_id.to_string(),
                code: recording_template("about:blank"),
                message: "no active recording session".to_string(),
            },
        }
    }

    /// Bounded poll for the output file to become readable
    async fn poll_output(&self, path: &Path) -> Option<String> {
        let attempts = self.config.recorder.output_poll_attempts;
        let interval =
            std::time::Duration::from_millis(self.config.recorder.output_poll_interval_ms);

        for _ in 0..attempts {
            if let Ok(code) = std::fs::read_to_string(path) {
                if !code.trim().is_empty() {
                    return Some(code);
                }
            }
            tokio::time::sleep(interval).await;
        }
        None
    }

    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.store.list()
    }
}

fn output_is_readable(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false)
}
