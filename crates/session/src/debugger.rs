//! Interactive debug orchestrator
//!
//! Runs a scenario through the automation CLI's interactive debug mode.
//! Unlike recording and background execution, starting a debug session
//! blocks until the debug run's process closes: a human is driving the
//! step-through session, and the caller wants the outcome of that run.

use crate::config::SessionConfig;
use crate::locator::BinaryLocator;
use crate::materialize::{remove_best_effort, CodeMaterializer, RunOptions};
use crate::normalize;
use crate::store::{Session, SessionStore};
use crate::supervisor::{playwright_env, playwright_invocation, CommandSpec, ProcessSupervisor};
use scenably_common::{Error, Result, SessionInfo, SessionKind, SessionStatus};
use tracing::info;

/// Outcome of a completed debug run
#[derive(Debug, Clone)]
pub struct DebugResult {
    pub session_id: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Orchestrates interactive debug sessions
#[derive(Clone)]
pub struct Debugger {
    config: SessionConfig,
    store: SessionStore,
    locator: BinaryLocator,
    materializer: CodeMaterializer,
    supervisor: ProcessSupervisor,
}

impl Debugger {
    pub fn new(config: SessionConfig, store: SessionStore) -> Result<Self> {
        let locator = BinaryLocator::new(config.clone());
        let materializer = CodeMaterializer::new(config.temp_dir_for(SessionKind::Debug))?;
        let supervisor = ProcessSupervisor::new(config.stop_grace());
        Ok(Self {
            config,
            store,
            locator,
            materializer,
            supervisor,
        })
    }

    /// Run a debug session to completion.
    ///
    /// Rejects duplicate ids and unrecognizable code before any file is
    /// written or process spawned. A spawn failure removes the session,
    /// cleans its files, and surfaces as this call's error.
    pub async fn start_debug_session(&self, code: &str, session_id: &str) -> Result<DebugResult> {
        if self.store.contains(session_id) {
            return Err(Error::SessionActive {
                kind: SessionKind::Debug.to_string(),
                id: session_id.to_string(),
            });
        }

        let code = normalize::normalize(code)?;

        let options = RunOptions {
            browser: self.config.playwright.default_browser.clone(),
            executable_path: self.locator.find_chromium_executable(),
            headless: false,
        };
        let files =
            self.materializer
                .write_run_files(SessionKind::Debug, session_id, &code, &options)?;

        let session = Session::new(session_id, SessionKind::Debug)
            .with_run_files(files.spec_path.clone(), files.config_path.clone());
        let log = session.log.clone();
        let cancel = session.cancel.clone();
        self.store.insert(session)?;

        info!("Debug session {} started", session_id);

        let cli = self.locator.find_playwright_cli();
        let (program, mut args) = playwright_invocation(&cli, &self.config);
        args.push("test".to_string());
        args.push(format!("--config={}", files.config_name()));
        args.push(files.spec_name());
        args.push("--debug".to_string());

        let spec = CommandSpec {
            program,
            args,
            cwd: self.materializer.temp_dir().to_path_buf(),
            env: playwright_env(&self.locator, &self.config),
        };

        let store = self.store.clone();
        let id = session_id.to_string();
        let result = self
            .supervisor
            .run(spec, log.clone(), cancel, move |pid| {
                store.set_pid(&id, pid);
                store.update_status(&id, SessionStatus::Running);
            })
            .await;

        match result {
            Ok(exit) => {
                let terminal = if exit.success() {
                    SessionStatus::Completed
                } else {
                    SessionStatus::Error
                };
                self.store.update_status(session_id, terminal);
                self.cleanup(session_id);

                let captured = log.lock();
                let mut output = captured.stdout.clone();
                output.push_str(&captured.stderr);

                info!(
                    "Debug session {} finished with code {:?}",
                    session_id, exit.code
                );
                Ok(DebugResult {
                    session_id: session_id.to_string(),
                    success: exit.success(),
                    exit_code: exit.code,
                    output,
                })
            }
            Err(e) => {
                self.store.update_status(session_id, SessionStatus::Error);
                self.cleanup(session_id);
                Err(e)
            }
        }
    }

    /// Request termination of a running debug session. Idempotent.
    pub fn stop_debug_session(&self, session_id: &str) -> Result<()> {
        if let Some(session) = self.store.get(session_id) {
            info!("Stopping debug session {}", session_id);
            self.store
                .update_status(session_id, SessionStatus::Stopping);
            session.cancel.cancel();
        }
        Ok(())
    }

    fn cleanup(&self, session_id: &str) {
        if let Some(session) = self.store.remove(session_id) {
            if session.try_claim_cleanup() {
                if let Some(path) = &session.spec_path {
                    remove_best_effort(path);
                }
                if let Some(path) = &session.config_path {
                    remove_best_effort(path);
                }
            }
        }
    }

    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.store.list()
    }
}
