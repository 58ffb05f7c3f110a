//! Background execution orchestrator
//!
//! Runs a scenario headlessly and fire-and-forget: the caller gets an
//! immediate accept/reject, and the outcome travels through the
//! execution sink, the notifier, and the completion callback once the
//! process closes. A spawn failure is recorded exactly like a nonzero
//! exit, with the error message standing in for captured output.

use crate::config::SessionConfig;
use crate::locator::BinaryLocator;
use crate::materialize::{remove_best_effort, CodeMaterializer, RunFiles, RunOptions};
use crate::normalize;
use crate::sink::{ExecutionNotifier, ExecutionSink};
use crate::store::{Session, SessionLog, SessionStore};
use crate::supervisor::{playwright_env, playwright_invocation, CommandSpec, ProcessSupervisor};
use parking_lot::Mutex;
use scenably_common::{
    Error, ExecutionEvent, ExecutionOutcome, ExecutionStatus, ExecutionUpdate, Result,
    SessionInfo, SessionKind, SessionStatus,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Orchestrates headless background executions
#[derive(Clone)]
pub struct Executor {
    config: SessionConfig,
    store: SessionStore,
    locator: BinaryLocator,
    materializer: CodeMaterializer,
    supervisor: ProcessSupervisor,
    sink: Arc<dyn ExecutionSink>,
    notifier: Arc<dyn ExecutionNotifier>,
}

impl Executor {
    pub fn new(
        config: SessionConfig,
        store: SessionStore,
        sink: Arc<dyn ExecutionSink>,
        notifier: Arc<dyn ExecutionNotifier>,
    ) -> Result<Self> {
        let locator = BinaryLocator::new(config.clone());
        let materializer = CodeMaterializer::new(config.temp_dir_for(SessionKind::Execution))?;
        let supervisor = ProcessSupervisor::new(config.stop_grace());
        Ok(Self {
            config,
            store,
            locator,
            materializer,
            supervisor,
            sink,
            notifier,
        })
    }

    /// Start a background execution.
    ///
    /// Validates synchronously (duplicate id, code shape) and returns
    /// before the process completes. `on_complete` fires exactly once
    /// with the final status, after the sink and notifier have been
    /// informed.
    pub fn execute_in_background<F>(
        &self,
        execution_id: &str,
        scenario_id: &str,
        code: &str,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(ExecutionStatus) + Send + 'static,
    {
        if self.store.contains(execution_id) {
            return Err(Error::SessionActive {
                kind: SessionKind::Execution.to_string(),
                id: execution_id.to_string(),
            });
        }

        // Local validation error, raised before any side effect
        let code = normalize::normalize(code)?;

        let options = RunOptions {
            browser: self.config.playwright.default_browser.clone(),
            executable_path: self.locator.find_chromium_executable(),
            headless: true,
        };
        let files = self.materializer.write_run_files(
            SessionKind::Execution,
            execution_id,
            &code,
            &options,
        )?;

        let session = Session::new(execution_id, SessionKind::Execution)
            .with_run_files(files.spec_path.clone(), files.config_path.clone());
        let log = session.log.clone();
        let cancel = session.cancel.clone();
        self.store.insert(session)?;

        info!(
            "Execution {} started for scenario {}",
            execution_id, scenario_id
        );

        let this = self.clone();
        let execution_id = execution_id.to_string();
        tokio::spawn(async move {
            this.run_to_completion(execution_id, files, log, cancel, on_complete)
                .await;
        });

        Ok(())
    }

    async fn run_to_completion<F>(
        &self,
        execution_id: String,
        files: RunFiles,
        log: Arc<Mutex<SessionLog>>,
        cancel: CancellationToken,
        on_complete: F,
    ) where
        F: FnOnce(ExecutionStatus) + Send + 'static,
    {
        let cli = self.locator.find_playwright_cli();
        let (program, mut args) = playwright_invocation(&cli, &self.config);
        args.push("test".to_string());
        args.push(format!("--config={}", files.config_name()));
        args.push(files.spec_name());

        let spec = CommandSpec {
            program,
            args,
            cwd: self.materializer.temp_dir().to_path_buf(),
            env: playwright_env(&self.locator, &self.config),
        };

        let store = self.store.clone();
        let id = execution_id.clone();
        let result = self
            .supervisor
            .run(spec, log.clone(), cancel, move |pid| {
                store.set_pid(&id, pid);
                store.update_status(&id, SessionStatus::Running);
            })
            .await;

        let (status, outcome) = match result {
            Ok(exit) => {
                let captured = log.lock();
                let status = if exit.success() {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::Failure
                };
                (
                    status,
                    ExecutionOutcome::Completed {
                        exit_code: exit.code,
                        stdout: captured.stdout.clone(),
                        stderr: captured.stderr.clone(),
                    },
                )
            }
            Err(e) => (
                ExecutionStatus::Failure,
                ExecutionOutcome::Failed {
                    error: e.to_string(),
                },
            ),
        };

        self.finish(&execution_id, status, outcome, on_complete)
            .await;
    }

    /// Terminal transition: remove the session, delete its temp files
    /// once, persist the record, notify listeners, fire the callback.
    async fn finish<F>(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        outcome: ExecutionOutcome,
        on_complete: F,
    ) where
        F: FnOnce(ExecutionStatus) + Send + 'static,
    {
        let terminal = match status {
            ExecutionStatus::Success => SessionStatus::Completed,
            ExecutionStatus::Failure => SessionStatus::Error,
        };
        self.store.update_status(execution_id, terminal);
        if let Some(session) = self.store.remove(execution_id) {
            if session.try_claim_cleanup() {
                if let Some(path) = &session.spec_path {
                    remove_best_effort(path);
                }
                if let Some(path) = &session.config_path {
                    remove_best_effort(path);
                }
            }
        }

        let result = serde_json::to_string(&outcome)
            .unwrap_or_else(|_| "{\"error\":\"unserializable outcome\"}".to_string());

        let update = ExecutionUpdate {
            status,
            result: result.clone(),
            completed_at: chrono::Utc::now().timestamp(),
        };
        // Persistence failure never affects the session outcome
        if let Err(e) = self.sink.update_execution(execution_id, update).await {
            warn!("Failed to persist execution {}: {}", execution_id, e);
        }

        self.notifier.notify(ExecutionEvent {
            execution_id: execution_id.to_string(),
            status,
            result,
        });

        info!("Execution {} finished: {}", execution_id, status);
        on_complete(status);
    }

    /// Request termination of a running execution. Idempotent: an absent
    /// or already-finished execution is a no-op.
    pub fn stop_execution(&self, execution_id: &str) -> Result<()> {
        if let Some(session) = self.store.get(execution_id) {
            self.store
                .update_status(execution_id, SessionStatus::Stopping);
            session.cancel.cancel();
        }
        Ok(())
    }

    pub fn active_executions(&self) -> Vec<SessionInfo> {
        self.store.list()
    }
}
