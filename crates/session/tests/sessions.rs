//! Orchestrator integration tests
//!
//! These run the real supervisor against stub "playwright" executables
//! written into temp directories, injected through the config's binary
//! override. No network or real browser is involved.

#![cfg(unix)]

use scenably_common::{ExecutionStatus, SessionStatus};
use scenably_session::sink::{MemorySink, NullNotifier};
use scenably_session::{Debugger, Executor, Recorder, SessionConfig, SessionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const TEST_CODE: &str = r#"
import { test, expect } from '@playwright/test';

test('smoke', async ({ page }) => {
  await page.goto('https://example.com/');
  await expect(page.locator('h1')).toBeVisible();
});
"#;

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config_with_stub(stub: &Path, root: &Path) -> SessionConfig {
    let mut config = SessionConfig {
        app_root: root.to_path_buf(),
        temp_root: Some(root.join("tmp")),
        stop_grace_ms: 200,
        ..Default::default()
    };
    config.playwright.binary_path = Some(stub.to_path_buf());
    config.recorder.output_poll_attempts = 3;
    config.recorder.output_poll_interval_ms = 100;
    config
}

async fn run_execution(
    executor: &Executor,
    execution_id: &str,
    code: &str,
) -> ExecutionStatus {
    let (tx, rx) = tokio::sync::oneshot::channel();
    executor
        .execute_in_background(execution_id, "scn-1", code, move |status| {
            let _ = tx.send(status);
        })
        .unwrap();
    tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .expect("execution did not complete in time")
        .expect("completion callback dropped")
}

#[tokio::test]
async fn execution_success_persists_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "echo '1 passed'; exit 0");
    let sink = MemorySink::new();
    let executor = Executor::new(
        config_with_stub(&stub, dir.path()),
        SessionStore::new(),
        Arc::new(sink.clone()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let status = run_execution(&executor, "exec-1", TEST_CODE).await;
    assert_eq!(status, ExecutionStatus::Success);

    let updates = sink.updates_for("exec-1");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, ExecutionStatus::Success);
    assert!(updates[0].result.contains("1 passed"));
    assert!(executor.active_executions().is_empty());
}

#[tokio::test]
async fn execution_failure_records_failure_and_cleans_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "echo 'boom' 1>&2; exit 1");
    let sink = MemorySink::new();
    let config = config_with_stub(&stub, dir.path());
    let exec_dir = config.temp_dir_for(scenably_common::SessionKind::Execution);
    let executor = Executor::new(
        config,
        SessionStore::new(),
        Arc::new(sink.clone()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let status = run_execution(&executor, "exec-2", TEST_CODE).await;
    assert_eq!(status, ExecutionStatus::Failure);

    let updates = sink.updates_for("exec-2");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, ExecutionStatus::Failure);
    assert!(updates[0].result.contains("boom"));

    assert!(!exec_dir.join("exec-exec-2.spec.ts").exists());
    assert!(!exec_dir.join("playwright.config.exec-exec-2.ts").exists());
    assert!(executor.active_executions().is_empty());
}

#[tokio::test]
async fn spawn_failure_is_recorded_like_a_failed_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_stub(&dir.path().join("missing"), dir.path());
    config.playwright.binary_path = Some(PathBuf::from("/nonexistent/playwright"));
    let sink = MemorySink::new();
    let executor = Executor::new(
        config,
        SessionStore::new(),
        Arc::new(sink.clone()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let status = run_execution(&executor, "exec-3", TEST_CODE).await;
    assert_eq!(status, ExecutionStatus::Failure);

    let updates = sink.updates_for("exec-3");
    assert_eq!(updates.len(), 1);
    assert!(updates[0].result.contains("error"));
    assert!(executor.active_executions().is_empty());
}

#[tokio::test]
async fn duplicate_execution_id_is_rejected_without_a_second_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "sleep 30");
    let executor = Executor::new(
        config_with_stub(&stub, dir.path()),
        SessionStore::new(),
        Arc::new(MemorySink::new()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    executor
        .execute_in_background("exec-dup", "scn-1", TEST_CODE, move |status| {
            let _ = tx.send(status);
        })
        .unwrap();

    let err = executor
        .execute_in_background("exec-dup", "scn-1", TEST_CODE, |_| {})
        .unwrap_err();
    assert!(matches!(
        err,
        scenably_common::Error::SessionActive { .. }
    ));
    assert_eq!(executor.active_executions().len(), 1);

    executor.stop_execution("exec-dup").unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(10), rx).await;
}

#[tokio::test]
async fn executor_rejects_garbage_code_before_any_side_effect() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "exit 0");
    let config = config_with_stub(&stub, dir.path());
    let exec_dir = config.temp_dir_for(scenably_common::SessionKind::Execution);
    let executor = Executor::new(
        config,
        SessionStore::new(),
        Arc::new(MemorySink::new()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let err = executor
        .execute_in_background("exec-bad", "scn-1", "garbage-not-code", |_| {})
        .unwrap_err();
    assert!(matches!(err, scenably_common::Error::InvalidCode(_)));
    assert!(executor.active_executions().is_empty());
    assert!(!exec_dir.join("exec-exec-bad.spec.ts").exists());
}

#[tokio::test]
async fn recorder_stop_before_output_returns_a_template() {
    let dir = tempfile::tempdir().unwrap();
    // Codegen stand-in that never writes its output file
    let stub = write_stub(dir.path(), "playwright", "sleep 30");
    let store = SessionStore::new();
    let recorder = Recorder::new(config_with_stub(&stub, dir.path()), store.clone()).unwrap();

    recorder
        .start("https://example.com", "rec-1")
        .await
        .unwrap();
    let stopped = recorder.stop("rec-1").await.unwrap();

    assert!(!stopped.code.is_empty());
    assert!(stopped.code.contains("https://example.com"));
    assert!(stopped.code.contains("test("));

    // A second stop must not throw either
    let again = recorder.stop("rec-1").await.unwrap();
    assert!(!again.code.is_empty());
}

#[tokio::test]
async fn recorder_harvests_output_written_by_codegen() {
    let dir = tempfile::tempdir().unwrap();
    // Writes its --output argument then waits to be stopped
    let stub = write_stub(
        dir.path(),
        "playwright",
        "echo \"await page.goto('https://example.com/');\" > \"$4\"; sleep 30",
    );
    let config = config_with_stub(&stub, dir.path());
    let recorder = Recorder::new(config, SessionStore::new()).unwrap();

    recorder
        .start("https://example.com", "rec-2")
        .await
        .unwrap();
    // Give the stub time to spawn and write the file
    tokio::time::sleep(Duration::from_millis(400)).await;

    let stopped = recorder.stop("rec-2").await.unwrap();
    assert!(stopped.code.contains("await page.goto"));
    assert!(recorder.active_sessions().is_empty());
}

#[tokio::test]
async fn recorder_start_rejects_duplicate_session() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "sleep 30");
    let recorder =
        Recorder::new(config_with_stub(&stub, dir.path()), SessionStore::new()).unwrap();

    recorder
        .start("https://example.com", "rec-3")
        .await
        .unwrap();
    let err = recorder
        .start("https://example.com", "rec-3")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        scenably_common::Error::SessionActive { .. }
    ));

    recorder.stop("rec-3").await.unwrap();
}

#[tokio::test]
async fn debugger_rejects_garbage_before_writing_files() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "exit 0");
    let config = config_with_stub(&stub, dir.path());
    let debug_dir = config.temp_dir_for(scenably_common::SessionKind::Debug);
    let store = SessionStore::new();
    let debugger = Debugger::new(config, store.clone()).unwrap();

    let err = debugger
        .start_debug_session("garbage-not-code", "dbg-1")
        .await
        .unwrap_err();
    assert!(matches!(err, scenably_common::Error::InvalidCode(_)));
    assert!(store.is_empty());

    let leftovers: Vec<_> = std::fs::read_dir(&debug_dir)
        .map(|entries| entries.flatten().collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn debugger_runs_to_completion_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "echo 'debug done'; exit 0");
    let config = config_with_stub(&stub, dir.path());
    let debug_dir = config.temp_dir_for(scenably_common::SessionKind::Debug);
    let debugger = Debugger::new(config, SessionStore::new()).unwrap();

    let result = debugger
        .start_debug_session(TEST_CODE, "dbg-2")
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.output.contains("debug done"));

    assert!(!debug_dir.join("debug-dbg-2.spec.ts").exists());
    assert!(!debug_dir.join("playwright.config.debug-dbg-2.ts").exists());
    assert!(debugger.active_sessions().is_empty());
}

#[tokio::test]
async fn debugger_converts_codegen_shaped_input() {
    let dir = tempfile::tempdir().unwrap();
    // Dump the materialized spec so the test can observe the conversion
    let stub = write_stub(dir.path(), "playwright", "cat *.spec.ts; exit 0");
    let debugger =
        Debugger::new(config_with_stub(&stub, dir.path()), SessionStore::new()).unwrap();

    let codegen = r#"
(async () => {
  const browser = await chromium.launch();
  const page = await browser.newPage();
  await page.goto('https://example.com/');
  await browser.close();
})();
"#;
    let result = debugger
        .start_debug_session(codegen, "dbg-3")
        .await
        .unwrap();
    assert!(result.success);
    assert!(result.output.contains("@playwright/test"));
    assert!(result.output.contains("await page.goto"));
    assert!(!result.output.contains("const browser"));
}

#[tokio::test]
async fn stop_execution_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "playwright", "sleep 30");
    let sink = MemorySink::new();
    let executor = Executor::new(
        config_with_stub(&stub, dir.path()),
        SessionStore::new(),
        Arc::new(sink.clone()),
        Arc::new(NullNotifier),
    )
    .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    executor
        .execute_in_background("exec-stop", "scn-1", TEST_CODE, move |status| {
            let _ = tx.send(status);
        })
        .unwrap();

    // Wait for the session to become active before stopping
    for _ in 0..50 {
        let active = executor.active_executions();
        if active
            .first()
            .map(|s| s.status == SessionStatus::Running)
            .unwrap_or(false)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    executor.stop_execution("exec-stop").unwrap();
    let status = tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, ExecutionStatus::Failure);

    // Stopping after the terminal transition is a no-op
    executor.stop_execution("exec-stop").unwrap();
    assert!(executor.active_executions().is_empty());
}
