//! Process supervision
//!
//! Spawns the external automation CLI, multiplexes its stdout/stderr into
//! the owning session's log trail, and translates OS process events into
//! exit reports. Termination is graceful-then-forceful: a terminate
//! signal, a bounded grace period, then a kill. On Unix the child runs in
//! its own process group and signals are delivered group-wide so that
//! browser grandchildren do not leak as orphans.

use crate::config::SessionConfig;
use crate::locator::{BinaryLocator, LaunchKind, PlaywrightCli};
use crate::store::SessionLog;
use parking_lot::Mutex;
use scenably_common::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fully-constructed invocation for one external process
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

/// How a supervised process ended
#[derive(Debug, Clone, Copy)]
pub struct ProcessExit {
    pub code: Option<i32>,
    /// True when the exit was forced by an explicit stop
    pub stopped: bool,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

/// Spawns and supervises one external process per call
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    grace: Duration,
}

impl ProcessSupervisor {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Run a process to completion or cancellation.
    ///
    /// `on_spawn` fires with the child's pid once the OS has confirmed the
    /// fork; before that point a cancellation can only mark intent. Output
    /// lines are appended to `log` and forwarded to the tracing sink. A
    /// spawn failure is returned as [`Error::Spawn`] without invoking
    /// `on_spawn`.
    pub async fn run(
        &self,
        spec: CommandSpec,
        log: Arc<Mutex<SessionLog>>,
        cancel: CancellationToken,
        on_spawn: impl FnOnce(u32) + Send,
    ) -> Result<ProcessExit> {
        debug!(
            "Spawning: {} {} (cwd {})",
            spec.program.display(),
            spec.args.join(" "),
            spec.cwd.display()
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        // Own process group so a stop can reap browser grandchildren.
        // Windows children stay attached: detaching breaks signaling.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            Error::Spawn(format!("{}: {}", spec.program.display(), e))
        })?;

        let pid = child.id().unwrap_or_default();
        info!("Process started with PID {}", pid);
        on_spawn(pid);

        let stdout_pump = child
            .stdout
            .take()
            .map(|s| tokio::spawn(pump(s, log.clone(), StreamKind::Stdout)));
        let stderr_pump = child
            .stderr
            .take()
            .map(|s| tokio::spawn(pump(s, log.clone(), StreamKind::Stderr)));

        let waited = tokio::select! {
            status = child.wait() => Some(status?),
            _ = cancel.cancelled() => None,
        };

        let (status, stopped) = match waited {
            Some(status) => (status, false),
            None => (self.terminate(&mut child, pid).await?, true),
        };

        // Drain output pumps; they end at stream EOF
        if let Some(task) = stdout_pump {
            let _ = task.await;
        }
        if let Some(task) = stderr_pump {
            let _ = task.await;
        }

        let exit = ProcessExit {
            code: status.code(),
            stopped,
        };
        info!("Process {} exited with code {:?}", pid, exit.code);
        Ok(exit)
    }

    /// Graceful terminate, bounded grace period, then forceful kill
    async fn terminate(&self, child: &mut Child, pid: u32) -> Result<std::process::ExitStatus> {
        info!("Stopping process {} (grace {:?})", pid, self.grace);

        #[cfg(unix)]
        signal_group(pid, nix::sys::signal::Signal::SIGTERM);
        #[cfg(not(unix))]
        let _ = child.start_kill();

        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("Process {} survived the grace period, killing", pid);
                #[cfg(unix)]
                signal_group(pid, nix::sys::signal::Signal::SIGKILL);
                let _ = child.start_kill();
                Ok(child.wait().await?)
            }
        }
    }
}

async fn pump<R: AsyncRead + Unpin>(
    reader: R,
    log: Arc<Mutex<SessionLog>>,
    kind: StreamKind,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match kind {
            StreamKind::Stdout => {
                debug!("child stdout: {}", line);
                log.lock().push_stdout(&line);
            }
            StreamKind::Stderr => {
                debug!("child stderr: {}", line);
                log.lock().push_stderr(&line);
            }
        }
    }
}

/// Deliver a signal to the child's whole process group
#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), signal) {
        debug!("killpg({}, {:?}) failed: {}", pid, signal, e);
    }
}

/// Program + leading args for a resolved Playwright CLI
///
/// Script entry points go through the configured Node launcher; native
/// and batch entry points are executed directly.
pub fn playwright_invocation(
    cli: &PlaywrightCli,
    config: &SessionConfig,
) -> (PathBuf, Vec<String>) {
    match cli.kind {
        LaunchKind::Direct => (cli.path.clone(), Vec::new()),
        LaunchKind::Script => {
            let launcher = config
                .playwright
                .node_launcher
                .clone()
                .unwrap_or_else(|| PathBuf::from("node"));
            (launcher, vec![cli.path.to_string_lossy().into_owned()])
        }
    }
}

/// Environment overlay for spawned Playwright processes
pub fn playwright_env(locator: &BinaryLocator, config: &SessionConfig) -> Vec<(String, String)> {
    let mut env = vec![
        ("NODE_PATH".to_string(), locator.node_path()),
        ("PLAYWRIGHT_SKIP_BROWSER_DOWNLOAD".to_string(), "1".to_string()),
    ];

    let browsers = locator.browser_root();
    if browsers.is_dir() {
        env.push((
            "PLAYWRIGHT_BROWSERS_PATH".to_string(),
            browsers.to_string_lossy().into_owned(),
        ));
    }

    // An Electron binary standing in for node must be told to behave as one
    if let Some(launcher) = &config.playwright.node_launcher {
        let is_electron = launcher
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase().contains("electron"))
            .unwrap_or(false);
        if is_electron {
            env.push(("ELECTRON_RUN_AS_NODE".to_string(), "1".to_string()));
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, cwd: PathBuf) -> CommandSpec {
        CommandSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            cwd,
            env: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_exit_code_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = ProcessSupervisor::new(Duration::from_secs(2));
        let log = Arc::new(Mutex::new(SessionLog::default()));

        let exit = supervisor
            .run(
                sh("echo out; echo err 1>&2; exit 3", dir.path().to_path_buf()),
                log.clone(),
                CancellationToken::new(),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(exit.code, Some(3));
        assert!(!exit.stopped);
        let log = log.lock();
        assert_eq!(log.stdout, "out\n");
        assert_eq!(log.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_terminates_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = ProcessSupervisor::new(Duration::from_millis(200));
        let log = Arc::new(Mutex::new(SessionLog::default()));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let exit = supervisor
            .run(
                sh("sleep 30", dir.path().to_path_buf()),
                log,
                cancel,
                |_| {},
            )
            .await
            .unwrap();

        assert!(exit.stopped);
        assert_ne!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = ProcessSupervisor::new(Duration::from_secs(1));
        let log = Arc::new(Mutex::new(SessionLog::default()));

        let mut spawned = false;
        let result = supervisor
            .run(
                CommandSpec {
                    program: PathBuf::from("/nonexistent/definitely-not-here"),
                    args: Vec::new(),
                    cwd: dir.path().to_path_buf(),
                    env: Vec::new(),
                },
                log,
                CancellationToken::new(),
                |_| spawned = true,
            )
            .await;

        assert!(matches!(result, Err(scenably_common::Error::Spawn(_))));
        assert!(!spawned);
    }
}
