//! Run-file materialization
//!
//! Writes a session's spec file and an ephemeral run configuration into
//! the per-activity temp directory before process spawn, and provides the
//! central best-effort deletion used after process close. Generated files
//! are never evaluated in-process; they are only ever handed to the
//! external automation CLI.

use scenably_common::{Result, SessionKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options shaping a generated run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub browser: String,
    /// Explicit browser binary, when the locator found one
    pub executable_path: Option<PathBuf>,
    pub headless: bool,
}

/// Paths of a session's materialized files
#[derive(Debug, Clone)]
pub struct RunFiles {
    pub spec_path: PathBuf,
    pub config_path: PathBuf,
}

impl RunFiles {
    /// Basenames are what gets passed on the command line; the process
    /// runs with the temp directory as its working directory, which keeps
    /// Windows path separators out of the runner's file-matching logic.
    pub fn spec_name(&self) -> String {
        file_name(&self.spec_path)
    }

    pub fn config_name(&self) -> String {
        file_name(&self.config_path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes session-scoped spec and config files into one temp directory
#[derive(Debug, Clone)]
pub struct CodeMaterializer {
    temp_dir: PathBuf,
}

impl CodeMaterializer {
    pub fn new(temp_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&temp_dir)?;
        Ok(Self { temp_dir })
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Expected spec path for a session id, whether or not it exists yet
    pub fn spec_path_for(&self, kind: SessionKind, session_id: &str) -> PathBuf {
        self.temp_dir
            .join(format!("{}-{}.spec.ts", kind.prefix(), session_id))
    }

    fn config_path_for(&self, kind: SessionKind, session_id: &str) -> PathBuf {
        self.temp_dir
            .join(format!("playwright.config.{}-{}.ts", kind.prefix(), session_id))
    }

    /// Write the spec and generated config for one session.
    ///
    /// Filenames are session-id-qualified, so concurrent sessions sharing
    /// the directory never collide.
    pub fn write_run_files(
        &self,
        kind: SessionKind,
        session_id: &str,
        code: &str,
        options: &RunOptions,
    ) -> Result<RunFiles> {
        let spec_path = self.spec_path_for(kind, session_id);
        let config_path = self.config_path_for(kind, session_id);

        std::fs::write(&spec_path, code)?;
        std::fs::write(&config_path, render_config(options))?;
        debug!(
            "Materialized run files: {} / {}",
            spec_path.display(),
            config_path.display()
        );

        Ok(RunFiles {
            spec_path,
            config_path,
        })
    }
}

/// Render the ephemeral run configuration.
///
/// The external CLI only cares about the object shape: `testDir`,
/// `use.browserName`, optional `use.launchOptions.executablePath`, and
/// `use.headless`.
fn render_config(options: &RunOptions) -> String {
    let launch_options = match &options.executable_path {
        Some(path) => format!(
            "\n    launchOptions: {{\n      executablePath: '{}',\n    }},",
            escape_single_quotes(&path.to_string_lossy())
        ),
        None => String::new(),
    };

    format!(
        r#"export default {{
  testDir: '.',
  use: {{
    browserName: '{browser}',
    headless: {headless},{launch_options}
  }},
}};
"#,
        browser = escape_single_quotes(&options.browser),
        headless = options.headless,
        launch_options = launch_options,
    )
}

pub(crate) fn escape_single_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Best-effort deletion: failures are logged and swallowed, never raised.
pub fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
