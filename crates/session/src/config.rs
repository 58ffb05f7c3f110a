//! Session manager configuration

use scenably_common::SessionKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Application root directory (the project directory in development)
    pub app_root: PathBuf,

    /// Resources directory of a packaged build, if any
    pub resources_root: Option<PathBuf>,

    /// Whether this is a packaged build (as opposed to a dev checkout)
    pub packaged: bool,

    /// Root for per-activity temp directories (system temp dir if unset)
    pub temp_root: Option<PathBuf>,

    /// Playwright configuration
    pub playwright: PlaywrightConfig,

    /// Recorder configuration
    pub recorder: RecorderConfig,

    /// Grace period before escalating a stop to a forceful kill, in ms
    pub stop_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            resources_root: None,
            packaged: false,
            temp_root: None,
            playwright: PlaywrightConfig::default(),
            recorder: RecorderConfig::default(),
            stop_grace_ms: 2_000,
        }
    }
}

/// Playwright-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaywrightConfig {
    /// Path to the Playwright CLI (auto-detected when unset)
    pub binary_path: Option<PathBuf>,

    /// Launcher for `.js` CLI entry points (`node`, or an Electron binary
    /// acting as a Node host)
    pub node_launcher: Option<PathBuf>,

    /// Directory holding downloaded browsers (auto-detected when unset)
    pub browsers_dir: Option<PathBuf>,

    /// Default browser for generated run configurations
    pub default_browser: String,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            binary_path: None, // Will auto-detect
            node_launcher: None,
            browsers_dir: None,
            default_browser: "chromium".to_string(),
        }
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// How many times to poll for the codegen output file after stop
    pub output_poll_attempts: u32,

    /// Delay between output polls, in ms
    pub output_poll_interval_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_poll_attempts: 10,
            output_poll_interval_ms: 500,
        }
    }
}

impl SessionConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Per-activity-kind temp directory
    ///
    /// Files inside are always session-id-qualified, so the directory
    /// itself can be shared by concurrent sessions of the same kind.
    pub fn temp_dir_for(&self, kind: SessionKind) -> PathBuf {
        self.temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("scenably-{}", kind.prefix()))
    }

    pub fn stop_grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stop_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dirs_are_per_kind() {
        let config = SessionConfig::default();
        let rec = config.temp_dir_for(SessionKind::Recording);
        let dbg = config.temp_dir_for(SessionKind::Debug);
        let exec = config.temp_dir_for(SessionKind::Execution);
        assert_ne!(rec, dbg);
        assert_ne!(dbg, exec);
        assert!(rec.ends_with("scenably-recording"));
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = SessionConfig::default();
        config.stop_grace_ms = 5_000;
        config.playwright.default_browser = "firefox".to_string();
        config.save(&path).unwrap();

        let loaded = SessionConfig::load(&path).unwrap();
        assert_eq!(loaded.stop_grace_ms, 5_000);
        assert_eq!(loaded.playwright.default_browser, "firefox");
    }
}
