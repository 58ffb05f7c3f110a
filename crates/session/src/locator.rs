//! Binary and browser discovery
//!
//! Resolves absolute paths to the Playwright CLI entry point and to a
//! launchable Chromium executable across dev checkouts and packaged
//! builds. Discovery never fails hard: a missing CLI degrades to a bare
//! command name resolved via the OS PATH, and a missing browser degrades
//! to `None`, which downstream code treats as "let Playwright use its own
//! resolution".

use crate::config::SessionConfig;
use crate::platform::{self, CandidateRoot, PlatformProfile};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Minimum size for a browser executable to be considered real; smaller
/// files are placeholders left behind by partial or failed downloads.
const MIN_BROWSER_EXECUTABLE_SIZE: u64 = 1_000_000;

/// How a resolved CLI entry point must be launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    /// Native or batch executable, executed directly
    Direct,
    /// `.js` entry point, launched through a Node host
    Script,
}

/// A resolved Playwright CLI
#[derive(Debug, Clone)]
pub struct PlaywrightCli {
    pub path: PathBuf,
    pub kind: LaunchKind,
}

/// Resolves filesystem paths to the automation CLI and browser executables
#[derive(Clone)]
pub struct BinaryLocator {
    config: SessionConfig,
    profile: &'static PlatformProfile,
}

impl BinaryLocator {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_profile(config, platform::current())
    }

    /// Construct against an explicit profile (used by tests to fabricate
    /// candidate tables)
    pub fn with_profile(config: SessionConfig, profile: &'static PlatformProfile) -> Self {
        Self { config, profile }
    }

    fn resolve_root(&self, root: CandidateRoot) -> Option<&Path> {
        match root {
            CandidateRoot::App => Some(self.config.app_root.as_path()),
            CandidateRoot::Resources => self.config.resources_root.as_deref(),
        }
    }

    fn launch_kind_for(&self, path: &Path) -> LaunchKind {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if self.profile.script_extensions.contains(&ext) {
            LaunchKind::Script
        } else {
            LaunchKind::Direct
        }
    }

    /// Resolve the Playwright CLI entry point
    ///
    /// An explicit `playwright.binary_path` override short-circuits the
    /// search. Otherwise the first existing candidate wins (existence
    /// check only), and when nothing exists the bare command name is
    /// returned for the OS PATH to resolve.
    pub fn find_playwright_cli(&self) -> PlaywrightCli {
        if let Some(path) = &self.config.playwright.binary_path {
            return PlaywrightCli {
                kind: self.launch_kind_for(path),
                path: path.clone(),
            };
        }

        for candidate in self.profile.cli_candidates {
            let Some(root) = self.resolve_root(candidate.root) else {
                continue;
            };
            let path = root.join(candidate.relative);
            if path.exists() {
                debug!("Resolved Playwright CLI: {}", path.display());
                return PlaywrightCli {
                    kind: self.launch_kind_for(&path),
                    path,
                };
            }
        }

        let fallback = PathBuf::from(self.profile.cli_fallback);
        debug!(
            "No Playwright CLI candidate found, falling back to '{}'",
            fallback.display()
        );
        PlaywrightCli {
            kind: self.launch_kind_for(&fallback),
            path: fallback,
        }
    }

    /// Directory holding downloaded browsers
    pub fn browser_root(&self) -> PathBuf {
        if let Some(dir) = &self.config.playwright.browsers_dir {
            return dir.clone();
        }
        if self.config.packaged {
            self.config
                .resources_root
                .clone()
                .unwrap_or_else(|| self.config.app_root.clone())
                .join("browsers")
        } else {
            self.config.app_root.join("browsers")
        }
    }

    /// Find a launchable Chromium-family executable
    ///
    /// `None` means "no usable executable found" and callers must let the
    /// automation library fall back to its own resolution, not fail.
    pub fn find_chromium_executable(&self) -> Option<PathBuf> {
        // Packaged Windows builds prefer a system Chrome over bundled
        // browsers, which frequently ship incomplete.
        if self.config.packaged {
            for path in self.profile.system_chrome_paths {
                let path = Path::new(path);
                if executable_looks_real(path) {
                    debug!("Using system Chrome: {}", path.display());
                    return Some(path.to_path_buf());
                }
            }
        }

        let root = self.browser_root();
        let newest = newest_chromium_dir(&root)?;

        for suffix in self.profile.browser_executable_suffixes {
            let candidate = newest.join(suffix);
            if executable_looks_real(&candidate) {
                debug!("Resolved Chromium executable: {}", candidate.display());
                return Some(candidate);
            }
        }

        warn!(
            "No usable Chromium executable under {}, deferring to Playwright",
            root.display()
        );
        None
    }

    /// Every plausible `node_modules` location, existing or not, for the
    /// NODE_PATH overlay of spawned processes
    pub fn node_module_paths(&self) -> Vec<PathBuf> {
        self.profile
            .node_module_dirs
            .iter()
            .filter_map(|c| self.resolve_root(c.root).map(|r| r.join(c.relative)))
            .collect()
    }

    /// NODE_PATH value joining all plausible `node_modules` locations
    pub fn node_path(&self) -> String {
        self.node_module_paths()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(&self.profile.env_path_separator.to_string())
    }
}

/// Lexicographically last `chromium-*` subdirectory (newest revision)
fn newest_chromium_dir(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("chromium-"))
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs.pop()
}

/// Existence plus the minimum-size sanity check
fn executable_looks_real(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.len() > MIN_BROWSER_EXECUTABLE_SIZE,
        Err(_) => false,
    }
}
