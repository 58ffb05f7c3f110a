//! Platform profiles
//!
//! All platform-specific path tables consumed by the locator and the
//! supervisor live here as data. The rest of the crate never branches on
//! the OS for path construction.

/// Root a CLI candidate path is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRoot {
    /// The application root (project directory in development)
    App,
    /// The packaged resources directory
    Resources,
}

/// One entry in the ordered Playwright CLI search list
#[derive(Debug, Clone, Copy)]
pub struct CliCandidate {
    pub root: CandidateRoot,
    pub relative: &'static str,
}

/// Platform-specific path tables
#[derive(Debug)]
pub struct PlatformProfile {
    /// Ordered Playwright CLI candidates; first existing path wins
    pub cli_candidates: &'static [CliCandidate],

    /// Bare command name resolved via the OS PATH when no candidate exists
    pub cli_fallback: &'static str,

    /// Executable sub-paths inside a `chromium-*` browser directory
    pub browser_executable_suffixes: &'static [&'static str],

    /// Well-known system Chrome install locations, preferred on packaged
    /// Windows builds to sidestep browser-bundling issues
    pub system_chrome_paths: &'static [&'static str],

    /// Relative `node_modules` locations contributing to NODE_PATH
    pub node_module_dirs: &'static [CliCandidate],

    /// Separator for PATH-like environment variables
    pub env_path_separator: char,

    /// File extensions that mark a CLI entry point as a script needing a
    /// Node launcher ('.js'); anything else is executed directly
    pub script_extensions: &'static [&'static str],
}

const NODE_MODULE_DIRS: &[CliCandidate] = &[
    CliCandidate { root: CandidateRoot::App, relative: "node_modules" },
    CliCandidate { root: CandidateRoot::Resources, relative: "app.asar.unpacked/node_modules" },
    CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules" },
];

#[cfg(windows)]
static CURRENT: PlatformProfile = PlatformProfile {
    cli_candidates: &[
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/.bin/playwright.cmd" },
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app.asar.unpacked/node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/.bin/playwright.cmd" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/playwright/cli.js" },
    ],
    cli_fallback: "playwright.cmd",
    browser_executable_suffixes: &["chrome-win/chrome.exe", "chrome-win64/chrome.exe"],
    system_chrome_paths: &[
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
        "C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
    ],
    node_module_dirs: NODE_MODULE_DIRS,
    env_path_separator: ';',
    script_extensions: &["js"],
};

#[cfg(target_os = "macos")]
static CURRENT: PlatformProfile = PlatformProfile {
    cli_candidates: &[
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/.bin/playwright" },
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app.asar.unpacked/node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/.bin/playwright" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/playwright/cli.js" },
    ],
    cli_fallback: "playwright",
    browser_executable_suffixes: &["chrome-mac/Chromium.app/Contents/MacOS/Chromium"],
    system_chrome_paths: &[],
    node_module_dirs: NODE_MODULE_DIRS,
    env_path_separator: ':',
    script_extensions: &["js"],
};

#[cfg(not(any(windows, target_os = "macos")))]
static CURRENT: PlatformProfile = PlatformProfile {
    cli_candidates: &[
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/.bin/playwright" },
        CliCandidate { root: CandidateRoot::App, relative: "node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app.asar.unpacked/node_modules/playwright/cli.js" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/.bin/playwright" },
        CliCandidate { root: CandidateRoot::Resources, relative: "app/node_modules/playwright/cli.js" },
    ],
    cli_fallback: "playwright",
    browser_executable_suffixes: &["chrome-linux/chrome"],
    system_chrome_paths: &[],
    node_module_dirs: NODE_MODULE_DIRS,
    env_path_separator: ':',
    script_extensions: &["js"],
};

/// Profile for the platform this binary was compiled for
pub fn current() -> &'static PlatformProfile {
    &CURRENT
}
