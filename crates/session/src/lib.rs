//! Scenably Session Manager
//!
//! This crate mediates between a request/response API and a fleet of OS
//! child processes, each representing one browser-automation activity:
//! recording a user's interactions, running a test headlessly, or running
//! a test in interactive debug mode.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Session Orchestrators                       │
//! │   Recorder.start/stop    Debugger.start_debug_session        │
//! │   Executor.execute_in_background                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  BinaryLocator     resolve Playwright CLI + Chromium paths   │
//! │  CodeMaterializer  write per-session spec + config files     │
//! │  ProcessSupervisor spawn, pump output, escalate termination  │
//! │  SessionStore      in-memory session state, cleanup guard    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  playwright codegen <url> --output <file>                    │
//! │  playwright test --config=<cfg> <spec> [--debug]             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orchestrators return before their child process completes (except the
//! Debugger, whose contract is synchronous-to-the-caller); process
//! lifecycle events asynchronously update the session store and perform
//! temp-file cleanup.

pub mod config;
pub mod debugger;
pub mod executor;
pub mod locator;
pub mod materialize;
pub mod normalize;
pub mod platform;
pub mod recorder;
pub mod sink;
pub mod store;
pub mod supervisor;
pub mod template;

pub use config::SessionConfig;
pub use debugger::{DebugResult, Debugger};
pub use executor::Executor;
pub use locator::{BinaryLocator, LaunchKind, PlaywrightCli};
pub use normalize::CodeShape;
pub use recorder::{Recorder, RecorderStart, RecorderStop};
pub use sink::{ExecutionNotifier, ExecutionSink, LogSink, MemorySink, NullNotifier};
pub use store::{Session, SessionStore};
