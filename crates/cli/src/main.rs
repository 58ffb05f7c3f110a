//! Scenably CLI
//!
//! Thin host around the session orchestrators: record a scenario
//! interactively, step through one in debug mode, or execute one
//! headlessly.

use clap::{Parser, Subcommand};
use scenably_session::sink::{MemorySink, NullNotifier};
use scenably_session::{BinaryLocator, Debugger, Executor, Recorder, SessionConfig, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scenably")]
#[command(about = "Record, debug, and execute Playwright browser scenarios")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a browser scenario interactively
    Record {
        /// Target URL to record against
        url: String,

        /// Session id (generated when omitted)
        #[arg(long)]
        session_id: Option<String>,

        /// Write the recorded code to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a scenario file in interactive debug mode
    Debug {
        /// Scenario file, test- or codegen-shaped
        file: PathBuf,

        /// Session id (generated when omitted)
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Execute a scenario file headlessly
    Run {
        /// Scenario file, test- or codegen-shaped
        file: PathBuf,

        /// Execution id (generated when omitted)
        #[arg(long)]
        execution_id: Option<String>,

        /// Scenario id recorded with the execution
        #[arg(long, default_value = "cli")]
        scenario_id: String,
    },

    /// Print the resolved Playwright CLI and browser paths
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(scenably_common::default_config_path);
    let config = SessionConfig::load(&config_path)?;

    match cli.command {
        Commands::Record {
            url,
            session_id,
            output,
        } => record(config, &url, session_id, output).await,
        Commands::Debug { file, session_id } => debug(config, &file, session_id).await,
        Commands::Run {
            file,
            execution_id,
            scenario_id,
        } => run(config, &file, execution_id, &scenario_id).await,
        Commands::Doctor => doctor(config),
    }
}

fn generated_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

async fn record(
    config: SessionConfig,
    url: &str,
    session_id: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session_id = session_id.unwrap_or_else(|| generated_id("rec"));
    let recorder = Recorder::new(config, SessionStore::new())?;

    let started = recorder.start(url, &session_id).await?;
    info!("{} ({})", started.message, started.session_id);
    eprintln!("Recording... interact with the browser, then press Ctrl-C to finish.");

    // Finish on Ctrl-C or when the codegen process ends on its own
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                if recorder.active_sessions().is_empty() {
                    break;
                }
            }
        }
    }

    let stopped = recorder.stop(&session_id).await?;
    info!("{}", stopped.message);

    match output {
        Some(path) => {
            std::fs::write(&path, &stopped.code)?;
            eprintln!("Recorded scenario written to {}", path.display());
        }
        None => println!("{}", stopped.code),
    }
    Ok(())
}

async fn debug(
    config: SessionConfig,
    file: &PathBuf,
    session_id: Option<String>,
) -> anyhow::Result<()> {
    let session_id = session_id.unwrap_or_else(|| generated_id("dbg"));
    let code = std::fs::read_to_string(file)?;
    let debugger = Debugger::new(config, SessionStore::new())?;

    let result = debugger.start_debug_session(&code, &session_id).await?;
    if result.success {
        eprintln!("Debug session finished successfully.");
        Ok(())
    } else {
        eprint!("{}", result.output);
        anyhow::bail!(
            "debug session exited with code {:?}",
            result.exit_code
        )
    }
}

async fn run(
    config: SessionConfig,
    file: &PathBuf,
    execution_id: Option<String>,
    scenario_id: &str,
) -> anyhow::Result<()> {
    let execution_id = execution_id.unwrap_or_else(|| generated_id("exec"));
    let code = std::fs::read_to_string(file)?;

    let sink = MemorySink::new();
    let executor = Executor::new(
        config,
        SessionStore::new(),
        Arc::new(sink.clone()),
        Arc::new(NullNotifier),
    )?;

    let (tx, rx) = tokio::sync::oneshot::channel();
    executor.execute_in_background(&execution_id, scenario_id, &code, move |status| {
        let _ = tx.send(status);
    })?;

    let status = rx
        .await
        .map_err(|_| anyhow::anyhow!("execution ended without reporting a status"))?;

    for update in sink.updates_for(&execution_id) {
        let pretty = serde_json::from_str::<serde_json::Value>(&update.result)
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or(update.result);
        println!("{}", pretty);
    }

    if status == scenably_common::ExecutionStatus::Success {
        Ok(())
    } else {
        anyhow::bail!("execution {} failed", execution_id)
    }
}

fn doctor(config: SessionConfig) -> anyhow::Result<()> {
    let locator = BinaryLocator::new(config);

    let cli = locator.find_playwright_cli();
    println!("Playwright CLI:      {}", cli.path.display());
    println!("Launch kind:         {:?}", cli.kind);
    println!("Browser root:        {}", locator.browser_root().display());
    match locator.find_chromium_executable() {
        Some(path) => println!("Chromium executable: {}", path.display()),
        None => println!("Chromium executable: (none found, Playwright will resolve its own)"),
    }
    println!("NODE_PATH overlay:   {}", locator.node_path());
    Ok(())
}
