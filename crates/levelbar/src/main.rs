//! levelbar - status widget on the terminal
//!
//! Polls the configured snapshot source and keeps a two-tier menu (total,
//! then one category per level with its detail rows) up to date on stdout.
//!
//! ## Usage
//!
//! ```bash
//! levelbar                          # run with ~/.config/levelbar/config.ron
//! levelbar --config ./dev.ron --interval-ms 5000
//! levelbar --once                   # one fetch, print the menu, exit
//! levelbar --print-config           # show the effective config
//! ```
//!
//! While running, type a row number and press Enter to open that detail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use levelbar_engine::constants::CONFIG_DIR_NAME;
use levelbar_engine::{CommandOpener, Config, Engine, MemoryShell};

mod console;

use console::{ConsoleShell, parse_row_number};

/// Polling status widget for the terminal.
#[derive(Parser, Debug)]
#[command(name = "levelbar")]
#[command(about = "Polls a snapshot source and shows its levels as a menu")]
struct Args {
    /// Config file (default: ~/.config/levelbar/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the poll interval, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Override the maximum detail label length
    #[arg(long)]
    max_subject_length: Option<usize>,

    /// Fetch once, print the menu and exit
    #[arg(long)]
    once: bool,

    /// Print the effective config as RON and exit
    #[arg(long)]
    print_config: bool,

    /// Directory for levelbar.log (default: $LEVELBAR_LOG_DIR, then the cache dir)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = args
        .log_dir
        .clone()
        .or_else(|| std::env::var_os("LEVELBAR_LOG_DIR").map(PathBuf::from))
        .or_else(|| dirs::cache_dir().map(|dir| dir.join(CONFIG_DIR_NAME)))
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "levelbar.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "levelbar=info,levelbar_engine=info,warn".into()
        }))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("logging to {}/levelbar.log", log_dir.display());

    let config = load_config(&args)?;

    if args.print_config {
        print!("{}", config.to_ron()?);
        return Ok(());
    }

    let menu = MemoryShell::new();
    let shell = ConsoleShell::new(menu.clone(), std::io::stdout());
    let opener = Arc::new(CommandOpener::new(&config.opener)?);
    let mut engine = Engine::from_config(&config, shell, opener)?;

    if args.once {
        engine.refresh().await;
        return Ok(());
    }

    tracing::info!(
        source = ?config.source,
        interval = ?config.poll_interval(),
        "starting levelbar"
    );
    engine.start().await;

    let mut input = spawn_stdin_reader();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for Ctrl-C")?;
                tracing::info!("interrupted, shutting down");
                break;
            }
            line = input.recv(), if stdin_open => match line {
                Some(line) => activate(&menu, &line),
                None => {
                    tracing::debug!("stdin closed, running until interrupted");
                    stdin_open = false;
                }
            },
        }
    }

    engine.stop().await;
    Ok(())
}

/// Load the config file and apply command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default()?,
    };

    if let Some(interval_ms) = args.interval_ms {
        config.poll_interval_ms = interval_ms;
    }
    if let Some(max) = args.max_subject_length {
        config.max_subject_length = max;
    }
    config.validate()?;
    Ok(config)
}

fn activate(menu: &MemoryShell, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match parse_row_number(line) {
        Some(index) if menu.activate_detail(index) => {}
        _ => eprintln!("no such row: {}", line.trim()),
    }
}

/// Read stdin lines on a dedicated thread.
///
/// Blocking reads on a tokio worker would keep the runtime from shutting
/// down until the next line arrives.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
