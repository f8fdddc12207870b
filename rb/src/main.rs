//! ReviewBot - homework review status notifier
//!
//! CLI entry point for the poll loop and its helper commands.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{error, info, warn};

use reviewbot::cli::{Cli, Command, get_log_dir, get_log_path, read_log_tail};
use reviewbot::config::{Config, Secrets, mask};
use reviewbot::driver::{Driver, PollCursor};
use reviewbot::notify::{Notifier, TelegramSink};
use reviewbot::poller::Poller;
use reviewbot::source::PracticumClient;

fn parse_level(s: &str) -> Option<tracing::Level> {
    match s.to_uppercase().as_str() {
        "TRACE" => Some(tracing::Level::TRACE),
        "DEBUG" => Some(tracing::Level::DEBUG),
        "INFO" => Some(tracing::Level::INFO),
        "WARN" | "WARNING" => Some(tracing::Level::WARN),
        "ERROR" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = get_log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let requested = cli_log_level.or(config_log_level);
    let level = requested.and_then(parse_level).unwrap_or(tracing::Level::INFO);

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(get_log_path())
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Some(s) = requested
        && parse_level(s).is_none()
    {
        warn!(level = %s, "Unknown log level, using INFO");
    }
    info!(%level, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    match cli.command.unwrap_or(Command::Run { from_date: None }) {
        Command::Run { from_date } => cmd_run(&config, from_date).await,
        Command::Once { from_date } => cmd_once(&config, from_date).await,
        Command::Check => cmd_check(&config),
        Command::Logs { follow, lines } => cmd_logs(follow, lines),
    }
}

/// Read secrets, logging the failure before it ends the process
fn load_secrets(config: &Config) -> Result<Secrets> {
    Secrets::from_env(config).inspect_err(|e| error!(error = %e, "Startup aborted"))
}

fn build_poller(config: &Config, secrets: &Secrets) -> Result<Poller> {
    let source = PracticumClient::new(&config.api, secrets.api_token.clone())
        .context("Failed to create status API client")?;
    let sink =
        TelegramSink::new(&config.telegram, secrets.telegram_token.clone()).context("Failed to create Telegram client")?;

    Ok(Poller::new(
        Arc::new(source),
        Notifier::new(Arc::new(sink), secrets.chat_id.clone()),
    ))
}

fn start_cursor(from_date: Option<i64>) -> PollCursor {
    from_date.map(PollCursor::new).unwrap_or_else(PollCursor::now)
}

/// Run the poll loop until a signal or a fatal error
async fn cmd_run(config: &Config, from_date: Option<i64>) -> Result<()> {
    let secrets = load_secrets(config)?;
    let poller = build_poller(config, &secrets)?;
    let driver = Driver::new(poller, config.poll.clone(), start_cursor(from_date));

    info!(endpoint = %config.api.endpoint, chat_id = %secrets.chat_id, "ReviewBot starting");

    tokio::select! {
        result = driver.run() => {
            result.context("Poll loop stopped")?;
        }
        signal = shutdown_signal() => {
            let name = signal?;
            warn!(signal = name, "Shutting down");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// Run a single cycle and print the report
async fn cmd_once(config: &Config, from_date: Option<i64>) -> Result<()> {
    let secrets = load_secrets(config)?;
    let poller = build_poller(config, &secrets)?;
    let mut driver = Driver::new(poller, config.poll.clone(), start_cursor(from_date));

    let from = driver.cursor().value();
    let report = driver.run_once().await.context("Poll cycle failed")?;

    println!("Fetched updates since {}", from);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print effective settings with secrets masked
fn cmd_check(config: &Config) -> Result<()> {
    println!("ReviewBot Configuration");
    println!("-----------------------");
    println!("Endpoint:        {}", config.api.endpoint);
    println!("API timeout:     {}ms", config.api.timeout_ms);
    println!("Telegram:        {}", config.telegram.base_url);
    println!("Poll interval:   {}s", config.poll.interval_secs);
    println!("Notify errors:   {}", config.poll.notify_errors);
    println!("Log file:        {}", get_log_path().display());
    println!();

    let secrets = load_secrets(config)?;
    println!("{:<16} {}", format!("{}:", config.api.token_env), mask(&secrets.api_token));
    println!("{:<16} {}", format!("{}:", config.telegram.token_env), mask(&secrets.telegram_token));
    println!("{:<16} {}", format!("{}:", config.telegram.chat_id_env), secrets.chat_id);
    println!();
    println!("All required settings present");
    Ok(())
}

/// Print the tail of the log file, or follow it with `tail -F`
fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if follow {
        // -F waits for the file if the bot has not written it yet
        let status = std::process::Command::new("tail")
            .arg("-F")
            .arg("-n")
            .arg(lines.to_string())
            .arg(&log_path)
            .status()
            .context("Failed to run tail -F")?;
        if !status.success() {
            return Err(eyre::eyre!("tail exited with {}", status));
        }
        return Ok(());
    }

    match read_log_tail(&log_path, lines)? {
        Some(tail) => tail.iter().for_each(|line| println!("{}", line)),
        None => println!("Nothing logged yet; the bot writes to {}", log_path.display()),
    }
    Ok(())
}
