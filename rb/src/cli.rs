//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// ReviewBot - homework review status notifier
#[derive(Parser)]
#[command(
    name = "rb",
    about = "Polls homework review statuses and forwards changes to Telegram",
    version,
    after_help = "Logs are written to: ~/.local/share/reviewbot/logs/reviewbot.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level override
    #[arg(short, long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll forever, sending a message for every status change
    Run {
        /// Start the cursor at this Unix timestamp instead of now
        #[arg(long)]
        from_date: Option<i64>,
    },

    /// Run a single poll cycle and print what it did
    Once {
        /// Unix timestamp to fetch updates from (defaults to now)
        #[arg(long)]
        from_date: Option<i64>,
    },

    /// Validate configuration and required environment variables
    Check,

    /// Show bot logs
    Logs {
        /// Follow log output (like tail -f)
        #[arg(short, long)]
        follow: bool,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

/// Path of the append-only log file
pub fn get_log_path() -> PathBuf {
    get_log_dir().join("reviewbot.log")
}

pub fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reviewbot")
        .join("logs")
}

/// Last `lines` lines of the log, or `None` if nothing has been logged yet
pub fn read_log_tail(path: &Path, lines: usize) -> Result<Option<Vec<String>>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(format!("Failed to open log file {}", path.display())),
    };

    let mut tail = VecDeque::with_capacity(lines);
    for line in BufReader::new(file).lines().map_while(std::io::Result::ok) {
        if tail.len() == lines {
            tail.pop_front();
        }
        if lines > 0 {
            tail.push_back(line);
        }
    }

    Ok(Some(tail.into()))
}
