// Logging module - conversation transcripts, HTTP request traces and data dir helpers
pub mod conversation_logger;
pub mod request_logger;

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub use conversation_logger::ConversationLogger;

pub use request_logger::{
    log_exchange_to_file,
    log_request,
    log_response,
};

/// Name of the per-user directory under `$HOME`
pub const DATA_DIR_NAME: &str = ".taxchat";

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = if max_chars >= 3 { max_chars - 3 } else { 0 };
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        Ok(home_dir()?.join(rest))
    } else if path_str == "~" {
        home_dir()
    } else {
        Ok(path.to_path_buf())
    }
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;
    Ok(PathBuf::from(home))
}

/// Get or create the data directory (`~/.taxchat` unless overridden)
pub fn get_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let data_dir = match override_dir {
        Some(dir) => expand_tilde(dir)?,
        None => home_dir()?.join(DATA_DIR_NAME),
    };

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(data_dir)
}

/// Get or create the logs directory inside the data directory
pub fn get_logs_dir(data_dir: &Path) -> Result<PathBuf> {
    let logs_dir = data_dir.join("logs");

    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)
            .context("Failed to create logs directory")?;
    }

    Ok(logs_dir)
}

/// Print a dim diagnostic line to stderr when verbose output is on
pub fn debug_line(verbose: bool, message: impl Display) {
    if verbose {
        eprintln!("{}", format!("🔧 {}", message).bright_black());
    }
}

/// Print a warning line to stderr regardless of verbosity
pub fn warn_line(message: impl Display) {
    eprintln!("{} {}", "⚠️".yellow(), message);
}
