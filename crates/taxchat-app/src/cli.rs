use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for taxchat
#[derive(Parser, Debug)]
#[command(name = "taxchat")]
#[command(about = "Taxchat - terminal Q&A assistant for the 2024 Nigerian tax reform bills")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the assistant backend (e.g., http://localhost:8000/api)
    #[arg(long, global = true, value_name = "URL", env = "TAXCHAT_API_URL")]
    pub api_url: Option<String>,

    /// Backend to talk to: http (default) or mock for offline canned answers
    #[arg(long, global = true, value_name = "MODE", env = "TAXCHAT_API_MODE")]
    pub mode: Option<String>,

    /// Directory holding the local store, config.toml and logs (default: ~/.taxchat)
    #[arg(long, global = true, value_name = "PATH", env = "TAXCHAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose debug output (shows HTTP requests, responses, session bookkeeping)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Append every HTTP exchange to a dated file under <data-dir>/logs
    #[arg(long, global = true)]
    pub log_http: bool,

    /// Password for login, register and password commands
    #[arg(long, global = true, value_name = "PASSWORD", env = "TAXCHAT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Ask a single question in the active session
    Ask {
        /// The question to send
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Start a new conversation
    New,
    /// Show the messages of the active session
    History,
    /// List recent chats
    Recent,
    /// Reopen a recent chat by its number in `recent`
    Open {
        index: usize,
    },
    /// Forget all recent chats
    ClearRecent,
    /// Sign in to an account
    Login {
        email: String,
    },
    /// Create an account and sign in
    Register {
        email: String,
        username: String,
        /// Full name shown on the profile
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Update the profile of the signed-in account
    Profile {
        #[arg(long)]
        full_name: String,
    },
    /// Change the password of the signed-in account
    ChangePassword {
        /// The new password
        #[arg(long)]
        new_password: String,
    },
    /// Request a password reset email
    ForgotPassword {
        email: String,
    },
    /// Set a new password using a reset token
    ResetPassword {
        token: String,
    },
    /// List conversations stored for the signed-in account
    Conversations,
    /// Delete a stored conversation
    DeleteConversation {
        session_id: String,
    },
    /// Ask the backend to index its source documents
    Ingest {
        /// Rebuild the index from scratch
        #[arg(long)]
        force: bool,
    },
    /// Show the state of document ingestion
    IngestStatus,
}

impl Cli {
    /// Password from `--password` / `TAXCHAT_PASSWORD`, or an error naming both
    pub fn require_password(&self) -> anyhow::Result<&str> {
        self.password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Password required: pass --password or set TAXCHAT_PASSWORD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_subcommand_means_repl() {
        let cli = Cli::try_parse_from(["taxchat", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::try_parse_from(["taxchat", "ask", "What", "are", "the", "new", "VAT", "rates?"]).unwrap();
        match cli.command {
            Some(Commands::Ask { message }) => assert_eq!(message.join(" "), "What are the new VAT rates?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taxchat", "open", "2", "--api-url", "http://example.test/api", "--mode", "mock",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Open { index: 2 }));
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
        assert_eq!(cli.mode.as_deref(), Some("mock"));
    }

    #[test]
    fn test_password_flag() {
        let cli = Cli::try_parse_from(["taxchat", "login", "ada@example.ng", "--password", "secret123"]).unwrap();
        assert_eq!(cli.require_password().unwrap(), "secret123");
    }
}
