//! Taxchat Application Library
//!
//! Terminal client for the tax reform Q&A assistant: local state, chat and
//! account controllers, rendering and the interactive REPL.

// Re-export workspace crates
pub use taxchat_api as api;
pub use taxchat_logging as logging;
pub use taxchat_types as types;

pub mod app;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod render;
pub mod storage;
pub mod topics;

pub use app::{execute_command, run_repl_mode, setup_from_cli, AppContext, Backend};
pub use auth::{AuthError, AuthSession};
pub use chat::ChatSession;
pub use cli::{Cli, Commands};
pub use config::{ClientConfig, FileConfig};
pub use storage::{LocalStore, SharedStore, StoreError};
