use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use taxchat_api::{ApiMode, AuthApi, ChatApi, HttpClient, MockApi};
use taxchat_logging::{debug_line, get_logs_dir};

use crate::auth::AuthSession;
use crate::chat::ChatSession;
use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::storage::{LocalStore, SharedStore, AUTH_TOKEN_KEY};

/// Clients for the configured backend.
///
/// In HTTP mode both handles point at the same `HttpClient`, so a token set
/// through the auth side is sent with chat requests too.
#[derive(Clone)]
pub struct Backend {
    pub chat: Arc<dyn ChatApi>,
    pub auth: Option<Arc<dyn AuthApi>>,
}

impl Backend {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        match config.mode {
            ApiMode::Mock => Ok(Self {
                chat: Arc::new(MockApi::new()),
                auth: None,
            }),
            ApiMode::Http => {
                let logs_dir = if config.log_http {
                    Some(get_logs_dir(&config.data_dir)?)
                } else {
                    None
                };
                let client = HttpClient::with_timeout(&config.api_url, config.timeout)
                    .context("Failed to build HTTP client")?
                    .verbose(config.verbose)
                    .log_to(logs_dir);
                let client = Arc::new(client);
                Ok(Self {
                    chat: client.clone(),
                    auth: Some(client),
                })
            }
        }
    }
}

/// Everything a command or the REPL needs
pub struct AppContext {
    pub config: ClientConfig,
    pub store: SharedStore,
    pub backend: Backend,
}

impl AppContext {
    pub fn new(config: ClientConfig, store: SharedStore, backend: Backend) -> Self {
        Self { config, store, backend }
    }

    pub fn chat_session(&self) -> ChatSession<dyn ChatApi> {
        ChatSession::new(self.backend.chat.clone(), self.store.clone()).verbose(self.config.verbose)
    }

    pub fn auth_session(&self) -> Result<AuthSession<dyn AuthApi>> {
        let api = self
            .backend
            .auth
            .clone()
            .with_context(|| format!("Accounts are not available in {} mode", self.config.mode))?;
        Ok(AuthSession::new(api, self.store.clone()).verbose(self.config.verbose))
    }

    /// Attach a stored bearer token without checking it with the backend
    pub async fn apply_stored_token(&self) {
        let Some(auth) = &self.backend.auth else {
            return;
        };
        let token = self.store.lock().await.get(AUTH_TOKEN_KEY);
        if token.is_some() {
            debug_line(self.config.verbose, "🔑 Using stored auth token");
        }
        auth.set_token(token);
    }
}

/// Set up application configuration from CLI arguments
pub fn setup_from_cli(cli: &Cli) -> Result<AppContext> {
    let config = ClientConfig::resolve(cli)?;

    debug_line(
        config.verbose,
        format!(
            "API: {} ({} mode, {}s timeout) • data dir: {}",
            config.api_url,
            config.mode,
            config.timeout.as_secs(),
            config.data_dir.display()
        ),
    );
    if config.mode == ApiMode::Mock && config.verbose {
        eprintln!("{}", "Using offline mock answers".yellow());
    }

    let store = LocalStore::open(&config.data_dir)?.shared();
    let backend = Backend::from_config(&config)?;
    Ok(AppContext::new(config, store, backend))
}
