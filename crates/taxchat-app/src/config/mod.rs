use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use taxchat_api::{normalize_base_url, ApiMode};
use taxchat_logging::get_data_dir;
use taxchat_types::DEFAULT_API_URL;

use crate::cli::Cli;

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Optional `<data_dir>/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub mode: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Read the config file in `data_dir`; a missing file is an empty config
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

/// Settings the client runs with after all sources are merged
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub mode: ApiMode,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub verbose: bool,
    pub log_http: bool,
}

impl ClientConfig {
    /// Precedence: CLI flags > TAXCHAT_* env (both via clap) > config.toml > defaults
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let data_dir = get_data_dir(cli.data_dir.as_deref())?;
        let file = FileConfig::load(&data_dir)?;
        Self::merge(cli, file, data_dir)
    }

    pub fn merge(cli: &Cli, file: FileConfig, data_dir: PathBuf) -> Result<Self> {
        let api_url = cli
            .api_url
            .clone()
            .or(file.api_url)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mode = match cli.mode.as_deref().or(file.mode.as_deref()) {
            Some(mode) => mode.parse::<ApiMode>().map_err(anyhow::Error::msg)?,
            None => ApiMode::default(),
        };

        let timeout_secs = cli
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("Timeout must be at least 1 second");
        }

        Ok(Self {
            api_url: normalize_base_url(&api_url),
            mode,
            data_dir,
            timeout: Duration::from_secs(timeout_secs),
            verbose: cli.verbose,
            log_http: cli.log_http,
        })
    }
}
