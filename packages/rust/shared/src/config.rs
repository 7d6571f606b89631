//! Application configuration for ExpertDesk.
//!
//! User config lives at `~/.expertdesk/expertdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ExpertDeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "expertdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".expertdesk";

// ---------------------------------------------------------------------------
// Config structs (matching expertdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Listing defaults.
    #[serde(default)]
    pub view: ViewConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root URL; collection paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the session token (never store the token itself).
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token_env: default_auth_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_auth_token_env() -> String {
    "EXPERTDESK_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[view]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Employment filter applied when none is given: current, former, or all.
    #[serde(default = "default_employment")]
    pub employment: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            employment: default_employment(),
        }
    }
}

fn default_page_size() -> usize {
    10
}
fn default_employment() -> String {
    "all".into()
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration, resolved from the config file, env, and CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Backend root URL, always ending in `/`.
    pub base_url: Url,
    /// Session token sent as the `Authorization` header, if any.
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl FetchConfig {
    /// Build a config for `base_url` with no token and the default timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        })
    }
}

impl TryFrom<&AppConfig> for FetchConfig {
    type Error = ExpertDeskError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.api.base_url)?,
            auth_token: resolve_auth_token(config),
            timeout_secs: config.api.timeout_secs,
        })
    }
}

/// Parse a base URL, adding the trailing slash `Url::join` needs to keep the path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ExpertDeskError::config(format!("invalid base_url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ExpertDeskError::config(format!(
            "base_url must be http or https, got '{other}'"
        ))),
    }
}

/// Read the session token from the env var named in the config, if set and non-empty.
pub fn resolve_auth_token(config: &AppConfig) -> Option<String> {
    let var_name = &config.api.auth_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => {
            tracing::debug!(var = %var_name, "no session token in environment");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.expertdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ExpertDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.expertdesk/expertdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ExpertDeskError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ExpertDeskError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ExpertDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ExpertDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ExpertDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
