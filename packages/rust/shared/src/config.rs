//! Application configuration for pageguide.
//!
//! User config lives at `~/.pageguide/pageguide.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuidanceError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pageguide.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pageguide";

// ---------------------------------------------------------------------------
// Config structs (matching pageguide.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scope derivation and query defaults.
    #[serde(default)]
    pub guidance: GuidanceConfig,

    /// SDK bridge subprocess settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Current user identity.
    #[serde(default)]
    pub user: UserConfig,
}

/// `[guidance]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Namespace tag prepended to page names when deriving quick-answer scopes.
    #[serde(default = "default_scope_prefix")]
    pub scope_prefix: String,

    /// Namespace tag used for context-sensitive help lookups.
    #[serde(default = "default_help_scope_prefix")]
    pub help_scope_prefix: String,

    /// Path marker preceding the object name in record page locations.
    #[serde(default = "default_location_marker")]
    pub location_marker: String,

    /// Simple query sent with every artefact search.
    #[serde(default = "default_initial_query")]
    pub initial_query: String,

    /// Page size for document searches.
    #[serde(default = "default_document_page_limit")]
    pub document_page_limit: u32,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            scope_prefix: default_scope_prefix(),
            help_scope_prefix: default_help_scope_prefix(),
            location_marker: default_location_marker(),
            initial_query: default_initial_query(),
            document_page_limit: default_document_page_limit(),
        }
    }
}

fn default_scope_prefix() -> String {
    "sf-page-guidance-v2-".into()
}
fn default_help_scope_prefix() -> String {
    "sf-page-guidance-".into()
}
fn default_location_marker() -> String {
    "lightning/r/".into()
}
fn default_initial_query() -> String {
    "*".into()
}
fn default_document_page_limit() -> u32 {
    5
}

/// `[bridge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Program that hosts the Panviva SDK (e.g., "node").
    #[serde(default = "default_bridge_command")]
    pub command: String,

    /// Arguments passed to the bridge program.
    #[serde(default = "default_bridge_args")]
    pub args: Vec<String>,

    /// Working directory for the bridge subprocess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Upper bound on a single bridge round trip.
    #[serde(default = "default_bridge_timeout")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: default_bridge_args(),
            working_dir: None,
            timeout_secs: default_bridge_timeout(),
        }
    }
}

fn default_bridge_command() -> String {
    "node".into()
}
fn default_bridge_args() -> Vec<String> {
    vec!["panviva-bridge.js".into()]
}
fn default_bridge_timeout() -> u64 {
    30
}

/// `[user]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Email of the signed-in user; the Panviva username is its local part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Guidance options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime guidance options, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct GuidanceOptions {
    pub scope_prefix: String,
    pub help_scope_prefix: String,
    pub location_marker: String,
    pub initial_query: String,
    pub document_page_limit: u32,
}

impl From<&AppConfig> for GuidanceOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            scope_prefix: config.guidance.scope_prefix.clone(),
            help_scope_prefix: config.guidance.help_scope_prefix.clone(),
            location_marker: config.guidance.location_marker.clone(),
            initial_query: config.guidance.initial_query.clone(),
            document_page_limit: config.guidance.document_page_limit,
        }
    }
}

impl Default for GuidanceOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Derive the Panviva username (the part before `@`) from an email.
pub fn username_from_email(email: &str) -> Option<String> {
    let local = email.split('@').next().unwrap_or_default().trim();
    if local.is_empty() {
        None
    } else {
        Some(local.to_string())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pageguide/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GuidanceError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pageguide/pageguide.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| GuidanceError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GuidanceError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GuidanceError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GuidanceError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GuidanceError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("scope_prefix"));
        assert!(toml_str.contains("sf-page-guidance-v2-"));
        assert!(!toml_str.contains("email"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[bridge]
command = "bun"
args = ["run", "bridge.ts"]

[user]
email = "jo.smith@example.com"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.bridge.command, "bun");
        assert_eq!(config.bridge.timeout_secs, 30);
        assert_eq!(config.guidance.location_marker, "lightning/r/");
        assert_eq!(config.user.email.as_deref(), Some("jo.smith@example.com"));
    }

    #[test]
    fn guidance_options_from_app_config() {
        let mut app = AppConfig::default();
        app.guidance.document_page_limit = 10;
        let opts = GuidanceOptions::from(&app);
        assert_eq!(opts.document_page_limit, 10);
        assert_eq!(opts.initial_query, "*");
        assert_eq!(opts.help_scope_prefix, "sf-page-guidance-");
    }

    #[test]
    fn username_is_email_local_part() {
        assert_eq!(username_from_email("jo.smith@example.com").as_deref(), Some("jo.smith"));
        assert_eq!(username_from_email("nodomain").as_deref(), Some("nodomain"));
        assert!(username_from_email("@example.com").is_none());
        assert!(username_from_email("").is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/pageguide.toml")).unwrap_err();
        assert!(matches!(err, GuidanceError::Io { .. }));
    }
}
