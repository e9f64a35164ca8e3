//! Application configuration for the RAG curation tool.
//!
//! User config lives at `~/.ragcurate/ragcurate.toml`.
//! CLI flags override config file values, which override defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagCurateError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ragcurate.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ragcurate";

// ---------------------------------------------------------------------------
// Config structs (matching ragcurate.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database location.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Answer generator selection and settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5001".into()
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite/libSQL database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("rag.db")
}

/// Which answer generator the server is wired with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    /// Fixed canned answer, no network.
    #[default]
    Simulated,
    /// OpenAI-compatible chat completions endpoint.
    Chat,
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Chat => f.write_str("chat"),
        }
    }
}

impl FromStr for GeneratorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "simulated" => Ok(Self::Simulated),
            "chat" => Ok(Self::Chat),
            other => Err(format!(
                "unknown generator mode '{other}': expected 'simulated' or 'chat'"
            )),
        }
    }
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generator implementation to use.
    #[serde(default)]
    pub mode: GeneratorMode,

    /// Base URL of the chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: GeneratorMode::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ragcurate/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RagCurateError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ragcurate/ragcurate.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| RagCurateError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RagCurateError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the default config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RagCurateError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| RagCurateError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| RagCurateError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Check that the generator API key env var is set and non-empty.
///
/// Returns the key so callers do not read the environment twice.
pub fn validate_api_key(config: &GeneratorConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(RagCurateError::config(format!(
            "generator API key not found. Set the {var_name} environment variable \
             or use the simulated generator."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("bind"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("mode = \"simulated\""));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[generator]
mode = "chat"
model = "local/qwen"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.generator.mode, GeneratorMode::Chat);
        assert_eq!(config.generator.model, "local/qwen");
        assert_eq!(config.generator.timeout_secs, 120);
        assert_eq!(config.server.bind, "127.0.0.1:5001");
        assert_eq!(config.database.path, PathBuf::from("data").join("rag.db"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = toml::from_str::<AppConfig>("[generator]\nmode = \"gpt\"\n");
        assert!(err.is_err());
        assert!("gpt".parse::<GeneratorMode>().is_err());
        assert_eq!("chat".parse::<GeneratorMode>(), Ok(GeneratorMode::Chat));
    }

    #[test]
    fn init_then_load_from_path() {
        let dir = std::env::temp_dir().join(format!("ragcurate_cfg_{}", std::process::id()));
        let path = dir.join("nested").join(CONFIG_FILE_NAME);
        init_config_at(&path).expect("init config");

        let loaded = load_config_from(&path).expect("load config");
        assert_eq!(loaded.generator.mode, GeneratorMode::Simulated);
        assert_eq!(loaded.server.bind, default_bind());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_validation() {
        let config = GeneratorConfig {
            // Use a unique env var name to avoid interfering with other tests
            api_key_env: "RAGCURATE_TEST_NONEXISTENT_KEY_12345".into(),
            ..GeneratorConfig::default()
        };
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
