//! Configuration file management for pmgen.
//!
//! Provides a TOML-based config file at `~/.config/pmgen/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pmgen_core::generate::GeneratorConfig;
use pmgen_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub generation: GenerationSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Generation backend settings. Every field is optional; unset fields fall
/// back to the built-in defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    /// API credential. Stored in a 0600 file; never logged or printed.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the pmgen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/pmgen` or `~/.config/pmgen`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("pmgen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pmgen")
}

/// Return the path to the pmgen config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold the API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PmgenConfig {
    pub db_config: DbConfig,
    pub generator_config: GeneratorConfig,
}

impl PmgenConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > default.
    ///
    /// - DB URL: `cli_db_url` > `PMGEN_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `PMGEN_API_KEY` env > `config_file.generation.api_key` > unset
    /// - Model: `cli_model` > `config_file.generation.model` > built-in default
    pub fn resolve(cli_db_url: Option<&str>, cli_model: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("PMGEN_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let defaults = GeneratorConfig::default();
        let generation = file_config.map(|cfg| cfg.generation).unwrap_or_default();

        let api_key = std::env::var("PMGEN_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or(generation.api_key)
            .filter(|k| !k.is_empty());

        let generator_config = GeneratorConfig {
            api_key,
            base_url: generation.base_url.unwrap_or(defaults.base_url),
            model: cli_model
                .map(str::to_owned)
                .or(generation.model)
                .unwrap_or(defaults.model),
            temperature: generation.temperature.unwrap_or(defaults.temperature),
            max_tokens: generation.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: generation
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        Ok(Self {
            db_config,
            generator_config,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
