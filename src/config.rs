//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `--config <PATH>` on the command line (must exist and parse)
//! 2. `$MAILNORM_CONFIG` (environment variable)
//! 3. `~/.config/mailnorm/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailnorm\config.toml` (Windows)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};
use crate::parser::mbox::InputMode;
use crate::parser::mime::MAX_DEPTH;

/// Upper bound for a configured `max_depth`; deeper values are clamped.
pub const MAX_DEPTH_CEILING: usize = 64;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Message framing and MIME walking.
    pub parsing: ParsingConfig,
    /// JSON output settings.
    pub output: OutputConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Message framing and MIME walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Input framing: "auto", "single" or "mbox".
    pub mode: InputMode,
    /// Deepest multipart nesting that is still walked.
    pub max_depth: usize,
}

/// JSON output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON document.
    pub pretty: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            mode: InputMode::Auto,
            max_depth: MAX_DEPTH,
        }
    }
}

impl ParsingConfig {
    /// Return a copy with `max_depth` limited to [`MAX_DEPTH_CEILING`].
    pub fn clamped(self) -> Self {
        if self.max_depth <= MAX_DEPTH_CEILING {
            return self;
        }
        tracing::warn!(
            requested = self.max_depth,
            ceiling = MAX_DEPTH_CEILING,
            "max_depth too large, clamping"
        );
        Self {
            max_depth: MAX_DEPTH_CEILING,
            ..self
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match load_config_from(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to load config, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Load configuration from an explicit path. Unlike [`load_config`], a
/// missing or malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MailError::FileNotFound(path.to_path_buf())
        } else {
            MailError::io(path, e)
        }
    })?;
    let mut cfg = toml::from_str::<Config>(&contents)
        .map_err(|e| MailError::Config(format!("{}: {e}", path.display())))?;
    cfg.parsing = cfg.parsing.clamped();
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("MAILNORM_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("mailnorm").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailnorm")
}
