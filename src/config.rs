// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Cli;

// =============================================================================
// DEFAULTS
// =============================================================================
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptify")
}

// =============================================================================
// CONFIG FILE
// =============================================================================
pub const CONFIG_FILENAME: &str = ".promptify.toml";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
    /// Signed-in identity; selects the credit scope and prompt ownership.
    pub email: Option<String>,
    /// Identities with unlimited credits.
    pub admin_emails: Option<Vec<String>>,
    pub data_dir: Option<PathBuf>,
    pub default_target: Option<String>,
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_FILENAME))
    }

    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("Could not determine home directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        println!("Config saved to: {}", path.display());
        Ok(())
    }
}

// =============================================================================
// RESOLVED CONFIG
// =============================================================================
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    pub email: Option<String>,
    pub admin_emails: Vec<String>,
    pub data_dir: PathBuf,
    pub default_target: Option<String>,
}

impl ResolvedConfig {
    /// Priority: CLI args (and their env fallbacks) > config file > env var > defaults.
    pub fn new(cli: &Cli, file: &Config) -> Self {
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| file.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());

        let model = cli
            .model
            .clone()
            .or_else(|| file.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = cli
            .max_tokens
            .or(file.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let temperature = cli
            .temperature
            .or(file.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| file.base_url.clone())
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        let email = cli.email.clone().or_else(|| file.email.clone());

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file.data_dir.clone())
            .unwrap_or_else(default_data_dir);

        Self {
            api_key,
            model,
            max_tokens,
            temperature,
            base_url,
            email,
            admin_emails: file.admin_emails.clone().unwrap_or_default(),
            data_dir,
            default_target: file.default_target.clone(),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            base_url: GEMINI_BASE_URL.into(),
            email: None,
            admin_emails: Vec::new(),
            data_dir: std::env::temp_dir().join("promptify-tests"),
            default_target: None,
        }
    }
}

// =============================================================================
// MODULE TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["promptify"];
        argv.extend_from_slice(args);
        argv.push("config");
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn config_default_is_empty() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(config.email.is_none());
        assert!(config.admin_emails.is_none());
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml_str = r#"
            api_key = "AIza-test"
            model = "gemini-2.5-pro"
            email = "me@example.com"
            admin_emails = ["owner@example.com"]
            default_target = "cursor"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.admin_emails, Some(vec!["owner@example.com".to_string()]));
        assert_eq!(config.default_target.as_deref(), Some("cursor"));
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = Config {
            email: Some("me@example.com".into()),
            max_tokens: Some(1000),
            ..Default::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("email = \"me@example.com\""));
        assert!(toml_str.contains("max_tokens = 1000"));
    }

    #[test]
    fn config_path_in_home() {
        if let Some(path) = Config::path() {
            assert!(path.to_string_lossy().ends_with(".promptify.toml"));
        }
    }

    #[test]
    fn resolved_config_uses_defaults() {
        let resolved = ResolvedConfig::new(&cli(&[]), &Config::default());
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(resolved.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(resolved.base_url, GEMINI_BASE_URL);
        assert!(resolved.admin_emails.is_empty());
    }

    #[test]
    fn resolved_config_file_overrides_defaults() {
        let file = Config {
            api_key: Some("file-key".into()),
            model: Some("gemini-2.5-pro".into()),
            temperature: Some(0.2),
            data_dir: Some(PathBuf::from("/tmp/promptify-data")),
            admin_emails: Some(vec!["boss@x.io".into()]),
            ..Default::default()
        };
        let resolved = ResolvedConfig::new(&cli(&[]), &file);
        assert_eq!(resolved.api_key.as_deref(), Some("file-key"));
        assert_eq!(resolved.model, "gemini-2.5-pro");
        assert_eq!(resolved.temperature, 0.2);
        assert_eq!(resolved.data_dir, PathBuf::from("/tmp/promptify-data"));
        assert_eq!(resolved.admin_emails, vec!["boss@x.io".to_string()]);
    }

    #[test]
    fn resolved_config_cli_overrides_file() {
        let file = Config {
            api_key: Some("file-key".into()),
            model: Some("gemini-2.5-pro".into()),
            email: Some("file@x.io".into()),
            ..Default::default()
        };
        let resolved = ResolvedConfig::new(
            &cli(&["--api-key", "cli-key", "--model", "gemini-2.0-flash", "--email", "cli@x.io"]),
            &file,
        );
        assert_eq!(resolved.api_key.as_deref(), Some("cli-key"));
        assert_eq!(resolved.model, "gemini-2.0-flash");
        assert_eq!(resolved.email.as_deref(), Some("cli@x.io"));
    }
}
