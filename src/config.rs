use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Caption language code used by both transcript strategies ("en" if unset)
    pub default_lang: Option<String>,
    /// Groq model name
    pub default_model: Option<String>,
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`
    pub api_base: Option<String>,
    /// Seconds allowed for each HTTP request and for the whole yt-dlp run (30 if unset)
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from ~/.config/urlsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("urlsum")
        .join("config.toml")
}
