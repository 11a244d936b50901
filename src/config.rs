use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AdmError, Result};

/// Application name passed to the notification sink.
pub const APP_NAME: &str = "ADM";

/// Optional settings read from `config.json` in the data directory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub news_api_key: Option<String>,
    #[serde(default)]
    pub news_language: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub news_api_key: Option<String>,
    pub news_language: String,
    pub app_name: String,
}

impl Config {
    /// Builds the configuration.
    ///
    /// The data directory is determined in the following order:
    /// 1. `ADM_DATA_DIR` environment variable.
    /// 2. `~/.local/share/adm` (on Linux).
    /// 3. `./adm` (fallback).
    ///
    /// `NEWS_API_KEY` overrides the key stored in `config.json`.
    pub fn load() -> Result<Self> {
        let data_dir = std::env::var("ADM_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("adm")
        });
        let cache_dir = dirs::cache_dir()
            .map(|p| p.join("adm"))
            .unwrap_or_else(|| data_dir.join("cache"));
        Self::from_dirs(data_dir, cache_dir)
    }

    /// Builds the configuration rooted at explicit directories.
    pub fn from_dirs(data_dir: PathBuf, cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir).map_err(|e| AdmError::io(&data_dir, e))?;

        let file_path = data_dir.join("config.json");
        let file = if file_path.exists() {
            let raw = fs::read_to_string(&file_path).map_err(|e| AdmError::io(&file_path, e))?;
            serde_json::from_str::<FileConfig>(&raw)
                .map_err(|e| AdmError::Config(format!("{}: {}", file_path.display(), e)))?
        } else {
            FileConfig::default()
        };

        let news_api_key = std::env::var("NEWS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or(file.news_api_key);

        Ok(Self {
            data_dir,
            cache_dir,
            news_api_key,
            news_language: file.news_language.unwrap_or_else(|| "en".into()),
            app_name: file.app_name.unwrap_or_else(|| APP_NAME.into()),
        })
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("tasks.jsonl")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.jsonl")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("tasks.snapshot")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("journal_entries.jsonl")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("adm.log")
    }

    pub fn image_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("images")
    }
}
