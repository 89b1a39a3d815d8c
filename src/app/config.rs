use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::app::pagination::RetryPolicy;
use crate::types::ShowList;

fn default_api_base() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_reload_distance() -> usize {
    10
}

fn default_page_rows() -> usize {
    12
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_image_base")]
    pub image_base: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub list: ShowList,
    // Rows left below the viewport at which the next page is requested
    #[serde(default = "default_reload_distance")]
    pub reload_distance: usize,
    // Rows shown per scroll step in the console view
    #[serde(default = "default_page_rows")]
    pub page_rows: usize,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            image_base: default_image_base(),
            language: default_language(),
            list: ShowList::default(),
            reload_distance: default_reload_distance(),
            page_rows: default_page_rows(),
            retry: RetryPolicy::default(),
        }
    }
}

lazy_static! {
    pub static ref APP_CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::default());
}

fn config_file_path() -> PathBuf {
    // Allow override for tests and packaging via env var
    if let Ok(p) = std::env::var("TVSHOWS_APP_CONFIG_PATH") {
        return PathBuf::from(p);
    }
    PathBuf::from("app_config.json")
}

impl AppConfig {
    pub fn load_from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let s: AppConfig = serde_json::from_str(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(s)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }

    /// Environment wins over the file: `TMDB_API_KEY` (also read from `.env`).
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TMDB_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
    }
}

/// Read settings with a closure instead of spelling out the lock at every call site.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&AppConfig) -> R,
{
    let cfg = APP_CONFIG.read().unwrap_or_else(|e| e.into_inner());
    f(&cfg)
}

pub fn load_config_from_disk() {
    // Not an error if there is no .env
    let _ = dotenvy::dotenv();

    let path = config_file_path();
    let mut cfg = match AppConfig::load_from_file(&path) {
        Ok(cfg) => {
            log::info!("Loaded app_config from {}", path.to_string_lossy());
            cfg
        }
        Err(e) => {
            // Keep defaults if missing/unreadable
            log::info!(
                "Using default app_config; cannot load {}: {}",
                path.to_string_lossy(),
                e
            );
            AppConfig::default()
        }
    };
    cfg.apply_env_overrides();
    if cfg.api_key.is_none() {
        log::warn!("No TMDB api key configured; set TMDB_API_KEY or api_key in app_config.json");
    }
    *APP_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = cfg;
}
