use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AcmapError, Result};

pub const API_URL_ENV: &str = "ACMAP_API_URL";
pub const PER_PAGE_ENV: &str = "ACMAP_PER_PAGE";

pub const DEFAULT_PER_PAGE: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default)]
    pub routes: RoutePaths,
}

/// Paths the screen hands back to its launcher when it navigates away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePaths {
    #[serde(default = "default_dashboard")]
    pub dashboard: String,
    #[serde(default = "default_account_master")]
    pub account_master: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_user_utility")]
    pub user_utility: String,
}

fn default_api_url() -> String {
    "http://localhost:8080/api/sugarian".to_string()
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

fn default_dashboard() -> String {
    "/DashBoard".to_string()
}

fn default_account_master() -> String {
    "/account-master".to_string()
}

fn default_fallback() -> String {
    "/path-no".to_string()
}

fn default_user_utility() -> String {
    "/eBuySugarian-user-utility".to_string()
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            dashboard: default_dashboard(),
            account_master: default_account_master(),
            fallback: default_fallback(),
            user_utility: default_user_utility(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
            routes: RoutePaths::default(),
        }
    }
}

/// Keys accepted by `acmap config set`.
pub const SETTING_KEYS: &[&str] = &[
    "api_url",
    "per_page",
    "routes.dashboard",
    "routes.account_master",
    "routes.fallback",
    "routes.user_utility",
];

impl Settings {
    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(per_page) = lookup(PER_PAGE_ENV).and_then(|v| v.trim().parse::<usize>().ok()) {
            if per_page > 0 {
                self.per_page = per_page;
            }
        }
        self
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_url" => {
                url::Url::parse(value)
                    .map_err(|e| AcmapError::InvalidUrl(format!("{value}: {e}")))?;
                self.api_url = value.to_string();
            }
            "per_page" => {
                let n: usize = value.parse().map_err(|_| {
                    AcmapError::Settings(format!("per_page must be a number, got '{value}'"))
                })?;
                if n == 0 {
                    return Err(AcmapError::Settings("per_page must be at least 1".into()));
                }
                self.per_page = n;
            }
            "routes.dashboard" => self.routes.dashboard = value.to_string(),
            "routes.account_master" => self.routes.account_master = value.to_string(),
            "routes.fallback" => self.routes.fallback = value.to_string(),
            "routes.user_utility" => self.routes.user_utility = value.to_string(),
            other => return Err(AcmapError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        Ok(match key {
            "api_url" => self.api_url.clone(),
            "per_page" => self.per_page.to_string(),
            "routes.dashboard" => self.routes.dashboard.clone(),
            "routes.account_master" => self.routes.account_master.clone(),
            "routes.fallback" => self.routes.fallback.clone(),
            "routes.user_utility" => self.routes.user_utility.clone(),
            other => return Err(AcmapError::UnknownSetting(other.to_string())),
        })
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("acmap")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn log_path() -> PathBuf {
    config_dir().join("acmap.log")
}

fn read_settings(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AcmapError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Settings file contents without environment overrides.
pub fn load_stored_settings() -> Settings {
    read_settings(&settings_path())
}

/// Effective settings: file, then environment.
pub fn load_settings() -> Settings {
    load_stored_settings().with_env(|key| std::env::var(key).ok())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    write_settings(&settings_path(), settings)
}
