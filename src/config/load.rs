use crate::config::types::{Config, UserSettings};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// 設定檔位於目前工作目錄
pub const SETTINGS_FILE: &str = "settings.json";

impl Config {
    /// 讀取 `settings.json`（不存在時使用預設值）並驗證
    pub fn new() -> Result<Self> {
        Self::from_path(Path::new(SETTINGS_FILE))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let settings = load_settings(path)?;
        settings
            .validate()
            .with_context(|| format!("設定檔內容無效: {}", path.display()))?;
        Ok(Self { settings })
    }
}

pub fn load_settings(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        debug!("找不到設定檔，使用預設值: {}", path.display());
        return Ok(UserSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    let settings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
    info!("已載入設定檔: {}", path.display());
    Ok(settings)
}
