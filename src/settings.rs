use crate::composer::PointBuyRules;
use crate::error::AppError;
use crate::stats::{MANUAL_POINTS_POOL, MIN_STAT_VALUE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "taleforge";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub language: String,               // Language the narrator writes in.
    pub openai_api_key: Option<String>, // Falls back to OPENAI_API_KEY when unset.
    pub model: String,
    pub api_base: Option<String>, // Any OpenAI-compatible endpoint.
    pub debug_mode: bool,
    pub point_pool: i32,
    pub stat_floor: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "English".to_string(),
            openai_api_key: None,
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            debug_mode: false,
            point_pool: MANUAL_POINTS_POOL,
            stat_floor: MIN_STAT_VALUE,
        }
    }
}

// `<home>/taleforge/data`
pub fn data_dir() -> Result<PathBuf, AppError> {
    let home = dir::home_dir().ok_or(AppError::NoHomeDirectory)?;
    Ok(home.join(APP_DIR_NAME).join("data"))
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_path() -> Result<PathBuf, AppError> {
        Ok(data_dir()?.join(SETTINGS_FILE_NAME))
    }

    pub fn load() -> Result<Self, AppError> {
        Ok(Self::load_settings_from_file(&Self::default_path()?)?)
    }

    pub fn save(&self) -> Result<(), AppError> {
        Ok(self.save_to_file(&Self::default_path()?)?)
    }

    pub fn load_settings_from_file(path: &Path) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    // The configured key, or the environment one. Blank keys count as missing.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn point_buy_rules(&self) -> PointBuyRules {
        PointBuyRules {
            pool: self.point_pool,
            floor: self.stat_floor,
        }
    }
}
