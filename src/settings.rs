use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FlatError, Result};
use crate::fields::ColumnLayout;
use crate::reconciler::TOTAL_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Fail on non-blank rows that match no row layout instead of skipping them.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_transfer_payor")]
    pub transfer_payor: String,
}

fn default_tolerance() -> f64 {
    TOTAL_TOLERANCE
}

fn default_transfer_payor() -> String {
    "internal transfer in".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnLayout::default(),
            tolerance: default_tolerance(),
            strict: false,
            transfer_payor: default_transfer_payor(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.columns.validate()?;
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(FlatError::Settings(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.transfer_payor.trim().is_empty() {
            return Err(FlatError::Settings("transfer_payor must not be empty".to_string()));
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("receiptflat")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from the user config file, or defaults when there is none.
pub fn load_settings() -> Result<Settings> {
    let path = settings_path();
    if path.exists() {
        load_settings_from(&path)
    } else {
        Ok(Settings::default())
    }
}

/// Settings from an explicit file. Unlike the user config, a malformed file
/// is an error rather than a silent fallback.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)
        .map_err(|e| FlatError::Settings(format!("{}: {e}", path.display())))?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FlatError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
