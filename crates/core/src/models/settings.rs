use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

use super::valuation::DISPLAY_SCALE;

/// Engine configuration. Every field has a default so partial JSON
/// documents load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pivot currency every fixing is quoted in (e.g., "USD").
    pub base_currency: String,

    /// Window, in days, of the "monthly dynamic" shown in listings.
    pub dynamic_window_days: u64,

    /// Fractional digits kept in reported money and percentages.
    pub display_scale: u32,

    /// First date requested from the feeds on a full refresh.
    pub history_start: NaiveDate,

    /// A full refresh stops this many days before "today".
    pub feed_lag_days: u64,

    /// Optional API keys for feeds that require them.
    /// Keys: provider name. Values: the API key string.
    pub api_keys: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            dynamic_window_days: 30,
            display_scale: DISPLAY_SCALE,
            history_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            feed_lag_days: 10,
            api_keys: HashMap::new(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file on disk.
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check every field and normalize the base currency code.
    pub fn validate(&mut self) -> Result<(), CoreError> {
        let code = self.base_currency.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid base currency '{}': must be exactly 3 ASCII letters (e.g., USD)",
                self.base_currency
            )));
        }
        self.base_currency = code;

        if self.dynamic_window_days < 1 {
            return Err(CoreError::ValidationError(format!(
                "dynamic_window_days must be at least 1, got {}",
                self.dynamic_window_days
            )));
        }
        if self.display_scale > 10 {
            return Err(CoreError::ValidationError(format!(
                "display_scale must be between 0 and 10, got {}",
                self.display_scale
            )));
        }
        Ok(())
    }
}
