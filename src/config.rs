//! Runtime configuration.
//!
//! A JSON file under the state dir holds the stable settings; `CSTBOT_*`
//! environment variables override it so secrets can stay out of the
//! file. Validation happens at load so a bad schedule or an empty
//! allow-list fails at startup, not inside a cycle.

use crate::status::source::Credentials;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Community tracker spreadsheet, public read access.
pub const DEFAULT_SHEET_ID: &str = "1U27V95kWlCVYWB0zye7DvqoXSkyqxgbA31eEJ_TKO6Y";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub chat_id: Option<i64>,
    pub sheets_api_key: Option<String>,
    pub sheet_id: String,
    pub locations: Vec<String>,
    pub scrape_command: Option<String>,
    pub uci: Option<String>,
    pub password: Option<String>,
    pub forum_hours: Vec<u32>,
    pub status_hours: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: None,
            chat_id: None,
            sheets_api_key: None,
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            locations: vec!["vancouver".to_string()],
            scrape_command: None,
            uci: None,
            password: None,
            forum_hours: vec![7, 9, 11, 13, 15, 17, 19, 21, 23],
            status_hours: vec![8, 14, 20],
        }
    }
}

/// Default state directory, `<platform data dir>/cstbot`.
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cstbot")
}

/// Load the config file if present, apply environment overrides, and
/// validate. A missing file is fine; defaults plus environment often
/// cover everything.
pub fn load(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let bytes =
            fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_slice(&bytes).context("parse config JSON")?
    } else {
        Config::default()
    };
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Environment wins over the file for every secret-bearing field.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("CSTBOT_TELEGRAM_TOKEN") {
            self.telegram_token = Some(value);
        }
        if let Some(value) = lookup("CSTBOT_CHAT_ID") {
            match value.parse() {
                Ok(id) => self.chat_id = Some(id),
                Err(_) => tracing::warn!("CSTBOT_CHAT_ID is not a number, ignoring"),
            }
        }
        if let Some(value) = lookup("CSTBOT_SHEETS_KEY") {
            self.sheets_api_key = Some(value);
        }
        if let Some(value) = lookup("CSTBOT_SCRAPE_COMMAND") {
            self.scrape_command = Some(value);
        }
        if let Some(value) = lookup("CSTBOT_UCI") {
            self.uci = Some(value);
        }
        if let Some(value) = lookup("CSTBOT_PASSWORD") {
            self.password = Some(value);
        }
    }

    fn validate(&self) -> Result<()> {
        for &hour in self.forum_hours.iter().chain(&self.status_hours) {
            if hour > 23 {
                return Err(anyhow!("schedule hour {hour} is out of range"));
            }
        }
        if self.locations.is_empty() {
            return Err(anyhow!("locations allow-list must not be empty"));
        }
        Ok(())
    }

    /// Telegram credentials, required by anything that sends.
    pub fn telegram(&self) -> Result<(String, i64)> {
        let token = self
            .telegram_token
            .clone()
            .ok_or_else(|| anyhow!("telegram token not configured (CSTBOT_TELEGRAM_TOKEN)"))?;
        let chat_id = self
            .chat_id
            .ok_or_else(|| anyhow!("chat id not configured (CSTBOT_CHAT_ID)"))?;
        Ok((token, chat_id))
    }

    pub fn sheets_key(&self) -> Result<String> {
        self.sheets_api_key
            .clone()
            .ok_or_else(|| anyhow!("sheets API key not configured (CSTBOT_SHEETS_KEY)"))
    }

    /// Scrape command plus portal credentials. `None` when the
    /// live-status side is not configured at all; an error when it is
    /// configured but incompletely.
    pub fn scraper(&self) -> Result<Option<(String, Credentials)>> {
        let Some(command) = self.scrape_command.clone() else {
            return Ok(None);
        };
        let uci = self
            .uci
            .clone()
            .ok_or_else(|| anyhow!("portal UCI not configured (CSTBOT_UCI)"))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| anyhow!("portal password not configured (CSTBOT_PASSWORD)"))?;
        Ok(Some((command, Credentials { uci, password })))
    }
}
