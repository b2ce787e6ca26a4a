use config::{Config, ConfigError, Environment, File};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::calendar::{default_epoch, DrawCalendar, DEFAULT_INTERVAL_DAYS};

pub const DEFAULT_CONFIG_FILE: &str = "Config.toml";
pub const ENV_PREFIX: &str = "LOTTO";

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetSettings {
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("lotto-data.json")
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarSettings {
    /// Date of round 1. The only place the epoch is configured.
    #[serde(default = "default_epoch")]
    pub epoch_date: NaiveDate,
    #[serde(default = "default_interval_days")]
    pub draw_interval_days: u32,
}

fn default_interval_days() -> u32 {
    DEFAULT_INTERVAL_DAYS
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            epoch_date: default_epoch(),
            draw_interval_days: default_interval_days(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_url() -> String {
    "https://www.dhlottery.co.kr/common.do".to_string()
}

fn default_search_url() -> String {
    "https://search.naver.com/search.naver?query=%EB%A1%9C%EB%98%90+%EB%8B%B9%EC%B2%A8%EB%B2%88%ED%98%B8".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            search_url: default_search_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// How the reconciler looks for new rounds.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Walk forward round by round from the cursor, stop at the first failure.
    Sequential,
    /// Ask the search page for the newest round first, fill the rounds in between.
    #[default]
    LatestFirst,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SyncSettings {
    #[serde(default)]
    pub mode: SyncMode,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Settings {
    /// Loads `Config.toml` (or `path`) if present, then `LOTTO_*` env overrides,
    /// e.g. `LOTTO_DATASET__PATH=/data/lotto.json`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // An explicit path must exist; the default one is optional.
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let s = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.sources.timeout_seconds) {
            return Err(ConfigError::Message(format!(
                "sources.timeout_seconds must be within 1..=60, got {}",
                self.sources.timeout_seconds
            )));
        }
        if self.calendar.draw_interval_days == 0 {
            return Err(ConfigError::Message(
                "calendar.draw_interval_days must be positive".to_string(),
            ));
        }
        for (key, raw) in [
            ("sources.api_url", &self.sources.api_url),
            ("sources.search_url", &self.sources.search_url),
        ] {
            url::Url::parse(raw)
                .map_err(|e| ConfigError::Message(format!("{} is not a valid URL: {}", key, e)))?;
        }
        Ok(())
    }

    pub fn calendar(&self) -> DrawCalendar {
        DrawCalendar::new(self.calendar.epoch_date, self.calendar.draw_interval_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.dataset.path, PathBuf::from("lotto-data.json"));
        assert_eq!(settings.sync.mode, SyncMode::LatestFirst);
        assert_eq!(settings.calendar().date_of(1), Some(default_epoch()));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[dataset]
path = "/tmp/history.json"

[calendar]
epoch_date = "2002-12-07"

[sources]
timeout_seconds = 15

[sync]
mode = "sequential"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.dataset.path, PathBuf::from("/tmp/history.json"));
        assert_eq!(settings.sources.timeout_seconds, 15);
        assert_eq!(settings.sync.mode, SyncMode::Sequential);
        assert_eq!(settings.sources.api_url, default_api_url());
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        let mut settings = Settings::default();
        settings.sources.timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/lotto.toml"))).is_err());
    }
}
