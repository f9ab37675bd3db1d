use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000; // one due-check per second
pub const DEFAULT_ACCEPTANCE_BAND_SECS: u64 = 60; // reminder stays "on time" for a minute
pub const MAX_ACCEPTANCE_BAND_SECS: u64 = 86_400;
pub const DEFAULT_DELIVERY_BUFFER: usize = 256;
pub const DEFAULT_CATEGORIES: [&str; 4] = ["General", "Work", "Personal", "Important"];

/// Top-level config (almanac.toml + ALMANAC_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlmanacConfig {
    #[serde(default)]
    pub reminders: ReminderSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        Self {
            reminders: ReminderSettings::default(),
            storage: StorageConfig::default(),
            categories: default_categories(),
        }
    }
}

/// Timing of the reminder poll loop.
///
/// The tick interval and the acceptance band are configured together: a
/// reminder is only fired by a tick that lands inside its band, so the band
/// has to cover at least two ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_acceptance_band_secs")]
    pub acceptance_band_secs: u64,
    /// Capacity of the scheduler → presentation delivery queue.
    #[serde(default = "default_delivery_buffer")]
    pub delivery_buffer: usize,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            acceptance_band_secs: DEFAULT_ACCEPTANCE_BAND_SECS,
            delivery_buffer: DEFAULT_DELIVERY_BUFFER,
        }
    }
}

impl ReminderSettings {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(AlmanacError::Config(
                "reminders.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.delivery_buffer == 0 {
            return Err(AlmanacError::Config(
                "reminders.delivery_buffer must be greater than zero".to_string(),
            ));
        }
        if self.acceptance_band_secs > MAX_ACCEPTANCE_BAND_SECS {
            return Err(AlmanacError::Config(format!(
                "reminders.acceptance_band_secs ({}) must be at most {}",
                self.acceptance_band_secs, MAX_ACCEPTANCE_BAND_SECS
            )));
        }
        let band_ms = self.acceptance_band_secs.saturating_mul(1_000);
        if self.tick_interval_ms.saturating_mul(2) > band_ms {
            return Err(AlmanacError::Config(format!(
                "reminders.tick_interval_ms ({}) must be at most half of \
                 reminders.acceptance_band_secs ({}s) or reminders can be skipped",
                self.tick_interval_ms, self.acceptance_band_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
fn default_acceptance_band_secs() -> u64 {
    DEFAULT_ACCEPTANCE_BAND_SECS
}
fn default_delivery_buffer() -> usize {
    DEFAULT_DELIVERY_BUFFER
}
fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}
fn default_storage_path() -> String {
    format!("{}/calendar_events.json", almanac_home())
}

fn almanac_home() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.almanac", home)
}

impl AlmanacConfig {
    /// Load config from a TOML file with ALMANAC_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `ALMANAC_REMINDERS__TICK_INTERVAL_MS=500`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: AlmanacConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ALMANAC_").split("__"))
            .extract()
            .map_err(|e| AlmanacError::Config(e.to_string()))?;

        config.reminders.validate()?;
        Ok(config)
    }
}

fn default_config_path() -> String {
    format!("{}/almanac.toml", almanac_home())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AlmanacConfig::default();
        assert!(cfg.reminders.validate().is_ok());
        assert_eq!(cfg.storage.backend, StorageBackend::Json);
        assert_eq!(cfg.categories.len(), 4);
    }

    #[test]
    fn tick_wider_than_half_band_rejected() {
        let settings = ReminderSettings {
            tick_interval_ms: 31_000,
            acceptance_band_secs: 60,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn widened_band_allows_wider_tick() {
        let settings = ReminderSettings {
            tick_interval_ms: 60_000,
            acceptance_band_secs: 120,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn oversized_band_rejected() {
        let settings = ReminderSettings {
            acceptance_band_secs: 100_000_000_000_000_000,
            ..Default::default()
        };
        assert_eq!(settings.validate().unwrap_err().code(), "CONFIG_ERROR");

        let day = ReminderSettings {
            acceptance_band_secs: MAX_ACCEPTANCE_BAND_SECS,
            ..Default::default()
        };
        assert!(day.validate().is_ok());
    }

    #[test]
    fn zero_tick_rejected() {
        let settings = ReminderSettings {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_reads_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "almanac.toml",
                r#"
                categories = ["General", "Gym"]

                [reminders]
                tick_interval_ms = 500

                [storage]
                backend = "sqlite"
                path = "events.db"
                "#,
            )?;
            jail.set_env("ALMANAC_REMINDERS__ACCEPTANCE_BAND_SECS", "90");

            let cfg = AlmanacConfig::load(Some("almanac.toml")).expect("config loads");
            assert_eq!(cfg.reminders.tick_interval_ms, 500);
            assert_eq!(cfg.reminders.acceptance_band_secs, 90);
            assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
            assert_eq!(cfg.storage.path, "events.db");
            assert_eq!(cfg.categories, vec!["General", "Gym"]);
            Ok(())
        });
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = AlmanacConfig::load(Some("does-not-exist.toml")).expect("defaults");
            assert_eq!(cfg.reminders, ReminderSettings::default());
            assert_eq!(cfg.categories.len(), 4);
            Ok(())
        });
    }

    #[test]
    fn load_rejects_invalid_timing() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "almanac.toml",
                "[reminders]\ntick_interval_ms = 45000\n",
            )?;
            assert!(AlmanacConfig::load(Some("almanac.toml")).is_err());
            Ok(())
        });
    }
}
