//! Runtime settings: parsing, validation, and environment overrides.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Entrypoints:
//! - Parse + validate a TOML string: [`load_settings_str`]
//! - Same, from a file on disk: [`load_settings_path`]
//! - Apply `DATABASE_URL` on top: [`Settings::with_env_overrides`]

use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::{
    day::DayCalendar, dwell::DwellBands, pipeline::PipelineSettings, status::StatusThresholds, tz,
};

/// Environment variable that overrides [`Settings::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// SQLite file path (optionally `sqlite:`-prefixed).
    pub database_url: String,
    /// IANA zone name that decides where one day ends and the next begins.
    pub timezone: String,
    /// Seconds between live polls.
    pub poll_interval_secs: u64,
    /// Smoothing and display budget.
    pub pipeline: PipelineSettings,
    /// Display thresholds.
    pub status: StatusThresholds,
    /// Dwell band edges.
    pub dwell: DwellBands,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "co2.db".to_string(),
            timezone: "UTC".to_string(),
            poll_interval_secs: 3,
            pipeline: PipelineSettings::default(),
            status: StatusThresholds::default(),
            dwell: DwellBands::default(),
        }
    }
}

impl Settings {
    /// Replace `database_url` with `DATABASE_URL` when that is set and non-blank.
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Some(url) = shared_utils::get_env_var_opt(DATABASE_URL_ENV)? {
            self.database_url = url;
        }
        Ok(self)
    }

    /// Calendar for the configured zone.
    pub fn calendar(&self) -> anyhow::Result<DayCalendar> {
        Ok(DayCalendar::new(tz::parse_tz(&self.timezone)?))
    }

    /// Live poll cadence.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject combinations that parse but make no sense.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            bail!("database_url cannot be empty");
        }
        tz::parse_tz(&self.timezone).context("invalid timezone")?;
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.pipeline.max_points == 0 {
            bail!("pipeline.max_points must be at least 1");
        }
        if self.pipeline.smoothing_window == 0 {
            bail!("pipeline.smoothing_window must be at least 1");
        }
        if self.status.warning >= self.status.danger {
            bail!(
                "status.warning ({}) must be below status.danger ({})",
                self.status.warning,
                self.status.danger
            );
        }
        if self.dwell.mid >= self.dwell.high {
            bail!(
                "dwell.mid ({}) must be below dwell.high ({})",
                self.dwell.mid,
                self.dwell.high
            );
        }
        Ok(())
    }
}

/// Parse settings from a TOML string and validate them.
pub fn load_settings_str(toml_str: &str) -> anyhow::Result<Settings> {
    let settings: Settings = from_str(toml_str).context("failed to parse settings TOML")?;
    settings.validate()?;
    Ok(settings)
}

/// Read a settings file from disk, then parse and validate it.
pub fn load_settings_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Settings> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read settings file {}", path.as_ref().display()))?;
    load_settings_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::{env, io::Write};

    #[test]
    fn empty_file_gives_defaults() {
        let s = load_settings_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.pipeline.max_points, 1500);
        assert_eq!(s.pipeline.smoothing_window, 15);
        assert_eq!(s.poll_interval(), Duration::from_secs(3));
        assert_eq!(s.status.warning, 800.0);
        assert_eq!(s.dwell.high, 1500.0);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let s = load_settings_str(
            r#"
            timezone = "Europe/Budapest"

            [dwell]
            mid = 900.0

            [pipeline]
            max_points = 300
            "#,
        )
        .unwrap();
        assert_eq!(s.timezone, "Europe/Budapest");
        assert_eq!(s.dwell.mid, 900.0);
        assert_eq!(s.dwell.high, 1500.0);
        assert_eq!(s.pipeline.max_points, 300);
        assert_eq!(s.pipeline.smoothing_window, 15);
        assert_eq!(s.calendar().unwrap().tz(), chrono_tz::Europe::Budapest);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_settings_str("pol_interval_secs = 5").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse settings TOML"));
        assert!(load_settings_str("[dwell]\nlow = 1.0").is_err());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = load_settings_str("[status]\nwarning = 1300.0").unwrap_err();
        assert!(err.to_string().contains("status.warning"));
        let err = load_settings_str("[dwell]\nmid = 1500.0").unwrap_err();
        assert!(err.to_string().contains("dwell.mid"));
    }

    #[test]
    fn bad_timezone_and_zero_values_are_rejected() {
        assert!(load_settings_str("timezone = \"Mars/Olympus\"").is_err());
        assert!(load_settings_str("poll_interval_secs = 0").is_err());
        assert!(load_settings_str("[pipeline]\nmax_points = 0").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "database_url = \"sqlite:/tmp/x.db\"").unwrap();
        let s = load_settings_path(f.path()).unwrap();
        assert_eq!(s.database_url, "sqlite:/tmp/x.db");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_settings_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    #[serial]
    fn env_overrides_database_url() {
        unsafe { env::set_var(DATABASE_URL_ENV, "/data/override.db") };
        let s = Settings::default().with_env_overrides().unwrap();
        unsafe { env::remove_var(DATABASE_URL_ENV) };
        assert_eq!(s.database_url, "/data/override.db");
    }

    #[test]
    #[serial]
    fn blank_env_keeps_configured_url() {
        unsafe { env::set_var(DATABASE_URL_ENV, "  ") };
        let s = Settings::default().with_env_overrides().unwrap();
        unsafe { env::remove_var(DATABASE_URL_ENV) };
        assert_eq!(s.database_url, "co2.db");
    }
}
