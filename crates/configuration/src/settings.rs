use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the dashboard.
///
/// Every section is optional in `dashboard.toml`; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks the cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dashboard;

        if d.top_n_min == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.top_n_min must be at least 1".to_string(),
            ));
        }
        if d.top_n_min > d.top_n_max {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.top_n_min ({}) is greater than dashboard.top_n_max ({})",
                d.top_n_min, d.top_n_max
            )));
        }
        if !(d.top_n_min..=d.top_n_max).contains(&d.default_top_n) {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.default_top_n ({}) must lie within {}..={}",
                d.default_top_n, d.top_n_min, d.top_n_max
            )));
        }
        if d.rfm_display_count == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.rfm_display_count must be at least 1".to_string(),
            ));
        }
        if d.short_id_len == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.short_id_len must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where the order dataset lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/order_full_clean.csv"),
        }
    }
}

/// Parameters for the aggregation engine and the rendered report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// How many products / sellers appear in rankings when the user does not say.
    pub default_top_n: usize,
    /// Inclusive lower bound for a user-supplied top-N.
    pub top_n_min: usize,
    /// Inclusive upper bound for a user-supplied top-N.
    pub top_n_max: usize,
    /// Length of each of the best-customer lists in the RFM section.
    pub rfm_display_count: usize,
    /// Customer ids are shortened to this many characters in RFM tables.
    pub short_id_len: usize,
    pub format: OutputFormat,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            top_n_min: 5,
            top_n_max: 10,
            rfm_display_count: 5,
            short_id_len: 5,
            format: OutputFormat::Table,
        }
    }
}

/// How the `report` command writes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Logging sinks and verbosity. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "orderlens.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dashboard.default_top_n, 5);
        assert_eq!(config.dashboard.top_n_max, 10);
    }

    #[test]
    fn default_top_n_outside_bounds_is_rejected() {
        let mut config = Config::default();
        config.dashboard.default_top_n = 12;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("default_top_n")));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut config = Config::default();
        config.dashboard.top_n_min = 8;
        config.dashboard.top_n_max = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rfm_display_count_is_rejected() {
        let mut config = Config::default();
        config.dashboard.rfm_display_count = 0;
        assert!(config.validate().is_err());
    }
}
