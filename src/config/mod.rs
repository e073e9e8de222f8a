//! Configuration for the dashboard
//!
//! Settings are read from a TOML (or JSON, by extension) file describing the
//! connection, chart geometry, the charts to draw and the pollers to offer.
//!
//! # Config Location
//!
//! Without an explicit path the dashboard looks in the platform config dir:
//! - **Linux**: `~/.config/dev.tucoflyer.bot-dashboard/dashboard.toml`
//! - **macOS**: `~/Library/Application Support/dev.tucoflyer.bot-dashboard/dashboard.toml`
//! - **Windows**: `%APPDATA%\dev.tucoflyer.bot-dashboard\dashboard.toml`
//!
//! # Example
//!
//! ```toml
//! [chart]
//! millis_per_pixel = 15.0
//!
//! [[charts]]
//! name = "Drift compensation"
//!
//! [[charts.series]]
//! value = "gimbal_status.message.GimbalControlStatus.drift_compensation.0"
//! timestamp = "gimbal_status.local_timestamp"
//! ```

use crate::chart::{ChartOptions, Extractors, SeriesOptions, SeriesStyle};
use crate::error::{DashboardError, Result, ResultExt};
use crate::gimbal;
use crate::polling::PollToggleSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.tucoflyer.bot-dashboard";

/// Config filename
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "BOT_DASHBOARD_CONFIG";

// ==================== Config Directory ====================

/// Platform config directory for the dashboard
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Default config file path
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Outbound requests queued before sends start failing
    pub outbound_queue: usize,
    /// Milliseconds between frames
    pub frame_period_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            outbound_queue: 1024,
            frame_period_ms: 16,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,bot_dashboard=debug".to_string(),
        }
    }
}

/// One line on a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Model path of the plotted value
    pub value: String,
    /// Model path of the sample time (milliseconds)
    pub timestamp: String,
    /// Model path of the trigger; the timestamp path when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Factor applied to every value
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub no_bounds: bool,
    #[serde(default)]
    pub full_data_rate: bool,
    #[serde(default)]
    pub style: SeriesStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_bounds_interval_ms: Option<f64>,
}

fn default_scale() -> f64 {
    1.0
}

impl SeriesSpec {
    pub fn new(value: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            timestamp: timestamp.into(),
            trigger: None,
            scale: 1.0,
            no_bounds: false,
            full_data_rate: false,
            style: SeriesStyle::default(),
            reset_bounds_interval_ms: None,
        }
    }

    pub fn trigger_path(&self) -> &str {
        self.trigger.as_deref().unwrap_or(&self.timestamp)
    }

    pub fn extractors(&self) -> Extractors {
        let extractors =
            Extractors::from_paths(self.value.as_str(), self.timestamp.as_str(), self.trigger_path());
        if self.scale == 1.0 {
            extractors
        } else {
            extractors.scaled(self.scale)
        }
    }

    pub fn options(&self) -> SeriesOptions {
        SeriesOptions {
            no_bounds: self.no_bounds,
            full_data_rate: self.full_data_rate,
            style: self.style.clone(),
            reset_bounds_interval_ms: self.reset_bounds_interval_ms,
        }
    }
}

/// A chart and its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub name: String,
    #[serde(default)]
    pub series: Vec<SeriesSpec>,
}

// ==================== Dashboard Config ====================

/// Complete dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Geometry shared by every chart
    #[serde(default)]
    pub chart: ChartOptions,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
    #[serde(default = "gimbal::global_toggles")]
    pub pollers: Vec<PollToggleSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            logging: LoggingSettings::default(),
            chart: ChartOptions::default(),
            charts: Vec::new(),
            pollers: gimbal::global_toggles(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

impl DashboardConfig {
    /// Load from a file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(DashboardError::from)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let parsed: Result<Self> = match Format::of(path) {
            Format::Json => serde_json::from_str(&content).map_err(DashboardError::from),
            Format::Toml => {
                toml::from_str(&content).map_err(|e| DashboardError::Config(e.to_string()))
            }
        };
        parsed.with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to a file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self).map_err(DashboardError::from),
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| DashboardError::Config(e.to_string()))
            }
        }
        .context("Failed to serialize config")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(DashboardError::from)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .map_err(DashboardError::from)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// A configuration charting gimbal drift and vision timing
    pub fn sample() -> Self {
        let drift = |axis: usize| {
            let mut spec = SeriesSpec::new(
                format!("gimbal_status.message.GimbalControlStatus.drift_compensation.{}", axis),
                "gimbal_status.local_timestamp",
            );
            if axis == 1 {
                spec.style.stroke_style = "#a4a".to_string();
            }
            spec
        };

        let detector = SeriesSpec {
            trigger: Some("camera.object_detection.message.Command.CameraObjectDetection.frame".to_string()),
            scale: 1e-6,
            full_data_rate: true,
            ..SeriesSpec::new(
                "camera.object_detection.message.Command.CameraObjectDetection.detector_nsec",
                "camera.object_detection.local_timestamp",
            )
        };

        Self {
            charts: vec![
                ChartSpec {
                    name: "Drift compensation".to_string(),
                    series: vec![drift(0), drift(1)],
                },
                ChartSpec {
                    name: "Detector latency (ms)".to_string(),
                    series: vec![detector],
                },
            ],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.connection.outbound_queue, 1024);
        assert_eq!(config.chart.millis_per_pixel, 15.0);
        assert!(config.charts.is_empty());
        assert_eq!(config.pollers.len(), 2);
        assert!(config.pollers.iter().all(|p| !p.enabled));
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = DashboardConfig::sample();

        config.save(&path).unwrap();
        let loaded = DashboardConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        DashboardConfig::sample().save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));
        assert_eq!(DashboardConfig::load(&path).unwrap(), DashboardConfig::sample());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [connection]
            frame_period_ms = 33

            [[charts]]
            name = "Force"

            [[charts.series]]
            value = "winches.0.message.WinchStatus.1.sensors.force.filtered"
            timestamp = "winches.0.local_timestamp"
            no_bounds = true
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.frame_period_ms, 33);
        assert_eq!(config.connection.outbound_queue, 1024);
        assert_eq!(config.chart, ChartOptions::default());
        let series = &config.charts[0].series[0];
        assert_eq!(series.scale, 1.0);
        assert_eq!(series.trigger_path(), "winches.0.local_timestamp");
        assert!(series.options().no_bounds);
        assert_eq!(series.style.stroke_style, "#3e8135");
        assert_eq!(config.pollers.len(), 2);
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "this is [not toml").unwrap();

        assert!(DashboardConfig::load(&path).is_err());
        assert_eq!(DashboardConfig::load_or_default(&path), DashboardConfig::default());
        assert_eq!(
            DashboardConfig::load_or_default(dir.path().join("missing.toml")),
            DashboardConfig::default()
        );
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = DashboardConfig::load(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
        assert!(err.to_string().contains("missing.toml"));
        assert!(matches!(
            err,
            DashboardError::WithContext { ref source, .. } if matches!(**source, DashboardError::Io(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let err = DashboardConfig::load(&bad).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
        assert!(matches!(
            err,
            DashboardError::WithContext { ref source, .. }
                if matches!(**source, DashboardError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_into_missing_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(APP_ID).join(CONFIG_FILE);
        assert!(!path.parent().unwrap().exists());

        DashboardConfig::default().save(&path).unwrap();
        assert!(path.exists());
        assert_eq!(DashboardConfig::load(&path).unwrap(), DashboardConfig::default());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(Path::new(APP_ID).join(CONFIG_FILE)));
        }
    }
}
