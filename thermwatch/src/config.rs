//! Configuration for the temperature monitor.

use std::path::PathBuf;
use std::time::Duration;

use thermwatch_common::LoggingConfig;
use thiserror::Error;

use crate::sensor::{
    CommandSensor, DEFAULT_READ_TIMEOUT, DEFAULT_THERMAL_ZONE, TemperatureSensor,
    ThermalZoneSensor,
};

/// Default alert threshold in degrees Celsius.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Default log file, relative to the working directory at startup.
pub const DEFAULT_LOG_FILE: &str = "temperature_log.txt";

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Fixed wait after a failed sensor read.
pub const SENSOR_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to resolve log path {}: {source}", .path.display())]
    LogPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which sensor backend to poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SensorKind {
    /// `vcgencmd measure_temp` (Raspberry Pi firmware).
    #[default]
    Vcgencmd,
    /// A sysfs thermal zone reporting millidegrees.
    ThermalZone,
}

/// Complete monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Smoothed temperatures strictly above this trigger an alert.
    pub threshold: f64,

    /// Path of the temperature log.
    pub log_file: PathBuf,

    /// Delay between successful samples.
    pub poll_interval: Duration,

    /// Delay after a failed sensor read.
    pub retry_delay: Duration,

    /// Detach from the terminal before polling.
    pub daemonize: bool,

    /// Sensor backend.
    pub sensor: SensorKind,

    /// Sysfs file for [`SensorKind::ThermalZone`].
    pub thermal_zone: PathBuf,

    /// Upper bound on a single sensor read.
    pub sensor_timeout: Duration,

    /// Diagnostic logging.
    pub logging: LoggingConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            retry_delay: SENSOR_RETRY_DELAY,
            daemonize: false,
            sensor: SensorKind::default(),
            thermal_zone: PathBuf::from(DEFAULT_THERMAL_ZONE),
            sensor_timeout: DEFAULT_READ_TIMEOUT,
            logging: LoggingConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::Validation(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "poll interval must be > 0".to_string(),
            ));
        }

        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "log file path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Make the log path absolute so it survives the daemon's `chdir("/")`.
    pub fn resolve_log_path(&mut self) -> Result<(), ConfigError> {
        self.log_file =
            std::path::absolute(&self.log_file).map_err(|source| ConfigError::LogPath {
                path: self.log_file.clone(),
                source,
            })?;
        Ok(())
    }

    /// Build the configured sensor backend.
    pub fn build_sensor(&self) -> Box<dyn TemperatureSensor> {
        match self.sensor {
            SensorKind::Vcgencmd => {
                Box::new(CommandSensor::vcgencmd().with_timeout(self.sensor_timeout))
            }
            SensorKind::ThermalZone => Box::new(ThermalZoneSensor::new(&self.thermal_zone)),
        }
    }
}
