//! CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thermwatch_common::{LogFormat, LoggingConfig};

use crate::config::{
    ConfigError, DEFAULT_LOG_FILE, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_THRESHOLD, MonitorConfig,
    SensorKind,
};
use crate::sensor::DEFAULT_THERMAL_ZONE;

/// Polls the board temperature, logs hot readings and warns above a threshold.
#[derive(Parser, Debug, Clone)]
#[command(name = "thermwatch")]
#[command(about = "Temperature monitor with smoothing, rotating log and threshold alerts")]
#[command(version)]
pub struct MonitorArgs {
    /// Alert threshold in degrees Celsius.
    #[arg(
        short = 't',
        long = "threshold",
        default_value_t = DEFAULT_THRESHOLD,
        allow_negative_numbers = true
    )]
    pub threshold: f64,

    /// Log file for readings above 65°C.
    #[arg(short = 'l', long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Poll interval in seconds.
    #[arg(short = 'i', long = "interval", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub interval: u64,

    /// Run detached as a background daemon.
    #[arg(short = 'd', long = "daemon")]
    pub daemon: bool,

    /// Sensor backend.
    #[arg(long, value_enum, default_value_t = SensorKind::Vcgencmd)]
    pub sensor: SensorKind,

    /// Sysfs file read by the thermal-zone backend.
    #[arg(long, default_value = DEFAULT_THERMAL_ZONE)]
    pub thermal_zone: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Diagnostic log format (text, json).
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,
}

impl MonitorArgs {
    /// Convert the arguments into a validated configuration.
    pub fn into_config(self) -> Result<MonitorConfig, ConfigError> {
        let config = MonitorConfig {
            threshold: self.threshold,
            log_file: self.log_file,
            poll_interval: Duration::from_secs(self.interval),
            daemonize: self.daemon,
            sensor: self.sensor,
            thermal_zone: self.thermal_zone,
            logging: LoggingConfig::default()
                .with_level(self.log_level)
                .with_format(self.log_format),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }
}
