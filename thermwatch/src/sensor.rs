//! Temperature sensor backends.
//!
//! A sensor produces one Celsius reading per call. Two backends are provided:
//!
//! - [`CommandSensor`] runs an external query command (by default
//!   `vcgencmd measure_temp`) and parses its `temp=<float>'C` output.
//! - [`ThermalZoneSensor`] reads a sysfs thermal zone reporting millidegrees.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

/// Path of the Raspberry Pi firmware query tool.
pub const VCGENCMD_PATH: &str = "/usr/bin/vcgencmd";

/// Default sysfs thermal zone.
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Default upper bound on how long a single read may take.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a single sensor read. All of them are transient from the
/// monitor's point of view.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Failed to run '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}")]
    ExitStatus { command: String, status: ExitStatus },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected sensor output: {0:?}")]
    Parse(String),
}

impl SensorError {
    /// Create a parse error for the given raw output.
    pub fn parse(output: impl Into<String>) -> Self {
        Self::Parse(output.into())
    }
}

/// A source of temperature readings.
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Take one reading in degrees Celsius.
    async fn read(&self) -> Result<f64, SensorError>;
}

/// Sensor that spawns a query command for every reading.
#[derive(Debug, Clone)]
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    description: String,
}

impl CommandSensor {
    /// Create a sensor running `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let description = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            program,
            args,
            timeout: DEFAULT_READ_TIMEOUT,
            description,
        }
    }

    /// The stock `vcgencmd measure_temp` sensor.
    pub fn vcgencmd() -> Self {
        Self::new(VCGENCMD_PATH, ["measure_temp"])
    }

    /// Set the read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TemperatureSensor for CommandSensor {
    fn name(&self) -> &str {
        &self.description
    }

    async fn read(&self) -> Result<f64, SensorError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SensorError::Timeout {
                command: self.description.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| SensorError::Launch {
                command: self.description.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SensorError::ExitStatus {
                command: self.description.clone(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(command = %self.description, output = %stdout.trim(), "Sensor output");
        parse_vcgencmd(&stdout)
    }
}

/// Sensor reading a sysfs file that holds millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZoneSensor {
    path: PathBuf,
    description: String,
}

impl ThermalZoneSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = path.display().to_string();
        Self { path, description }
    }
}

impl Default for ThermalZoneSensor {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE)
    }
}

#[async_trait]
impl TemperatureSensor for ThermalZoneSensor {
    fn name(&self) -> &str {
        &self.description
    }

    async fn read(&self) -> Result<f64, SensorError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SensorError::Io {
                path: self.path.clone(),
                source,
            })?;
        parse_millidegrees(&content)
    }
}

/// Parse `vcgencmd measure_temp` output, e.g. `temp=48.3'C`.
pub fn parse_vcgencmd(output: &str) -> Result<f64, SensorError> {
    let trimmed = output.trim();
    let value = trimmed
        .strip_prefix("temp=")
        .and_then(|rest| rest.strip_suffix("'C"))
        .ok_or_else(|| SensorError::parse(trimmed))?;

    let celsius: f64 = value
        .trim()
        .parse()
        .map_err(|_| SensorError::parse(trimmed))?;

    if !celsius.is_finite() {
        return Err(SensorError::parse(trimmed));
    }

    Ok(celsius)
}

/// Parse a sysfs temperature in millidegrees Celsius, e.g. `48312`.
pub fn parse_millidegrees(content: &str) -> Result<f64, SensorError> {
    let trimmed = content.trim();
    let milli: i64 = trimmed.parse().map_err(|_| SensorError::parse(trimmed))?;
    Ok(milli as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vcgencmd() {
        assert_eq!(parse_vcgencmd("temp=48.3'C\n").unwrap(), 48.3);
        assert_eq!(parse_vcgencmd("temp=70'C").unwrap(), 70.0);
        assert_eq!(parse_vcgencmd("temp=-5.5'C").unwrap(), -5.5);
    }

    #[test]
    fn test_parse_vcgencmd_malformed() {
        assert!(matches!(parse_vcgencmd(""), Err(SensorError::Parse(_))));
        assert!(parse_vcgencmd("48.3'C").is_err());
        assert!(parse_vcgencmd("temp=48.3").is_err());
        assert!(parse_vcgencmd("temp=abc'C").is_err());
        assert!(parse_vcgencmd("temp='C").is_err());
        assert!(parse_vcgencmd("VCHI initialization failed").is_err());
    }

    #[test]
    fn test_parse_vcgencmd_rejects_non_finite() {
        assert!(parse_vcgencmd("temp=inf'C").is_err());
        assert!(parse_vcgencmd("temp=NaN'C").is_err());
    }

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("48312\n").unwrap(), 48.312);
        assert_eq!(parse_millidegrees("-2000").unwrap(), -2.0);
        assert!(parse_millidegrees("hot").is_err());
    }

    #[test]
    fn test_command_sensor_description() {
        let sensor = CommandSensor::vcgencmd();
        assert_eq!(sensor.name(), "/usr/bin/vcgencmd measure_temp");
    }

    #[tokio::test]
    async fn test_command_sensor_reads_stdout() {
        let sensor = CommandSensor::new("echo", ["temp=52.1'C"]);
        assert_eq!(sensor.read().await.unwrap(), 52.1);
    }

    #[tokio::test]
    async fn test_command_sensor_missing_program() {
        let sensor = CommandSensor::new("/nonexistent/thermwatch-sensor", Vec::<String>::new());
        let err = sensor.read().await.unwrap_err();
        assert!(matches!(err, SensorError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_command_sensor_failed_exit() {
        let sensor = CommandSensor::new("false", Vec::<String>::new());
        let err = sensor.read().await.unwrap_err();
        assert!(matches!(err, SensorError::ExitStatus { .. }));
    }

    #[tokio::test]
    async fn test_command_sensor_timeout() {
        let sensor = CommandSensor::new("sleep", ["5"]).with_timeout(Duration::from_millis(50));
        let err = sensor.read().await.unwrap_err();
        assert!(matches!(err, SensorError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_thermal_zone_sensor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "61500\n").unwrap();

        let sensor = ThermalZoneSensor::new(&path);
        assert_eq!(sensor.read().await.unwrap(), 61.5);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            sensor.read().await,
            Err(SensorError::Io { .. })
        ));
    }
}
