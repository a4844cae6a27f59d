//! Temperature monitor.
//!
//! Polls a hardware temperature sensor at a fixed interval, smooths the
//! readings with a five-sample moving average, appends readings above 65°C to
//! a size-rotated log and warns on the console when a threshold is exceeded.
//!
//! # Console output
//!
//! ```text
//! Measuring temperature...
//! -----------------------
//! Current temperature: 48.30°C
//! Current temperature: 81.20°C
//! Temperature above threshold! Current temperature: 81.20°C
//! ```
//!
//! Lines are colored by [`band::TemperatureBand`].

pub mod alert;
pub mod args;
pub mod band;
pub mod config;
pub mod daemon;
pub mod monitor;
pub mod sensor;
pub mod smoothing;
pub mod temp_log;

pub use alert::{AlertNotifier, NoopNotifier, ThresholdAlert};
pub use args::MonitorArgs;
pub use config::{ConfigError, MonitorConfig, SensorKind};
pub use monitor::{MonitorStats, TemperatureMonitor};
pub use sensor::{CommandSensor, SensorError, TemperatureSensor, ThermalZoneSensor};
pub use smoothing::SmoothingWindow;
pub use temp_log::{RecordOutcome, TempLogError, TemperatureLog};
