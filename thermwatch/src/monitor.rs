//! The sampling loop.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::alert::{self, AlertNotifier, NoopNotifier};
use crate::band::{TemperatureBand, paint};
use crate::config::MonitorConfig;
use crate::sensor::TemperatureSensor;
use crate::smoothing::SmoothingWindow;
use crate::temp_log::{RecordOutcome, TemperatureLog};

/// Counters kept over the lifetime of a monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Successful sensor reads.
    pub samples: u64,
    /// Failed sensor reads.
    pub read_failures: u64,
    /// Lines appended to the temperature log.
    pub lines_logged: u64,
    /// Log rotations.
    pub rotations: u64,
    /// Log writes that failed.
    pub log_failures: u64,
    /// Threshold alerts raised.
    pub alerts: u64,
}

/// Polls a sensor, smooths readings, logs and alerts until shut down.
pub struct TemperatureMonitor<W: Write = Stdout> {
    sensor: Box<dyn TemperatureSensor>,
    window: SmoothingWindow,
    log: TemperatureLog,
    notifier: Box<dyn AlertNotifier>,
    console: W,
    threshold: f64,
    poll_interval: Duration,
    retry_delay: Duration,
    stats: MonitorStats,
}

impl TemperatureMonitor<Stdout> {
    /// Create a monitor printing to stdout.
    pub fn new(config: &MonitorConfig, sensor: Box<dyn TemperatureSensor>) -> Self {
        Self {
            sensor,
            window: SmoothingWindow::new(),
            log: TemperatureLog::new(&config.log_file),
            notifier: Box::new(NoopNotifier),
            console: io::stdout(),
            threshold: config.threshold,
            poll_interval: config.poll_interval,
            retry_delay: config.retry_delay,
            stats: MonitorStats::default(),
        }
    }
}

impl<W: Write> TemperatureMonitor<W> {
    /// Replace the console writer.
    pub fn with_console<W2: Write>(self, console: W2) -> TemperatureMonitor<W2> {
        TemperatureMonitor {
            sensor: self.sensor,
            window: self.window,
            log: self.log,
            notifier: self.notifier,
            console,
            threshold: self.threshold,
            poll_interval: self.poll_interval,
            retry_delay: self.retry_delay,
            stats: self.stats,
        }
    }

    /// Forward alerts to `notifier` in addition to the console.
    pub fn with_notifier(mut self, notifier: impl AlertNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    ///
    /// The flag is checked before every read, and a pending read or sleep is
    /// abandoned as soon as it flips.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> MonitorStats {
        info!(
            sensor = %self.sensor.name(),
            log = %self.log.path().display(),
            threshold = self.threshold,
            interval = ?self.poll_interval,
            "Starting temperature monitor"
        );

        self.emit(format_args!("Measuring temperature..."));
        self.emit(format_args!("-----------------------"));

        loop {
            if *shutdown.borrow() {
                break;
            }

            let reading = tokio::select! {
                reading = self.sensor.read() => reading,
                _ = wait_for_shutdown(&mut shutdown) => break,
            };

            let delay = match reading {
                Ok(celsius) => {
                    self.process(celsius);
                    self.poll_interval
                }
                Err(e) => {
                    self.stats.read_failures += 1;
                    warn!(
                        sensor = %self.sensor.name(),
                        error = %e,
                        retry_in = ?self.retry_delay,
                        "Failed to read temperature"
                    );
                    self.retry_delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!(samples = self.stats.samples, "Temperature monitor stopped");
        self.stats
    }

    /// Handle one successful reading.
    fn process(&mut self, reading: f64) {
        self.stats.samples += 1;

        let smoothed = self.window.push(reading);
        let band = TemperatureBand::classify(smoothed);
        debug!(raw = reading, smoothed, band = %band, "Sampled temperature");

        self.emit(format_args!(
            "{}",
            paint(
                band.color(),
                format_args!("Current temperature: {:.2}°C", smoothed)
            )
        ));

        match self.log.record(smoothed) {
            Ok(RecordOutcome::Written { rotated }) => {
                self.stats.lines_logged += 1;
                if rotated {
                    self.stats.rotations += 1;
                    info!(
                        path = %self.log.path().display(),
                        backup = %self.log.backup_path().display(),
                        "Rotated temperature log"
                    );
                }
            }
            Ok(RecordOutcome::Skipped) => {}
            Err(e) => {
                self.stats.log_failures += 1;
                error!(error = %e, "Error writing temperature log");
            }
        }

        if let Some(alert) = alert::check(smoothed, self.threshold) {
            self.stats.alerts += 1;
            self.emit(format_args!("{}", alert.colored()));
            warn!(
                temperature = alert.temperature,
                threshold = alert.threshold,
                "Temperature above threshold"
            );
            self.notifier.notify(&alert);
        }
    }

    /// Write one line to the console. Failures are logged, never fatal.
    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.console, "{}", line) {
            debug!(error = %e, "Failed to write to console");
        }
    }
}

/// Resolve once the shutdown flag is set or the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Sensor that replays a script, then requests shutdown.
    struct ScriptedSensor {
        script: Mutex<VecDeque<Result<f64, SensorError>>>,
        shutdown: watch::Sender<bool>,
    }

    impl ScriptedSensor {
        fn new(
            script: impl IntoIterator<Item = Result<f64, SensorError>>,
            shutdown: watch::Sender<bool>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                shutdown,
            }
        }
    }

    #[async_trait]
    impl TemperatureSensor for ScriptedSensor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn read(&self) -> Result<f64, SensorError> {
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| {
                let _ = self.shutdown.send(true);
                Err(SensorError::parse("script exhausted"))
            })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Arc<Mutex<Vec<f64>>>);

    impl AlertNotifier for RecordingNotifier {
        fn notify(&mut self, alert: &alert::ThresholdAlert) {
            self.0.lock().unwrap().push(alert.temperature);
        }
    }

    fn test_config(dir: &std::path::Path, threshold: f64) -> MonitorConfig {
        MonitorConfig {
            threshold,
            log_file: dir.join("temps.txt"),
            poll_interval: Duration::from_millis(5),
            retry_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn monitor_with(
        config: &MonitorConfig,
        script: Vec<Result<f64, SensorError>>,
    ) -> (TemperatureMonitor<Vec<u8>>, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let sensor = ScriptedSensor::new(script, tx);
        let monitor = TemperatureMonitor::new(config, Box::new(sensor)).with_console(Vec::new());
        (monitor, rx)
    }

    #[tokio::test]
    async fn test_failed_reads_do_not_advance_window() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 100.0);
        let (mut monitor, rx) = monitor_with(
            &config,
            vec![
                Ok(10.0),
                Err(SensorError::parse("garbage")),
                Ok(20.0),
                Err(SensorError::parse("garbage")),
                Ok(30.0),
            ],
        );

        let stats = monitor.run(rx).await;

        assert_eq!(stats.samples, 3);
        // Two scripted failures plus the one that ends the script.
        assert_eq!(stats.read_failures, 3);
        assert_eq!(monitor.window().len(), 3);
        assert_eq!(monitor.window().mean(), Some(20.0));
    }

    #[tokio::test]
    async fn test_console_output_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 72.0);
        let notifier = RecordingNotifier::default();
        let (monitor, rx) = monitor_with(&config, vec![Ok(70.0), Ok(80.0)]);
        let mut monitor = monitor.with_notifier(notifier.clone());

        let stats = monitor.run(rx).await;

        let console = String::from_utf8(monitor.console().clone()).unwrap();
        let lines: Vec<_> = console.lines().collect();
        assert_eq!(lines[0], "Measuring temperature...");
        assert_eq!(lines[1], "-----------------------");
        assert_eq!(lines[2], "\x1b[0;35mCurrent temperature: 70.00°C\x1b[0m");
        assert_eq!(lines[3], "\x1b[0;35mCurrent temperature: 75.00°C\x1b[0m");
        assert_eq!(
            lines[4],
            "\x1b[0;31mTemperature above threshold! Current temperature: 75.00°C\x1b[0m"
        );
        assert_eq!(lines.len(), 5);

        assert_eq!(stats.alerts, 1);
        assert_eq!(*notifier.0.lock().unwrap(), vec![75.0]);
    }

    #[tokio::test]
    async fn test_logs_only_above_floor() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 100.0);
        // Smoothed: 50, 60, 70, 75
        let (mut monitor, rx) =
            monitor_with(&config, vec![Ok(50.0), Ok(70.0), Ok(90.0), Ok(90.0)]);

        let stats = monitor.run(rx).await;

        assert_eq!(stats.lines_logged, 2);
        let content = std::fs::read_to_string(&config.log_file).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("70.00°C"));
        assert!(lines[1].contains("75.00°C"));
    }

    #[tokio::test]
    async fn test_log_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), 100.0);
        config.log_file = dir.path().join("missing").join("temps.txt");
        let (mut monitor, rx) = monitor_with(&config, vec![Ok(70.0), Ok(70.0)]);

        let stats = monitor.run(rx).await;

        assert_eq!(stats.samples, 2);
        assert_eq!(stats.log_failures, 2);
        assert_eq!(stats.lines_logged, 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 80.0);
        let (mut monitor, _rx) = monitor_with(&config, vec![Ok(70.0)]);

        let (tx, rx) = watch::channel(true);
        let stats = monitor.run(rx).await;
        drop(tx);

        assert_eq!(stats, MonitorStats::default());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), 80.0);
        config.poll_interval = Duration::from_secs(3600);
        let (mut monitor, _script_rx) = monitor_with(&config, vec![Ok(42.0), Ok(42.0)]);

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), monitor.run(rx))
            .await
            .expect("shutdown should interrupt the poll interval");

        assert_eq!(stats.samples, 1);
    }
}
