//! Threshold alerts.

use std::fmt;

use crate::band::{RED, paint};

/// A smoothed temperature that exceeded the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdAlert {
    pub temperature: f64,
    pub threshold: f64,
}

impl ThresholdAlert {
    /// The warning as printed on the console, in red.
    pub fn colored(&self) -> String {
        paint(RED, self)
    }
}

impl fmt::Display for ThresholdAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature above threshold! Current temperature: {:.2}°C",
            self.temperature
        )
    }
}

/// Return an alert if `temperature` is strictly above `threshold`.
pub fn check(temperature: f64, threshold: f64) -> Option<ThresholdAlert> {
    (temperature > threshold).then_some(ThresholdAlert {
        temperature,
        threshold,
    })
}

/// Hook for forwarding alerts beyond the console (mail, SMS, desktop
/// notifications). Called once per alert, after the console warning.
pub trait AlertNotifier: Send {
    fn notify(&mut self, alert: &ThresholdAlert);
}

/// Notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl AlertNotifier for NoopNotifier {
    fn notify(&mut self, _alert: &ThresholdAlert) {}
}
