//! Temperature bands and their ANSI colors.

use std::fmt;

/// Green.
pub const GREEN: &str = "\x1b[0;32m";
/// Yellow.
pub const YELLOW: &str = "\x1b[0;33m";
/// Magenta, used for the "hot" band.
pub const MAGENTA: &str = "\x1b[0;35m";
/// Red.
pub const RED: &str = "\x1b[0;31m";
/// Reset all attributes.
pub const RESET: &str = "\x1b[0m";

/// Upper bound (inclusive) of the cool band.
pub const COOL_MAX: f64 = 40.0;
/// Upper bound (inclusive) of the warm band.
pub const WARM_MAX: f64 = 65.0;
/// Upper bound (inclusive) of the hot band. Anything above is critical.
pub const HOT_MAX: f64 = 75.0;

/// Coarse classification of a temperature, used to pick a display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// At or below 40°C.
    Cool,
    /// Above 40°C, at or below 65°C.
    Warm,
    /// Above 65°C, at or below 75°C.
    Hot,
    /// Above 75°C.
    Critical,
}

impl TemperatureBand {
    /// Classify a temperature in degrees Celsius.
    pub fn classify(celsius: f64) -> Self {
        if celsius <= COOL_MAX {
            Self::Cool
        } else if celsius <= WARM_MAX {
            Self::Warm
        } else if celsius <= HOT_MAX {
            Self::Hot
        } else {
            Self::Critical
        }
    }

    /// ANSI escape sequence for this band.
    pub fn color(self) -> &'static str {
        match self {
            Self::Cool => GREEN,
            Self::Warm => YELLOW,
            Self::Hot => MAGENTA,
            Self::Critical => RED,
        }
    }

    /// Short lowercase name, used as a tracing field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cool => "cool",
            Self::Warm => "warm",
            Self::Hot => "hot",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap `text` in `color` and a trailing reset.
pub fn paint(color: &str, text: impl fmt::Display) -> String {
    format!("{}{}{}", color, text, RESET)
}
