//! Trailing simple moving average over recent readings.

/// Number of readings kept in the smoothing window.
pub const WINDOW_SIZE: usize = 5;

/// Fixed-capacity circular buffer of the most recent readings.
///
/// The mean only covers slots that have actually been written, so the first
/// few readings are not dragged towards zero by empty slots.
#[derive(Debug, Clone)]
pub struct SmoothingWindow<const N: usize = WINDOW_SIZE> {
    samples: [f64; N],
    count: usize,
}

impl<const N: usize> SmoothingWindow<N> {
    /// Create an empty window.
    pub fn new() -> Self {
        Self {
            samples: [0.0; N],
            count: 0,
        }
    }

    /// Insert a reading and return the mean of the valid entries.
    pub fn push(&mut self, reading: f64) -> f64 {
        self.samples[self.count % N] = reading;
        self.count = self.count.saturating_add(1);
        self.valid().iter().sum::<f64>() / self.len() as f64
    }

    /// Mean of the valid entries, or `None` before the first push.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.valid().iter().sum::<f64>() / self.len() as f64)
    }

    /// Number of valid entries (at most `N`).
    pub fn len(&self) -> usize {
        self.count.min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total readings pushed since creation.
    pub fn total_pushed(&self) -> usize {
        self.count
    }

    fn valid(&self) -> &[f64] {
        &self.samples[..self.len()]
    }
}

impl<const N: usize> Default for SmoothingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
