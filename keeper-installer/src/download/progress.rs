//! Mapping byte counts onto a slice of overall install progress.

use crate::error::{InstallerError, InstallerResult};

/// The part of overall progress `[0, 1]` a download is allowed to occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRange {
    start: f64,
    end: f64,
}

impl ProgressRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 <= start <= end <= 1`.
    pub fn new(start: f64, end: f64) -> InstallerResult<Self> {
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
            return Err(InstallerError::Config(format!(
                "invalid progress range [{}, {}]",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The whole of `[0, 1]`.
    pub fn full() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
        }
    }

    /// Lower bound.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Upper bound.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Map a completion ratio in `[0, 1]` into this range.
    pub fn scale(&self, ratio: f64) -> f64 {
        let ratio = ratio.clamp(0.0, 1.0);
        (self.start + ratio * (self.end - self.start)).min(self.end)
    }
}

/// Turns a stream of byte counts into non-decreasing progress values.
///
/// With a known total, progress is proportional to bytes received. With an
/// unknown total, it stays at the range start until [`complete`] is called.
///
/// [`complete`]: ProgressScaler::complete
#[derive(Debug, Clone)]
pub(crate) struct ProgressScaler {
    range: ProgressRange,
    total: Option<u64>,
    last: f64,
}

impl ProgressScaler {
    pub(crate) fn new(range: ProgressRange, total: Option<u64>) -> Self {
        Self {
            range,
            total,
            last: range.start(),
        }
    }

    /// Value to report before the first chunk.
    pub(crate) fn initial(&self) -> f64 {
        self.range.start()
    }

    /// Progress after `bytes` have been received, or `None` if it did not move.
    pub(crate) fn advance(&mut self, bytes: u64) -> Option<f64> {
        let total = self.total.filter(|&t| t > 0)?;
        let value = self.range.scale(bytes as f64 / total as f64);
        if value > self.last {
            self.last = value;
            Some(value)
        } else {
            None
        }
    }

    /// Value to report once the stream has ended.
    pub(crate) fn complete(&mut self) -> f64 {
        self.last = self.range.end();
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(ProgressRange::new(0.1, 0.8).is_ok());
        assert!(ProgressRange::new(0.5, 0.5).is_ok());
        assert!(ProgressRange::new(0.8, 0.1).is_err());
        assert!(ProgressRange::new(-0.1, 0.5).is_err());
        assert!(ProgressRange::new(0.0, 1.5).is_err());
        assert!(ProgressRange::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_range_scale() {
        let range = ProgressRange::new(0.1, 0.8).unwrap();
        assert_eq!(range.scale(0.0), 0.1);
        assert!((range.scale(0.5) - 0.45).abs() < 1e-9);
        assert!((range.scale(1.0) - 0.8).abs() < 1e-9);
        assert!((range.scale(2.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_scaler_known_length() {
        let range = ProgressRange::new(0.0, 1.0).unwrap();
        let mut scaler = ProgressScaler::new(range, Some(1000));

        assert_eq!(scaler.advance(250), Some(0.25));
        assert_eq!(scaler.advance(250), None);
        assert_eq!(scaler.advance(1000), Some(1.0));
        // More bytes than advertised never overshoot the range.
        assert_eq!(scaler.advance(5000), None);
        assert_eq!(scaler.complete(), 1.0);
    }

    #[test]
    fn test_scaler_unknown_length_holds_at_start() {
        let range = ProgressRange::new(0.1, 0.8).unwrap();
        let mut scaler = ProgressScaler::new(range, None);

        assert_eq!(scaler.initial(), 0.1);
        assert_eq!(scaler.advance(32 * 1024), None);
        assert_eq!(scaler.advance(10_000_000), None);
        assert_eq!(scaler.complete(), 0.8);
    }

    #[test]
    fn test_scaler_zero_length() {
        let mut scaler = ProgressScaler::new(ProgressRange::full(), Some(0));
        assert_eq!(scaler.advance(0), None);
        assert_eq!(scaler.complete(), 1.0);
    }
}
