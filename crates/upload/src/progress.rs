//! Per-upload progress accounting.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Default sliding window for speed calculation.
const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Default maximum retained samples.
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Progress snapshot delivered after each received chunk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub filename: String,
    pub bytes_received: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_size: Option<u64>,
    /// Sliding-window transfer speed; 0.0 until enough samples exist.
    pub bytes_per_second: f64,
}

/// Callback invoked with upload progress.
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

struct SpeedSample {
    bytes: u64,
    timestamp: Instant,
}

/// Calculates transfer speed over a sliding window of samples.
///
/// Owned by a single operation; uploads never share speed state.
pub struct SpeedWindow {
    samples: Vec<SpeedSample>,
    window: Duration,
    max_samples: usize,
}

impl SpeedWindow {
    /// Creates a window with the given span and sample cap.
    ///
    /// Defaults: 5 s window, 100 samples.
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            samples: Vec::new(),
            window: window.unwrap_or(DEFAULT_WINDOW),
            max_samples: max_samples.unwrap_or(DEFAULT_MAX_SAMPLES),
        }
    }

    /// Records `bytes` transferred at the current instant.
    pub fn record(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push(SpeedSample {
            bytes,
            timestamp: now,
        });

        // Prune samples outside the window.
        let cutoff = now - self.window;
        self.samples.retain(|s| s.timestamp >= cutoff);

        if self.samples.len() > self.max_samples {
            let excess = self.samples.len() - self.max_samples;
            self.samples.drain(..excess);
        }
    }

    /// Average speed in bytes/second within the window.
    ///
    /// Returns 0.0 with fewer than 2 samples or zero elapsed time.
    pub fn bytes_per_second(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }

        let first = &self.samples[0];
        let last = &self.samples[self.samples.len() - 1];
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if elapsed.is_zero() {
            return 0.0;
        }

        let total: u64 = self.samples.iter().map(|s| s.bytes).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// Clears all recorded samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_is_zero() {
        let speed = SpeedWindow::new(None, None);
        assert_eq!(speed.bytes_per_second(), 0.0);
    }

    #[test]
    fn single_sample_is_zero() {
        let mut speed = SpeedWindow::new(None, None);
        speed.record(100);
        assert_eq!(speed.bytes_per_second(), 0.0);
    }

    #[test]
    fn multiple_samples_yield_positive_speed() {
        let mut speed = SpeedWindow::new(Some(Duration::from_secs(10)), None);
        speed.record(500);
        std::thread::sleep(Duration::from_millis(20));
        speed.record(500);
        assert!(speed.bytes_per_second() > 0.0);
    }

    #[test]
    fn reset_clears_samples() {
        let mut speed = SpeedWindow::new(None, None);
        speed.record(100);
        speed.record(200);
        speed.reset();
        assert_eq!(speed.bytes_per_second(), 0.0);
    }

    #[test]
    fn sample_count_is_capped() {
        let mut speed = SpeedWindow::new(Some(Duration::from_secs(60)), Some(5));
        for i in 0..20 {
            speed.record(i * 10);
        }
        assert!(speed.samples.len() <= 5);
    }

    #[test]
    fn progress_serializes_camel_case() {
        let progress = UploadProgress {
            filename: "pkg.tgz".into(),
            bytes_received: 42,
            declared_size: None,
            bytes_per_second: 0.0,
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["bytesReceived"], 42);
        assert!(json.get("declaredSize").is_none());
    }
}
