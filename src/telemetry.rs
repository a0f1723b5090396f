//! Sliding-window sample buffers and the synthetic tick source that feeds
//! them while a test is running on the remote service.
//!
//! The synthetic values only approximate load for display. They track test
//! progress, not what the server is actually seeing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;

use crate::config::{
    BASE_LATENCY_SECS, LATENCY_JITTER_SECS, LATENCY_WAVE_AMPLITUDE, LATENCY_WAVE_FREQUENCY,
    MAX_SYNTHETIC_ERROR_PCT, MIN_ACTIVE_USER_FRACTION, MIXED_STATUS_ERROR_PCT,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub timestamp: String,
    pub value: f64,
}

/// Fixed-capacity FIFO of samples, oldest first.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    capacity: usize,
    samples: VecDeque<MetricSample>,
}

impl MetricSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append, then drop the single oldest sample if over capacity.
    pub fn append(&mut self, timestamp: impl Into<String>, value: f64) {
        self.samples.push_back(MetricSample {
            timestamp: timestamp.into(),
            value,
        });
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.timestamp.clone()).collect()
    }
}

/// One synthetic tick, as pushed to the charts and the live readouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryFrame {
    pub tick: u32,
    pub duration: u32,
    pub timestamp: String,
    #[serde(skip)]
    pub latency_secs: f64,
    pub latency_ms: f64,
    pub error_rate_pct: f64,
    pub active_users: u32,
    pub progress_pct: f64,
    pub status_codes: String,
    pub status_text: String,
}

/// Progress through a run of `duration` ticks, clamped to 100.
pub fn progress_pct(tick: u32, duration: u32) -> f64 {
    if duration == 0 {
        return 100.0;
    }
    (f64::from(tick) / f64::from(duration) * 100.0).min(100.0)
}

/// Yields exactly `duration` frames, then `None`.
pub struct SyntheticTelemetry<R = StdRng> {
    rng: R,
    num_users: u32,
    duration: u32,
    tick: u32,
}

impl SyntheticTelemetry<StdRng> {
    pub fn new(num_users: u32, duration: u32) -> Self {
        Self::with_rng(StdRng::from_os_rng(), num_users, duration)
    }

    pub fn seeded(seed: u64, num_users: u32, duration: u32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), num_users, duration)
    }
}

impl<R: Rng> SyntheticTelemetry<R> {
    pub fn with_rng(rng: R, num_users: u32, duration: u32) -> Self {
        Self {
            rng,
            num_users,
            duration,
            tick: 0,
        }
    }

    pub fn ticks_emitted(&self) -> u32 {
        self.tick
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.duration
    }

    fn sample(&mut self, timestamp: String) -> TelemetryFrame {
        let tick = self.tick;
        let wave = (f64::from(tick) * LATENCY_WAVE_FREQUENCY).sin() * LATENCY_WAVE_AMPLITUDE;
        let jitter = self.rng.random_range(0.0..LATENCY_JITTER_SECS);
        let latency_secs = BASE_LATENCY_SECS + wave + jitter;

        let error_rate_pct = self.rng.random_range(0.0..MAX_SYNTHETIC_ERROR_PCT);
        let user_fraction = self.rng.random_range(MIN_ACTIVE_USER_FRACTION..1.0);
        let active_users = (f64::from(self.num_users) * user_fraction).floor() as u32;

        let status_codes = if error_rate_pct > MIXED_STATUS_ERROR_PCT {
            "Mixed"
        } else {
            "2xx"
        };

        TelemetryFrame {
            tick,
            duration: self.duration,
            timestamp,
            latency_secs,
            latency_ms: latency_secs * 1000.0,
            error_rate_pct,
            active_users,
            progress_pct: progress_pct(tick, self.duration),
            status_codes: status_codes.to_string(),
            status_text: format!("Testing in progress... ({}/{}s)", tick, self.duration),
        }
    }
}

impl<R: Rng> Iterator for SyntheticTelemetry<R> {
    type Item = TelemetryFrame;

    fn next(&mut self) -> Option<TelemetryFrame> {
        if self.is_finished() {
            return None;
        }
        self.tick += 1;
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        Some(self.sample(timestamp))
    }
}
