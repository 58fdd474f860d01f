//! Load observability: outcome counters and a fetch latency histogram.
//! Diagnostic only; nothing here influences resolution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Fixed-capacity ring buffer for histogram samples.
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
    capacity: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            pos: 0,
            count: 0,
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        let idx = idx.min(self.count - 1);
        sorted[idx]
    }

    fn summary(&self) -> MetricSummary {
        MetricSummary {
            p50_us: self.percentile(50.0),
            p95_us: self.percentile(95.0),
            p99_us: self.percentile(99.0),
            count: self.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: usize,
}

/// Point-in-time copy of the load counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    /// Fetches that succeeded after their language was replaced.
    pub stale: u64,
    pub fetch_latency: MetricSummary,
}

pub struct LoadMetrics {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    stale: AtomicU64,
    latency: Mutex<SampleRing>,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(ring_capacity: usize) -> Self {
        Self {
            started: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            latency: Mutex::new(SampleRing::new(ring_capacity.max(1))),
        }
    }

    pub fn record_start(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.record_latency(elapsed);
    }

    pub fn record_failure(&self, elapsed: Duration) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(elapsed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros() as f64;
        self.latency.lock().push(elapsed_us);
        tracing::trace!(value_us = elapsed_us, "fetch_latency_recorded");
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            fetch_latency: self.latency.lock().summary(),
        }
    }
}

impl Default for LoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_samples() {
        let mut ring = SampleRing::new(8);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            ring.push(v);
        }
        assert_eq!(ring.percentile(0.0), 10.0);
        assert_eq!(ring.percentile(50.0), 30.0);
        assert_eq!(ring.percentile(100.0), 50.0);
    }

    #[test]
    fn ring_overwrites_oldest() {
        let mut ring = SampleRing::new(2);
        ring.push(1.0);
        ring.push(2.0);
        ring.push(3.0);
        assert_eq!(ring.count, 2);
        assert_eq!(ring.percentile(0.0), 2.0);
    }

    #[test]
    fn counters_accumulate() {
        let metrics = LoadMetrics::new();
        metrics.record_start();
        metrics.record_start();
        metrics.record_success(Duration::from_millis(4));
        metrics.record_cancelled();
        metrics.record_stale();

        let stats = metrics.stats();
        assert_eq!(stats.started, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.fetch_latency.count, 1);
        assert_eq!(stats.fetch_latency.p50_us, 4000.0);
    }

    #[test]
    fn empty_histogram_reports_zero() {
        let stats = LoadMetrics::new().stats();
        assert_eq!(stats.fetch_latency.count, 0);
        assert_eq!(stats.fetch_latency.p99_us, 0.0);
    }
}
