//! Lock-free metrics for the email proxy
//!
//! Counters are plain atomics updated on the request path. Totals and the
//! latency histogram are monotonic so they can be scraped; only the max
//! latency is reset by `report()`.
//!
//! NOTE: All atomics use Relaxed ordering. They are statistical counters
//! only and must not be used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Vendor call latency bucket boundaries (milliseconds)
/// Buckets: ≤25, ≤50, ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, >12800
const BUCKET_BOUNDS: [u64; 10] = [25, 50, 100, 200, 400, 800, 1600, 3200, 6400, 12800];
const NUM_BUCKETS: usize = 11;

#[inline]
fn bucket_index(latency_ms: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_ms)
}

#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Terminal outcome of one registration-email request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Rejected,
    VendorError,
    TransportError,
}

pub struct Metrics {
    started_at: Instant,
    email_requests_total: AtomicU64,
    email_sent_total: AtomicU64,
    email_rejected_total: AtomicU64,
    email_vendor_errors_total: AtomicU64,
    email_transport_errors_total: AtomicU64,
    /// Vendor latency histogram (monotonic)
    vendor_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of vendor latencies in ms (monotonic)
    vendor_latency_sum_ms: AtomicU64,
    /// Max vendor latency in ms (reset on report)
    vendor_latency_max_ms: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            email_requests_total: AtomicU64::new(0),
            email_sent_total: AtomicU64::new(0),
            email_rejected_total: AtomicU64::new(0),
            email_vendor_errors_total: AtomicU64::new(0),
            email_transport_errors_total: AtomicU64::new(0),
            vendor_latency_buckets: Default::default(),
            vendor_latency_sum_ms: AtomicU64::new(0),
            vendor_latency_max_ms: AtomicU64::new(0),
        }
    }

    pub fn record_email_request(&self) {
        self.email_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Sent => &self.email_sent_total,
            DispatchOutcome::Rejected => &self.email_rejected_total,
            DispatchOutcome::VendorError => &self.email_vendor_errors_total,
            DispatchOutcome::TransportError => &self.email_transport_errors_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vendor_latency(&self, latency_ms: u64) {
        self.vendor_latency_buckets[bucket_index(latency_ms)].fetch_add(1, Ordering::Relaxed);
        self.vendor_latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        update_atomic_max(&self.vendor_latency_max_ms, latency_ms);
    }

    pub fn email_requests_total(&self) -> u64 {
        self.email_requests_total.load(Ordering::Relaxed)
    }

    pub fn email_sent_total(&self) -> u64 {
        self.email_sent_total.load(Ordering::Relaxed)
    }

    pub fn email_rejected_total(&self) -> u64 {
        self.email_rejected_total.load(Ordering::Relaxed)
    }

    /// Read counters without resetting anything (for scrapes)
    pub fn snapshot(&self) -> MetricsSummary {
        self.summarize(self.vendor_latency_max_ms.load(Ordering::Relaxed))
    }

    /// Read counters and reset the max latency (for the periodic log line)
    pub fn report(&self) -> MetricsSummary {
        self.summarize(self.vendor_latency_max_ms.swap(0, Ordering::Relaxed))
    }

    fn summarize(&self, latency_max: u64) -> MetricsSummary {
        let vendor_latency_buckets = load_buckets(&self.vendor_latency_buckets);
        let latency_sum = self.vendor_latency_sum_ms.load(Ordering::Relaxed);
        let calls: u64 = vendor_latency_buckets.iter().sum();

        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            email_requests_total: self.email_requests_total.load(Ordering::Relaxed),
            email_sent_total: self.email_sent_total.load(Ordering::Relaxed),
            email_rejected_total: self.email_rejected_total.load(Ordering::Relaxed),
            email_vendor_errors_total: self.email_vendor_errors_total.load(Ordering::Relaxed),
            email_transport_errors_total: self
                .email_transport_errors_total
                .load(Ordering::Relaxed),
            vendor_latency_buckets,
            vendor_latency_sum_ms: latency_sum,
            vendor_latency_avg_ms: if calls > 0 { latency_sum / calls } else { 0 },
            vendor_latency_max_ms: latency_max,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for Prometheus formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub email_requests_total: u64,
    pub email_sent_total: u64,
    pub email_rejected_total: u64,
    pub email_vendor_errors_total: u64,
    pub email_transport_errors_total: u64,
    pub vendor_latency_buckets: [u64; NUM_BUCKETS],
    pub vendor_latency_sum_ms: u64,
    pub vendor_latency_avg_ms: u64,
    pub vendor_latency_max_ms: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            email_requests = %self.email_requests_total,
            email_sent = %self.email_sent_total,
            email_rejected = %self.email_rejected_total,
            vendor_errors = %self.email_vendor_errors_total,
            transport_errors = %self.email_transport_errors_total,
            vendor_avg_ms = %self.vendor_latency_avg_ms,
            vendor_max_ms = %self.vendor_latency_max_ms,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.email_requests_total(), 0);
        assert_eq!(metrics.email_sent_total(), 0);
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = Metrics::new();
        metrics.record_email_request();
        metrics.record_email_request();
        metrics.record_outcome(DispatchOutcome::Sent);
        metrics.record_outcome(DispatchOutcome::Rejected);

        let summary = metrics.report();
        assert_eq!(summary.email_requests_total, 2);
        assert_eq!(summary.email_sent_total, 1);
        assert_eq!(summary.email_rejected_total, 1);
        assert_eq!(summary.email_vendor_errors_total, 0);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(25), 0);
        assert_eq!(bucket_index(26), 1);
        assert_eq!(bucket_index(12800), 9);
        assert_eq!(bucket_index(50_000), 10);
    }

    #[test]
    fn test_report_resets_only_max() {
        let metrics = Metrics::new();
        metrics.record_vendor_latency(30);
        metrics.record_vendor_latency(90);

        let summary = metrics.report();
        assert_eq!(summary.vendor_latency_avg_ms, 60);
        assert_eq!(summary.vendor_latency_max_ms, 90);
        assert_eq!(summary.vendor_latency_buckets[1], 1);
        assert_eq!(summary.vendor_latency_buckets[2], 1);

        let summary = metrics.report();
        assert_eq!(summary.vendor_latency_max_ms, 0);
        assert_eq!(summary.vendor_latency_buckets.iter().sum::<u64>(), 2);
        assert_eq!(summary.vendor_latency_sum_ms, 120);
    }

    #[test]
    fn test_snapshot_keeps_max() {
        let metrics = Metrics::new();
        metrics.record_vendor_latency(400);
        assert_eq!(metrics.snapshot().vendor_latency_max_ms, 400);
        assert_eq!(metrics.snapshot().vendor_latency_max_ms, 400);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Arc::new(Metrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.record_email_request();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.email_requests_total(), 1000);
    }
}
