//! Process-wide client counters (lock-free atomics).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Pricing oracle ---
    pub oracle_requests: AtomicU64,
    pub oracle_errors: AtomicU64,

    // --- Status polling ---
    pub status_polls: AtomicU64,
    pub status_poll_errors: AtomicU64,
    /// Server reported a lower-rank status than already stored.
    pub status_regressions: AtomicU64,

    // --- Transactions ---
    pub transactions_registered: AtomicU64,
    pub transactions_completed: AtomicU64,

    // --- HTTP ---
    pub http_retries: AtomicU64,
    pub http_duration_us_sum: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            oracle_requests: AtomicU64::new(0),
            oracle_errors: AtomicU64::new(0),
            status_polls: AtomicU64::new(0),
            status_poll_errors: AtomicU64::new(0),
            status_regressions: AtomicU64::new(0),
            transactions_registered: AtomicU64::new(0),
            transactions_completed: AtomicU64::new(0),
            http_retries: AtomicU64::new(0),
            http_duration_us_sum: AtomicU64::new(0),
        }
    }

    pub fn record_http_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.http_duration_us_sum.fetch_add(us, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, tracked: usize, polling: usize) -> String {
        let oracle_requests = self.oracle_requests.load(Ordering::Relaxed);
        let oracle_errors = self.oracle_errors.load(Ordering::Relaxed);
        let status_polls = self.status_polls.load(Ordering::Relaxed);
        let status_poll_errors = self.status_poll_errors.load(Ordering::Relaxed);
        let status_regressions = self.status_regressions.load(Ordering::Relaxed);
        let registered = self.transactions_registered.load(Ordering::Relaxed);
        let completed = self.transactions_completed.load(Ordering::Relaxed);
        let http_retries = self.http_retries.load(Ordering::Relaxed);
        let http_dur_sum_s = self.http_duration_us_sum.load(Ordering::Relaxed) as f64 / 1_000_000.0;

        format!(
            "\
# HELP offset_oracle_requests_total Price range requests sent to the pricing oracle.\n\
# TYPE offset_oracle_requests_total counter\n\
offset_oracle_requests_total {oracle_requests}\n\
# HELP offset_oracle_errors_total Failed price range requests.\n\
# TYPE offset_oracle_errors_total counter\n\
offset_oracle_errors_total {oracle_errors}\n\
# HELP offset_status_polls_total Transaction status polls.\n\
# TYPE offset_status_polls_total counter\n\
offset_status_polls_total {status_polls}\n\
# HELP offset_status_poll_errors_total Failed transaction status polls.\n\
# TYPE offset_status_poll_errors_total counter\n\
offset_status_poll_errors_total {status_poll_errors}\n\
# HELP offset_status_regressions_total Out-of-order statuses ignored.\n\
# TYPE offset_status_regressions_total counter\n\
offset_status_regressions_total {status_regressions}\n\
# HELP offset_transactions_registered_total Transactions submitted and tracked.\n\
# TYPE offset_transactions_registered_total counter\n\
offset_transactions_registered_total {registered}\n\
# HELP offset_transactions_completed_total Transactions that reached a terminal status.\n\
# TYPE offset_transactions_completed_total counter\n\
offset_transactions_completed_total {completed}\n\
# HELP offset_http_retries_total Retried marketplace API calls.\n\
# TYPE offset_http_retries_total counter\n\
offset_http_retries_total {http_retries}\n\
# HELP offset_http_duration_seconds_sum Total marketplace API time (seconds).\n\
# TYPE offset_http_duration_seconds_sum counter\n\
offset_http_duration_seconds_sum {http_dur_sum_s:.6}\n\
# HELP offset_transactions_tracked Transactions held in the session.\n\
# TYPE offset_transactions_tracked gauge\n\
offset_transactions_tracked {tracked}\n\
# HELP offset_transactions_polling Transactions with an active poller.\n\
# TYPE offset_transactions_polling gauge\n\
offset_transactions_polling {polling}\n"
        )
    }
}
