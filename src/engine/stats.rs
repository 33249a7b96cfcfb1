// Live statistics aggregation: task outcomes, timeouts, late replies, served bytes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

struct StatsSample {
    at: Instant,
    serve_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub tasks_dispatched: u64,
    pub tasks_settled: u64,
    pub tasks_failed: u64,
    pub timeouts: u64,
    pub late_replies: u64,
    pub probes_answered: u64,
    pub served_bytes: u64,
    pub serve_bps: u64,
    pub in_flight: usize,
}

pub struct StatsCollector {
    tasks_dispatched: AtomicU64,
    tasks_settled: AtomicU64,
    tasks_failed: AtomicU64,
    timeouts: AtomicU64,
    late_replies: AtomicU64,
    probes_answered: AtomicU64,
    serve_bytes_total: AtomicU64,
    last_sample: Mutex<StatsSample>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            tasks_dispatched: AtomicU64::new(0),
            tasks_settled: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            late_replies: AtomicU64::new(0),
            probes_answered: AtomicU64::new(0),
            serve_bytes_total: AtomicU64::new(0),
            last_sample: Mutex::new(StatsSample {
                at: Instant::now(),
                serve_bytes: 0,
            }),
        }
    }

    pub fn record_dispatched(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reply that matched a pending entry.
    pub fn record_settled(&self, success: bool) {
        self.tasks_settled.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_late_reply(&self) {
        self.late_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe(&self) {
        self.probes_answered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_served(&self, bytes: u64) {
        self.serve_bytes_total.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self, in_flight: usize) -> StatsSnapshot {
        let now = Instant::now();
        let current_serve = self.serve_bytes_total.load(Ordering::Relaxed);

        let serve_bps = {
            let mut sample = self.last_sample.lock();
            let elapsed = now.duration_since(sample.at).as_secs_f64();

            let bps = if elapsed > 0.1 {
                (current_serve.saturating_sub(sample.serve_bytes) as f64 / elapsed) as u64
            } else {
                0
            };

            // Update sample for next call
            sample.at = now;
            sample.serve_bytes = current_serve;
            bps
        };

        StatsSnapshot {
            tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
            tasks_settled: self.tasks_settled.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            late_replies: self.late_replies.load(Ordering::Relaxed),
            probes_answered: self.probes_answered.load(Ordering::Relaxed),
            served_bytes: current_serve,
            serve_bps,
            in_flight,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = StatsCollector::new();
        stats.record_dispatched();
        stats.record_dispatched();
        stats.record_settled(true);
        stats.record_settled(false);
        stats.record_timeout();
        stats.record_late_reply();
        stats.record_probe();
        stats.record_served(1000);
        stats.record_served(24);

        let snap = stats.snapshot(3);
        assert_eq!(snap.tasks_dispatched, 2);
        assert_eq!(snap.tasks_settled, 2);
        assert_eq!(snap.tasks_failed, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.late_replies, 1);
        assert_eq!(snap.probes_answered, 1);
        assert_eq!(snap.served_bytes, 1024);
        assert_eq!(snap.in_flight, 3);
    }

    #[test]
    fn test_concurrent_snapshots_do_not_underflow() {
        let stats = StatsCollector::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5_000 {
                        stats.record_served(7);
                        let snap = stats.snapshot(0);
                        assert!(snap.served_bytes >= 7);
                    }
                });
            }
        });
        assert_eq!(stats.snapshot(0).served_bytes, 8 * 5_000 * 7);
    }
}
