use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Periodic progress logging for passes over many items
pub struct ProgressTracker {
    total: usize,
    succeeded: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    /// `progress_interval` is the number of items between two progress lines
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Starting operation: {} items to process", total);
        }
        Self {
            total,
            succeeded: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    /// Interval that keeps small batches quiet and large ones readable
    pub fn interval_for(total: usize) -> usize {
        if total < 100 {
            10
        } else {
            100
        }
    }

    pub fn record_succeeded(&mut self) {
        self.succeeded += 1;
    }

    /// Count a failure under `error_category` for the summary breakdown
    pub fn record_failed(&mut self, error_category: &str) {
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn log_progress(&mut self) {
        let current = self.processed();
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        // Fast passes finish before a progress line would tell anyone anything
        if elapsed < 0.5 && current < self.total {
            return;
        }
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        info!(
            "Progress: {}/{} ({:.1} items/sec) | Succeeded: {} | Failed: {}",
            current, self.total, rate, self.succeeded, self.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed == 0 {
            info!(
                "{} completed: {} total in {:.1}s | Succeeded: {}",
                operation_name, self.total, elapsed, self.succeeded
            );
            return;
        }

        warn!(
            "{} completed: {} total in {:.1}s | Succeeded: {} | Failed: {}",
            operation_name, self.total, elapsed, self.succeeded, self.failed
        );
        let mut error_entries: Vec<_> = self.error_counts.iter().collect();
        error_entries.sort_by(|a, b| b.1.cmp(a.1));
        let error_summary: Vec<String> = error_entries
            .iter()
            .map(|(category, count)| format!("{}: {}", category, count))
            .collect();
        info!("Error breakdown: {}", error_summary.join(", "));
    }
}
