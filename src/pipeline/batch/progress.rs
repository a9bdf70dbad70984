//! Progress events and remaining-time estimation for a running batch.

use std::time::Duration;

use serde::Serialize;

// ═══════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════

/// One progress notification. `completed` counts cached and fresh results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressUpdate {
    pub fn scanning() -> Self {
        Self {
            completed: 0,
            total: 0,
            message: "Scanning folders...".to_string(),
        }
    }

    pub fn cached(cached: usize, total: usize) -> Self {
        Self {
            completed: cached,
            total,
            message: format!("Loaded {cached} cached results ({cached}/{total})"),
        }
    }

    /// Emitted after `name` finished processing.
    pub fn processed(name: &str, completed: usize, total: usize, remaining: Duration) -> Self {
        Self {
            completed,
            total,
            message: format!(
                "Processing {name} ({completed}/{total}) - ~{}s remaining",
                remaining.as_secs()
            ),
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Estimation
// ═══════════════════════════════════════════════════════════

/// Remaining time from the observed pace of this run.
///
/// Formula: `elapsed / processed * remaining`. Cached results are excluded
/// from `processed` since they cost nothing.
pub fn estimate_remaining(elapsed: Duration, processed: usize, remaining: usize) -> Duration {
    if processed == 0 || remaining == 0 {
        return Duration::ZERO;
    }
    let per_item = elapsed.as_secs_f64() / processed as f64;
    Duration::from_secs_f64((per_item * remaining as f64).ceil())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_message_format() {
        let update = ProgressUpdate::processed("Kofi Mensah", 3, 12, Duration::from_secs(27));
        assert_eq!(update.message, "Processing Kofi Mensah (3/12) - ~27s remaining");
        assert_eq!(update.fraction(), 0.25);
    }

    #[test]
    fn scanning_has_no_total() {
        let update = ProgressUpdate::scanning();
        assert_eq!(update.message, "Scanning folders...");
        assert_eq!(update.fraction(), 0.0);
    }

    #[test]
    fn estimate_uses_pace_so_far() {
        let eta = estimate_remaining(Duration::from_secs(10), 4, 6);
        assert_eq!(eta, Duration::from_secs(15));
    }

    #[test]
    fn estimate_rounds_up() {
        let eta = estimate_remaining(Duration::from_millis(1500), 2, 1);
        assert_eq!(eta, Duration::from_secs(1));
        let eta = estimate_remaining(Duration::from_millis(2500), 2, 1);
        assert_eq!(eta, Duration::from_secs(2));
    }

    #[test]
    fn estimate_is_zero_without_data_or_work() {
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 10), Duration::ZERO);
        assert_eq!(estimate_remaining(Duration::from_secs(5), 3, 0), Duration::ZERO);
    }
}
