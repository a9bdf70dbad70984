use serde::{Deserialize, Serialize};

use super::applicant::ExtractionResult;
use super::enums::{BatchStatus, ExtractionStatus};

/// Issues recorded for one applicant, for the error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantIssues {
    pub applicant: String,
    pub issues: Vec<String>,
}

/// Batch counters and throughput.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_processed: usize,
    pub successful: usize,
    /// `unsupported`, `failed` and `error` results.
    pub failed: usize,
    /// `no_form` results, left for manual review.
    pub manual_review: usize,
    pub from_cache: usize,
    /// Percent of processed applicants that succeeded, one decimal.
    pub success_rate: f64,
    pub elapsed_secs: f64,
    /// Applicants per second.
    pub rate: f64,
}

impl BatchStats {
    /// Count one completed applicant.
    pub fn record(&mut self, status: ExtractionStatus, from_cache: bool) {
        self.total_processed += 1;
        match status {
            ExtractionStatus::Success => self.successful += 1,
            ExtractionStatus::NoForm => self.manual_review += 1,
            ExtractionStatus::Unsupported | ExtractionStatus::Failed | ExtractionStatus::Error => {
                self.failed += 1
            }
        }
        if from_cache {
            self.from_cache += 1;
        }
    }

    /// Fill the derived rates once the batch is over.
    pub fn finish(&mut self, elapsed_secs: f64) {
        self.elapsed_secs = (elapsed_secs * 100.0).round() / 100.0;
        self.success_rate = if self.total_processed > 0 {
            (self.successful as f64 / self.total_processed as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        self.rate = if elapsed_secs > 0.0 {
            (self.total_processed as f64 / elapsed_secs * 100.0).round() / 100.0
        } else {
            0.0
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// Set when the batch itself failed.
    pub message: Option<String>,
    /// Sorted by applicant name.
    pub results: Vec<ExtractionResult>,
    pub errors: Vec<ApplicantIssues>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Batch-fatal report with no results.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Error,
            message: Some(message.into()),
            results: Vec::new(),
            errors: Vec::new(),
            stats: BatchStats::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_classify_statuses() {
        let mut stats = BatchStats::default();
        stats.record(ExtractionStatus::Success, false);
        stats.record(ExtractionStatus::Success, true);
        stats.record(ExtractionStatus::NoForm, false);
        stats.record(ExtractionStatus::Error, false);
        stats.record(ExtractionStatus::Failed, false);

        assert_eq!(stats.total_processed, 5);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.manual_review, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.from_cache, 1);
    }

    #[test]
    fn finish_computes_rates() {
        let mut stats = BatchStats::default();
        for _ in 0..3 {
            stats.record(ExtractionStatus::Success, false);
        }
        stats.record(ExtractionStatus::Error, false);
        stats.finish(2.0);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.rate, 2.0);
    }

    #[test]
    fn finish_with_nothing_processed() {
        let mut stats = BatchStats::default();
        stats.finish(0.0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.rate, 0.0);
    }

    #[test]
    fn failed_report_carries_message() {
        let report = BatchReport::failed("No applicant folders found");
        assert!(!report.is_complete());
        assert_eq!(report.message.as_deref(), Some("No applicant folders found"));
        assert!(report.results.is_empty());
    }
}
