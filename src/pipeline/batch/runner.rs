//! Batch runner: drives every applicant folder under a parent directory
//! through the [`ApplicantProcessor`] with a bounded worker pool.
//!
//! Workers pull applicants from a shared queue and send finished results
//! back over a channel. The calling thread owns the cache, the counters and
//! the progress callback, so none of them need locking.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::NaiveDate;

use super::cache::ResultCache;
use super::progress::{estimate_remaining, ProgressUpdate};
use super::BatchError;
use crate::config::BatchConfig;
use crate::models::{
    ApplicantFolder, ApplicantIssues, BatchReport, BatchStats, BatchStatus, ExtractionResult,
};
use crate::pipeline::import::{folder_statistics, scan_applicants};
use crate::pipeline::processor::ApplicantProcessor;
use crate::pipeline::vocabulary::Vocabulary;

pub struct BatchRunner {
    processor: ApplicantProcessor,
    vocab: Arc<Vocabulary>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(processor: ApplicantProcessor, vocab: Arc<Vocabulary>, config: BatchConfig) -> Self {
        Self {
            processor,
            vocab,
            config,
        }
    }

    /// Process every applicant folder under `parent`.
    ///
    /// Only a scan failure is an `Err`. Individual applicants never abort the
    /// batch: their problems are in the report's results and errors. An empty
    /// parent folder yields a failed report.
    pub fn run(
        &self,
        parent: &Path,
        today: NaiveDate,
        progress_fn: Option<&dyn Fn(ProgressUpdate)>,
    ) -> Result<BatchReport, BatchError> {
        let start = Instant::now();
        let emit = |update: ProgressUpdate| {
            if let Some(progress) = progress_fn {
                progress(update);
            }
        };

        emit(ProgressUpdate::scanning());
        let applicants = scan_applicants(parent, &self.vocab.form_keywords)?;
        if applicants.is_empty() {
            tracing::warn!(parent = %parent.display(), "No applicant folders found");
            return Ok(BatchReport::failed("No applicant folders found"));
        }

        let overview = folder_statistics(&applicants);
        tracing::info!(
            total = overview.total_folders,
            with_forms = overview.with_forms,
            without_forms = overview.without_forms,
            file_types = ?overview.file_types,
            "Batch started"
        );

        let total = applicants.len();
        let mut cache = ResultCache::load(parent);
        let mut stats = BatchStats::default();
        let mut results: Vec<ExtractionResult> = Vec::with_capacity(total);

        // ── Cached results ──
        let mut pending: VecDeque<&ApplicantFolder> = VecDeque::new();
        for applicant in &applicants {
            match cache.get(&applicant.cache_key()) {
                Some(cached) => {
                    stats.record(cached.status, true);
                    results.push(cached.clone());
                }
                None => pending.push_back(applicant),
            }
        }
        let cached = results.len();
        if cached > 0 {
            tracing::info!(cached, remaining = pending.len(), "Serving cached results");
            emit(ProgressUpdate::cached(cached, total));
        }

        // ── Worker pool ──
        if !pending.is_empty() {
            let workers = self.config.max_workers.clamp(1, pending.len());
            let flush_every = self.config.cache_flush_every.max(1);
            let work_start = Instant::now();
            let queue = Mutex::new(pending);
            let (tx, rx) = mpsc::channel::<(&ApplicantFolder, ExtractionResult)>();

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    let tx = tx.clone();
                    let queue = &queue;
                    scope.spawn(move || loop {
                        let next = queue
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .pop_front();
                        let Some(applicant) = next else { break };
                        let result = self.processor.process_isolated(applicant, today);
                        if tx.send((applicant, result)).is_err() {
                            break;
                        }
                    });
                }
                drop(tx);

                let mut processed = 0usize;
                for (applicant, result) in rx {
                    processed += 1;
                    stats.record(result.status, false);
                    cache.insert(applicant.cache_key(), result.clone());
                    if processed % flush_every == 0 && cache.is_dirty() {
                        flush(&mut cache);
                    }

                    let completed = cached + processed;
                    let remaining =
                        estimate_remaining(work_start.elapsed(), processed, total - completed);
                    emit(ProgressUpdate::processed(
                        &applicant.name,
                        completed,
                        total,
                        remaining,
                    ));
                    results.push(result);
                }
            });
        }

        if cache.is_dirty() {
            flush(&mut cache);
        }

        results.sort_by_cached_key(|r| r.applicant_name.to_lowercase());
        let errors: Vec<ApplicantIssues> = results
            .iter()
            .filter(|r| !r.issues.is_empty())
            .map(|r| ApplicantIssues {
                applicant: r.applicant_name.clone(),
                issues: r.issues.clone(),
            })
            .collect();
        stats.finish(start.elapsed().as_secs_f64());

        tracing::info!(
            processed = stats.total_processed,
            successful = stats.successful,
            manual_review = stats.manual_review,
            failed = stats.failed,
            from_cache = stats.from_cache,
            success_rate = stats.success_rate,
            elapsed_secs = stats.elapsed_secs,
            "Batch complete"
        );

        Ok(BatchReport {
            status: BatchStatus::Complete,
            message: None,
            results,
            errors,
            stats,
        })
    }
}

/// A failed flush only costs a rerun its cache hits, so the batch carries on.
fn flush(cache: &mut ResultCache) {
    if let Err(e) = cache.save() {
        tracing::warn!(path = %cache.path().display(), error = %e, "Could not write result cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminDefaults;
    use crate::models::{ExtractionStatus, Field};
    use crate::pipeline::batch::cache::cache_path;
    use crate::pipeline::extraction::types::{DocumentDecoder, RawDocument};
    use crate::pipeline::extraction::ExtractionError;
    use crate::pipeline::processor::MockDecoder;
    use crate::pipeline::structuring::orchestrator::FormExtractor;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FORM_TEXT: &str = "APPLICATION FORM\nFull Name: Kofi Mensah\nSex: M\nNationality: Ghanaian\n\
                             Date of Birth: 02/05/1985\nExperience start year: 2009\nMSc Economics, 2011";

    /// Counts decodes; documents whose file name contains "boom" panic.
    struct CountingDecoder {
        calls: Arc<AtomicUsize>,
    }

    impl DocumentDecoder for CountingDecoder {
        fn decode(&self, path: &Path) -> Result<RawDocument, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if path.file_name().is_some_and(|n| n.to_string_lossy().contains("boom")) {
                panic!("decoder crashed");
            }
            Ok(RawDocument::from_text(FORM_TEXT))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn runner(decoder: impl DocumentDecoder + Send + Sync + 'static, workers: usize) -> BatchRunner {
        let vocab = Arc::new(Vocabulary::default());
        let processor = ApplicantProcessor::new(
            Box::new(decoder),
            Box::new(FormExtractor::new(vocab.clone())),
            AdminDefaults::default(),
        );
        BatchRunner::new(
            processor,
            vocab,
            BatchConfig {
                max_workers: workers,
                cache_flush_every: 2,
            },
        )
    }

    fn applicant_dir(parent: &Path, name: &str, form: Option<&str>) -> PathBuf {
        let dir = parent.join(name);
        std::fs::create_dir(&dir).unwrap();
        if let Some(form) = form {
            std::fs::write(dir.join(form), b"stub").unwrap();
        }
        dir
    }

    #[test]
    fn every_applicant_gets_a_result_sorted_by_name() {
        let parent = tempfile::tempdir().unwrap();
        for name in ["Zainab Bello", "Ama Serwaa", "Kofi Mensah", "Ngozi Eze", "Yaw Boateng"] {
            applicant_dir(parent.path(), name, Some("Application Form.pdf"));
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let report = runner(CountingDecoder { calls: calls.clone() }, 4)
            .run(parent.path(), today(), None)
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let names: Vec<_> = report.results.iter().map(|r| r.applicant_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Ama Serwaa", "Kofi Mensah", "Ngozi Eze", "Yaw Boateng", "Zainab Bello"]
        );
        assert_eq!(report.results[0].fields.text(Field::Name), "AMA SERWAA");
        assert_eq!(report.stats.total_processed, 5);
        assert_eq!(report.stats.successful, 5);
        assert_eq!(report.stats.success_rate, 100.0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn rerun_is_served_from_cache() {
        let parent = tempfile::tempdir().unwrap();
        applicant_dir(parent.path(), "Ama", Some("application form.pdf"));
        applicant_dir(parent.path(), "Kofi", Some("application form.pdf"));
        applicant_dir(parent.path(), "Yaw", Some("application form.pdf"));
        applicant_dir(parent.path(), "Empty", None);

        let calls = Arc::new(AtomicUsize::new(0));
        let first = runner(CountingDecoder { calls: calls.clone() }, 2)
            .run(parent.path(), today(), None)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache_path(parent.path()).exists());

        let calls = Arc::new(AtomicUsize::new(0));
        let second = runner(CountingDecoder { calls: calls.clone() }, 2)
            .run(parent.path(), today(), None)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.stats.from_cache, 4);
        assert_eq!(second.results, first.results);
    }

    #[test]
    fn one_crash_does_not_stop_the_batch() {
        let parent = tempfile::tempdir().unwrap();
        applicant_dir(parent.path(), "Ama", Some("application form.pdf"));
        applicant_dir(parent.path(), "Bad", Some("application form boom.pdf"));
        applicant_dir(parent.path(), "Kofi", Some("application form.pdf"));

        let calls = Arc::new(AtomicUsize::new(0));
        let report = runner(CountingDecoder { calls }, 3)
            .run(parent.path(), today(), None)
            .unwrap();

        assert_eq!(report.results.len(), 3);
        let bad = &report.results[1];
        assert_eq!(bad.applicant_name, "Bad");
        assert_eq!(bad.status, ExtractionStatus::Error);
        assert_eq!(bad.fields.text(Field::Name), "Bad");
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.successful, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].applicant, "Bad");
        assert_eq!(report.errors[0].issues, vec!["Extraction failed: decoder crashed".to_string()]);
    }

    #[test]
    fn failures_are_retried_on_rerun() {
        let parent = tempfile::tempdir().unwrap();
        applicant_dir(parent.path(), "Bad", Some("application form boom.pdf"));

        let calls = Arc::new(AtomicUsize::new(0));
        runner(CountingDecoder { calls: calls.clone() }, 1)
            .run(parent.path(), today(), None)
            .unwrap();
        runner(CountingDecoder { calls: calls.clone() }, 1)
            .run(parent.path(), today(), None)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn folder_without_form_needs_manual_review() {
        let parent = tempfile::tempdir().unwrap();
        applicant_dir(parent.path(), "Kofi Mensah", Some("cv.pdf"));
        let report = runner(MockDecoder::text(FORM_TEXT), 4)
            .run(parent.path(), today(), None)
            .unwrap();

        // "cv.pdf" is still a supported file, so it is selected as the form
        assert_eq!(report.results[0].status, ExtractionStatus::Success);

        let parent = tempfile::tempdir().unwrap();
        applicant_dir(parent.path(), "Kofi Mensah", Some("notes.txt"));
        let report = runner(MockDecoder::text(FORM_TEXT), 4)
            .run(parent.path(), today(), None)
            .unwrap();
        assert_eq!(report.results[0].status, ExtractionStatus::NoForm);
        assert_eq!(report.stats.manual_review, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn empty_parent_is_a_failed_batch() {
        let parent = tempfile::tempdir().unwrap();
        let report = runner(MockDecoder::text(FORM_TEXT), 4)
            .run(parent.path(), today(), None)
            .unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.message.as_deref(), Some("No applicant folders found"));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let parent = tempfile::tempdir().unwrap();
        let missing = parent.path().join("nope");
        let err = runner(MockDecoder::text(FORM_TEXT), 4)
            .run(&missing, today(), None)
            .unwrap_err();
        assert!(matches!(err, BatchError::Scan(_)));
    }

    #[test]
    fn progress_reports_every_completion() {
        let parent = tempfile::tempdir().unwrap();
        for name in ["A", "B", "C"] {
            applicant_dir(parent.path(), name, Some("application form.docx"));
        }
        let updates = RefCell::new(Vec::new());
        let record = |u: ProgressUpdate| updates.borrow_mut().push(u);
        runner(MockDecoder::text(FORM_TEXT), 2)
            .run(parent.path(), today(), Some(&record))
            .unwrap();

        let updates = updates.into_inner();
        assert_eq!(updates[0].message, "Scanning folders...");
        assert_eq!(updates.len(), 4);
        let last = updates.last().unwrap();
        assert_eq!((last.completed, last.total), (3, 3));
        assert!(last.message.starts_with("Processing "));
        assert!(last.message.contains("(3/3)"));
        assert!(last.message.ends_with("s remaining"));
    }

    #[test]
    fn cache_is_flushed_every_n_completions() {
        let parent = tempfile::tempdir().unwrap();
        for name in ["A", "B", "C", "D", "E"] {
            applicant_dir(parent.path(), name, Some("application form.pdf"));
        }
        let cache_file = cache_path(parent.path());
        let on_disk = RefCell::new(Vec::new());
        let record = |u: ProgressUpdate| {
            if !u.message.starts_with("Processing ") {
                return;
            }
            let entries = std::fs::read_to_string(&cache_file)
                .ok()
                .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
                .and_then(|v| v["entries"].as_object().map(|m| m.len()))
                .unwrap_or(0);
            on_disk.borrow_mut().push((u.completed, entries));
        };
        runner(MockDecoder::text(FORM_TEXT), 1)
            .run(parent.path(), today(), Some(&record))
            .unwrap();

        // flush_every is 2; the fifth result is only written by the final save
        assert_eq!(on_disk.into_inner(), vec![(1, 0), (2, 2), (3, 2), (4, 4), (5, 4)]);
        assert_eq!(ResultCache::load(parent.path()).len(), 5);
    }
}
