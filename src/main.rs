use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use applicant_intake::config::{self, AdminDefaults, BatchConfig, DecoderSettings};
use applicant_intake::export::{load_sheet, save_sheet, write_error_log};
use applicant_intake::models::BatchReport;
use applicant_intake::pipeline::batch::{BatchRunner, ProgressUpdate};
use applicant_intake::pipeline::extraction::{FileDecoder, PdfiumBackend};
use applicant_intake::pipeline::processor::ApplicantProcessor;
use applicant_intake::pipeline::structuring::FormExtractor;
use applicant_intake::pipeline::vocabulary::Vocabulary;

#[derive(Parser, Debug)]
#[command(
    name = "applicant-intake",
    about = "Extract application-form fields for every applicant folder and merge them into a workbook",
    version
)]
struct Cli {
    /// Folder holding one subfolder per applicant
    parent: PathBuf,
    /// Concurrent applicant workers
    #[arg(long, default_value_t = config::DEFAULT_MAX_WORKERS)]
    workers: usize,
    /// Workbook to update in place (created when missing)
    #[arg(long)]
    excel: Option<PathBuf>,
    /// Write a plain-text log of applicants with issues
    #[arg(long)]
    error_log: Option<PathBuf>,
    /// JSON file overriding the keyword vocabulary
    #[arg(long)]
    vocabulary: Option<PathBuf>,
    /// Value for the POSITION CODE column
    #[arg(long, default_value = "")]
    position_code: String,
    /// Value for the INT/EXT column
    #[arg(long, default_value = "EXT")]
    int_ext: String,
    /// Tesseract language data directory, for scanned forms and images
    #[arg(long)]
    tessdata: Option<PathBuf>,
}

fn build_decoder(cli: &Cli) -> FileDecoder {
    let mut decoder = FileDecoder::new(DecoderSettings::default());
    match PdfiumBackend::new() {
        Ok(backend) => {
            decoder = decoder
                .with_pdf_extractor(Box::new(backend))
                .with_pdf_renderer(Box::new(backend));
        }
        Err(e) => tracing::warn!(error = %e, "PDFium unavailable, PDF forms will be reported as errors"),
    }
    attach_ocr(decoder, cli.tessdata.as_deref())
}

#[cfg(feature = "ocr")]
fn attach_ocr(decoder: FileDecoder, tessdata: Option<&std::path::Path>) -> FileDecoder {
    use applicant_intake::pipeline::extraction::BundledTesseract;

    let Some(dir) = tessdata else {
        return decoder;
    };
    match BundledTesseract::new(dir) {
        Ok(engine) => decoder.with_ocr_engine(Arc::new(engine)),
        Err(e) => {
            tracing::warn!(error = %e, "OCR unavailable, scanned forms will not be read");
            decoder
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn attach_ocr(decoder: FileDecoder, tessdata: Option<&std::path::Path>) -> FileDecoder {
    if tessdata.is_some() {
        tracing::warn!("Built without the `ocr` feature, --tessdata ignored");
    }
    decoder
}

fn print_summary(report: &BatchReport) {
    let stats = &report.stats;
    println!(
        "Processed {} applicants in {:.1}s: {} successful, {} manual review, {} failed ({} from cache, {:.1}% success)",
        stats.total_processed,
        stats.elapsed_secs,
        stats.successful,
        stats.manual_review,
        stats.failed,
        stats.from_cache,
        stats.success_rate,
    );
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let vocab = Arc::new(match &cli.vocabulary {
        Some(path) => Vocabulary::from_json_file(path)?,
        None => Vocabulary::default(),
    });
    let admin = AdminDefaults {
        position_code: cli.position_code.clone(),
        int_ext: cli.int_ext.clone(),
    };
    let processor = ApplicantProcessor::new(
        Box::new(build_decoder(&cli)),
        Box::new(FormExtractor::new(vocab.clone())),
        admin,
    );
    let runner = BatchRunner::new(
        processor,
        vocab,
        BatchConfig {
            max_workers: cli.workers,
            ..BatchConfig::default()
        },
    );

    let today = chrono::Local::now().date_naive();
    let progress = |update: ProgressUpdate| eprintln!("{}", update.message);
    let report = runner.run(&cli.parent, today, Some(&progress))?;
    if !report.is_complete() {
        return Err(report
            .message
            .unwrap_or_else(|| "Batch failed".to_string())
            .into());
    }
    print_summary(&report);

    if let Some(path) = &cli.excel {
        let mut table = load_sheet(path)?;
        let summary = table.merge(&report.results);
        save_sheet(&table, path)?;
        println!(
            "Workbook {}: {} updated, {} appended",
            path.display(),
            summary.updated,
            summary.appended
        );
    }
    if let Some(path) = &cli.error_log {
        write_error_log(&report.errors, chrono::Local::now().naive_local(), path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    applicant_intake::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Batch aborted");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
