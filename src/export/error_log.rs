//! Plain-text error log listing every applicant with issues.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDateTime;

use super::ExportError;
use crate::config::APP_NAME;
use crate::models::ApplicantIssues;

const RULE_WIDTH: usize = 60;

pub fn render_error_log(errors: &[ApplicantIssues], generated: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{APP_NAME} - Error Log");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "Generated: {}\n", generated.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Total Errors: {}\n", errors.len());
    for (index, entry) in errors.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, entry.applicant);
        for issue in &entry.issues {
            let _ = writeln!(out, "   - {issue}");
        }
        out.push('\n');
    }
    out
}

pub fn write_error_log(
    errors: &[ApplicantIssues],
    generated: NaiveDateTime,
    path: &Path,
) -> Result<(), ExportError> {
    std::fs::write(path, render_error_log(errors, generated))?;
    tracing::info!(path = %path.display(), entries = errors.len(), "Error log exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn generated() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn log_lists_applicants_and_issues() {
        let errors = vec![
            ApplicantIssues {
                applicant: "Ama Serwaa".into(),
                issues: vec!["DOB is empty or could not be extracted - review manually".into()],
            },
            ApplicantIssues {
                applicant: "Kofi".into(),
                issues: vec!["first".into(), "second".into()],
            },
        ];
        let log = render_error_log(&errors, generated());
        let lines: Vec<&str> = log.lines().collect();

        assert_eq!(lines[0], "Applicant Intake - Error Log");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2], "Generated: 2024-06-30 14:05:09");
        assert_eq!(lines[4], "Total Errors: 2");
        assert_eq!(lines[6], "1. Ama Serwaa");
        assert_eq!(lines[7], "   - DOB is empty or could not be extracted - review manually");
        assert_eq!(lines[9], "2. Kofi");
        assert_eq!(lines[11], "   - second");
    }

    #[test]
    fn empty_log_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.txt");
        write_error_log(&[], generated(), &path).unwrap();
        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("Total Errors: 0"));
    }
}
