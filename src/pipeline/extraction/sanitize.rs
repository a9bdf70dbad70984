/// Sanitize decoded text before field extraction.
/// Drops control characters, folds non-breaking spaces, collapses runs of
/// horizontal whitespace and removes blank lines.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect::<String>()
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line form of a table cell.
pub fn clean_cell(raw: &str) -> String {
    raw.replace('\u{00A0}', " ")
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_control_characters() {
        assert_eq!(sanitize_extracted_text("Sex:\u{0007} Male"), "Sex: Male");
    }

    #[test]
    fn collapses_whitespace_and_blank_lines() {
        let raw = "Name:\t\tADA   OBI\r\n\r\n  Nationality:\u{00A0}Nigerian  ";
        assert_eq!(sanitize_extracted_text(raw), "Name: ADA OBI\nNationality: Nigerian");
    }

    #[test]
    fn preserves_accented_text() {
        assert_eq!(sanitize_extracted_text("Né le 15 février 1990"), "Né le 15 février 1990");
    }

    #[test]
    fn clean_cell_joins_lines() {
        assert_eq!(clean_cell(" BSc\nComputer  Science "), "BSc Computer Science");
    }
}
