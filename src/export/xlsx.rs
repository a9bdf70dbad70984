//! Workbook load/save for the results sheet.
//!
//! Columns are positional: S/N in A, then the field columns in order.
//! Anything past the last known column is dropped on load.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

use super::sheet::{header_row, SheetRow, SheetTable, SHEET_NAME};
use super::ExportError;
use crate::models::{Field, FieldRecord, FieldValue};

/// Column widths in character units, S/N first.
const COLUMN_WIDTHS: [f64; 11] = [8.0, 25.0, 20.0, 10.0, 10.0, 15.0, 8.0, 15.0, 18.0, 18.0, 50.0];

const HEADER_FILL: u32 = 0x4472C4;

fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Int(i) => FieldValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => FieldValue::Integer(*f as i64),
        Data::Float(f) => FieldValue::Decimal(*f),
        Data::String(s) => FieldValue::Text(s.trim().to_string()),
        Data::Empty => FieldValue::EMPTY,
        other => FieldValue::Text(other.to_string()),
    }
}

/// Load the results sheet. A missing file is an empty table. The
/// "Applications" sheet is preferred, falling back to the first sheet.
pub fn load_sheet(path: &Path) -> Result<SheetTable, ExportError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No existing workbook, starting a new one");
        return Ok(SheetTable::new());
    }

    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let Some(sheet) = names
        .iter()
        .find(|n| n.as_str() == SHEET_NAME)
        .or_else(|| names.first())
        .cloned()
    else {
        return Ok(SheetTable::new());
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut table = SheetTable::new();
    for row in range.rows().skip(1) {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        let serial = row.first().map(cell_value).unwrap_or_default();
        let mut values = FieldRecord::new();
        for (field, cell) in Field::ALL.into_iter().zip(row.iter().skip(1)) {
            values.set(field, cell_value(cell));
        }
        table.rows.push(SheetRow { serial, values });
    }
    tracing::info!(path = %path.display(), sheet = %sheet, rows = table.rows.len(), "Loaded workbook");
    Ok(table)
}

/// Write the table as a fresh workbook with a styled, frozen header row.
pub fn save_sheet(table: &SheetTable, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_font_color(Color::White)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let cell_format = Format::new().set_align(FormatAlign::Top);
    let wrap_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    for (col, header) in header_row().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let r = index as u32 + 1;
        let cells = std::iter::once(&row.serial).chain(Field::ALL.iter().map(|f| row.values.get(*f)));
        for (col, value) in cells.enumerate() {
            let format = if col == Field::ALL.len() { &wrap_format } else { &cell_format };
            let col = col as u16;
            match value {
                FieldValue::Integer(i) => {
                    worksheet.write_number_with_format(r, col, *i as f64, format)?;
                }
                FieldValue::Decimal(d) => {
                    worksheet.write_number_with_format(r, col, *d, format)?;
                }
                FieldValue::Text(s) if s.is_empty() => {}
                FieldValue::Text(s) => {
                    worksheet.write_string_with_format(r, col, s, format)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook.save(path)?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "Workbook saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminDefaults;
    use crate::export::MergeSummary;
    use crate::models::{ApplicantFolder, ExtractionResult, ExtractionStatus};
    use std::path::PathBuf;

    fn result(name: &str, age: i64) -> ExtractionResult {
        let applicant = ApplicantFolder {
            name: name.into(),
            path: PathBuf::from("/batch").join(name),
            form: None,
        };
        let mut result =
            ExtractionResult::for_applicant(&applicant, ExtractionStatus::Success, &AdminDefaults::default());
        result.fields.set(Field::Age, age);
        result.fields.set(Field::ExperienceYears, 9.3);
        result.fields.set(Field::Qualifications, "MSc IT - 2023\nBSc CS - 2017");
        result
    }

    #[test]
    fn missing_workbook_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_sheet(&dir.path().join("none.xlsx")).unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn saved_sheet_reloads_and_merges_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applications.xlsx");

        let mut table = SheetTable::new();
        table.merge(&[result("Ama", 34), result("Kofi", 39)]);
        save_sheet(&table, &path).unwrap();

        let mut reloaded = load_sheet(&path).unwrap();
        assert_eq!(reloaded.rows.len(), 2);
        assert_eq!(reloaded.rows[0].serial, FieldValue::Integer(1));
        assert_eq!(reloaded.rows[1].values.text(Field::Name), "KOFI");
        assert_eq!(*reloaded.rows[0].values.get(Field::Age), FieldValue::Integer(34));
        assert_eq!(*reloaded.rows[0].values.get(Field::ExperienceYears), FieldValue::Decimal(9.3));
        assert_eq!(
            reloaded.rows[0].values.text(Field::Qualifications),
            "MSc IT - 2023\nBSc CS - 2017"
        );

        let summary = reloaded.merge(&[result("kofi", 40), result("Yaw", 25)]);
        assert_eq!(summary, MergeSummary { updated: 1, appended: 1 });
        assert_eq!(reloaded.rows[2].serial, FieldValue::Integer(3));
    }
}
