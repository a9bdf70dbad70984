//! In-memory results sheet: one row per applicant, keyed by NAME.

use serde::Serialize;

use crate::models::{ExtractionResult, Field, FieldRecord, FieldValue};
use crate::pipeline::normalize::display_from_iso;

pub const SHEET_NAME: &str = "Applications";

/// Serial-number column, written before the field columns.
pub const SERIAL_HEADER: &str = "S/N";

/// Header row: S/N followed by every field label in column order.
pub fn header_row() -> Vec<&'static str> {
    std::iter::once(SERIAL_HEADER)
        .chain(Field::ALL.iter().map(|f| f.label()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub serial: FieldValue,
    pub values: FieldRecord,
}

impl SheetRow {
    /// Row match key: trimmed, uppercased NAME.
    pub fn key(&self) -> String {
        name_key(&self.values.text(Field::Name))
    }
}

/// Counts from one [`SheetTable::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub updated: usize,
    pub appended: usize,
}

impl MergeSummary {
    pub fn rows_written(&self) -> usize {
        self.updated + self.appended
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub rows: Vec<SheetRow>,
}

fn name_key(name: &str) -> String {
    name.trim().to_uppercase()
}

impl SheetTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.key() == key)
    }

    /// Update rows whose NAME matches a result, append the rest.
    ///
    /// On update, administrative columns are only overwritten when the
    /// result carries a value; extracted columns are always overwritten.
    /// Results without a NAME are skipped. DOB is written in display form.
    pub fn merge(&mut self, results: &[ExtractionResult]) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for result in results {
            let key = name_key(&result.fields.text(Field::Name));
            if key.is_empty() {
                continue;
            }

            let index = match self.position(&key) {
                Some(index) => {
                    summary.updated += 1;
                    index
                }
                None => {
                    let mut values = FieldRecord::new();
                    values.set(Field::Name, key.clone());
                    self.rows.push(SheetRow {
                        serial: FieldValue::Integer(self.rows.len() as i64 + 1),
                        values,
                    });
                    summary.appended += 1;
                    self.rows.len() - 1
                }
            };

            let row = &mut self.rows[index].values;
            for field in Field::ALL {
                if field == Field::Name {
                    continue;
                }
                let value = result.fields.get(field);
                if field.is_administrative() && value.is_empty() {
                    continue;
                }
                let value = match (field, value) {
                    (Field::Dob, FieldValue::Text(dob)) => FieldValue::Text(display_from_iso(dob)),
                    _ => value.clone(),
                };
                row.set(field, value);
            }
        }
        tracing::info!(
            updated = summary.updated,
            appended = summary.appended,
            "Merged results into sheet"
        );
        summary
    }
}
