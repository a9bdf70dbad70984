use crate::models::{Field, FieldRecord};
use crate::pipeline::processor::ProcessingError;

/// One review note per required field left empty, in column order.
pub fn missing_field_issues(record: &FieldRecord) -> Vec<String> {
    Field::REQUIRED
        .into_iter()
        .filter(|field| !record.is_filled(*field))
        .map(|field| ProcessingError::FieldMissing(field).to_string())
        .collect()
}
