use crate::models::{Field, FieldRecord};
use crate::pipeline::vocabulary::Vocabulary;

/// Empty every extracted text field whose value is a placeholder or a stray
/// label ("N/A", "Nationality", "-"). Returns the fields that were cleared.
pub fn clear_noise(record: &mut FieldRecord, vocab: &Vocabulary) -> Vec<Field> {
    let noisy: Vec<Field> = record
        .iter()
        .filter(|(field, _)| !field.is_administrative())
        .filter_map(|(field, value)| value.as_text().map(|text| (field, text)))
        .filter(|(_, text)| !text.trim().is_empty() && vocab.is_noise(text))
        .map(|(field, _)| field)
        .collect();
    for field in &noisy {
        tracing::debug!(field = %field, "Cleared placeholder value");
        record.clear(*field);
    }
    noisy
}
