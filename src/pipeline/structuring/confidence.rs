use crate::models::{ConfidenceMap, Field, FieldRecord};

/// Confidence thresholds for extracted fields
pub mod field_thresholds {
    /// Below this: value should be checked by hand
    pub const LOW: f32 = 0.60;

    /// Below this: value is plausible but unconfirmed
    pub const MEDIUM: f32 = 0.80;

    /// Above this: labelled value read cleanly
    pub const HIGH: f32 = 0.90;
}

/// Value read from a labelled personal-information table cell.
pub const TABLE_FIELD: f32 = 0.95;

/// Experience computed from employment table rows.
pub const TABLE_EXPERIENCE: f32 = 0.85;

/// Aggregated qualifications, from table rows or text lines.
pub const QUALIFICATIONS: f32 = 0.80;

/// Experience years derived from a start year alone.
pub const DERIVED_EXPERIENCE: f32 = 0.80;

/// Ceiling for a date of birth that could not be normalized.
pub const UNPARSED_DATE_CAP: f32 = 0.50;

/// Filled, extracted fields scoring below [`field_thresholds::LOW`].
pub fn low_confidence_fields(record: &FieldRecord, confidence: &ConfidenceMap) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|f| !f.is_administrative() && record.is_filled(*f))
        .filter(|f| confidence.get(*f) < field_thresholds::LOW)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_ordered() {
        assert!(field_thresholds::LOW < field_thresholds::MEDIUM);
        assert!(field_thresholds::MEDIUM < field_thresholds::HIGH);
        assert!(UNPARSED_DATE_CAP < field_thresholds::LOW);
    }

    #[test]
    fn only_filled_fields_are_flagged() {
        let mut record = FieldRecord::new();
        let mut confidence = ConfidenceMap::new();
        record.set(Field::Dob, "sometime in 1990");
        confidence.set(Field::Dob, UNPARSED_DATE_CAP);
        record.set(Field::Gender, "F");
        confidence.set(Field::Gender, TABLE_FIELD);

        assert_eq!(low_confidence_fields(&record, &confidence), vec![Field::Dob]);
    }
}
