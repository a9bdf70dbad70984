use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AdminDefaults;

// ═══════════════════════════════════════════
// Output columns
// ═══════════════════════════════════════════

/// The closed set of output columns. Declaration order is column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "NAME")]
    Name,
    #[serde(rename = "POSITION CODE")]
    PositionCode,
    #[serde(rename = "GENDER")]
    Gender,
    #[serde(rename = "INT/EXT")]
    IntExt,
    #[serde(rename = "DOB")]
    Dob,
    #[serde(rename = "AGE")]
    Age,
    #[serde(rename = "NATIONALITY")]
    Nationality,
    #[serde(rename = "EXP START (YEAR)")]
    ExpStartYear,
    #[serde(rename = "EXPERIENCE(Years)")]
    ExperienceYears,
    #[serde(rename = "QUALIFICATIONS")]
    Qualifications,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::PositionCode,
        Field::Gender,
        Field::IntExt,
        Field::Dob,
        Field::Age,
        Field::Nationality,
        Field::ExpStartYear,
        Field::ExperienceYears,
        Field::Qualifications,
    ];

    /// Fields reported as issues when they end up empty.
    pub const REQUIRED: [Field; 6] = [
        Field::Gender,
        Field::Dob,
        Field::Nationality,
        Field::ExpStartYear,
        Field::ExperienceYears,
        Field::Qualifications,
    ];

    /// Column header text.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "NAME",
            Field::PositionCode => "POSITION CODE",
            Field::Gender => "GENDER",
            Field::IntExt => "INT/EXT",
            Field::Dob => "DOB",
            Field::Age => "AGE",
            Field::Nationality => "NATIONALITY",
            Field::ExpStartYear => "EXP START (YEAR)",
            Field::ExperienceYears => "EXPERIENCE(Years)",
            Field::Qualifications => "QUALIFICATIONS",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        let wanted = label.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(wanted))
    }

    /// Constant-valued columns filled from configuration, never extracted.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Field::PositionCode | Field::IntExt)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════
// Values
// ═══════════════════════════════════════════

/// A single cell value. Empty text means "not extracted".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl FieldValue {
    pub const EMPTY: FieldValue = FieldValue::Text(String::new());

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::EMPTY
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Decimal(d) => write!(f, "{d:.1}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(d: f64) -> Self {
        FieldValue::Decimal(d)
    }
}

static EMPTY_VALUE: FieldValue = FieldValue::EMPTY;

// ═══════════════════════════════════════════
// Record
// ═══════════════════════════════════════════

/// One value per [`Field`]. Every column is always present; "missing" is an
/// empty value, never an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Field, FieldValue>", into = "BTreeMap<Field, FieldValue>")]
pub struct FieldRecord {
    values: BTreeMap<Field, FieldValue>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self {
            values: Field::ALL
                .into_iter()
                .map(|f| (f, FieldValue::EMPTY))
                .collect(),
        }
    }

    /// Empty record with the administrative columns filled in.
    pub fn with_admin(admin: &AdminDefaults) -> Self {
        let mut record = Self::new();
        record.set(Field::PositionCode, admin.position_code.as_str());
        record.set(Field::IntExt, admin.int_ext.as_str());
        record
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        self.values.get(&field).unwrap_or(&EMPTY_VALUE)
    }

    /// Text form of a value (empty string when missing).
    pub fn text(&self, field: Field) -> String {
        self.get(field).to_string()
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.values.insert(field, FieldValue::EMPTY);
    }

    pub fn is_filled(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }
}

impl Default for FieldRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<Field, FieldValue>> for FieldRecord {
    fn from(mut values: BTreeMap<Field, FieldValue>) -> Self {
        for field in Field::ALL {
            values.entry(field).or_insert(FieldValue::EMPTY);
        }
        Self { values }
    }
}

impl From<FieldRecord> for BTreeMap<Field, FieldValue> {
    fn from(record: FieldRecord) -> Self {
        record.values
    }
}

// ═══════════════════════════════════════════
// Confidence
// ═══════════════════════════════════════════

/// Per-field confidence in [0, 1]. Administrative fields are always 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Field, f32>", into = "BTreeMap<Field, f32>")]
pub struct ConfidenceMap {
    scores: BTreeMap<Field, f32>,
}

impl ConfidenceMap {
    pub fn new() -> Self {
        Self {
            scores: Field::ALL
                .into_iter()
                .map(|f| (f, if f.is_administrative() { 1.0 } else { 0.0 }))
                .collect(),
        }
    }

    pub fn get(&self, field: Field) -> f32 {
        self.scores.get(&field).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, field: Field, score: f32) {
        if field.is_administrative() {
            return;
        }
        self.scores.insert(field, score.clamp(0.0, 1.0));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, f32)> + '_ {
        self.scores.iter().map(|(f, s)| (*f, *s))
    }
}

impl Default for ConfidenceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<Field, f32>> for ConfidenceMap {
    fn from(scores: BTreeMap<Field, f32>) -> Self {
        let mut map = Self::new();
        for (field, score) in scores {
            map.set(field, score);
        }
        map
    }
}

impl From<ConfidenceMap> for BTreeMap<Field, f32> {
    fn from(map: ConfidenceMap) -> Self {
        map.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_every_field_empty() {
        let record = FieldRecord::new();
        assert_eq!(record.iter().count(), Field::ALL.len());
        assert!(record.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn admin_fields_prefilled() {
        let admin = AdminDefaults {
            position_code: "ECW-042".into(),
            int_ext: "INT".into(),
        };
        let record = FieldRecord::with_admin(&admin);
        assert_eq!(record.text(Field::PositionCode), "ECW-042");
        assert_eq!(record.text(Field::IntExt), "INT");
        assert!(!record.is_filled(Field::Name));
    }

    #[test]
    fn record_serializes_with_column_labels() {
        let mut record = FieldRecord::new();
        record.set(Field::Age, 34);
        record.set(Field::ExperienceYears, 5.5);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["AGE"], 34);
        assert_eq!(json["EXPERIENCE(Years)"], 5.5);
        assert_eq!(json["EXP START (YEAR)"], "");
    }

    #[test]
    fn deserialize_fills_missing_columns() {
        let record: FieldRecord = serde_json::from_str(r#"{"NAME": "ADA OBI", "AGE": 41}"#).unwrap();
        assert_eq!(record.text(Field::Name), "ADA OBI");
        assert_eq!(record.get(Field::Age), &FieldValue::Integer(41));
        assert_eq!(record.iter().count(), Field::ALL.len());
    }

    #[test]
    fn decimal_displays_one_place() {
        assert_eq!(FieldValue::Decimal(7.24).to_string(), "7.2");
        assert_eq!(FieldValue::Integer(1999).to_string(), "1999");
    }

    #[test]
    fn label_lookup_is_case_insensitive() {
        assert_eq!(Field::from_label("experience(years)"), Some(Field::ExperienceYears));
        assert_eq!(Field::from_label(" DOB "), Some(Field::Dob));
        assert_eq!(Field::from_label("S/N"), None);
    }

    #[test]
    fn confidence_admin_fields_stay_certain() {
        let mut map = ConfidenceMap::new();
        map.set(Field::PositionCode, 0.2);
        map.set(Field::Dob, 1.7);
        assert_eq!(map.get(Field::PositionCode), 1.0);
        assert_eq!(map.get(Field::Dob), 1.0);
        assert_eq!(map.get(Field::Gender), 0.0);
    }
}
