//! Ordered regex cascades over free text.
//!
//! Each field has a list of patterns tried in order; the first one that
//! matches wins and its confidence is recorded. Labels cover English,
//! French and Portuguese forms. `[^\S\n]` is horizontal whitespace so a
//! label never captures the next line's value.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ConfidenceMap, Field, FieldRecord};
use crate::pipeline::vocabulary::Vocabulary;

struct FieldPattern {
    regex: Regex,
    confidence: f32,
}

struct Cascade {
    field: Field,
    patterns: Vec<FieldPattern>,
}

fn pattern(source: &str, confidence: f32) -> FieldPattern {
    FieldPattern {
        regex: Regex::new(source).unwrap(),
        confidence,
    }
}

/// Separator between a label and its value, with an optional "(dd/mm/yyyy)" hint.
const SEP: &str = r"(?:[^\S\n]*\([^)\n]*\))?[^\S\n]*[:\-–]?[^\S\n]*";

/// Up to six name words on one line.
const NAME_WORDS: &str = r"([\p{L}'’\-]+(?:[^\S\n]+[\p{L}'’\-]+){0,5})";

const DOB_LABEL: &str = r"\b(?:date[^\S\n]+of[^\S\n]+birth|birth[^\S\n]*date|d\.?o\.?b\b\.?|date[^\S\n]+de[^\S\n]+naissance|n[ée]e?[^\S\n]+le|data[^\S\n]+de[^\S\n]+nascimento|nascid[oa][^\S\n]+(?:a|em))";

static CASCADES: LazyLock<Vec<Cascade>> = LazyLock::new(|| {
    vec![
        Cascade {
            field: Field::Name,
            patterns: vec![
                pattern(&format!(r"(?im)\bapplicant(?:'s)?[^\S\n]+name\b{SEP}{NAME_WORDS}"), 0.9),
                pattern(
                    &format!(r"(?im)\b(?:full[^\S\n]+name|name[^\S\n]+in[^\S\n]+full)\b{SEP}{NAME_WORDS}"),
                    0.9,
                ),
                pattern(
                    &format!(r"(?im)\b(?:nom[^\S\n]+complet|nom[^\S\n]+et[^\S\n]+pr[ée]noms?|nome[^\S\n]+completo)\b{SEP}{NAME_WORDS}"),
                    0.85,
                ),
                pattern(&format!(r"(?im)^[^\S\n]*(?:name|nom|nome)[^\S\n]*:[^\S\n]*{NAME_WORDS}"), 0.8),
            ],
        },
        Cascade {
            field: Field::Dob,
            patterns: vec![
                pattern(&format!(r"(?i){DOB_LABEL}{SEP}(\d{{1,2}}[-/.]\d{{1,2}}[-/.]\d{{2,4}})"), 0.9),
                pattern(&format!(r"(?i){DOB_LABEL}{SEP}(\d{{4}}[-/.]\d{{1,2}}[-/.]\d{{1,2}})"), 0.9),
                pattern(
                    &format!(r"(?i){DOB_LABEL}{SEP}(\d{{1,2}}(?:st|nd|rd|th|er)?[^\S\n]+(?:(?:de|of)[^\S\n]+)?\p{{L}}{{3,10}}\.?,?[^\S\n]+(?:de[^\S\n]+)?\d{{4}})"),
                    0.9,
                ),
                pattern(
                    &format!(r"(?i){DOB_LABEL}{SEP}(\p{{L}}{{3,10}}\.?[^\S\n]+\d{{1,2}}(?:st|nd|rd|th)?,?[^\S\n]+\d{{4}})"),
                    0.85,
                ),
                pattern(r"\b(\d{1,2}[-/.]\d{1,2}[-/.](?:19|20)\d{2})\b", 0.5),
            ],
        },
        Cascade {
            field: Field::Nationality,
            patterns: vec![
                pattern(
                    &format!(r"(?i)\b(?:nationality|nationalit[ée]|nacionalidade)\b{SEP}(\p{{L}}[\p{{L}} \-]*)"),
                    0.9,
                ),
                pattern(
                    &format!(r"(?i)\b(?:country[^\S\n]+of[^\S\n]+citizenship|citizenship|citoyennet[ée]|cidadania)\b{SEP}(\p{{L}}[\p{{L}} \-]*)"),
                    0.8,
                ),
            ],
        },
        Cascade {
            field: Field::Gender,
            patterns: vec![
                pattern(
                    &format!(r"(?i)\b(?:sex|gender|sexe|sexo|g[ée]nero)\b{SEP}(male|female|masculin[oe]?|f[ée]minin[oe]?|homme|femme|mulher|m|f|h)\b"),
                    0.95,
                ),
                pattern(
                    r"(?i)\b(?:sex|gender|sexe|sexo|g[ée]nero)[^\S\n]*[:\-][^\S\n]*(\p{L}+)",
                    0.6,
                ),
            ],
        },
        Cascade {
            field: Field::ExpStartYear,
            patterns: vec![
                pattern(
                    &format!(r"(?i)\b(?:experience[^\S\n]+start(?:[^\S\n]+year)?|work[^\S\n]+start|started[^\S\n]+work(?:ing)?|d[ée]but[^\S\n]+(?:de[^\S\n]+)?carri[èe]re|in[íi]cio[^\S\n]+(?:de[^\S\n]+|da[^\S\n]+)?carreira)\b{SEP}((?:19|20)\d{{2}})\b"),
                    0.8,
                ),
                pattern(
                    &format!(r"(?i)\b(?:earliest|first)[^\S\n]+employment\b{SEP}((?:19|20)\d{{2}})\b"),
                    0.8,
                ),
                pattern(
                    r"(?i)\b(?:working|employed)[^\S\n]+since[^\S\n]+((?:19|20)\d{2})\b",
                    0.7,
                ),
            ],
        },
        Cascade {
            field: Field::ExperienceYears,
            patterns: vec![
                pattern(
                    &format!(r"(?i)\b(?:years[^\S\n]+of[^\S\n]+(?:professional[^\S\n]+|work[^\S\n]+)?experience|total[^\S\n]+experience|ann[ée]es[^\S\n]+d['’]exp[ée]rience|anos[^\S\n]+de[^\S\n]+experi[êe]ncia)\b{SEP}(\d{{1,2}}(?:[.,]\d)?)"),
                    0.7,
                ),
                pattern(
                    r"(?i)\b(\d{1,2})\+?[^\S\n]+years?[^\S\n]+(?:of[^\S\n]+)?(?:professional[^\S\n]+|work[^\S\n]+|relevant[^\S\n]+)?experience\b",
                    0.6,
                ),
            ],
        },
    ]
});

/// Words that end a captured value when a label follows on the same line
/// ("Name: ADA OBI Sex: F").
static TRAILING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[^\S\n]+(?:sex|gender|sexe|sexo|date|dob|d\.o\.b|born|nationality|nationalit[ée]|nacionalidade|place|age|marital|e-?mail|phone|tel|address|adresse|morada|religion|state|n[ée]e?)\b.*$").unwrap()
});

/// The winning pattern of one cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub field: Field,
    pub value: String,
    pub pattern_index: usize,
    pub confidence: f32,
}

/// Fields covered by a pattern cascade, in cascade order.
pub fn cascade_fields() -> Vec<Field> {
    CASCADES.iter().map(|c| c.field).collect()
}

/// First matching pattern for `field`. When a pattern has several capture
/// groups their non-empty captures are joined with a space.
pub fn first_match(field: Field, text: &str) -> Option<PatternMatch> {
    let cascade = CASCADES.iter().find(|c| c.field == field)?;
    cascade
        .patterns
        .iter()
        .enumerate()
        .find_map(|(pattern_index, p)| {
            let caps = p.regex.captures(text)?;
            let value = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!value.is_empty()).then(|| PatternMatch {
                field,
                value,
                pattern_index,
                confidence: p.confidence,
            })
        })
}

fn cut_trailing_label(value: &str) -> String {
    TRAILING_LABEL
        .replace(value, "")
        .trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .to_string()
}

/// Run every cascade over `text`, filling only fields `existing` leaves empty.
///
/// Returns the merged record and the confidence of each value this call set.
/// Fields that were already filled keep their value and score 0.0 here.
pub fn extract_from_text(
    text: &str,
    existing: &FieldRecord,
    vocab: &Vocabulary,
) -> (FieldRecord, ConfidenceMap) {
    let mut record = existing.clone();
    let mut confidence = ConfidenceMap::new();

    for field in cascade_fields() {
        if record.is_filled(field) {
            continue;
        }
        let Some(found) = first_match(field, text) else {
            continue;
        };
        tracing::debug!(field = %field, pattern = found.pattern_index, "Pattern match");

        match field {
            Field::Name => {
                let name = cut_trailing_label(&found.value);
                if name.is_empty() || vocab.is_noise(&name) {
                    continue;
                }
                let score = if name.split_whitespace().count() >= 2 {
                    found.confidence
                } else {
                    found.confidence.min(0.6)
                };
                record.set(field, name);
                confidence.set(field, score);
            }
            Field::Nationality => {
                let nationality = cut_trailing_label(&found.value);
                if nationality.is_empty() || vocab.is_noise(&nationality) {
                    continue;
                }
                record.set(field, nationality);
                confidence.set(field, found.confidence);
            }
            Field::Gender => {
                let gender = vocab
                    .gender_code(&found.value)
                    .map(str::to_string)
                    .unwrap_or_else(|| found.value.to_uppercase());
                record.set(field, gender);
                confidence.set(field, found.confidence);
            }
            Field::ExpStartYear => {
                if let Ok(year) = found.value.parse::<i64>() {
                    record.set(field, year);
                    confidence.set(field, found.confidence);
                }
            }
            Field::ExperienceYears => {
                if let Ok(years) = found.value.replace(',', ".").parse::<f64>() {
                    record.set(field, years);
                    confidence.set(field, found.confidence);
                }
            }
            _ => {
                record.set(field, found.value);
                confidence.set(field, found.confidence);
            }
        }
    }

    (record, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn value(field: Field, text: &str) -> Option<String> {
        first_match(field, text).map(|m| m.value)
    }

    #[test]
    fn name_patterns_in_order() {
        let m = first_match(Field::Name, "Applicant's Name: Ada Obi\nFull Name: Other Person").unwrap();
        assert_eq!(m.value, "Ada Obi");
        assert_eq!(m.pattern_index, 0);

        let m = first_match(Field::Name, "Nom complet : Kofi Mensah").unwrap();
        assert_eq!(m.value, "Kofi Mensah");
        assert_eq!(m.pattern_index, 2);

        assert_eq!(value(Field::Name, "Name: ADA\nSex: F").as_deref(), Some("ADA"));
    }

    #[test]
    fn dob_labelled_and_unlabelled() {
        assert_eq!(value(Field::Dob, "Date of Birth: 15/03/1990").as_deref(), Some("15/03/1990"));
        assert_eq!(
            value(Field::Dob, "Date of birth (dd/mm/yyyy): 15/03/1990").as_deref(),
            Some("15/03/1990")
        );
        assert_eq!(value(Field::Dob, "D.O.B - 1990-03-15").as_deref(), Some("1990-03-15"));
        assert_eq!(
            value(Field::Dob, "Date de naissance : 1er février 1992").as_deref(),
            Some("1er février 1992")
        );
        assert_eq!(
            value(Field::Dob, "Data de nascimento: 15 de março de 1990").as_deref(),
            Some("15 de março de 1990")
        );
        assert_eq!(value(Field::Dob, "DOB: March 15, 1990").as_deref(), Some("March 15, 1990"));

        let m = first_match(Field::Dob, "Signed on 02/05/2023").unwrap();
        assert_eq!(m.confidence, 0.5);
    }

    #[test]
    fn gender_recognises_codes_and_words() {
        assert_eq!(value(Field::Gender, "Sex: F").as_deref(), Some("F"));
        assert_eq!(value(Field::Gender, "Sexe : Masculin").as_deref(), Some("Masculin"));
        assert_eq!(value(Field::Gender, "Gender - Female").as_deref(), Some("Female"));
        assert_eq!(value(Field::Gender, "Sexual harassment policy"), None);
    }

    #[test]
    fn experience_patterns() {
        assert_eq!(value(Field::ExpStartYear, "Experience start year: 2009").as_deref(), Some("2009"));
        assert_eq!(value(Field::ExperienceYears, "Years of experience: 12").as_deref(), Some("12"));
        assert_eq!(
            value(Field::ExperienceYears, "Over 8 years of relevant experience in logistics").as_deref(),
            Some("8")
        );
    }

    #[test]
    fn extract_fills_only_empty_fields() {
        let text = "Full Name: Ada Obi Sex: Female\nNationality: Nigerian Date of Birth: 15/03/1990\nYears of experience: 7,5";
        let mut existing = FieldRecord::new();
        existing.set(Field::Gender, "F");

        let (record, confidence) = extract_from_text(text, &existing, &Vocabulary::default());
        assert_eq!(record.text(Field::Name), "Ada Obi");
        assert_eq!(confidence.get(Field::Name), 0.9);
        assert_eq!(record.text(Field::Gender), "F");
        assert_eq!(confidence.get(Field::Gender), 0.0);
        assert_eq!(record.text(Field::Nationality), "Nigerian");
        assert_eq!(record.text(Field::Dob), "15/03/1990");
        assert_eq!(confidence.get(Field::Dob), 0.9);
        assert_eq!(*record.get(Field::ExperienceYears), FieldValue::Decimal(7.5));
    }

    #[test]
    fn single_word_name_has_low_confidence() {
        let (record, confidence) =
            extract_from_text("Name: Ada", &FieldRecord::new(), &Vocabulary::default());
        assert_eq!(record.text(Field::Name), "Ada");
        assert_eq!(confidence.get(Field::Name), 0.6);
    }

    #[test]
    fn gender_is_canonicalised() {
        let (record, confidence) =
            extract_from_text("Sexo: Feminino", &FieldRecord::new(), &Vocabulary::default());
        assert_eq!(record.text(Field::Gender), "F");
        assert_eq!(confidence.get(Field::Gender), 0.95);

        let (record, _) = extract_from_text("Gender: other", &FieldRecord::new(), &Vocabulary::default());
        assert_eq!(record.text(Field::Gender), "OTHER");
    }

    #[test]
    fn noise_values_are_not_taken() {
        let (record, _) =
            extract_from_text("Nationality: None", &FieldRecord::new(), &Vocabulary::default());
        assert!(!record.is_filled(Field::Nationality));
    }
}
