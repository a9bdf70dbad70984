//! Hand-tuned keyword lists shared by every pipeline stage.
//!
//! All lists are data: the defaults cover English, French and Portuguese
//! forms, and a JSON file can replace any of them (`#[serde(default)]` keeps
//! the built-in value for lists the file omits).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid vocabulary file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Header keywords that move the section parser into each state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionHeaders {
    pub personal: Vec<String>,
    pub education: Vec<String>,
    pub qualification: Vec<String>,
    pub experience: Vec<String>,
    /// Sections whose rows are skipped (languages, references, ...).
    pub ignored: Vec<String>,
}

/// Row labels inside the personal-information section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalLabels {
    pub full_name: Vec<String>,
    pub first_name: Vec<String>,
    pub other_names: Vec<String>,
    pub family_name: Vec<String>,
    pub gender: Vec<String>,
    pub nationality: Vec<String>,
    pub date_of_birth: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenderValues {
    pub male: Vec<String>,
    pub female: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthName {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Substrings that mark a file name as the application form.
    pub form_keywords: Vec<String>,
    pub section_headers: SectionHeaders,
    /// Column titles that repeat inside table sections and are never data.
    pub column_headers: Vec<String>,
    pub personal_labels: PersonalLabels,
    pub gender_values: GenderValues,
    pub months: Vec<MonthName>,
    /// Words dropped from date strings ("monday", "lundi", ...).
    pub weekdays: Vec<String>,
    /// End-date words meaning "still employed".
    pub present_keywords: Vec<String>,
    pub degree_keywords: Vec<String>,
    /// Values that are placeholders or stray labels, never real data.
    pub noise: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SectionHeaders {
    fn default() -> Self {
        Self {
            personal: strings(&[
                "personal information",
                "personal details",
                "personal data",
                "personal particulars",
                "bio data",
                "biodata",
                "informations personnelles",
                "renseignements personnels",
                "état civil",
                "informações pessoais",
                "dados pessoais",
            ]),
            education: strings(&[
                "educational background",
                "educational qualifications",
                "academic qualifications",
                "academic background",
                "education",
                "formation académique",
                "formation",
                "études",
                "éducation",
                "formação académica",
                "formação acadêmica",
                "habilitações literárias",
                "educação",
            ]),
            qualification: strings(&[
                "professional qualifications",
                "professional certifications",
                "certifications",
                "certificates",
                "other qualifications",
                "qualifications professionnelles",
                "certificats",
                "qualificações profissionais",
                "certificados",
            ]),
            experience: strings(&[
                "work experience",
                "professional experience",
                "employment history",
                "employment record",
                "experience",
                "expérience professionnelle",
                "expérience",
                "experiência profissional",
                "experiência",
            ]),
            ignored: strings(&[
                "languages",
                "language proficiency",
                "references",
                "referees",
                "declaration",
                "signature",
                "hobbies",
                "langues",
                "références",
                "déclaration",
                "línguas",
                "idiomas",
                "referências",
                "declaração",
                "assinatura",
            ]),
        }
    }
}

impl Default for PersonalLabels {
    fn default() -> Self {
        Self {
            full_name: strings(&[
                "full name",
                "name in full",
                "name",
                "nom complet",
                "nom et prénoms",
                "nome completo",
                "nome",
            ]),
            first_name: strings(&[
                "first name",
                "given name",
                "forename",
                "prénom",
                "prenom",
                "primeiro nome",
                "nome próprio",
            ]),
            other_names: strings(&[
                "other name",
                "middle name",
                "autres prénoms",
                "autre prénom",
                "outros nomes",
                "nomes do meio",
            ]),
            family_name: strings(&[
                "surname",
                "family name",
                "last name",
                "nom de famille",
                "nom",
                "apelido",
                "sobrenome",
            ]),
            gender: strings(&["gender", "sex", "sexe", "sexo", "género", "gênero"]),
            nationality: strings(&[
                "nationality",
                "citizenship",
                "nationalité",
                "nacionalidade",
            ]),
            date_of_birth: strings(&[
                "date of birth",
                "birth date",
                "dob",
                "d.o.b",
                "date de naissance",
                "data de nascimento",
            ]),
        }
    }
}

impl Default for GenderValues {
    fn default() -> Self {
        Self {
            male: strings(&["m", "male", "man", "h", "homme", "masculin", "masculino"]),
            female: strings(&[
                "f", "female", "woman", "femme", "féminin", "feminin", "feminino", "mulher",
            ]),
        }
    }
}

fn default_months() -> Vec<MonthName> {
    let table: &[(&str, u32)] = &[
        // English
        ("january", 1),
        ("jan", 1),
        ("february", 2),
        ("feb", 2),
        ("march", 3),
        ("mar", 3),
        ("april", 4),
        ("apr", 4),
        ("may", 5),
        ("june", 6),
        ("jun", 6),
        ("july", 7),
        ("jul", 7),
        ("august", 8),
        ("aug", 8),
        ("september", 9),
        ("sept", 9),
        ("sep", 9),
        ("october", 10),
        ("oct", 10),
        ("november", 11),
        ("nov", 11),
        ("december", 12),
        ("dec", 12),
        // French
        ("janvier", 1),
        ("janv", 1),
        ("février", 2),
        ("fevrier", 2),
        ("févr", 2),
        ("fevr", 2),
        ("mars", 3),
        ("avril", 4),
        ("avr", 4),
        ("mai", 5),
        ("juin", 6),
        ("juillet", 7),
        ("juil", 7),
        ("août", 8),
        ("aout", 8),
        ("septembre", 9),
        ("octobre", 10),
        ("novembre", 11),
        ("décembre", 12),
        ("decembre", 12),
        ("déc", 12),
        // Portuguese
        ("janeiro", 1),
        ("fevereiro", 2),
        ("fev", 2),
        ("março", 3),
        ("marco", 3),
        ("abril", 4),
        ("abr", 4),
        ("maio", 5),
        ("junho", 6),
        ("julho", 7),
        ("agosto", 8),
        ("ago", 8),
        ("setembro", 9),
        ("set", 9),
        ("outubro", 10),
        ("out", 10),
        ("novembro", 11),
        ("dezembro", 12),
        ("dez", 12),
    ];
    table
        .iter()
        .map(|(name, number)| MonthName {
            name: name.to_string(),
            number: *number,
        })
        .collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            form_keywords: strings(&["application form", "application", "form", "applicant form"]),
            section_headers: SectionHeaders::default(),
            column_headers: strings(&[
                "s/n",
                "no",
                "level",
                "qualification",
                "qualification obtained",
                "degree",
                "year",
                "year obtained",
                "field of study",
                "course",
                "institution",
                "school",
                "awarding body",
                "title",
                "from",
                "to",
                "start",
                "end",
                "employer",
                "position",
                "niveau",
                "diplôme",
                "année",
                "domaine",
                "établissement",
                "titre",
                "de",
                "à",
                "début",
                "fin",
                "nível",
                "grau",
                "ano",
                "área",
                "instituição",
                "título",
                "início",
                "fim",
            ]),
            personal_labels: PersonalLabels::default(),
            gender_values: GenderValues::default(),
            months: default_months(),
            weekdays: strings(&[
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
                "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
                "segunda", "terça", "quarta", "quinta", "sexta", "sábado", "domingo",
            ]),
            present_keywords: strings(&[
                "present",
                "current",
                "currently",
                "to date",
                "till date",
                "date",
                "now",
                "ongoing",
                "à ce jour",
                "aujourd'hui",
                "présent",
                "actuel",
                "en cours",
                "atual",
                "actual",
                "presente",
                "até hoje",
                "até à data",
                "hoje",
            ]),
            degree_keywords: strings(&[
                "PhD",
                "Doctorate",
                "Master",
                "Masters",
                "MBA",
                "MSc",
                "MA",
                "Bachelor",
                "B.sc",
                "BSc",
                "B.A",
                "BA",
                "Degree",
                "Diploma",
                "HND",
                "OND",
                "SSCE",
                "WAEC",
                "WEAC",
                "School Certificate",
                "Certificate",
                "Licence",
                "Maîtrise",
                "Doctorat",
                "Baccalauréat",
                "Licenciatura",
                "Mestrado",
                "Doutoramento",
                "Bacharelato",
            ]),
            noise: strings(&[
                "n/a", "na", "nil", "none", "null", "-", "--", "---", ".", "s/n", "no", "#", "n°",
                "nº", "name", "surname", "gender", "sex", "nationality", "date of birth", "dob",
                "personal information", "education", "experience", "nom", "nome", "sexe",
                "sexo", "nationalité", "nacionalidade", "néant", "nenhum",
            ]),
        }
    }
}

impl Vocabulary {
    /// Load a vocabulary override file. Lists missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, VocabularyError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Month number for a lowercase month name or abbreviation.
    pub fn month_number(&self, token: &str) -> Option<u32> {
        let token = token.trim_end_matches('.');
        self.months
            .iter()
            .find(|m| m.name == token)
            .map(|m| m.number)
    }

    pub fn is_weekday(&self, token: &str) -> bool {
        self.weekdays.iter().any(|w| w == token)
    }

    /// Canonical "M"/"F" for a recognised gender value.
    pub fn gender_code(&self, value: &str) -> Option<&'static str> {
        let v = normalize_label(value);
        if self.gender_values.male.iter().any(|m| *m == v) {
            Some("M")
        } else if self.gender_values.female.iter().any(|f| *f == v) {
            Some("F")
        } else {
            None
        }
    }

    pub fn is_noise(&self, value: &str) -> bool {
        let v = normalize_label(value);
        self.noise.iter().any(|n| *n == v)
    }

    pub fn is_column_header(&self, value: &str) -> bool {
        let v = normalize_label(value);
        self.column_headers.iter().any(|h| *h == v)
    }

    pub fn is_present_keyword(&self, value: &str) -> bool {
        let v = normalize_label(value);
        self.present_keywords.iter().any(|p| *p == v)
    }
}

/// Lowercase, collapse whitespace and strip decoration (`:`, `*`, trailing dots).
pub fn normalize_label(raw: &str) -> String {
    let collapsed = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_matches(|c: char| matches!(c, ':' | '*' | '.' | ' '))
        .to_string()
}
