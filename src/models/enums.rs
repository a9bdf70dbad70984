use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ExtractionStatus {
    Success => "success",
    NoForm => "no_form",
    Unsupported => "unsupported",
    Failed => "failed",
    Error => "error",
});

str_enum!(BatchStatus {
    Complete => "complete",
    Error => "error",
});

str_enum!(DocumentKind {
    Pdf => "pdf",
    Docx => "docx",
    LegacyDoc => "doc",
    Image => "image",
});

impl ExtractionStatus {
    /// Results with this status are written to the persistent cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Success | Self::NoForm)
    }
}

impl DocumentKind {
    /// Route a file by its extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::LegacyDoc),
            "jpg" | "jpeg" | "png" | "tiff" | "tif" | "bmp" => Some(Self::Image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn extraction_status_round_trips_through_str() {
        for status in [
            ExtractionStatus::Success,
            ExtractionStatus::NoForm,
            ExtractionStatus::Unsupported,
            ExtractionStatus::Failed,
            ExtractionStatus::Error,
        ] {
            assert_eq!(ExtractionStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = ExtractionStatus::from_str("done").unwrap_err();
        assert_eq!(err.field, "ExtractionStatus");
        assert_eq!(err.value, "done");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ExtractionStatus::NoForm).unwrap();
        assert_eq!(json, "\"no_form\"");
    }

    #[test]
    fn only_success_and_no_form_are_cached() {
        assert!(ExtractionStatus::Success.is_cacheable());
        assert!(ExtractionStatus::NoForm.is_cacheable());
        assert!(!ExtractionStatus::Error.is_cacheable());
        assert!(!ExtractionStatus::Failed.is_cacheable());
        assert!(!ExtractionStatus::Unsupported.is_cacheable());
    }

    #[test]
    fn document_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_extension("doc"), Some(DocumentKind::LegacyDoc));
        assert_eq!(DocumentKind::from_extension("JPEG"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_extension("txt"), None);
    }

    #[test]
    fn every_selectable_extension_can_be_decoded() {
        for ext in crate::config::SUPPORTED_EXTENSIONS {
            assert!(DocumentKind::from_extension(ext).is_some(), "{ext} has no decoder route");
        }
    }
}
