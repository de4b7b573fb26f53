//! Extractor for Vietnamese citizen ID cards (CCCD).

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::document::{DocumentField, Locale, PartialDocumentRecord};

use super::{DocumentExtractor, FieldExtractor, LabeledFieldExtractor};

/// Rule-based CCCD extractor.
#[derive(Debug, Clone, Default)]
pub struct CccdExtractor {
    /// Language of the labels returned by `validate`.
    locale: Locale,
    /// Whether to look for the (never required) expiry date.
    extract_expiry: bool,
}

impl CccdExtractor {
    /// Create a new extractor with Vietnamese labels.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            locale: config.locale,
            extract_expiry: config.extract_expiry,
        }
    }

    /// Set the label language.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set expiry date extraction.
    pub fn with_expiry(mut self, extract: bool) -> Self {
        self.extract_expiry = extract;
        self
    }

    fn field_value(text: &str, field: DocumentField) -> String {
        LabeledFieldExtractor::for_field(field)
            .extract(text)
            .map(|m| m.value)
            .unwrap_or_default()
    }
}

impl DocumentExtractor for CccdExtractor {
    fn extract_fields(&self, text: &str) -> PartialDocumentRecord {
        let record = PartialDocumentRecord {
            id_number: Self::field_value(text, DocumentField::IdNumber),
            full_name: Self::field_value(text, DocumentField::FullName),
            date_of_birth: Self::field_value(text, DocumentField::DateOfBirth),
            sex: Self::field_value(text, DocumentField::Sex),
            nationality: Self::field_value(text, DocumentField::Nationality),
            place_of_origin: Self::field_value(text, DocumentField::PlaceOfOrigin),
            place_of_residence: Self::field_value(text, DocumentField::PlaceOfResidence),
            date_of_expiry: if self.extract_expiry {
                LabeledFieldExtractor::for_field(DocumentField::DateOfExpiry)
                    .extract(text)
                    .map(|m| m.value)
            } else {
                None
            },
        };

        debug!(
            "Extracted {}/{} required fields",
            DocumentField::REQUIRED.len() - record.missing_fields().len(),
            DocumentField::REQUIRED.len()
        );

        record
    }

    fn validate(&self, record: &PartialDocumentRecord) -> Vec<String> {
        record
            .missing_fields()
            .into_iter()
            .map(|f| f.label(self.locale).to_string())
            .collect()
    }

    fn locale(&self) -> Locale {
        self.locale
    }
}
