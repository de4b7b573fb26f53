//! Label-prefixed field extractors.

use regex::Regex;

use crate::models::document::DocumentField;

use super::patterns::*;
use super::{ExtractionMatch, FieldExtractor};

/// Extracts one field by matching its label pattern.
///
/// The first capture group of the pattern holds the value; it is trimmed
/// before being returned.
pub struct LabeledFieldExtractor {
    field: DocumentField,
    pattern: &'static Regex,
}

impl LabeledFieldExtractor {
    /// Extractor for a document field.
    pub fn for_field(field: DocumentField) -> Self {
        let pattern: &'static Regex = match field {
            DocumentField::IdNumber => &*ID_NUMBER,
            DocumentField::FullName => &*FULL_NAME,
            DocumentField::DateOfBirth => &*DATE_OF_BIRTH,
            DocumentField::Sex => &*SEX,
            DocumentField::Nationality => &*NATIONALITY,
            DocumentField::PlaceOfOrigin => &*PLACE_OF_ORIGIN,
            DocumentField::PlaceOfResidence => &*PLACE_OF_RESIDENCE,
            DocumentField::DateOfExpiry => &*DATE_OF_EXPIRY,
        };
        Self { field, pattern }
    }

    pub fn field(&self) -> DocumentField {
        self.field
    }
}

impl FieldExtractor for LabeledFieldExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let value = caps.get(1)?.as_str().trim();
                if value.is_empty() {
                    return None;
                }
                let full_match = caps.get(0)?;
                Some(
                    ExtractionMatch::new(value.to_string(), full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let extractor = LabeledFieldExtractor::for_field(DocumentField::Sex);
        let text = "Sex: Nữ\nSex: Nam";

        let found = extractor.extract(text).unwrap();
        assert_eq!(found.value, "Nữ");
        assert_eq!(found.position, Some((0, 9)));
        assert_eq!(extractor.extract_all(text).len(), 2);
    }

    #[test]
    fn test_value_is_trimmed() {
        let extractor = LabeledFieldExtractor::for_field(DocumentField::Nationality);
        let found = extractor.extract("Nationality:   Việt Nam  \t\r\n").unwrap();
        assert_eq!(found.value, "Việt Nam");
    }

    #[test]
    fn test_no_match() {
        let extractor = LabeledFieldExtractor::for_field(DocumentField::DateOfBirth);
        assert!(extractor.extract("Date of birth: unknown").is_none());
        assert_eq!(extractor.field(), DocumentField::DateOfBirth);
    }
}
