//! ID card field extraction.

mod cccd;
mod fields;
pub mod patterns;

pub use cccd::CccdExtractor;
pub use fields::LabeledFieldExtractor;

use crate::models::document::{Locale, PartialDocumentRecord};

/// Trait for document extractors.
pub trait DocumentExtractor {
    /// Extract every required field from recognized text.
    ///
    /// Never fails: fields that cannot be found are empty strings.
    fn extract_fields(&self, text: &str) -> PartialDocumentRecord;

    /// Labels of the empty required fields, in canonical order.
    ///
    /// An empty result means the record is complete.
    fn validate(&self, record: &PartialDocumentRecord) -> Vec<String>;

    /// Language of the labels `validate` returns.
    fn locale(&self) -> Locale;
}

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched field value with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span of the match in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched, label included.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
