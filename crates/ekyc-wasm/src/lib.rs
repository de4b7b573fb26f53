//! WASM bindings for ID card eKYC.
//!
//! Exposes the text half of the pipeline (extraction, validation, outcome
//! building) to browsers and React Native hosts that run OCR themselves.

use wasm_bindgen::prelude::*;

use ekyc_core::{
    CaptureOutcome, CccdExtractor, DocumentExtractor, DocumentField, DocumentRecord, FaceVerdict,
    ImageHandle, Locale, PartialDocumentRecord, RecognizedText, SimilarityLevel, TextLine,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_locale(locale: &str) -> Result<Locale, JsValue> {
    Locale::from_str(locale).ok_or_else(|| JsValue::from_str(&format!("unsupported locale: {}", locale)))
}

/// Serialize to plain JS objects (not `Map`s), flattened records included.
fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build the outcome for recognized text captured from `image_uri`.
fn outcome_for(extractor: &CccdExtractor, text: &str, image_uri: &str) -> CaptureOutcome {
    let fields = extractor.extract_fields(text);
    let missing_labels = extractor.validate(&fields);
    if !missing_labels.is_empty() {
        return CaptureOutcome::Incomplete { missing_labels };
    }
    match DocumentRecord::from_partial(fields, ImageHandle::new(image_uri), extractor.locale()) {
        Ok(record) => CaptureOutcome::Complete { record },
        Err(ekyc_core::ExtractionError::MissingFields(missing_labels)) => {
            CaptureOutcome::Incomplete { missing_labels }
        }
    }
}

/// Extract ID card fields from recognized text.
///
/// Every required key is present; unreadable fields are empty strings.
#[wasm_bindgen]
pub fn extract_fields(text: &str) -> Result<JsValue, JsValue> {
    to_js(&CccdExtractor::new().extract_fields(text))
}

/// Labels of the empty required fields of a record, in canonical order.
#[wasm_bindgen]
pub fn validate(record: JsValue, locale: &str) -> Result<JsValue, JsValue> {
    let record: PartialDocumentRecord = serde_wasm_bindgen::from_value(record)?;
    let extractor = CccdExtractor::new().with_locale(parse_locale(locale)?);
    to_js(&extractor.validate(&record))
}

/// Run extraction and validation, returning a tagged outcome
/// (`status` is `complete` or `incomplete`).
#[wasm_bindgen]
pub fn process_text(text: &str, image_uri: &str, locale: &str) -> Result<JsValue, JsValue> {
    let extractor = CccdExtractor::new().with_locale(parse_locale(locale)?);
    to_js(&outcome_for(&extractor, text, image_uri))
}

/// Labels of all required fields, in canonical order.
#[wasm_bindgen]
pub fn required_labels(locale: &str) -> Result<JsValue, JsValue> {
    let locale = parse_locale(locale)?;
    let labels: Vec<&str> = DocumentField::REQUIRED
        .iter()
        .map(|f| f.label(locale))
        .collect();
    to_js(&labels)
}

/// Verdict for a face comparison similarity level (`high`, `medium`, ...).
#[wasm_bindgen]
pub fn face_verdict(level: &str) -> Result<JsValue, JsValue> {
    to_js(&FaceVerdict::for_level(SimilarityLevel::from_str(level)))
}

/// Document scanner class for host apps.
#[wasm_bindgen]
pub struct DocumentScanner {
    extractor: CccdExtractor,
}

#[wasm_bindgen]
impl DocumentScanner {
    /// Create a scanner with Vietnamese labels.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            extractor: CccdExtractor::new(),
        }
    }

    /// Set the label language.
    #[wasm_bindgen]
    pub fn set_locale(&mut self, locale: &str) -> Result<(), JsValue> {
        self.extractor = self.extractor.clone().with_locale(parse_locale(locale)?);
        Ok(())
    }

    /// Configure expiry date extraction.
    #[wasm_bindgen]
    pub fn set_extract_expiry(&mut self, extract: bool) {
        self.extractor = self.extractor.clone().with_expiry(extract);
    }

    /// Extract fields from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.extractor.extract_fields(text))
    }

    /// Extract, validate, and build the capture outcome.
    #[wasm_bindgen]
    pub fn process(&self, text: &str, image_uri: &str) -> Result<JsValue, JsValue> {
        to_js(&outcome_for(&self.extractor, text, image_uri))
    }
}

impl Default for DocumentScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Text lines recognized by host-side OCR.
#[wasm_bindgen]
pub struct RecognizedTextJs {
    lines: Vec<TextLine>,
}

#[wasm_bindgen]
impl RecognizedTextJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add a recognized line with its quadrilateral bounding box.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_line(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.lines.push(TextLine {
            text: text.to_string(),
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            confidence,
        });
    }

    /// Full text with lines in reading order.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        RecognizedText::from_lines(self.lines.clone(), 0).text
    }

    /// Process the recognized lines into a capture outcome.
    #[wasm_bindgen]
    pub fn process(&self, image_uri: &str, locale: &str) -> Result<JsValue, JsValue> {
        process_text(&self.get_text(), image_uri, locale)
    }
}

impl Default for RecognizedTextJs {
    fn default() -> Self {
        Self::new()
    }
}
