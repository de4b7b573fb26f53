//! Error types for the ekyc-core library.

use thiserror::Error;

/// Main error type for the ekyc library.
#[derive(Error, Debug)]
pub enum EkycError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Capture pipeline error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Record promotion or extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a text recognizer.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The image could not be read or decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The image was processed but contained no text.
    #[error("no text recognized")]
    NoText,
}

/// Errors that escape the capture pipeline.
///
/// Recognition and extraction problems are not errors; they come back as
/// typed outcomes. Only misuse of the pipeline and camera faults land here.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// A capture attempt is already in flight.
    #[error("capture already in progress (state: {0})")]
    Busy(String),

    /// The camera service failed for a reason other than user cancellation.
    #[error("camera failure: {0}")]
    Camera(String),
}

/// Errors related to document record promotion.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    /// One or more required fields are empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Result type for the ekyc library.
pub type Result<T> = std::result::Result<T, EkycError>;
