//! Core library for ID card eKYC onboarding.
//!
//! This crate provides:
//! - CCCD (Vietnamese citizen ID) field extraction from recognized text
//! - A capture pipeline driving camera, OCR, extraction, and validation
//! - OCR backed by `pure-onnx-ocr` (feature `native`)
//! - Face comparison result models

pub mod capture;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;

pub use capture::{
    AttemptOutcome, CameraService, CaptureOutcome, CapturePipeline, CaptureResult, CaptureState,
    FlowOutcome, Navigator, PermissionChecker, RetryChoice, ScreenGuard, StaticPermission,
};
pub use error::{CaptureError, EkycError, ExtractionError, OcrError, Result};
pub use extraction::{CccdExtractor, DocumentExtractor, FieldExtractor};
pub use models::config::EkycConfig;
pub use models::document::{
    DocumentField, DocumentRecord, ImageHandle, Locale, PartialDocumentRecord,
};
pub use models::face::{FaceComparisonResult, FaceVerdict, SimilarityLevel};
pub use ocr::{RecognizedText, TextLine, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
