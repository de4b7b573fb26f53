//! Document capture pipeline: permission, camera, OCR, extraction, validation.

mod pipeline;

pub use pipeline::{CapturePipeline, ScreenGuard};

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CaptureError;
use crate::models::document::{DocumentRecord, ImageHandle, Locale};

/// Result of asking the camera for a shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Captured(ImageHandle),
    /// The user backed out. Not an error.
    Cancelled,
}

/// Takes a photo of the document.
#[async_trait(?Send)]
pub trait CameraService {
    /// Suspends until the user confirms a shot or cancels.
    async fn capture(&self) -> Result<CaptureResult, CaptureError>;
}

/// Answers whether the camera may be used.
#[async_trait(?Send)]
pub trait PermissionChecker {
    async fn has_camera_permission(&self) -> bool;
}

/// Fixed permission answer, for hosts without a runtime permission model.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub bool);

#[async_trait(?Send)]
impl PermissionChecker for StaticPermission {
    async fn has_camera_permission(&self) -> bool {
        self.0
    }
}

/// What the user chose after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryChoice {
    Recapture,
    Cancel,
}

/// Screen transitions driven by the pipeline.
#[async_trait(?Send)]
pub trait Navigator {
    /// Hand a complete record to the confirmation screen.
    async fn confirm(&self, record: DocumentRecord);

    /// Show a failed outcome and ask whether to recapture.
    async fn offer_retry(&self, outcome: &CaptureOutcome) -> RetryChoice;

    /// Tell the user camera permission is missing, offering system settings.
    async fn permission_required(&self, message: &str);
}

/// Phase of a capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    Capturing,
    Recognizing,
    Extracting,
    Validating,
    Complete,
    Incomplete,
    RecognitionFailed,
}

impl CaptureState {
    /// Whether a new attempt may start from this state.
    pub fn accepts_capture(self) -> bool {
        matches!(self, Self::Idle | Self::Complete)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Recognizing => "recognizing",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::RecognitionFailed => "recognition_failed",
        };
        f.write_str(name)
    }
}

/// Outcome of processing one captured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// Every required field was found.
    Complete { record: DocumentRecord },
    /// Labels of the required fields that could not be read, in canonical order.
    Incomplete { missing_labels: Vec<String> },
    /// The recognizer could not read the image.
    RecognitionFailed { message: String },
}

impl CaptureOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// Message to show the user for a failed outcome.
    pub fn user_message(&self, locale: Locale) -> Option<String> {
        match self {
            Self::Complete { .. } => None,
            Self::Incomplete { missing_labels } => {
                Some(incomplete_message(missing_labels, locale))
            }
            Self::RecognitionFailed { message } => Some(message.clone()),
        }
    }
}

/// Outcome of a full attempt, including the steps before processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Camera permission is missing; the camera was never opened.
    PermissionDenied { message: String },
    /// The user cancelled the camera.
    Cancelled,
    /// The capture screen was closed before recognition finished.
    Discarded,
    Processed { outcome: CaptureOutcome },
}

/// How an onboarding capture flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// A complete record was handed to the confirmation screen.
    Confirmed,
    Cancelled,
    PermissionDenied,
}

pub(crate) fn recognition_failed_message(locale: Locale) -> String {
    match locale {
        Locale::Vi => "Không thể nhận dạng văn bản từ ảnh. Vui lòng chụp lại.",
        Locale::En => "Failed to recognize text from image. Please try again.",
    }
    .to_string()
}

pub(crate) fn permission_required_message(locale: Locale) -> String {
    match locale {
        Locale::Vi => "Cần cấp quyền camera để quét giấy tờ.",
        Locale::En => "Camera permission is required to scan documents.",
    }
    .to_string()
}

fn incomplete_message(missing_labels: &[String], locale: Locale) -> String {
    let prefix = match locale {
        Locale::Vi => "Không đọc được các thông tin sau",
        Locale::En => "Could not read the following fields",
    };
    format!("{}: {}", prefix, missing_labels.join(", "))
}
