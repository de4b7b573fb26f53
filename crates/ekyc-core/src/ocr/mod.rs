//! Text recognition collaborator.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::document::ImageHandle;

/// Converts a captured image into text.
///
/// Best effort: line breaks in the result follow the reading order of the
/// document. Calls are single-shot and cannot be cancelled.
#[async_trait(?Send)]
pub trait TextRecognizer {
    async fn recognize(&self, image: &ImageHandle) -> Result<RecognizedText, OcrError>;
}

#[async_trait(?Send)]
impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    async fn recognize(&self, image: &ImageHandle) -> Result<RecognizedText, OcrError> {
        (**self).recognize(image).await
    }
}

/// A recognized line of text with its quadrilateral bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextLine {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of text recognition on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedText {
    /// Recognized lines in reading order.
    pub lines: Vec<TextLine>,

    /// Full text (lines joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl RecognizedText {
    /// Wrap plain text that did not come with line geometry.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            text: text.into(),
            processing_time_ms: 0,
        }
    }

    /// Build from lines, sorting them into reading order first.
    pub fn from_lines(mut lines: Vec<TextLine>, processing_time_ms: u64) -> Self {
        sort_by_reading_order(&mut lines);
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            lines,
            text,
            processing_time_ms,
        }
    }
}

/// Sort lines top-to-bottom, then left-to-right within a 20px row band.
pub fn sort_by_reading_order(lines: &mut [TextLine]) {
    lines.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}
