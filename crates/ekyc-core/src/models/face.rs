//! Selfie-versus-ID face comparison results.

use serde::{Deserialize, Deserializer, Serialize};

/// Similarity bucket reported by the face comparison service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityLevel {
    High,
    Medium,
    Low,
    Unsimilar,
}

impl SimilarityLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "unsimilar" => Some(Self::Unsimilar),
            _ => None,
        }
    }
}

/// Response body of the face comparison service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceComparisonResult {
    /// Similarity score reported by the service.
    pub similarity: f32,
    /// URL of the face crop taken from the ID card.
    pub cccd_url: String,
    /// URL of the face crop taken from the selfie.
    pub face_url: String,
    /// Similarity bucket. A missing or empty level reads as `Unsimilar`;
    /// a level we do not recognize is `None`.
    #[serde(default = "default_level", deserialize_with = "lenient_level")]
    pub result: Option<SimilarityLevel>,
}

fn default_level() -> Option<SimilarityLevel> {
    Some(SimilarityLevel::Unsimilar)
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<SimilarityLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        None | Some("") => default_level(),
        Some(level) => SimilarityLevel::from_str(level),
    })
}

/// What to tell the user about a comparison result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaceVerdict {
    pub title: &'static str,
    pub message: &'static str,
    /// Hex colour for the result badge.
    pub color: &'static str,
    /// Only a high similarity counts as a successful verification.
    pub verified: bool,
}

impl FaceVerdict {
    /// Map a similarity level to its verdict. `None` covers levels the
    /// service reported that we do not recognize.
    pub fn for_level(level: Option<SimilarityLevel>) -> Self {
        match level {
            Some(SimilarityLevel::High) => Self {
                title: "Xác minh thành công",
                message: "Khuôn mặt của bạn khớp với CCCD",
                color: "#10b981",
                verified: true,
            },
            Some(SimilarityLevel::Medium) => Self {
                title: "Xác minh thất bại",
                message: "Khuôn mặt của bạn tương đối khớp với CCCD",
                color: "#f59e0b",
                verified: false,
            },
            Some(SimilarityLevel::Low) => Self {
                title: "Xác minh thất bại",
                message: "Khuôn mặt của bạn có ít điểm tương đồng với CCCD",
                color: "#f97316",
                verified: false,
            },
            Some(SimilarityLevel::Unsimilar) => Self {
                title: "Xác minh thất bại",
                message: "Khuôn mặt của bạn không khớp với CCCD",
                color: "#ef4444",
                verified: false,
            },
            None => Self {
                title: "Lỗi xác minh",
                message: "Có lỗi xảy ra trong quá trình xác minh",
                color: "#6b7280",
                verified: false,
            },
        }
    }
}

impl FaceComparisonResult {
    pub fn verdict(&self) -> FaceVerdict {
        FaceVerdict::for_level(self.result)
    }
}

/// Fallback message when the comparison service gives no usable error.
pub const FACE_COMPARISON_FAILED: &str = "Không thể xác minh danh tính. Vui lòng thử lại.";
