//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::time::Instant;

use async_trait::async_trait;
use image::GenericImageView;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;
use crate::models::document::ImageHandle;

use super::{RecognizedText, TextLine, TextRecognizer};

/// On-device recognizer backed by `pure-onnx-ocr` (no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }

    fn recognize_blocking(&self, image: &ImageHandle) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();

        let img = image::open(image.path())
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", image, e)))?;
        let (width, height) = img.dimensions();

        info!("Recognizing {}: {}x{}", image, width, height);

        let results = self
            .engine
            .run_from_image(&img)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let lines: Vec<TextLine> = results
            .iter()
            .map(|r| TextLine {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .filter(|l| !l.text.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Err(OcrError::NoText);
        }

        let recognized = RecognizedText::from_lines(lines, start.elapsed().as_millis() as u64);

        info!(
            "OCR complete: {} lines in {}ms",
            recognized.lines.len(),
            recognized.processing_time_ms
        );

        Ok(recognized)
    }
}

#[async_trait(?Send)]
impl TextRecognizer for PureOcrEngine {
    async fn recognize(&self, image: &ImageHandle) -> Result<RecognizedText, OcrError> {
        self.recognize_blocking(image)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Takes the first 4 exterior points as `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
