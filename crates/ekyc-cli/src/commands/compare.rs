//! Compare command - check a selfie against the ID card photo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::style;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use ekyc_core::models::face::FACE_COMPARISON_FAILED;
use ekyc_core::FaceComparisonResult;

use super::config::load_config;

/// Arguments for the compare command.
#[derive(Args)]
pub struct CompareArgs {
    /// Selfie image
    #[arg(long)]
    selfie: PathBuf,

    /// ID card image the selfie is compared against
    #[arg(long)]
    id_card: PathBuf,

    /// Comparison service URL, overrides the config
    #[arg(long)]
    api_url: Option<String>,

    /// Print the raw service response as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize)]
struct ServiceError {
    error: Option<String>,
}

async fn image_part(path: &Path, file_name: &'static str) -> anyhow::Result<Part> {
    if !path.is_file() {
        anyhow::bail!("Image not found: {}", path.display());
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/jpeg")?)
}

pub async fn run(args: CompareArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let api_url = args.api_url.unwrap_or(config.face.api_url);
    let endpoint = format!("{}/detect", api_url.trim_end_matches('/'));

    let form = Form::new()
        .part("image", image_part(&args.selfie, "selfie.jpg").await?)
        .part("image2", image_part(&args.id_card, "idcard.jpg").await?);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.face.timeout_secs))
        .build()?;

    debug!("Posting face comparison to {}", endpoint);

    let response = match client.post(&endpoint).multipart(form).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Face comparison request failed: {}", e);
            anyhow::bail!(FACE_COMPARISON_FAILED);
        }
    };

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        warn!("Unreadable face comparison response: {}", e);
        anyhow::anyhow!(FACE_COMPARISON_FAILED)
    })?;
    let result = parse_response(status, &body)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_verdict(&result));
    }

    Ok(())
}

/// Turn the service reply into a result. On failure the server's `error`
/// message wins over the generic one.
fn parse_response(status: StatusCode, body: &str) -> anyhow::Result<FaceComparisonResult> {
    if !status.is_success() {
        warn!("Face comparison service returned {}", status);
        let message = serde_json::from_str::<ServiceError>(body)
            .ok()
            .and_then(|body| body.error)
            .filter(|error| !error.trim().is_empty())
            .unwrap_or_else(|| FACE_COMPARISON_FAILED.to_string());
        anyhow::bail!(message);
    }

    serde_json::from_str(body).map_err(|e| {
        warn!("Unreadable face comparison response: {}", e);
        anyhow::anyhow!(FACE_COMPARISON_FAILED)
    })
}

fn render_verdict(result: &FaceComparisonResult) -> String {
    let verdict = result.verdict();
    let mark = if verdict.verified {
        style("✓").green()
    } else {
        style("✗").red()
    };

    format!(
        "{} {}\n  {}\n  Similarity: {:.1}%",
        mark,
        style(verdict.title).bold(),
        verdict.message,
        result.similarity * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str =
        r#"{"similarity":0.923,"cccd_url":"/static/c.jpg","face_url":"/static/f.jpg","result":"high"}"#;

    #[test]
    fn test_server_error_message_wins() {
        let err = parse_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Không tìm thấy khuôn mặt trong ảnh"}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Không tìm thấy khuôn mặt trong ảnh");
    }

    #[test]
    fn test_error_without_message_falls_back() {
        for body in ["<html>Internal Server Error</html>", r#"{"error":""}"#, "{}"] {
            let err = parse_response(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
            assert_eq!(err.to_string(), FACE_COMPARISON_FAILED);
        }
    }

    #[test]
    fn test_unreadable_success_body_falls_back() {
        let err = parse_response(StatusCode::OK, "not json").unwrap_err();
        assert_eq!(err.to_string(), FACE_COMPARISON_FAILED);
    }

    #[test]
    fn test_verdict_rendering() {
        console::set_colors_enabled(false);

        let result = parse_response(StatusCode::OK, MATCH).unwrap();
        assert_eq!(
            render_verdict(&result),
            "✓ Xác minh thành công\n  Khuôn mặt của bạn khớp với CCCD\n  Similarity: 92.3%"
        );

        let unknown = MATCH.replace("\"high\"", "\"blurry\"");
        let result = parse_response(StatusCode::OK, &unknown).unwrap();
        assert!(render_verdict(&result).starts_with("✗ Lỗi xác minh"));
    }
}
