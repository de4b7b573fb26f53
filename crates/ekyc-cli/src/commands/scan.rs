//! Scan command - run the capture pipeline over ID card photos.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use ekyc_core::{
    CameraService, CaptureError, CaptureOutcome, CapturePipeline, CaptureResult, DocumentRecord,
    FlowOutcome, ImageHandle, Locale, Navigator, PureOcrEngine, RetryChoice, StaticPermission,
};

use super::config::load_config;
use super::extract::parse_locale;
use super::format::{FieldReport, OutputFormat};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// ID card images, tried in order until one yields every field
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory, overrides the config
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Label language (vi or en), overrides the config
    #[arg(short, long, value_parser = parse_locale)]
    locale: Option<Locale>,
}

/// Camera that "captures" the next image from a list of files.
struct FileCamera {
    images: RefCell<VecDeque<PathBuf>>,
}

impl FileCamera {
    fn new(images: Vec<PathBuf>) -> Self {
        Self {
            images: RefCell::new(images.into()),
        }
    }

    fn has_more(&self) -> bool {
        !self.images.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl CameraService for FileCamera {
    async fn capture(&self) -> Result<CaptureResult, CaptureError> {
        let Some(path) = self.images.borrow_mut().pop_front() else {
            return Ok(CaptureResult::Cancelled);
        };
        if !path.is_file() {
            return Err(CaptureError::Camera(format!(
                "image not found: {}",
                path.display()
            )));
        }
        debug!("Captured {}", path.display());
        Ok(CaptureResult::Captured(ImageHandle::from(path)))
    }
}

/// Navigator that reports to the terminal and recaptures while images remain.
struct ConsoleNavigator<'a> {
    camera: &'a FileCamera,
    locale: Locale,
    progress: &'a ProgressBar,
    confirmed: RefCell<Option<DocumentRecord>>,
    last_failure: RefCell<Option<CaptureOutcome>>,
}

#[async_trait(?Send)]
impl Navigator for ConsoleNavigator<'_> {
    async fn confirm(&self, record: DocumentRecord) {
        *self.confirmed.borrow_mut() = Some(record);
    }

    async fn offer_retry(&self, outcome: &CaptureOutcome) -> RetryChoice {
        if let Some(message) = outcome.user_message(self.locale) {
            self.progress
                .println(format!("{} {}", style("⚠").yellow(), message));
        }
        *self.last_failure.borrow_mut() = Some(outcome.clone());

        if self.camera.has_more() {
            self.progress.set_message("Recapturing...");
            RetryChoice::Recapture
        } else {
            RetryChoice::Cancel
        }
    }

    async fn permission_required(&self, message: &str) {
        self.progress
            .println(format!("{} {}", style("✗").red(), message));
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;

    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }
    if let Some(locale) = args.locale {
        config.extraction.locale = locale;
    }
    let locale = config.extraction.locale;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading OCR models...");

    let engine = PureOcrEngine::from_config(&config.ocr)
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?;

    info!("Scanning {} image(s)", args.images.len());

    let camera = FileCamera::new(args.images.clone());
    let navigator = ConsoleNavigator {
        camera: &camera,
        locale,
        progress: &pb,
        confirmed: RefCell::new(None),
        last_failure: RefCell::new(None),
    };

    pb.set_message("Scanning...");
    let mut pipeline = CapturePipeline::for_cccd(engine, &config.extraction);
    let flow = pipeline
        .run(&camera, &StaticPermission(true), &navigator)
        .await;
    pb.finish_and_clear();

    let flow = flow?;
    debug!("Scan finished as {:?} in {:?}", flow, start.elapsed());

    let record = match (flow, navigator.confirmed.into_inner()) {
        (FlowOutcome::Confirmed, Some(record)) => record,
        _ => {
            let reason = navigator
                .last_failure
                .into_inner()
                .and_then(|outcome| outcome.user_message(locale))
                .unwrap_or_else(|| "no image was processed".to_string());
            anyhow::bail!("No complete ID card captured: {}", reason);
        }
    };

    let output = FieldReport::new(record.fields(), &[]).render(args.format, locale)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    eprintln!(
        "{} Captured from {}",
        style("ℹ").blue(),
        record.image()
    );

    Ok(())
}
