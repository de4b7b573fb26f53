//! Extract command - pull ID card fields out of recognized text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use ekyc_core::{CccdExtractor, DocumentExtractor, Locale};

use super::config::load_config;
use super::format::{FieldReport, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file produced by OCR (default: stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Label language (vi or en), overrides the config
    #[arg(short, long, value_parser = parse_locale)]
    locale: Option<Locale>,

    /// Also extract the expiry date
    #[arg(long)]
    expiry: bool,

    /// Exit with an error when required fields are missing
    #[arg(long)]
    strict: bool,
}

pub fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::from_str(s).ok_or_else(|| format!("unsupported locale: {} (expected vi or en)", s))
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = match &args.input {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            fs::read_to_string(path)?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let locale = args.locale.unwrap_or(config.extraction.locale);
    let extractor = CccdExtractor::from_config(&config.extraction)
        .with_locale(locale)
        .with_expiry(args.expiry || config.extraction.extract_expiry);

    let record = extractor.extract_fields(&text);
    let missing = extractor.validate(&record);

    info!(
        "Extracted fields from {} characters, {} missing",
        text.len(),
        missing.len()
    );

    let output = FieldReport::new(&record, &missing).render(args.format, locale)?;

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

    if args.strict && !missing.is_empty() {
        anyhow::bail!("Missing required fields: {}", missing.join(", "));
    }

    Ok(())
}
