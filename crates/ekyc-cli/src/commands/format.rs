//! Output formatting shared by the scan and extract commands.

use serde::Serialize;

use ekyc_core::{DocumentField, Locale, PartialDocumentRecord};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Extracted fields together with what is still missing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport<'a> {
    pub complete: bool,
    pub record: &'a PartialDocumentRecord,
    pub missing_labels: &'a [String],
}

impl<'a> FieldReport<'a> {
    pub fn new(record: &'a PartialDocumentRecord, missing_labels: &'a [String]) -> Self {
        Self {
            complete: missing_labels.is_empty(),
            record,
            missing_labels,
        }
    }

    pub fn render(&self, format: OutputFormat, locale: Locale) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Csv => self.format_csv(),
            OutputFormat::Text => Ok(self.format_text(locale)),
        }
    }

    fn format_csv(&self) -> anyhow::Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        let mut header: Vec<&str> = DocumentField::REQUIRED.iter().map(|f| f.key()).collect();
        header.push("missing");
        wtr.write_record(&header)?;

        let mut row: Vec<String> = DocumentField::REQUIRED
            .iter()
            .map(|f| self.record.value(*f).to_string())
            .collect();
        row.push(self.missing_labels.join("; "));
        wtr.write_record(&row)?;

        let data = String::from_utf8(wtr.into_inner()?)?;
        Ok(data)
    }

    fn format_text(&self, locale: Locale) -> String {
        let width = DocumentField::REQUIRED
            .iter()
            .map(|f| f.label(locale).chars().count())
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        for field in DocumentField::REQUIRED {
            let label = field.label(locale);
            let pad = width - label.chars().count();
            output.push_str(&format!(
                "{}:{} {}\n",
                label,
                " ".repeat(pad),
                self.record.value(field)
            ));
        }

        if let Some(expiry) = &self.record.date_of_expiry {
            output.push_str(&format!(
                "{}: {}\n",
                DocumentField::DateOfExpiry.label(locale),
                expiry
            ));
        }

        if !self.missing_labels.is_empty() {
            output.push_str(&format!("\nMissing: {}\n", self.missing_labels.join(", ")));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_has_missing_column() {
        let record = PartialDocumentRecord {
            id_number: "001099012345".into(),
            ..Default::default()
        };
        let missing = vec!["Họ và tên".to_string(), "Ngày sinh".to_string()];
        let csv = FieldReport::new(&record, &missing).render(OutputFormat::Csv, Locale::Vi).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("idNumber,fullName,dateOfBirth,sex,nationality,placeOfOrigin,placeOfResidence,missing")
        );
        assert_eq!(lines.next(), Some("001099012345,,,,,,,Họ và tên; Ngày sinh"));
    }

    #[test]
    fn test_text_aligns_labels() {
        let record = PartialDocumentRecord {
            sex: "Nam".into(),
            ..Default::default()
        };
        let text = FieldReport::new(&record, &[]).render(OutputFormat::Text, Locale::En).unwrap();
        assert!(text.contains("Sex:                Nam\n"));
        assert!(!text.contains("Missing"));
    }
}
