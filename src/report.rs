//! Human-readable rendering and plain-text export of a `PrescriptionRecord`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EXPORT_FILE_NAME;
use crate::pipeline::structuring::{
    confidence_percent, thresholds, ConfidenceBand, MedicationRecord, PrescriptionRecord,
};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No extracted text to export")]
    NothingToExport,
}

/// "Twice daily for 7 days", "Once daily", "For 14 days". `None` when the
/// medication has neither a frequency nor a duration.
pub fn dosage_summary(medication: &MedicationRecord) -> Option<String> {
    let duration = medication.duration_days.map(|days| match days {
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    });

    let summary = match (&medication.frequency, duration) {
        (Some(freq), Some(dur)) => format!("{} for {dur}", freq.to_lowercase()),
        (Some(freq), None) => freq.to_lowercase(),
        (None, Some(dur)) => format!("for {dur}"),
        (None, None) => return None,
    };
    Some(capitalize(&summary))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Plain-text report: prescriber details, medications, instructions and the
/// full extracted text.
pub fn render_report(record: &PrescriptionRecord) -> String {
    let mut out = String::new();
    let band = ConfidenceBand::from_score(record.overall_confidence);

    let _ = writeln!(out, "# Prescription");
    let _ = writeln!(out);
    let _ = writeln!(out, "Doctor: {}", record.provider_name.as_deref().unwrap_or("Not found"));
    let _ = writeln!(out, "Date: {}", record.date.as_deref().unwrap_or("Not found"));
    if let Some(follow_up) = &record.follow_up_date {
        let _ = writeln!(out, "Next visit: {follow_up}");
    }
    let _ = writeln!(
        out,
        "Confidence: {}% ({})",
        confidence_percent(record.overall_confidence),
        band.label()
    );
    if record.overall_confidence < thresholds::MODERATE {
        let _ = writeln!(
            out,
            "Check medication names and doses against the original prescription."
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Medications");
    if record.medications.is_empty() {
        let _ = writeln!(out, "None found");
    }
    for (i, med) in record.medications.iter().enumerate() {
        let mut line = format!("{}. {}", i + 1, med.name);
        if let Some(strength) = &med.strength {
            let _ = write!(line, " {strength}");
        }
        if let Some(dosage) = dosage_summary(med) {
            let _ = write!(line, ": {dosage}");
        }
        let _ = writeln!(out, "{line}");
    }

    if !record.instructions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Instructions");
        for instruction in &record.instructions {
            let _ = writeln!(out, "- {instruction}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Extracted text");
    let _ = writeln!(out, "{}", record.extracted_text);

    out
}

/// Write `extracted_text` to `<dir>/prescription.txt`, creating `dir` if needed.
pub fn export_text(record: &PrescriptionRecord, dir: &Path) -> Result<PathBuf, ExportError> {
    if record.extracted_text.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, &record.extracted_text).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        bytes = record.extracted_text.len(),
        "Exported extracted text"
    );
    Ok(path)
}
