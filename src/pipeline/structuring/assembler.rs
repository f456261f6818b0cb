use super::classify::classify_lines;
use super::confidence::compute_overall_confidence;
use super::medication::extract_medications;
use super::metadata::extract_metadata;
use super::normalize::normalize_lines;
use super::types::{LineRole, PrescriptionRecord};
use super::vocabulary::{RuleVocabulary, Rules};
use super::StructuringError;
use crate::pipeline::recognition::RawRecognitionResult;

/// Turns a recognition result into a `PrescriptionRecord`.
///
/// Holds only compiled, read-only rules, so one structurer can be shared
/// across threads and called concurrently.
#[derive(Debug, Clone)]
pub struct PrescriptionStructurer {
    rules: Rules,
}

impl Default for PrescriptionStructurer {
    fn default() -> Self {
        Self {
            rules: Rules::builtin().clone(),
        }
    }
}

impl PrescriptionStructurer {
    /// Structurer with a custom vocabulary.
    pub fn new(vocabulary: RuleVocabulary) -> Result<Self, StructuringError> {
        Ok(Self {
            rules: Rules::compile(vocabulary)?,
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Normalize → classify → extract → score → assemble. Never fails;
    /// missing fields are `None` and an empty result yields an empty record.
    pub fn structure(&self, raw: &RawRecognitionResult) -> PrescriptionRecord {
        let _span = tracing::debug_span!(
            "structure_prescription",
            image_id = %raw.image_id,
            raw_lines = raw.lines().len()
        )
        .entered();

        let normalized = normalize_lines(raw, &self.rules);
        if normalized.is_empty() {
            tracing::debug!("No usable lines after normalization");
            return PrescriptionRecord::empty();
        }

        let classified = classify_lines(&normalized, &self.rules);
        let medications = extract_medications(&classified, &self.rules);
        let metadata = extract_metadata(&classified, &self.rules);
        let overall_confidence = compute_overall_confidence(&classified, &medications, &metadata);

        let instructions: Vec<String> = classified
            .iter()
            .filter(|l| l.role == LineRole::Instruction)
            .map(|l| self.rules.strip_bullet(l.text()).to_string())
            .collect();

        let extracted_text = normalized
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            lines = normalized.len(),
            medications = medications.len(),
            instructions = instructions.len(),
            has_provider = metadata.provider_name.is_some(),
            has_date = metadata.date.is_some(),
            overall_confidence,
            "Prescription structured"
        );

        PrescriptionRecord {
            medications,
            instructions,
            provider_name: metadata.provider_name,
            date: metadata.date,
            follow_up_date: metadata.follow_up_date,
            overall_confidence,
            extracted_text,
        }
    }
}

/// Structure with the built-in vocabulary.
pub fn structure_prescription(raw: &RawRecognitionResult) -> PrescriptionRecord {
    PrescriptionStructurer::default().structure(raw)
}
