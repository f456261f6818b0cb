use serde::{Deserialize, Serialize};

use super::types::{ClassifiedLine, MedicationRecord, PrescriptionMetadata};

/// Confidence thresholds used by the report and the CLI
pub mod thresholds {
    /// Below this: reading likely failed. Show strong warning.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: significant uncertainty. Check every field.
    pub const LOW: f32 = 0.50;

    /// Below this: some uncertainty. Check medications and dates.
    pub const MODERATE: f32 = 0.70;

    /// Above this: high confidence. No special flagging.
    pub const HIGH: f32 = 0.85;
}

const RECOGNITION_WEIGHT: f64 = 0.6;
const STRENGTH_WEIGHT: f64 = 0.25;
const METADATA_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl ConfidenceBand {
    pub fn from_score(score: f32) -> Self {
        if score < thresholds::LOW {
            if score < thresholds::VERY_LOW {
                Self::VeryLow
            } else {
                Self::Low
            }
        } else if score < thresholds::HIGH {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "very low",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Whether the reader should double-check the structured fields.
    pub fn needs_review(self) -> bool {
        !matches!(self, Self::High)
    }
}

/// Overall score: 0.6 × mean line confidence + 0.25 × share of medications
/// with a strength + 0.15 × metadata completeness. Zero lines score 0.
/// With no medication lines nothing failed to parse, so the strength share is 1.
pub fn compute_overall_confidence(
    lines: &[ClassifiedLine],
    medications: &[MedicationRecord],
    metadata: &PrescriptionMetadata,
) -> f32 {
    if lines.is_empty() {
        return 0.0;
    }

    let mean = lines
        .iter()
        .map(|l| f64::from(l.line.source_confidence))
        .sum::<f64>()
        / lines.len() as f64;

    let strength_ratio = if medications.is_empty() {
        1.0
    } else {
        let with_strength = medications.iter().filter(|m| m.strength.is_some()).count();
        with_strength as f64 / medications.len() as f64
    };

    let completeness = match (metadata.provider_name.is_some(), metadata.date.is_some()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    };

    let score = RECOGNITION_WEIGHT * mean
        + STRENGTH_WEIGHT * strength_ratio
        + METADATA_WEIGHT * completeness;

    (score as f32).clamp(0.0, 1.0)
}

/// Score as a whole percentage for display.
pub fn confidence_percent(score: f32) -> u8 {
    if score.is_nan() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}
