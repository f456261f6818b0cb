use serde::{Deserialize, Serialize};

/// A recognized line after whitespace collapsing and noise removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub text: String,
    pub source_confidence: f32,
    /// Position of the originating line in the recognition result.
    pub source_index: usize,
}

/// Role a line plays on the prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    Header,
    PatientInfo,
    MedicationEntry,
    Instruction,
    Footer,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    #[serde(flatten)]
    pub line: NormalizedLine,
    pub role: LineRole,
}

impl ClassifiedLine {
    pub fn text(&self) -> &str {
        &self.line.text
    }
}

/// One prescribed medication.
///
/// `name` is never empty. Fields that could not be read are `None`; no
/// default dose, frequency or duration is ever filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub name: String,
    pub strength: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<u32>,
    pub raw_line: String,
}

/// Prescriber and dates found in header/footer lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionMetadata {
    pub provider_name: Option<String>,
    /// ISO-8601 calendar date (YYYY-MM-DD).
    pub date: Option<String>,
    /// ISO-8601 date of the next visit, when the prescription names one.
    pub follow_up_date: Option<String>,
}

/// Final structured reading of one prescription image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub medications: Vec<MedicationRecord>,
    pub instructions: Vec<String>,
    pub provider_name: Option<String>,
    pub date: Option<String>,
    pub follow_up_date: Option<String>,
    pub overall_confidence: f32,
    /// Normalized full text in original line order; always present.
    pub extracted_text: String,
}

impl PrescriptionRecord {
    /// Record for a recognition result with no usable lines.
    pub fn empty() -> Self {
        Self {
            medications: vec![],
            instructions: vec![],
            provider_name: None,
            date: None,
            follow_up_date: None,
            overall_confidence: 0.0,
            extracted_text: String::new(),
        }
    }

    /// True when nothing could be extracted at all.
    pub fn is_empty(&self) -> bool {
        self.extracted_text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_no_content() {
        let r = PrescriptionRecord::empty();
        assert!(r.is_empty());
        assert!(r.medications.is_empty());
        assert!(r.instructions.is_empty());
        assert!(r.provider_name.is_none());
        assert!(r.date.is_none());
        assert_eq!(r.overall_confidence, 0.0);
        assert_eq!(r.extracted_text, "");
    }

    #[test]
    fn line_role_serializes_snake_case() {
        let json = serde_json::to_string(&LineRole::MedicationEntry).unwrap();
        assert_eq!(json, "\"medication_entry\"");
        let json = serde_json::to_string(&LineRole::PatientInfo).unwrap();
        assert_eq!(json, "\"patient_info\"");
    }

    #[test]
    fn classified_line_flattens_normalized_fields() {
        let line = ClassifiedLine {
            line: NormalizedLine {
                text: "Age: 35 years".into(),
                source_confidence: 0.9,
                source_index: 4,
            },
            role: LineRole::PatientInfo,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["text"], "Age: 35 years");
        assert_eq!(value["source_index"], 4);
        assert_eq!(value["role"], "patient_info");
    }

    #[test]
    fn record_serializes_nulls_for_missing_fields() {
        let json = serde_json::to_value(PrescriptionRecord::empty()).unwrap();
        assert!(json["provider_name"].is_null());
        assert!(json["date"].is_null());
        assert_eq!(json["medications"].as_array().unwrap().len(), 0);
    }
}
