use super::types::{ClassifiedLine, LineRole, PrescriptionMetadata};
use super::vocabulary::Rules;

/// Provider name and dates from Header and Footer lines. Missing fields are
/// a normal outcome, not an error.
pub fn extract_metadata(lines: &[ClassifiedLine], rules: &Rules) -> PrescriptionMetadata {
    let candidates: Vec<&str> = lines
        .iter()
        .filter(|l| matches!(l.role, LineRole::Header | LineRole::Footer))
        .map(ClassifiedLine::text)
        .collect();

    let provider_name = candidates
        .iter()
        .find(|text| rules.has_provider_title(text))
        .map(|text| text.to_string());

    // First dated line decides; an impossible calendar date leaves the field empty.
    let date = candidates
        .iter()
        .filter(|text| !rules.is_follow_up(text))
        .find_map(|text| rules.find_date(text))
        .and_then(|d| d.to_iso());

    let follow_up_date = candidates
        .iter()
        .filter(|text| rules.is_follow_up(text))
        .find_map(|text| rules.find_date(text))
        .and_then(|d| d.to_iso());

    PrescriptionMetadata {
        provider_name,
        date,
        follow_up_date,
    }
}
