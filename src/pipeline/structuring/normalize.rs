use super::drug_names::DrugNameCorrector;
use super::types::NormalizedLine;
use super::vocabulary::Rules;
use crate::pipeline::recognition::RawRecognitionResult;

/// Clean recognized lines: drop control and zero-width characters, remove
/// noise tokens, collapse whitespace runs and trim. Lines left empty are
/// dropped; order, confidence and source index are kept. Never fails.
pub fn normalize_lines(raw: &RawRecognitionResult, rules: &Rules) -> Vec<NormalizedLine> {
    let vocabulary = rules.vocabulary();
    let corrector = vocabulary
        .correct_drug_names
        .then(|| DrugNameCorrector::new(&vocabulary.drug_dictionary));

    raw.lines()
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let text = normalize_text(&line.text, rules);
            if text.is_empty() {
                return None;
            }
            let text = match &corrector {
                Some(c) => c.correct(&text),
                None => text,
            };
            Some(NormalizedLine {
                text,
                source_confidence: line.confidence,
                source_index: index,
            })
        })
        .collect()
}

/// Normalize a single line of text.
pub fn normalize_text(text: &str, rules: &Rules) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() || is_zero_width(c) {
                None
            } else {
                Some(c)
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !rules.is_noise_token(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}
