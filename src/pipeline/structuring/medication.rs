use super::classify::strip_list_marker;
use super::types::{ClassifiedLine, LineRole, MedicationRecord};
use super::vocabulary::Rules;

/// Separators between the drug segment and the usage segment.
const USAGE_DELIMITERS: [&str; 3] = [" - ", " \u{2013} ", " \u{2014} "];

/// Byte offset and length of the first usage delimiter in `text`.
pub fn find_usage_delimiter(text: &str) -> Option<(usize, usize)> {
    USAGE_DELIMITERS
        .iter()
        .filter_map(|d| text.find(d).map(|pos| (pos, d.len())))
        .min_by_key(|(pos, _)| *pos)
}

/// Split on the first delimiter into (drug segment, usage segment).
pub fn split_usage(text: &str) -> (&str, Option<&str>) {
    match find_usage_delimiter(text) {
        Some((pos, len)) => (text[..pos].trim(), Some(text[pos + len..].trim())),
        None => (text.trim(), None),
    }
}

/// One record per MedicationEntry line, in line order.
pub fn extract_medications(lines: &[ClassifiedLine], rules: &Rules) -> Vec<MedicationRecord> {
    lines
        .iter()
        .filter(|l| l.role == LineRole::MedicationEntry)
        .map(|l| parse_medication_line(l.text(), rules))
        .collect()
}

/// Parse a single medication line. Never fails: fields that cannot be read
/// stay `None`, and the name falls back to the text before the strength,
/// then to the drug segment, then to the line itself.
pub fn parse_medication_line(text: &str, rules: &Rules) -> MedicationRecord {
    let (body, _) = strip_list_marker(text);
    let (drug, usage) = split_usage(body);
    let named = rules.strip_dosage_form(drug);

    let name = leading_name(named)
        .or_else(|| before_strength(named, rules))
        .or_else(|| Some(drug).filter(|d| !d.is_empty()))
        .unwrap_or(text.trim());

    MedicationRecord {
        name: name.to_string(),
        strength: rules.find_strength(drug).map(str::to_string),
        frequency: usage
            .and_then(|u| rules.find_frequency(u))
            .map(str::to_string),
        duration_days: usage.and_then(|u| rules.find_duration_days(u)),
        raw_line: text.to_string(),
    }
}

/// The run of alphabetic tokens at the start of the drug segment, as a slice
/// of it ("Vitamin D 1000 IU" → "Vitamin D").
fn leading_name(drug: &str) -> Option<&str> {
    let mut end = 0;
    let mut offset = 0;
    for token in drug.split(' ') {
        let start = offset;
        offset += token.len() + 1;
        if token.is_empty() {
            continue;
        }
        if !is_name_token(token) {
            break;
        }
        end = start + token.len();
    }
    (end > 0).then(|| &drug[..end])
}

fn before_strength<'t>(drug: &'t str, rules: &Rules) -> Option<&'t str> {
    let start = rules.strength_start(drug)?;
    Some(drug[..start].trim()).filter(|n| !n.is_empty())
}

fn is_name_token(token: &str) -> bool {
    let trimmed = token.trim_end_matches([',', ':', ';']);
    trimmed.starts_with(|c: char| c.is_alphabetic())
        && trimmed
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, '\'' | '-' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::types::NormalizedLine;

    fn parse(text: &str) -> MedicationRecord {
        parse_medication_line(text, Rules::builtin())
    }

    fn assert_no_fabrication(m: &MedicationRecord) {
        assert!(!m.name.is_empty());
        assert!(m.raw_line.contains(&m.name), "name {:?} not in {:?}", m.name, m.raw_line);
        if let Some(s) = &m.strength {
            assert!(m.raw_line.contains(s.as_str()), "strength {s:?} not in line");
        }
        if let Some(f) = &m.frequency {
            assert!(m.raw_line.contains(f.as_str()), "frequency {f:?} not in line");
        }
        if let Some(d) = m.duration_days {
            assert!(m.raw_line.contains(&d.to_string()));
        }
    }

    #[test]
    fn full_line_parses_every_field() {
        let m = parse("1. Amoxicillin 500mg - Take 1 tablet twice daily after meals for 7 days");
        assert_eq!(m.name, "Amoxicillin");
        assert_eq!(m.strength.as_deref(), Some("500mg"));
        assert_eq!(m.frequency.as_deref(), Some("twice daily"));
        assert_eq!(m.duration_days, Some(7));
        assert_eq!(
            m.raw_line,
            "1. Amoxicillin 500mg - Take 1 tablet twice daily after meals for 7 days"
        );
        assert_no_fabrication(&m);
    }

    #[test]
    fn missing_strength_keeps_the_medication() {
        let m = parse("Vitamins - as advised");
        assert_eq!(m.name, "Vitamins");
        assert_eq!(m.strength, None);
        assert_eq!(m.frequency, None);
        assert_eq!(m.duration_days, None);
        assert_no_fabrication(&m);
    }

    #[test]
    fn no_delimiter_means_no_usage_fields() {
        let m = parse("Amoxicillin 500mg twice daily for 7 days");
        assert_eq!(m.name, "Amoxicillin");
        assert_eq!(m.strength.as_deref(), Some("500mg"));
        assert_eq!(m.frequency, None);
        assert_eq!(m.duration_days, None);
    }

    #[test]
    fn multi_word_names_stop_at_the_strength() {
        let m = parse("Vitamin D 1000 IU - once weekly");
        assert_eq!(m.name, "Vitamin D");
        assert_eq!(m.strength.as_deref(), Some("1000 IU"));
        assert_no_fabrication(&m);
    }

    #[test]
    fn strength_only_read_from_drug_segment() {
        let m = parse("Paracetamol - 650mg when needed");
        assert_eq!(m.strength, None);
        assert_eq!(m.frequency.as_deref(), Some("when needed"));
    }

    #[test]
    fn frequency_kept_as_written() {
        let m = parse("2. Paracetamol 650mg - Take 1 tablet WHEN NEEDED for fever");
        assert_eq!(m.frequency.as_deref(), Some("WHEN NEEDED"));
        assert_eq!(m.duration_days, None);
        assert_no_fabrication(&m);
    }

    #[test]
    fn en_dash_delimiter_is_accepted() {
        let m = parse("Omeprazole 20mg \u{2013} once daily for 14 days");
        assert_eq!(m.frequency.as_deref(), Some("once daily"));
        assert_eq!(m.duration_days, Some(14));
    }

    #[test]
    fn name_falls_back_when_line_starts_with_a_number() {
        let m = parse("500mg - twice daily");
        assert_eq!(m.name, "500mg");
        assert_eq!(m.strength.as_deref(), Some("500mg"));
        assert_no_fabrication(&m);
    }

    #[test]
    fn dosage_form_prefix_is_not_part_of_the_name() {
        let m = parse("1. Tab. Amoxicillin 500mg - twice daily for 7 days");
        assert_eq!(m.name, "Amoxicillin");
        assert_eq!(m.strength.as_deref(), Some("500mg"));
        assert_eq!(m.frequency.as_deref(), Some("twice daily"));
        assert_eq!(m.duration_days, Some(7));
        assert_no_fabrication(&m);

        let m = parse("Tab. Paracetamol 650mg - when needed");
        assert_eq!(m.name, "Paracetamol");
        assert_eq!(m.strength.as_deref(), Some("650mg"));
        assert_no_fabrication(&m);
    }

    #[test]
    fn unreadable_name_is_cut_before_the_strength() {
        let m = parse("(Amoxicillin) 500mg - twice daily");
        assert_eq!(m.name, "(Amoxicillin)");
        assert_eq!(m.strength.as_deref(), Some("500mg"));
        assert_no_fabrication(&m);

        let m = parse("Tab. 500mg - twice daily");
        assert_eq!(m.name, "Tab. 500mg");
        assert_no_fabrication(&m);
    }

    #[test]
    fn extracts_only_medication_lines_in_order() {
        let lines: Vec<ClassifiedLine> = [
            ("Dr. Sarah Johnson, MD", LineRole::Header),
            ("1. Amoxicillin 500mg - twice daily", LineRole::MedicationEntry),
            ("- Avoid alcohol", LineRole::Instruction),
            ("2. Vitamins - as advised", LineRole::MedicationEntry),
        ]
        .iter()
        .enumerate()
        .map(|(i, (text, role))| ClassifiedLine {
            line: NormalizedLine {
                text: text.to_string(),
                source_confidence: 1.0,
                source_index: i,
            },
            role: *role,
        })
        .collect();

        let meds = extract_medications(&lines, Rules::builtin());
        let names: Vec<&str> = meds.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Amoxicillin", "Vitamins"]);
    }

    #[test]
    fn split_usage_uses_first_delimiter() {
        assert_eq!(
            split_usage("Drug 5mg - take - after food"),
            ("Drug 5mg", Some("take - after food"))
        );
        assert_eq!(split_usage("Drug 5mg"), ("Drug 5mg", None));
        assert_eq!(split_usage("Co-amoxiclav 625mg"), ("Co-amoxiclav 625mg", None));
    }
}
