//! Rule vocabulary for prescription structuring.
//!
//! The vocabulary is data: titles, units, frequency phrases and date words can
//! be extended from a JSON file without touching the classifier. `Rules` is the
//! compiled form the pipeline stages match against.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::StructuringError;

/// Matches nothing. Used when a vocabulary list is empty so that an empty
/// alternation does not match every line.
const NEVER: &str = r"(?:\b\B)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleVocabulary {
    /// Professional titles, matched case-sensitively as whole tokens.
    pub provider_titles: Vec<String>,
    /// Units accepted after a number to form a strength ("500mg", "5 ml").
    pub strength_units: Vec<String>,
    /// Frequency phrases, matched case-insensitively in the usage segment.
    pub frequency_phrases: Vec<String>,
    /// Markers of a follow-up appointment line ("Next Visit").
    pub follow_up_markers: Vec<String>,
    /// Dosage-form abbreviations written before the drug name ("Tab.", "Cap.").
    /// Matched case-insensitively and skipped when reading the name.
    pub dosage_form_prefixes: Vec<String>,
    /// Line prefixes that identify patient details.
    pub patient_prefixes: Vec<String>,
    /// Leading markers of a free-text instruction line.
    pub bullet_markers: Vec<String>,
    /// Characters that, when a token consists only of them, are OCR noise.
    pub noise_chars: String,
    /// The twelve month names, January first. Abbreviations are derived.
    pub month_names: Vec<String>,
    /// Replace near-miss drug names with dictionary spellings during normalization.
    pub correct_drug_names: bool,
    /// Lowercase drug names used when `correct_drug_names` is on.
    pub drug_dictionary: Vec<String>,
}

impl Default for RuleVocabulary {
    fn default() -> Self {
        Self {
            provider_titles: strings(&[
                "Dr", "DR", "Doctor", "MD", "M.D.", "MBBS", "MS", "DNB", "FRCP", "FRCS", "BDS",
                "BAMS", "DDS", "Prof", "NP", "PA-C",
            ]),
            strength_units: strings(&["mg", "mcg", "ml", "g", "IU"]),
            frequency_phrases: strings(&[
                "once daily",
                "twice daily",
                "three times daily",
                "four times daily",
                "once a day",
                "twice a day",
                "three times a day",
                "four times a day",
                "every morning",
                "every night",
                "at bedtime",
                "when needed",
                "as needed",
                "as required",
                "daily",
            ]),
            follow_up_markers: strings(&["Next Visit", "Follow-up", "Follow up", "Review on"]),
            dosage_form_prefixes: strings(&[
                "Tab.", "Tab", "Tabs", "Cap.", "Cap", "Caps", "Syp.", "Syp", "Syr.", "Inj.", "Inj",
            ]),
            patient_prefixes: strings(&["Patient", "Age"]),
            bullet_markers: strings(&["-", "•", "*", "\u{2013}", "·"]),
            noise_chars: "|~^`¦_".to_string(),
            month_names: strings(&[
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]),
            correct_drug_names: false,
            drug_dictionary: strings(&[
                "acetaminophen", "albuterol", "allopurinol", "amlodipine", "amoxicillin",
                "atorvastatin", "azithromycin", "cefixime", "cetirizine", "ciprofloxacin",
                "clopidogrel", "diclofenac", "doxycycline", "esomeprazole", "fluconazole",
                "gabapentin", "ibuprofen", "levocetirizine", "levothyroxine", "lisinopril",
                "losartan", "metformin", "metoprolol", "metronidazole", "montelukast",
                "naproxen", "omeprazole", "ondansetron", "pantoprazole", "paracetamol",
                "prednisolone", "prednisone", "ranitidine", "rosuvastatin", "salbutamol",
                "sertraline", "simvastatin", "telmisartan", "tramadol", "warfarin",
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A date found in text, not yet checked against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCandidate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateCandidate {
    /// ISO-8601 form, or `None` when the date does not exist (e.g. February 30).
    pub fn to_iso(self) -> Option<String> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Compiled vocabulary.
#[derive(Debug, Clone)]
pub struct Rules {
    vocabulary: RuleVocabulary,
    month_keys: Vec<String>,
    provider_title: Regex,
    strength: Regex,
    dosage_form: Regex,
    medication_line: Regex,
    frequency: Regex,
    duration: Regex,
    follow_up: Regex,
    patient_prefix: Regex,
    month_day_year: Regex,
    day_month_year: Regex,
    iso_date: Regex,
}

static BUILTIN_RULES: LazyLock<Rules> = LazyLock::new(|| {
    Rules::compile(RuleVocabulary::default()).expect("built-in vocabulary compiles")
});

impl Rules {
    /// Rules compiled from the built-in vocabulary.
    pub fn builtin() -> &'static Rules {
        &BUILTIN_RULES
    }

    pub fn compile(vocabulary: RuleVocabulary) -> Result<Self, StructuringError> {
        if vocabulary.month_names.len() != 12 {
            return Err(StructuringError::InvalidVocabulary(format!(
                "month_names must list 12 months, got {}",
                vocabulary.month_names.len()
            )));
        }
        if vocabulary.month_names.iter().any(|m| m.chars().count() < 3) {
            return Err(StructuringError::InvalidVocabulary(
                "month names must be at least 3 characters".into(),
            ));
        }

        let titles = alternation(&vocabulary.provider_titles);
        let units = alternation(&vocabulary.strength_units);
        let phrases = alternation(&vocabulary.frequency_phrases);
        let follow_up = alternation(&vocabulary.follow_up_markers);
        let patient = alternation(&vocabulary.patient_prefixes);
        let forms = alternation(&vocabulary.dosage_form_prefixes);

        let month_keys: Vec<String> = vocabulary
            .month_names
            .iter()
            .map(|m| m.to_lowercase())
            .collect();
        let mut month_words: Vec<String> = vocabulary.month_names.clone();
        month_words.extend(
            vocabulary
                .month_names
                .iter()
                .map(|m| m.chars().take(3).collect::<String>()),
        );
        let months = alternation(&month_words);

        let strength = format!(r"(?i)\b\d+(?:[.,]\d+)?\s?{units}\b");
        let name_token = r"\p{L}[\p{L}'/\-]*";
        let medication_line =
            format!(r"^(?i:{forms}\s+)?{name_token}(?:\s+{name_token})*\s+(?i:\d+(?:[.,]\d+)?\s?{units}\b).*?\s[-–—]\s+\S");

        Ok(Self {
            month_keys,
            provider_title: compile(&format!(r"(?:^|[^\p{{L}}]){titles}(?:[^\p{{L}}]|$)"))?,
            strength: compile(&strength)?,
            dosage_form: compile(&format!(r"(?i)^{forms}\s+"))?,
            medication_line: compile(&medication_line)?,
            frequency: compile(&format!(r"(?i)\b{phrases}\b"))?,
            duration: compile(r"(?i)\bfor\s+(\d{1,3})\s+days?\b")?,
            follow_up: compile(&format!(r"(?i)\b{follow_up}\b"))?,
            patient_prefix: compile(&format!(r"(?i)^{patient}\b"))?,
            month_day_year: compile(&format!(
                r"(?i)\b({months})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
            ))?,
            day_month_year: compile(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")?,
            iso_date: compile(r"\b(\d{4})-(\d{2})-(\d{2})\b")?,
            vocabulary,
        })
    }

    pub fn vocabulary(&self) -> &RuleVocabulary {
        &self.vocabulary
    }

    pub fn has_provider_title(&self, text: &str) -> bool {
        self.provider_title.is_match(text)
    }

    /// `[form] <name tokens> <number><unit> ... - <usage>`, list marker already stripped.
    pub fn is_full_medication_line(&self, text: &str) -> bool {
        self.medication_line.is_match(text)
    }

    /// First `<number><unit>` token, as written.
    pub fn find_strength<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.strength.find(text).map(|m| m.as_str())
    }

    /// Byte offset where the first strength token starts.
    pub fn strength_start(&self, text: &str) -> Option<usize> {
        self.strength.find(text).map(|m| m.start())
    }

    /// Text after a leading dosage-form prefix. Unchanged when there is none
    /// or when nothing follows it.
    pub fn strip_dosage_form<'t>(&self, text: &'t str) -> &'t str {
        match self.dosage_form.find(text) {
            Some(m) if m.end() < text.len() => &text[m.end()..],
            _ => text,
        }
    }

    /// First frequency phrase, as written.
    pub fn find_frequency<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.frequency.find(text).map(|m| m.as_str())
    }

    /// N from "for N days".
    pub fn find_duration_days(&self, text: &str) -> Option<u32> {
        self.duration
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn is_follow_up(&self, text: &str) -> bool {
        self.follow_up.is_match(text)
    }

    pub fn is_patient_info(&self, text: &str) -> bool {
        self.patient_prefix.is_match(text)
    }

    pub fn starts_with_bullet(&self, text: &str) -> bool {
        self.vocabulary
            .bullet_markers
            .iter()
            .any(|m| !m.is_empty() && text.starts_with(m.as_str()))
    }

    /// Text with a leading bullet marker and following whitespace removed.
    pub fn strip_bullet<'t>(&self, text: &'t str) -> &'t str {
        self.vocabulary
            .bullet_markers
            .iter()
            .filter(|m| !m.is_empty())
            .find_map(|m| text.strip_prefix(m.as_str()))
            .map(str::trim_start)
            .unwrap_or(text)
    }

    pub fn is_noise_token(&self, token: &str) -> bool {
        !token.is_empty() && token.chars().all(|c| self.vocabulary.noise_chars.contains(c))
    }

    pub fn has_date(&self, text: &str) -> bool {
        self.find_date(text).is_some()
    }

    /// Earliest date pattern in the line. The calendar check happens in
    /// `DateCandidate::to_iso`.
    pub fn find_date(&self, text: &str) -> Option<DateCandidate> {
        let mut found: Vec<(usize, DateCandidate)> = Vec::new();

        if let Some(c) = self.month_day_year.captures(text) {
            let month = self.month_number(&c[1]);
            if let (Some(month), Ok(day), Ok(year)) = (month, c[2].parse::<u32>(), c[3].parse::<i32>()) {
                found.push((c.get(0).map_or(0, |m| m.start()), DateCandidate { year, month, day }));
            }
        }
        if let Some(c) = self.day_month_year.captures(text) {
            if let (Ok(day), Ok(month), Ok(year)) = (c[1].parse::<u32>(), c[2].parse::<u32>(), c[3].parse::<i32>()) {
                found.push((c.get(0).map_or(0, |m| m.start()), DateCandidate { year, month, day }));
            }
        }
        if let Some(c) = self.iso_date.captures(text) {
            if let (Ok(year), Ok(month), Ok(day)) = (c[1].parse::<i32>(), c[2].parse::<u32>(), c[3].parse::<u32>()) {
                found.push((c.get(0).map_or(0, |m| m.start()), DateCandidate { year, month, day }));
            }
        }

        found.into_iter().min_by_key(|(pos, _)| *pos).map(|(_, d)| d)
    }

    fn month_number(&self, word: &str) -> Option<u32> {
        let key = word.trim_end_matches('.').to_lowercase();
        self.month_keys
            .iter()
            .position(|m| *m == key || (key.chars().count() >= 3 && m.starts_with(&key)))
            .map(|i| i as u32 + 1)
    }
}

/// `(?:a|b|c)` with longest terms first so "twice daily" wins over "daily".
/// Spaces match any whitespace run.
fn alternation(terms: &[String]) -> String {
    let mut terms: Vec<&String> = terms.iter().filter(|t| !t.trim().is_empty()).collect();
    if terms.is_empty() {
        return NEVER.to_string();
    }
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    terms.dedup();
    let parts: Vec<String> = terms
        .iter()
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    format!("(?:{})", parts.join("|"))
}

fn compile(pattern: &str) -> Result<Regex, StructuringError> {
    Regex::new(pattern).map_err(|e| StructuringError::InvalidVocabulary(e.to_string()))
}
