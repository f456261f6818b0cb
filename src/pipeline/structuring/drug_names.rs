//! Post-OCR drug-name correction.
//!
//! Fixes common recognition slips in drug names ("Amoxicilin", "Paracetamo1"
//! after digit cleanup, "rn" read for "m") by fuzzy matching against a drug
//! dictionary. A word is replaced only when it is at least 5 letters long and
//! exactly one dictionary entry lies within edit distance 2.

const MIN_WORD_LEN: usize = 5;
const MAX_DISTANCE: usize = 2;

pub struct DrugNameCorrector<'d> {
    dictionary: &'d [String],
}

impl<'d> DrugNameCorrector<'d> {
    /// `dictionary` entries are expected in lowercase.
    pub fn new(dictionary: &'d [String]) -> Self {
        Self { dictionary }
    }

    /// Correct every alphabetic word in `text`, leaving everything else untouched.
    pub fn correct(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();

        for ch in text.chars() {
            if ch.is_alphabetic() {
                word.push(ch);
                continue;
            }
            if !word.is_empty() {
                out.push_str(&self.correct_word(&word));
                word.clear();
            }
            out.push(ch);
        }
        if !word.is_empty() {
            out.push_str(&self.correct_word(&word));
        }

        out
    }

    fn correct_word(&self, word: &str) -> String {
        let len = word.chars().count();
        if len < MIN_WORD_LEN {
            return word.to_string();
        }

        let lower = word.to_lowercase();
        if self.dictionary.iter().any(|t| *t == lower) {
            return word.to_string();
        }

        let mut best: Option<(&str, usize)> = None;
        let mut tied = false;

        for term in self.dictionary {
            if term.chars().count().abs_diff(len) > MAX_DISTANCE {
                continue;
            }
            let dist = edit_distance(&lower, term);
            if dist > MAX_DISTANCE {
                continue;
            }
            match best {
                Some((_, d)) if dist > d => {}
                Some((_, d)) if dist == d => tied = true,
                _ => {
                    best = Some((term.as_str(), dist));
                    tied = false;
                }
            }
        }

        match best {
            Some((term, _)) if !tied => match_case(word, term),
            _ => word.to_string(),
        }
    }
}

/// Apply the original word's capitalisation (ALL CAPS, Title or lower) to `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    replacement.to_string()
}

/// Levenshtein distance over chars, two-row dynamic programming.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
