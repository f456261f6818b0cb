//! Tesseract TSV output → per-line recognition results.
//!
//! TSV columns: level page_num block_num par_num line_num word_num left top width height conf text.
//! Level 5 rows are words; a line is identified by (page, block, paragraph, line).

use super::types::RecognizedLine;
use super::RecognitionError;

/// Group word rows into lines. Each line's confidence is the mean of its
/// word confidences, scaled from 0-100 to 0.0-1.0. Malformed rows are skipped.
pub fn lines_from_tesseract_tsv(tsv: &str) -> Vec<RecognizedLine> {
    let mut lines: Vec<(LineKey, Vec<String>, Vec<f32>)> = Vec::new();

    for row in tsv.lines().skip(1) {
        let Some(word) = parse_word_row(row) else {
            continue;
        };

        match lines.last_mut() {
            Some((key, words, confs)) if *key == word.key => {
                words.push(word.text);
                confs.push(word.confidence);
            }
            _ => lines.push((word.key, vec![word.text], vec![word.confidence])),
        }
    }

    lines
        .into_iter()
        .map(|(_, words, confs)| {
            let mean = confs.iter().sum::<f32>() / confs.len() as f32;
            RecognizedLine::new(words.join(" "), mean)
        })
        .collect()
}

/// Split plain text into lines that all carry the same confidence.
pub fn lines_from_text(text: &str, confidence: f32) -> Vec<RecognizedLine> {
    text.lines()
        .map(|l| RecognizedLine::new(l, confidence))
        .collect()
}

/// Parse `confidence<TAB>text` rows, one recognized line per row. Blank rows
/// are skipped; a row without a numeric confidence is an error naming its
/// 1-based row number.
pub fn lines_from_scored_text(input: &str) -> Result<Vec<RecognizedLine>, RecognitionError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, row)| !row.trim().is_empty())
        .map(|(i, row)| {
            let (conf, text) = row.split_once('\t').ok_or_else(|| {
                RecognitionError::MalformedInput(format!("row {}: missing tab separator", i + 1))
            })?;
            let conf: f32 = conf.trim().parse().map_err(|_| {
                RecognitionError::MalformedInput(format!("row {}: invalid confidence {conf:?}", i + 1))
            })?;
            Ok(RecognizedLine::new(text, conf))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineKey {
    page: u32,
    block: u32,
    paragraph: u32,
    line: u32,
}

struct WordRow {
    key: LineKey,
    text: String,
    confidence: f32,
}

fn parse_word_row(row: &str) -> Option<WordRow> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < 12 {
        return None;
    }

    let level: i32 = fields[0].parse().ok()?;
    if level != 5 {
        return None;
    }

    let key = LineKey {
        page: fields[1].parse().ok()?,
        block: fields[2].parse().ok()?,
        paragraph: fields[3].parse().ok()?,
        line: fields[4].parse().ok()?,
    };

    // Tesseract reports conf as an integer or float depending on version
    let conf: f32 = fields[10].trim().parse().ok()?;

    let text = fields[11].trim();
    if text.is_empty() {
        return None;
    }

    // -1 means Tesseract could not assign a confidence
    let confidence = if conf < 0.0 { 0.0 } else { conf / 100.0 };

    Some(WordRow {
        key,
        text: text.to_string(),
        confidence,
    })
}
