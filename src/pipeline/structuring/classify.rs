//! Rule-based line classification.
//!
//! Rules are an ordered table of predicate → role pairs evaluated first-match-wins:
//! Header, MedicationEntry, Footer, PatientInfo, Instruction, then Unknown.
//! A line never looks at its neighbours' roles, so there is no backtracking.

use super::medication::find_usage_delimiter;
use super::types::{ClassifiedLine, LineRole, NormalizedLine};
use super::vocabulary::Rules;

/// The line under test and its position in the document.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub text: &'a str,
    pub index: usize,
    pub total: usize,
}

impl LineContext<'_> {
    fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

pub struct ClassificationRule {
    pub role: LineRole,
    pub matches: fn(&LineContext<'_>, &Rules) -> bool,
}

/// Precedence order. Footer sits before Instruction so a dated line that
/// starts with a dash is still read as a footer.
pub const CLASSIFICATION_RULES: [ClassificationRule; 5] = [
    ClassificationRule {
        role: LineRole::Header,
        matches: is_header,
    },
    ClassificationRule {
        role: LineRole::MedicationEntry,
        matches: is_medication_entry,
    },
    ClassificationRule {
        role: LineRole::Footer,
        matches: is_footer,
    },
    ClassificationRule {
        role: LineRole::PatientInfo,
        matches: is_patient_info,
    },
    ClassificationRule {
        role: LineRole::Instruction,
        matches: is_instruction,
    },
];

/// Label every line, keeping length and order.
pub fn classify_lines(lines: &[NormalizedLine], rules: &Rules) -> Vec<ClassifiedLine> {
    let total = lines.len();
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let ctx = LineContext {
                text: &line.text,
                index,
                total,
            };
            ClassifiedLine {
                line: line.clone(),
                role: classify_line(&ctx, rules),
            }
        })
        .collect()
}

pub fn classify_line(ctx: &LineContext<'_>, rules: &Rules) -> LineRole {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| (rule.matches)(ctx, rules))
        .map_or(LineRole::Unknown, |rule| rule.role)
}

/// Strip a leading numbered-list marker ("1.", "2)"). Returns the remaining
/// text and whether a marker was present. "2.5mg" is a number, not a marker.
pub fn strip_list_marker(text: &str) -> (&str, bool) {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 2 {
        return (text, false);
    }

    let rest = &text[digits..];
    let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) else {
        return (text, false);
    };
    if after.starts_with(|c: char| c.is_ascii_digit()) {
        return (text, false);
    }

    let body = after.trim_start();
    if body.is_empty() {
        return (text, false);
    }
    (body, true)
}

fn is_header(ctx: &LineContext<'_>, rules: &Rules) -> bool {
    ctx.index < 2 || rules.has_provider_title(ctx.text)
}

fn is_medication_entry(ctx: &LineContext<'_>, rules: &Rules) -> bool {
    let (body, numbered) = strip_list_marker(ctx.text);
    if rules.is_full_medication_line(body) {
        return true;
    }
    // Numbered prescription items are medications even when the strength is unreadable
    numbered
        && body.starts_with(|c: char| c.is_alphabetic())
        && find_usage_delimiter(body).is_some()
}

fn is_footer(ctx: &LineContext<'_>, rules: &Rules) -> bool {
    rules.has_date(ctx.text)
        || rules.is_follow_up(ctx.text)
        || (ctx.is_last() && rules.has_provider_title(ctx.text))
}

fn is_patient_info(ctx: &LineContext<'_>, rules: &Rules) -> bool {
    rules.is_patient_info(ctx.text)
}

fn is_instruction(ctx: &LineContext<'_>, rules: &Rules) -> bool {
    rules.starts_with_bullet(ctx.text)
}
