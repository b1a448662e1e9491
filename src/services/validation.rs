use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use strsim::jaro_winkler;
use strum::IntoEnumIterator;

use crate::models::label::{
    ExpectedFields, FieldStatus, FieldVerification, LabelField, ValidationResponse,
};
use crate::services::pipeline::{FieldComparator, PipelineError};

/// Minimum similarity for an unlabeled token to be quoted as the value found
/// in place of the expected one.
const RESEMBLANCE_THRESHOLD: f64 = 0.80;

/// `<caption><sep><value>` per text field, e.g. `Serial Number: SN-999` or `SN:SN-999`.
static CAPTIONED_VALUE: LazyLock<HashMap<LabelField, Regex>> = LazyLock::new(|| {
    LabelField::iter()
        .filter(|f| *f != LabelField::RohsCompliance)
        .map(|field| {
            let captions = field
                .captions()
                .iter()
                .map(|c| regex::escape(c))
                .collect::<Vec<_>>()
                .join("|");
            let pattern =
                format!(r"(?i)(?:^|[^A-Za-z0-9])(?:{captions})[ \t]*[:#=][ \t]*([^\s,;|]+)");
            let regex = Regex::new(&pattern).expect("caption pattern is valid");
            (field, regex)
        })
        .collect()
});

/// Lowercased words used in field captions. These are never quoted as a found value.
static CAPTION_WORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    LabelField::iter()
        .flat_map(|f| f.captions().iter())
        .flat_map(|c| c.split_whitespace())
        .map(|w| w.trim_matches(|ch: char| !ch.is_alphanumeric()).to_lowercase())
        .collect()
});

/// A compliance marker with an optional `not`/`non` prefix, e.g. `RoHS: Yes`,
/// `Not RoHS Compliant`, `Non-RoHS`.
static ROHS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\b(?:not|non)[\s-]*)?\brohs\b").expect("marker pattern is valid")
});

/// Literal-match policy for text fields. The default is exact matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    pub case_insensitive: bool,
    pub collapse_whitespace: bool,
}

impl MatchPolicy {
    fn normalize(&self, value: &str) -> String {
        let value = if self.collapse_whitespace {
            value.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            value.to_string()
        };
        if self.case_insensitive {
            value.to_lowercase()
        } else {
            value
        }
    }

    pub fn contains(&self, haystack: &str, needle: &str) -> bool {
        self.normalize(haystack).contains(&self.normalize(needle))
    }
}

/// What the label says about RoHS compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceReading {
    Affirmative,
    Negative,
    Conflicting,
    Absent,
}

/// Scan extracted text for RoHS compliance markers.
///
/// Each marker is read up to the next marker, so run-on text carrying both an
/// affirmative and a negative marker reads as conflicting.
pub fn read_compliance(text: &str) -> ComplianceReading {
    let markers: Vec<_> = ROHS_MARKER.captures_iter(text).collect();
    let mut affirmative = false;
    let mut negative = false;

    for (i, caps) in markers.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let marker = if caps.get(1).is_some() {
            Some(false)
        } else {
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            classify_marker_context(&marker_context(&text[whole.end()..end]))
        };
        match marker {
            Some(true) => affirmative = true,
            Some(false) => negative = true,
            None => {}
        }
    }

    match (affirmative, negative) {
        (true, true) => ComplianceReading::Conflicting,
        (true, false) => ComplianceReading::Affirmative,
        (false, true) => ComplianceReading::Negative,
        (false, false) => ComplianceReading::Absent,
    }
}

/// The rest of the marker's line, or the following line when only
/// punctuation follows the marker (`RoHS:` above `Yes`).
fn marker_context(rest: &str) -> String {
    let mut lines = rest.lines();
    let first = lines.next().unwrap_or_default();
    if first.chars().any(char::is_alphanumeric) {
        first.to_string()
    } else {
        format!("{first} {}", lines.next().unwrap_or_default())
    }
}

/// Version designations printed after `RoHS`, e.g. `RoHS 3`, `RoHS II`.
fn is_version_token(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit()) || matches!(word, "ii" | "iii")
}

/// Interpret the words after `RoHS`: `Some(true)` affirmative, `Some(false)` negative.
fn classify_marker_context(context: &str) -> Option<bool> {
    let lowered = context.to_lowercase();
    let words = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(|w| w.trim_matches('-'))
        .filter(|w| !w.is_empty());

    let mut saw_compliant = false;
    for word in words {
        match word {
            "compliant" => saw_compliant = true,
            "compliance" | "status" => {}
            w if is_version_token(w) => {}
            "yes" | "true" | "pass" | "passed" | "ok" | "certified" => return Some(true),
            "no" | "false" | "fail" | "failed" | "not" | "non" | "non-compliant" | "noncompliant" => {
                return Some(false)
            }
            _ => break,
        }
    }
    saw_compliant.then_some(true)
}

/// Find the value printed under a field's caption, if any.
fn captioned_value(field: LabelField, text: &str) -> Option<String> {
    CAPTIONED_VALUE
        .get(&field)?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The token most resembling `expected`, if any clears the resemblance threshold.
fn closest_token(expected: &str, text: &str) -> Option<String> {
    let expected = expected.to_lowercase();
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty() && !CAPTION_WORDS.contains(&t.to_lowercase()))
        .map(|t| (t, jaro_winkler(&t.to_lowercase(), &expected)))
        .filter(|(_, score)| *score >= RESEMBLANCE_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(t, _)| t.to_string())
}

fn verify_text_field(
    field: LabelField,
    expected: &str,
    text: &str,
    policy: MatchPolicy,
) -> FieldVerification {
    let status = if policy.contains(text, expected) {
        FieldStatus::Correct
    } else {
        match captioned_value(field, text).or_else(|| closest_token(expected, text)) {
            Some(found) => FieldStatus::Incorrect { found },
            None => FieldStatus::Missing,
        }
    };

    FieldVerification {
        field,
        expected: expected.to_string(),
        status,
    }
}

fn verify_compliance(expected: bool, text: &str) -> FieldVerification {
    let yes_no = |v: bool| if v { "Yes" } else { "No" };
    let status = match (read_compliance(text), expected) {
        (ComplianceReading::Affirmative, true) | (ComplianceReading::Negative, false) => {
            FieldStatus::Correct
        }
        (ComplianceReading::Affirmative, false) | (ComplianceReading::Negative, true) => {
            FieldStatus::Incorrect {
                found: yes_no(!expected).to_string(),
            }
        }
        (ComplianceReading::Conflicting, _) => FieldStatus::Conflicting,
        (ComplianceReading::Absent, _) => FieldStatus::Missing,
    };

    FieldVerification {
        field: LabelField::RohsCompliance,
        expected: yes_no(expected).to_string(),
        status,
    }
}

/// Check every expected field against the extracted label text.
///
/// Text fields must appear literally (subject to `policy`). The compliance flag
/// is matched semantically against affirmative/negative RoHS markers.
pub fn verify_label(
    extracted_text: &str,
    expected: &ExpectedFields,
    policy: MatchPolicy,
) -> Vec<FieldVerification> {
    expected
        .checked_fields()
        .into_iter()
        .map(|field| match expected.text_value(field) {
            Some(value) => verify_text_field(field, value, extracted_text, policy),
            None => verify_compliance(expected.rohs_compliance, extracted_text),
        })
        .collect()
}

/// Deterministic comparator implementing the matching policy locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleComparator {
    policy: MatchPolicy,
}

impl RuleComparator {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn verdict(&self, expected: &ExpectedFields, extracted_text: &str) -> ValidationResponse {
        ValidationResponse::from_field_results(&verify_label(extracted_text, expected, self.policy))
    }
}

impl FieldComparator for RuleComparator {
    async fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        Ok(self.verdict(expected, extracted_text))
    }
}
