//! Heuristic verdict extraction for responses that contain no usable JSON.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize_score;
use crate::constants::FALLBACK_REASON;
use crate::model::ConfidenceSource;

const POSITIVE_WORDS: [&str; 7] = [
    "valid",
    "passed",
    "ok",
    "good",
    "safe",
    "appropriate",
    "acceptable",
];
const NEGATIVE_WORDS: [&str; 6] = ["invalid", "failed", "bad", "unsafe", "inappropriate", "reject"];

const CONFIDENT_WORDS: [&str; 5] = [
    "definitely",
    "certainly",
    "clearly",
    "obviously",
    "undoubtedly",
];
const UNCERTAIN_WORDS: [&str; 5] = ["maybe", "perhaps", "possibly", "likely", "probably"];

const MIN_SENTENCE_REASON_CHARS: usize = 10;

static EXPLICIT_CONFIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)confidence[^\d\n]{0,24}?(\d+(?:\.\d+)?)").expect("valid confidence regex")
});

static REASON_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\breason\b[^\S\n]*[:=\-][^\S\n]*([^\n]+)").expect("valid reason regex")
});

static ISSUES_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:issues?|problems?|concerns?)\b[^\S\n]*[:\-][^\S\n]*([^\n]*)")
        .expect("valid issues regex")
});

static SUGGESTIONS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:suggestions?|recommendations?|improvements?)\b[^\S\n]*[:\-][^\S\n]*([^\n]*)",
    )
    .expect("valid suggestions regex")
});

static BULLET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+|\d+[.)])\s*").expect("valid bullet regex"));

/// Verdict read from free text. Categories are never produced on this path.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeTextVerdict {
    pub is_valid: bool,
    pub confidence: f64,
    pub confidence_source: ConfidenceSource,
    pub reason: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Keyword matching is case-insensitive substring matching, so `"isValid"` counts as a positive
/// hit while `"invalid"` counts as both; any negative hit wins.
pub fn parse_free_text(raw: &str) -> FreeTextVerdict {
    let lower = raw.to_lowercase();

    let positive = POSITIVE_WORDS.iter().any(|w| lower.contains(w));
    let negative = NEGATIVE_WORDS.iter().any(|w| lower.contains(w));

    let (confidence, confidence_source) = estimate_confidence(raw, &lower);

    FreeTextVerdict {
        is_valid: positive && !negative,
        confidence,
        confidence_source,
        reason: extract_reason(raw),
        issues: extract_list(raw, &ISSUES_LABEL),
        suggestions: extract_list(raw, &SUGGESTIONS_LABEL),
    }
}

fn estimate_confidence(raw: &str, lower: &str) -> (f64, ConfidenceSource) {
    if let Some(value) = EXPLICIT_CONFIDENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        return (normalize_score(value), ConfidenceSource::Reported);
    }

    let confident: usize = CONFIDENT_WORDS.iter().map(|w| lower.matches(w).count()).sum();
    let uncertain: usize = UNCERTAIN_WORDS.iter().map(|w| lower.matches(w).count()).sum();

    let confidence = match confident.cmp(&uncertain) {
        std::cmp::Ordering::Greater => 0.8,
        std::cmp::Ordering::Less => 0.4,
        std::cmp::Ordering::Equal => 0.6,
    };
    (confidence, ConfidenceSource::Inferred)
}

fn extract_reason(raw: &str) -> String {
    if let Some(reason) = REASON_LABEL
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        return reason.to_string();
    }

    let first_sentence = raw
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    if first_sentence.chars().count() > MIN_SENTENCE_REASON_CHARS {
        first_sentence.to_string()
    } else {
        FALLBACK_REASON.to_string()
    }
}

/// Collects items after a label: the rest of the label's line plus any bullet lines that follow,
/// split on commas, semicolons and bullets, de-duplicated in order of appearance.
fn extract_list(raw: &str, label: &Regex) -> Vec<String> {
    let Some(caps) = label.captures(raw) else {
        return Vec::new();
    };
    let (Some(head), Some(inline)) = (caps.get(0), caps.get(1)) else {
        return Vec::new();
    };

    let mut fragments = vec![inline.as_str().to_string()];
    for line in raw[head.end()..].lines().skip(1) {
        let line = line.trim();
        if BULLET_PREFIX.is_match(line) {
            fragments.push(line.to_string());
        } else {
            break;
        }
    }

    let mut items: Vec<String> = Vec::new();
    for fragment in &fragments {
        for piece in fragment.split([',', ';', '•']) {
            let item = BULLET_PREFIX.replace(piece.trim(), "").trim().to_string();
            let lowered = item.to_lowercase();
            if item.is_empty() || lowered == "none" || lowered == "n/a" {
                continue;
            }
            if !items.contains(&item) {
                items.push(item);
            }
        }
    }
    items
}
