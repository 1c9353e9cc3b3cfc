//! Defensive JSON extraction from model output.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::model::ParseMethod;

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object span regex"));

// Every repair pattern starts with a string-literal alternative so that text inside an
// existing string is matched whole and handed back unchanged.
const STRING_LITERAL: &str = r#""(?:\\.|[^"\\])*""#;

static SMART_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?P<string>{})|[\x{{201C}}-\x{{201F}}]"#,
        STRING_LITERAL
    ))
    .expect("valid smart quote regex")
});

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?P<string>{})|(?P<lead>[{{,]\s*)(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*:"#,
        STRING_LITERAL
    ))
    .expect("valid unquoted key regex")
});

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?P<string>{})|,\s*(?P<close>[}}\]])"#,
        STRING_LITERAL
    ))
    .expect("valid trailing comma regex")
});

/// Extracts a JSON object, trying in order: the whole text, the greedy `{...}` span, and the
/// span after repairs. Returns `None` when none of them yields an object.
pub fn extract_object(raw: &str) -> Option<(Map<String, Value>, ParseMethod)> {
    if let Some(object) = parse_object(raw.trim()) {
        return Some((object, ParseMethod::Json));
    }

    let span = OBJECT_SPAN.find(raw)?.as_str();

    if let Some(object) = parse_object(span) {
        return Some((object, ParseMethod::ExtractedJson));
    }

    parse_object(&repair(span)).map(|object| (object, ParseMethod::RepairedJson))
}

/// Applies the bounded set of textual repairs to a candidate span. String contents are never
/// rewritten.
pub fn repair(span: &str) -> String {
    let unescaped = unescape_double_encoded(span);
    let quoted = replace_outside_strings(&SMART_QUOTE, &unescaped, |_| "\"".to_string());
    let keyed = replace_outside_strings(&UNQUOTED_KEY, &quoted, |caps| {
        format!("{}\"{}\":", &caps["lead"], &caps["key"])
    });
    replace_outside_strings(&TRAILING_COMMA, &keyed, |caps| caps["close"].to_string())
}

/// Runs `replace` on every match of `pattern` except string literals, which are kept verbatim.
fn replace_outside_strings(
    pattern: &Regex,
    text: &str,
    replace: impl Fn(&Captures) -> String,
) -> String {
    pattern
        .replace_all(text, |caps: &Captures| match caps.name("string") {
            Some(literal) => literal.as_str().to_string(),
            None => replace(caps),
        })
        .into_owned()
}

/// Double-encoded payloads (`{\"isValid\": true}`) lose one level of escaping.
fn unescape_double_encoded(span: &str) -> String {
    let trimmed = span.trim_start_matches(|c: char| c == '{' || c.is_whitespace());
    if trimmed.starts_with("\\\"") {
        span.replace("\\\"", "\"")
    } else {
        span.to_string()
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
