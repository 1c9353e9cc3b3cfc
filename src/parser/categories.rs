use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::normalize::{coerce_bool, normalize_value};
use crate::constants::NO_EXPLANATION;
use crate::model::{Category, CategoryResult, VerificationCriteria};

/// Builds the category map for a structured response.
///
/// Every canonical name is present in the output, plus any custom criteria. Entries the model
/// omitted or sent in the wrong shape become [`CategoryResult::not_checked`].
pub fn validate_categories(
    source: Option<&Value>,
    criteria: &VerificationCriteria,
) -> BTreeMap<String, CategoryResult> {
    let object = source.and_then(Value::as_object);

    Category::ALL
        .iter()
        .map(|c| c.as_str())
        .chain(criteria.custom.iter().map(String::as_str))
        .map(|name| {
            let result = object
                .and_then(|o| lookup(o, name))
                .and_then(Value::as_object)
                .map(coerce_category)
                .unwrap_or_else(CategoryResult::not_checked);
            (name.to_string(), result)
        })
        .collect()
}

/// All seven canonical categories as "not checked".
pub fn not_checked_categories() -> BTreeMap<String, CategoryResult> {
    Category::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), CategoryResult::not_checked()))
        .collect()
}

fn lookup<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn coerce_category(entry: &Map<String, Value>) -> CategoryResult {
    let passed = coerce_bool(entry.get("passed"));
    let score = entry.get("score").and_then(normalize_value).unwrap_or(0.0);
    let explanation = entry
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_EXPLANATION)
        .to_string();
    let details = entry
        .get("details")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(value_to_text).collect());

    CategoryResult {
        passed,
        score,
        explanation,
        details,
    }
}

pub(super) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
