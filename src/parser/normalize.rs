//! Score and confidence normalization onto `[0, 1]`.

use serde_json::Value;

/// Maps a raw score from any of the common scales onto `[0, 1]`.
///
/// | input        | treated as | result      |
/// |--------------|------------|-------------|
/// | `x <= 1`     | 0–1        | `x`         |
/// | `1 < x <= 5` | 0–5        | `x / 5`     |
/// | `5 < x <= 10`| 0–10       | `x / 10`    |
/// | `x > 10`     | 0–100      | `x / 100`   |
///
/// Negative and non-finite inputs map to `0`; anything left above `1` is clamped. The output is
/// always a fixed point: `normalize_score(normalize_score(x)) == normalize_score(x)`.
pub fn normalize_score(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }

    let scaled = if raw <= 1.0 {
        raw
    } else if raw <= 5.0 {
        raw / 5.0
    } else if raw <= 10.0 {
        raw / 10.0
    } else {
        raw / 100.0
    };

    scaled.clamp(0.0, 1.0)
}

/// Maps a textual confidence label to a value.
pub fn confidence_from_label(label: &str) -> Option<f64> {
    let label = label.trim().to_lowercase();
    let value = match label.as_str() {
        "very high" | "very_high" | "certain" => 0.95,
        "high" => 0.85,
        "medium" | "moderate" => 0.6,
        "low" => 0.3,
        "very low" | "very_low" => 0.1,
        _ => return None,
    };
    Some(value)
}

/// Reads a JSON value as a normalized score.
///
/// Accepts numbers, numeric strings (optionally suffixed with `%`) and confidence labels.
/// Returns `None` for anything else so callers can apply their own default.
pub fn normalize_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(normalize_score),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(percent) = trimmed.strip_suffix('%') {
                return percent
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| (v / 100.0).clamp(0.0, 1.0));
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(normalize_score(v)),
                _ => confidence_from_label(trimmed),
            }
        }
        _ => None,
    }
}

/// Loose boolean coercion for model-supplied flags. Absent or unrecognised values are `false`.
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "valid" | "pass" | "passed" | "1"
        ),
        _ => false,
    }
}
