//! Prompt rendering for verification requests.
//!
//! [`build_prompt`] is pure: identical inputs always render identical text. The output contract
//! always lists all seven canonical categories so the parser can rely on a fixed shape, even
//! when only a subset was requested.


use std::fmt::Write;

use crate::constants::{CATEGORY_NOT_CHECKED, CONNECTION_TEST_TOKEN};
use crate::model::{Category, VerificationCriteria};

const TASK_PREAMBLE: &str = "You are a strict content verification system for an online services \
marketplace. Analyze the content below against the listed verification criteria and decide \
whether it is valid.";

const CATEGORY_SHAPE: &str = r#"{"passed": boolean, "score": number between 0 and 1, "explanation": "string", "details": ["string"]}"#;

/// Renders the instruction text for one verification.
pub fn build_prompt(
    content: &str,
    criteria: &VerificationCriteria,
    context: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(content.len() + 2048);

    prompt.push_str(TASK_PREAMBLE);
    prompt.push_str("\n\n");

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("Context:\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Content to verify:\n\"\"\"\n");
    prompt.push_str(content);
    prompt.push_str("\n\"\"\"\n\n");

    prompt.push_str("Verification criteria:\n");
    let mut numbered = 0usize;
    for category in criteria.enabled() {
        numbered += 1;
        let _ = writeln!(
            prompt,
            "{}. {}: {}",
            numbered,
            category.as_str(),
            category.description()
        );
    }
    for name in &criteria.custom {
        numbered += 1;
        let _ = writeln!(prompt, "{}. {}: Content satisfies the \"{}\" check", numbered, name, name);
    }
    if numbered == 0 {
        prompt.push_str("- No specific criteria requested; judge overall validity only.\n");
    }
    prompt.push('\n');

    prompt.push_str("Respond with ONLY a JSON object of exactly this shape:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"isValid\": boolean,\n");
    prompt.push_str("  \"confidence\": number between 0 and 1,\n");
    prompt.push_str("  \"reason\": \"short explanation of the verdict\",\n");
    prompt.push_str("  \"issues\": [\"issue\"],\n");
    prompt.push_str("  \"suggestions\": [\"suggestion\"],\n");
    prompt.push_str("  \"categories\": {\n");

    let names: Vec<&str> = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .chain(criteria.custom.iter().map(String::as_str))
        .collect();
    for (i, name) in names.iter().enumerate() {
        let separator = if i + 1 < names.len() { "," } else { "" };
        let _ = writeln!(prompt, "    \"{}\": {}{}", name, CATEGORY_SHAPE, separator);
    }

    prompt.push_str("  }\n");
    prompt.push_str("}\n\n");

    prompt.push_str("Rules:\n");
    prompt.push_str("- Include every category shown in \"categories\", in every response.\n");
    let _ = writeln!(
        prompt,
        "- Categories not listed under verification criteria must be returned as \
         {{\"passed\": false, \"score\": 0, \"explanation\": \"{}\"}}.",
        CATEGORY_NOT_CHECKED
    );
    prompt.push_str("- isValid is true only if every requested criterion passes.\n");
    prompt.push_str("- Do not add fields outside this schema.\n");
    prompt.push_str("- Do not wrap the JSON in markdown or add any text around it.\n");

    prompt
}

/// Trivial prompt used by the connection smoke test.
pub fn connection_test_prompt() -> String {
    format!(
        "This is a connectivity check. Reply with the single word {} and nothing else.",
        CONNECTION_TEST_TOKEN
    )
}
