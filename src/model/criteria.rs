use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// One of the seven canonical verification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Toxicity,
    Factuality,
    Coherence,
    Relevance,
    Safety,
    Moderation,
    Bias,
}

impl Category {
    /// Canonical order. Prompts and parsers iterate in this order.
    pub const ALL: [Category; 7] = [
        Category::Toxicity,
        Category::Factuality,
        Category::Coherence,
        Category::Relevance,
        Category::Safety,
        Category::Moderation,
        Category::Bias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Toxicity => "toxicity",
            Category::Factuality => "factuality",
            Category::Coherence => "coherence",
            Category::Relevance => "relevance",
            Category::Safety => "safety",
            Category::Moderation => "moderation",
            Category::Bias => "bias",
        }
    }

    /// One-line description rendered into the prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Toxicity => "Content is free of toxic, abusive, hateful or harassing language",
            Category::Factuality => "Claims are factually accurate and not misleading",
            Category::Coherence => "Content is logically consistent and well structured",
            Category::Relevance => "Content is relevant to the stated context or purpose",
            Category::Safety => "Content does not encourage harm, violence or dangerous activity",
            Category::Moderation => "Content complies with marketplace moderation policies",
            Category::Bias => "Content is free of unfair bias or discriminatory framing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Which checks a verification requests.
///
/// The seven canonical flags plus any number of additional named checks. Immutable for the
/// duration of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationCriteria {
    pub toxicity: bool,
    pub factuality: bool,
    pub coherence: bool,
    pub relevance: bool,
    pub safety: bool,
    pub moderation: bool,
    pub bias: bool,
    /// Additional named checks, listed after the canonical ones.
    #[serde(deserialize_with = "deserialize_custom")]
    pub custom: BTreeSet<String>,
}

impl Default for VerificationCriteria {
    fn default() -> Self {
        Self {
            toxicity: true,
            factuality: true,
            coherence: true,
            relevance: true,
            safety: true,
            moderation: false,
            bias: false,
            custom: BTreeSet::new(),
        }
    }
}

impl VerificationCriteria {
    /// Criteria with every flag off.
    pub fn none() -> Self {
        Self {
            toxicity: false,
            factuality: false,
            coherence: false,
            relevance: false,
            safety: false,
            moderation: false,
            bias: false,
            custom: BTreeSet::new(),
        }
    }

    /// Criteria with all seven canonical flags on.
    pub fn all() -> Self {
        let mut criteria = Self::none();
        for category in Category::ALL {
            criteria.set(category, true);
        }
        criteria
    }

    pub fn only(categories: &[Category]) -> Self {
        let mut criteria = Self::none();
        for category in categories {
            criteria.set(*category, true);
        }
        criteria
    }

    /// Adds a named check. Blank, canonical or malformed names are ignored.
    pub fn with_custom(mut self, name: impl Into<String>) -> Self {
        if let Ok(Some(name)) = normalize_custom_name(&name.into()) {
            self.custom.insert(name);
        }
        self
    }

    /// Re-applies custom-name normalization, dropping names that do not survive it.
    pub fn normalized(mut self) -> Self {
        self.custom = std::mem::take(&mut self.custom)
            .into_iter()
            .filter_map(|name| normalize_custom_name(&name).ok().flatten())
            .collect();
        self
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Toxicity => self.toxicity,
            Category::Factuality => self.factuality,
            Category::Coherence => self.coherence,
            Category::Relevance => self.relevance,
            Category::Safety => self.safety,
            Category::Moderation => self.moderation,
            Category::Bias => self.bias,
        }
    }

    pub fn set(&mut self, category: Category, enabled: bool) {
        let flag = match category {
            Category::Toxicity => &mut self.toxicity,
            Category::Factuality => &mut self.factuality,
            Category::Coherence => &mut self.coherence,
            Category::Relevance => &mut self.relevance,
            Category::Safety => &mut self.safety,
            Category::Moderation => &mut self.moderation,
            Category::Bias => &mut self.bias,
        };
        *flag = enabled;
    }

    /// Enabled canonical categories, in canonical order.
    pub fn enabled(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.is_enabled(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none() && self.custom.is_empty()
    }
}

/// Trims and lowercases a custom criterion name.
///
/// `Ok(None)` for blank names and names that repeat a canonical category. Names may only contain
/// ASCII letters, digits, spaces, `_` and `-`, since they are rendered into the prompt's schema.
pub fn normalize_custom_name(name: &str) -> Result<Option<String>, String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() || name.parse::<Category>().is_ok() {
        return Ok(None);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        return Err(format!("Invalid custom criterion name: {:?}", name));
    }
    Ok(Some(name))
}

fn deserialize_custom<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    let mut custom = BTreeSet::new();
    for name in names {
        if let Some(name) = normalize_custom_name(&name).map_err(serde::de::Error::custom)? {
            custom.insert(name);
        }
    }
    Ok(custom)
}
