//! Selector Evaluator.
//!
//! Scores a (strategy, value) pair for robustness. Higher is more robust.
//! Each strategy has a baseline weight; a few strategies then run an ordered
//! chain of guard clauses where the first matching rule returns, so later
//! rules never see its adjustment. Scoring is pure and deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::{Locator, Strategy};

/// A locator annotated with a robustness score and a rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredSelector {
    /// The scored locator
    pub locator: Locator,
    /// Robustness score, nominally 0..=12
    pub score: i32,
    /// Human-readable explanation of the score
    pub rationale: String,
}

impl fmt::Display for ScoredSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.locator, self.score, self.rationale)
    }
}

/// Baseline robustness weight of a strategy
#[must_use]
pub const fn base_weight(strategy: Strategy) -> i32 {
    match strategy {
        Strategy::Id => 10,
        Strategy::Name => 8,
        Strategy::Css => 7,
        Strategy::Xpath => 6,
        Strategy::LinkText => 5,
        Strategy::Tag | Strategy::Class => 3,
        Strategy::Text => 2,
    }
}

/// Score `value` under `strategy`
#[must_use]
pub fn score(strategy: Strategy, value: &str) -> ScoredSelector {
    let (score, rationale) = rate(strategy, value);
    ScoredSelector {
        locator: Locator {
            strategy,
            value: value.to_string(),
        },
        score,
        rationale,
    }
}

/// Score an existing locator
#[must_use]
pub fn score_locator(locator: &Locator) -> ScoredSelector {
    score(locator.strategy, &locator.value)
}

fn rate(strategy: Strategy, value: &str) -> (i32, String) {
    let base = base_weight(strategy);
    match strategy {
        Strategy::Id => rate_id(base, value),
        Strategy::Xpath => rate_xpath(base, value),
        Strategy::Css => rate_css(base, value),
        Strategy::Class => rate_class(base, value),
        Strategy::Name | Strategy::LinkText | Strategy::Tag | Strategy::Text => {
            (base, format!("robustness of this strategy is {base}/10"))
        }
    }
}

fn rate_id(base: i32, value: &str) -> (i32, String) {
    if value.ends_with(|c: char| c.is_ascii_digit()) {
        return (
            base - 2,
            "id ends in digits and may be generated dynamically, unstable".into(),
        );
    }
    (base, "id selectors are usually the most reliable choice".into())
}

fn rate_xpath(base: i32, value: &str) -> (i32, String) {
    let mut score = base;
    if value.contains("//") {
        score -= 1;
    }
    if value.contains("contains(") {
        score += 1;
    }
    if value.matches('/').count() > 5 {
        return (
            score - 2,
            "XPath path is too long and breaks when the DOM structure changes".into(),
        );
    }
    if value.contains("@id") || value.contains("@name") {
        return (
            score + 2,
            "XPath anchored on an id or name attribute is relatively stable".into(),
        );
    }
    (
        score,
        "XPath is reliable while the DOM structure stays stable".into(),
    )
}

fn rate_css(base: i32, value: &str) -> (i32, String) {
    if value.contains('#') {
        return (base + 2, "CSS selector based on id, reliable".into());
    }
    if child_combinators(value) > 3 {
        return (
            base - 2,
            "CSS selector chain is too long and breaks when the DOM structure changes".into(),
        );
    }
    if value.contains('[') && value.contains(']') {
        return (base + 1, "attribute selector improves robustness".into());
    }
    (
        base,
        "CSS selector is reliable while the DOM structure stays stable".into(),
    )
}

fn rate_class(base: i32, value: &str) -> (i32, String) {
    if value.split_whitespace().count() > 2 {
        return (
            base + 1,
            "multiple classes improve specificity but remain coupled to styling".into(),
        );
    }
    (
        base,
        "class selectors are coupled to styling, pair them with another strategy".into(),
    )
}

/// Count `>` combinators outside attribute brackets and quoted strings
fn child_combinators(selector: &str) -> usize {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in selector.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}
