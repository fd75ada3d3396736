//! Locator abstraction: one strategy, one value.
//!
//! A [`Locator`] names *how* to find an element. It never holds on to the
//! element itself; the scheduler re-resolves it on every poll tick.
//!
//! Flow documents store locators as single-entry maps (`{css: "#login"}`).
//! [`Locator::from_map`] accepts that shape but rejects maps with zero or
//! several keys instead of silently picking one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::{LocusError, LocusResult};

/// Strategy used to resolve a locator against the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// `name` attribute
    Name,
    /// CSS selector
    Css,
    /// XPath expression
    Xpath,
    /// Exact text of an anchor element
    LinkText,
    /// Tag name
    Tag,
    /// Class name(s)
    Class,
    /// Rendered text
    Text,
}

impl Strategy {
    /// All strategies, in baseline robustness order
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::Name,
        Self::Css,
        Self::Xpath,
        Self::LinkText,
        Self::Tag,
        Self::Class,
        Self::Text,
    ];

    /// Canonical snake_case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Css => "css",
            Self::Xpath => "xpath",
            Self::LinkText => "link_text",
            Self::Tag => "tag",
            Self::Class => "class",
            Self::Text => "text",
        }
    }

    /// Whether an empty value is acceptable for this strategy
    #[must_use]
    pub const fn allows_empty_value(&self) -> bool {
        matches!(self, Self::Tag | Self::Text)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = LocusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "css" | "css_selector" => Ok(Self::Css),
            "xpath" => Ok(Self::Xpath),
            "link_text" | "linktext" | "link" => Ok(Self::LinkText),
            "tag" | "tag_name" => Ok(Self::Tag),
            "class" | "class_name" => Ok(Self::Class),
            "text" => Ok(Self::Text),
            other => Err(LocusError::config(format!(
                "unknown locator strategy: {other:?}"
            ))),
        }
    }
}

/// A (strategy, value) pair identifying how to find an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Resolution strategy
    pub strategy: Strategy,
    /// Strategy-specific value
    pub value: String,
}

impl Locator {
    /// Create a validated locator
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] when `value` is empty for a strategy
    /// that requires one.
    pub fn new(strategy: Strategy, value: impl Into<String>) -> LocusResult<Self> {
        let locator = Self {
            strategy,
            value: value.into(),
        };
        locator.validate()?;
        Ok(locator)
    }

    /// Locate by `id`
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Id, value)
    }

    /// Locate by `name`
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Name, value)
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Css, value)
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Xpath, value)
    }

    /// Locate an anchor by its text
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::LinkText, value)
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Tag, value)
    }

    /// Locate by class name(s)
    #[must_use]
    pub fn class(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Class, value)
    }

    /// Locate by rendered text
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::unchecked(Strategy::Text, value)
    }

    fn unchecked(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Build a locator from a single-entry `{strategy: value}` map
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] for an empty map, a map with more than
    /// one entry, an unknown strategy name, or an empty value.
    pub fn from_map<K, V, I>(entries: I) -> LocusResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut iter = entries.into_iter();
        let Some((key, value)) = iter.next() else {
            return Err(LocusError::config("locator map is empty"));
        };
        let extra = iter.count();
        if extra > 0 {
            return Err(LocusError::config(format!(
                "locator map must have exactly one strategy, found {}",
                extra + 1
            )));
        }
        Self::new(key.as_ref().parse()?, value.as_ref())
    }

    /// Check the locator invariant (non-empty value except tag/text)
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] when the invariant does not hold.
    pub fn validate(&self) -> LocusResult<()> {
        if self.value.trim().is_empty() && !self.strategy.allows_empty_value() {
            return Err(LocusError::config(format!(
                "locator value for strategy '{}' must not be empty",
                self.strategy
            )));
        }
        Ok(())
    }

    /// JavaScript expression evaluating to the first matching node, or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        let v = js_literal(&self.value);
        match self.strategy {
            Strategy::Id => format!("document.getElementById({v})"),
            Strategy::Name => format!("(document.getElementsByName({v})[0] || null)"),
            Strategy::Css => format!("document.querySelector({v})"),
            Strategy::Xpath => format!(
                "document.evaluate({v}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
            Strategy::LinkText => format!(
                "(Array.from(document.querySelectorAll('a')).find(el => (el.textContent || '').trim() === {v}) || null)"
            ),
            Strategy::Tag => format!("(document.getElementsByTagName({v})[0] || null)"),
            Strategy::Class => format!("(document.getElementsByClassName({v})[0] || null)"),
            Strategy::Text => format!(
                "(Array.from(document.querySelectorAll('body *')).find(el => (el.textContent || '').trim() === {v}) || null)"
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.strategy, self.value)
    }
}

/// Quote a string as a JavaScript string literal
pub(crate) fn js_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
