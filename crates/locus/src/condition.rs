//! Wait conditions.
//!
//! [`WaitCondition`] is a sum type: each variant carries exactly the
//! parameters it needs, so a typed caller cannot forget a pattern or an
//! attribute name. Callers holding untyped input (a condition name plus a
//! [`ConditionParams`] bag, as stored in flow documents) go through
//! [`WaitCondition::from_parts`], which is where missing parameters and bad
//! regular expressions become configuration errors, before any polling.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::{LocusError, LocusResult};

/// The closed set of condition names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Element resolves
    Exists,
    /// Element is rendered with a non-empty box
    Visible,
    /// Visible, enabled and not covered at its center
    Clickable,
    /// Element is absent or not visible
    Invisible,
    /// Trimmed text contains a string
    TextContains,
    /// Trimmed text equals a string
    TextEquals,
    /// Trimmed text has a regex match
    TextMatches,
    /// Attribute value contains a string
    AttrContains,
    /// Attribute value equals a string
    AttrEquals,
    /// Attribute value has a regex match
    AttrMatches,
    /// Caller-supplied boolean script expression
    Custom,
}

impl ConditionKind {
    /// Snake_case name used in flow documents
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Invisible => "invisible",
            Self::TextContains => "text_contains",
            Self::TextEquals => "text_equals",
            Self::TextMatches => "text_matches",
            Self::AttrContains => "attr_contains",
            Self::AttrEquals => "attr_equals",
            Self::AttrMatches => "attr_matches",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = LocusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "exists" => Self::Exists,
            "visible" => Self::Visible,
            "clickable" => Self::Clickable,
            "invisible" => Self::Invisible,
            "text_contains" => Self::TextContains,
            "text_equals" => Self::TextEquals,
            "text_matches" => Self::TextMatches,
            "attr_contains" => Self::AttrContains,
            "attr_equals" => Self::AttrEquals,
            "attr_matches" => Self::AttrMatches,
            "custom" => Self::Custom,
            _ => {
                return Err(LocusError::config(format!(
                    "invalid wait condition: {s:?}"
                )))
            }
        };
        Ok(kind)
    }
}

/// Untyped parameter bag, keyed the way flow documents store it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionParams {
    /// Expected text for `text_contains` / `text_equals`
    pub text: Option<String>,
    /// Regular expression for `text_matches` / `attr_matches`
    pub pattern: Option<String>,
    /// Attribute name for the `attr_*` conditions
    pub attr_name: Option<String>,
    /// Expected attribute value for `attr_contains` / `attr_equals`
    pub value: Option<String>,
    /// Boolean script expression over `el` for `custom`
    pub js_condition: Option<String>,
}

/// A compiled regular expression with value semantics
#[derive(Debug, Clone)]
pub struct TextPattern(Regex);

impl TextPattern {
    /// Compile a pattern
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] when the pattern is empty or invalid.
    pub fn new(pattern: &str) -> LocusResult<Self> {
        if pattern.is_empty() {
            return Err(LocusError::config("regular expression must not be empty"));
        }
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| LocusError::config(format!("invalid regular expression: {e}")))
    }

    /// Search (not full-match) semantics
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }

    /// Source text of the pattern
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TextPattern {}

/// A condition an element must satisfy, with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// Element resolves
    Exists,
    /// Element is rendered with a non-empty box
    Visible,
    /// Visible, enabled and the topmost node at its center
    Clickable,
    /// Element is absent or not visible
    Invisible,
    /// Trimmed text contains the string
    TextContains(String),
    /// Trimmed text equals the string
    TextEquals(String),
    /// Trimmed text has a match for the pattern
    TextMatches(TextPattern),
    /// Attribute value contains `value` (missing attribute reads as "")
    AttrContains {
        /// Attribute name
        name: String,
        /// Expected substring
        value: String,
    },
    /// Attribute value equals `value` (missing attribute reads as "")
    AttrEquals {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// Attribute value has a match for the pattern
    AttrMatches {
        /// Attribute name
        name: String,
        /// Pattern
        pattern: TextPattern,
    },
    /// Boolean script expression evaluated with `el` bound to the element
    Custom(String),
}

impl WaitCondition {
    /// Text contains `text`
    #[must_use]
    pub fn text_contains(text: impl Into<String>) -> Self {
        Self::TextContains(text.into())
    }

    /// Text equals `text`
    #[must_use]
    pub fn text_equals(text: impl Into<String>) -> Self {
        Self::TextEquals(text.into())
    }

    /// Text matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] for an empty or invalid pattern.
    pub fn text_matches(pattern: &str) -> LocusResult<Self> {
        Ok(Self::TextMatches(TextPattern::new(pattern)?))
    }

    /// Attribute `name` contains `value`
    #[must_use]
    pub fn attr_contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttrContains {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute `name` equals `value`
    #[must_use]
    pub fn attr_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttrEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute `name` matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] for an empty or invalid pattern.
    pub fn attr_matches(name: impl Into<String>, pattern: &str) -> LocusResult<Self> {
        Ok(Self::AttrMatches {
            name: name.into(),
            pattern: TextPattern::new(pattern)?,
        })
    }

    /// Custom script expression over `el`
    #[must_use]
    pub fn custom(expression: impl Into<String>) -> Self {
        Self::Custom(expression.into())
    }

    /// Build a typed condition from a kind and a parameter bag
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] when a parameter the kind requires is
    /// missing or empty, or a pattern does not compile.
    pub fn from_parts(kind: ConditionKind, params: &ConditionParams) -> LocusResult<Self> {
        let condition = match kind {
            ConditionKind::Exists => Self::Exists,
            ConditionKind::Visible => Self::Visible,
            ConditionKind::Clickable => Self::Clickable,
            ConditionKind::Invisible => Self::Invisible,
            ConditionKind::TextContains => {
                Self::TextContains(required(kind, "text", params.text.as_ref(), true)?)
            }
            ConditionKind::TextEquals => {
                Self::TextEquals(required(kind, "text", params.text.as_ref(), true)?)
            }
            ConditionKind::TextMatches => {
                let pattern = required(kind, "pattern", params.pattern.as_ref(), false)?;
                Self::TextMatches(TextPattern::new(&pattern)?)
            }
            ConditionKind::AttrContains => Self::AttrContains {
                name: required(kind, "attr_name", params.attr_name.as_ref(), false)?,
                value: required(kind, "value", params.value.as_ref(), true)?,
            },
            ConditionKind::AttrEquals => Self::AttrEquals {
                name: required(kind, "attr_name", params.attr_name.as_ref(), false)?,
                value: required(kind, "value", params.value.as_ref(), true)?,
            },
            ConditionKind::AttrMatches => {
                let name = required(kind, "attr_name", params.attr_name.as_ref(), false)?;
                let pattern = required(kind, "pattern", params.pattern.as_ref(), false)?;
                Self::AttrMatches {
                    name,
                    pattern: TextPattern::new(&pattern)?,
                }
            }
            ConditionKind::Custom => {
                Self::Custom(required(kind, "js_condition", params.js_condition.as_ref(), false)?)
            }
        };
        Ok(condition)
    }

    /// Parse a condition name and validate its parameters
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] for an unknown name or invalid parameters.
    pub fn parse(name: &str, params: &ConditionParams) -> LocusResult<Self> {
        Self::from_parts(name.parse()?, params)
    }

    /// The condition's kind
    #[must_use]
    pub const fn kind(&self) -> ConditionKind {
        match self {
            Self::Exists => ConditionKind::Exists,
            Self::Visible => ConditionKind::Visible,
            Self::Clickable => ConditionKind::Clickable,
            Self::Invisible => ConditionKind::Invisible,
            Self::TextContains(_) => ConditionKind::TextContains,
            Self::TextEquals(_) => ConditionKind::TextEquals,
            Self::TextMatches(_) => ConditionKind::TextMatches,
            Self::AttrContains { .. } => ConditionKind::AttrContains,
            Self::AttrEquals { .. } => ConditionKind::AttrEquals,
            Self::AttrMatches { .. } => ConditionKind::AttrMatches,
            Self::Custom(_) => ConditionKind::Custom,
        }
    }
}

fn required(
    kind: ConditionKind,
    key: &str,
    value: Option<&String>,
    allow_empty: bool,
) -> LocusResult<String> {
    match value {
        Some(v) if allow_empty || !v.is_empty() => Ok(v.clone()),
        _ => Err(LocusError::config(format!(
            "condition '{kind}' requires parameter '{key}'"
        ))),
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("to exist"),
            Self::Visible => f.write_str("to be visible"),
            Self::Clickable => f.write_str("to be clickable"),
            Self::Invisible => f.write_str("to be invisible"),
            Self::TextContains(t) => write!(f, "text to contain '{t}'"),
            Self::TextEquals(t) => write!(f, "text to equal '{t}'"),
            Self::TextMatches(p) => write!(f, "text to match /{}/", p.as_str()),
            Self::AttrContains { name, value } => write!(f, "@{name} to contain '{value}'"),
            Self::AttrEquals { name, value } => write!(f, "@{name} to equal '{value}'"),
            Self::AttrMatches { name, pattern } => {
                write!(f, "@{name} to match /{}/", pattern.as_str())
            }
            Self::Custom(expr) => write!(f, "custom condition `{expr}`"),
        }
    }
}

/// Action categories understood by smart waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// click, double_click, right_click
    Click,
    /// input, type, send_keys
    Input,
    /// hover, mouse_over
    Hover,
    /// select, dropdown
    Select,
    /// drag, drag_and_drop
    Drag,
    /// Anything else
    Other,
}

impl ActionKind {
    /// Map an action name to its family; unknown names are [`ActionKind::Other`]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "click" | "double_click" | "right_click" => Self::Click,
            "input" | "type" | "send_keys" => Self::Input,
            "hover" | "mouse_over" => Self::Hover,
            "select" | "dropdown" => Self::Select,
            "drag" | "drag_and_drop" => Self::Drag,
            _ => Self::Other,
        }
    }

    /// Fixed condition table used by smart waiting
    #[must_use]
    pub fn required_condition(&self) -> WaitCondition {
        match self {
            Self::Click => WaitCondition::Clickable,
            Self::Input | Self::Hover | Self::Select | Self::Drag => WaitCondition::Visible,
            Self::Other => WaitCondition::Exists,
        }
    }
}
