//! Condition Evaluator.
//!
//! Judges one resolved element against one [`WaitCondition`] using probe
//! scripts run through the host. The evaluator never fails: a host error
//! (stale node, detached node, script exception) means "not satisfied yet"
//! and the surrounding poll loop simply tries again on the next tick.

use serde_json::Value;
use tracing::debug;

use crate::condition::WaitCondition;
use crate::host::{ElementHandle, HostError, PageHost};

/// Probe scripts the evaluator sends to the host
///
/// Every script starts with a marker comment so script-only hosts and the
/// mock page can tell probes apart without parsing JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Computed style and box size check, returns a boolean
    Visible,
    /// Visibility, disabled flag and center hit-test, returns a boolean
    Clickable,
    /// Trimmed text content, returns a string
    Text,
    /// Attribute named by `arguments[1]`, returns a string or null
    Attribute,
    /// Caller expression over `el`, returns a boolean
    Custom,
    /// Element snapshot for selector generation, returns an object
    Describe,
}

const VISIBLE_SCRIPT: &str = r"/* locus:visible */
(function(el) {
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
})(arguments[0]);";

const CLICKABLE_SCRIPT: &str = r"/* locus:clickable */
(function(el) {
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) return false;
    if (el.disabled) return false;
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
    return el === hit || el.contains(hit);
})(arguments[0]);";

const TEXT_SCRIPT: &str = r"/* locus:text */
(function(el) {
    return el ? (el.textContent || el.innerText || '').trim() : '';
})(arguments[0]);";

const ATTRIBUTE_SCRIPT: &str = r"/* locus:attribute */
(function(el, name) {
    return el ? el.getAttribute(name) : null;
})(arguments[0], arguments[1]);";

const DESCRIBE_SCRIPT: &str = r"/* locus:describe */
(function(el) {
    if (!el) return null;
    const attributes = {};
    for (const attr of Array.from(el.attributes || [])) {
        attributes[attr.name] = attr.value;
    }
    return {
        tag: el.tagName ? el.tagName.toLowerCase() : '',
        id: el.getAttribute('id'),
        name: el.getAttribute('name'),
        class: el.getAttribute('class'),
        text: (el.textContent || el.innerText || '').trim(),
        attributes: attributes
    };
})(arguments[0]);";

impl Probe {
    /// Marker comment opening the probe's script
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::Visible => "/* locus:visible */",
            Self::Clickable => "/* locus:clickable */",
            Self::Text => "/* locus:text */",
            Self::Attribute => "/* locus:attribute */",
            Self::Custom => "/* locus:custom */",
            Self::Describe => "/* locus:describe */",
        }
    }

    /// Recognise a probe from its script
    #[must_use]
    pub fn identify(script: &str) -> Option<Self> {
        [
            Self::Visible,
            Self::Clickable,
            Self::Text,
            Self::Attribute,
            Self::Custom,
            Self::Describe,
        ]
        .into_iter()
        .find(|probe| script.trim_start().starts_with(probe.marker()))
    }

    /// Script for a fixed probe; `None` for [`Probe::Custom`], see [`custom_script`]
    #[must_use]
    pub const fn script(&self) -> Option<&'static str> {
        match self {
            Self::Visible => Some(VISIBLE_SCRIPT),
            Self::Clickable => Some(CLICKABLE_SCRIPT),
            Self::Text => Some(TEXT_SCRIPT),
            Self::Attribute => Some(ATTRIBUTE_SCRIPT),
            Self::Describe => Some(DESCRIBE_SCRIPT),
            Self::Custom => None,
        }
    }
}

/// Wrap a boolean expression over `el` into a custom probe script
#[must_use]
pub fn custom_script(expression: &str) -> String {
    format!(
        "{}\n(function(el) {{ return Boolean({expression}); }})(arguments[0]);",
        Probe::Custom.marker()
    )
}

/// Expression carried by a custom probe script, if `script` is one
#[must_use]
pub fn custom_expression(script: &str) -> Option<&str> {
    let body = script
        .trim_start()
        .strip_prefix(Probe::Custom.marker())?
        .trim_start();
    let inner = body.strip_prefix("(function(el) { return Boolean(")?;
    let end = inner.rfind("); })(arguments[0]);")?;
    Some(&inner[..end])
}

/// JavaScript-style truthiness of a script result
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Pure judge of (element, condition) pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Create a new evaluator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Judge `element` against `condition`; host errors read as `false`
    pub fn evaluate<H: PageHost + ?Sized>(
        &self,
        host: &H,
        element: &ElementHandle,
        condition: &WaitCondition,
    ) -> bool {
        match self.try_evaluate(host, element, condition) {
            Ok(satisfied) => satisfied,
            Err(err) => {
                debug!(element = %element.id, %condition, error = %err, "evaluation failed, treating as unsatisfied");
                false
            }
        }
    }

    /// Judge `element` against `condition`, surfacing host errors
    ///
    /// # Errors
    ///
    /// Returns the [`HostError`] raised by any probe.
    pub fn try_evaluate<H: PageHost + ?Sized>(
        &self,
        host: &H,
        element: &ElementHandle,
        condition: &WaitCondition,
    ) -> Result<bool, HostError> {
        match condition {
            WaitCondition::Exists => Ok(true),
            WaitCondition::Visible => self.is_visible(host, element),
            WaitCondition::Clickable => {
                let value = host.evaluate_script(CLICKABLE_SCRIPT, element, &[])?;
                Ok(truthy(&value))
            }
            WaitCondition::Invisible => self.is_visible(host, element).map(|visible| !visible),
            WaitCondition::TextContains(expected) => {
                Ok(self.text(host, element)?.contains(expected.as_str()))
            }
            WaitCondition::TextEquals(expected) => Ok(self.text(host, element)? == *expected),
            WaitCondition::TextMatches(pattern) => Ok(pattern.is_match(&self.text(host, element)?)),
            WaitCondition::AttrContains { name, value } => {
                Ok(self.attribute(host, element, name)?.contains(value.as_str()))
            }
            WaitCondition::AttrEquals { name, value } => {
                Ok(self.attribute(host, element, name)? == *value)
            }
            WaitCondition::AttrMatches { name, pattern } => {
                Ok(pattern.is_match(&self.attribute(host, element, name)?))
            }
            WaitCondition::Custom(expression) => {
                let value = host.evaluate_script(&custom_script(expression), element, &[])?;
                Ok(truthy(&value))
            }
        }
    }

    fn is_visible<H: PageHost + ?Sized>(
        &self,
        host: &H,
        element: &ElementHandle,
    ) -> Result<bool, HostError> {
        let value = host.evaluate_script(VISIBLE_SCRIPT, element, &[])?;
        Ok(truthy(&value))
    }

    /// Trimmed rendered text of `element`
    ///
    /// # Errors
    ///
    /// Returns the [`HostError`] raised by the text probe.
    pub fn text<H: PageHost + ?Sized>(
        &self,
        host: &H,
        element: &ElementHandle,
    ) -> Result<String, HostError> {
        let value = host.evaluate_script(TEXT_SCRIPT, element, &[])?;
        Ok(text_of(value).trim().to_string())
    }

    /// Current value of attribute `name`, empty when absent
    ///
    /// # Errors
    ///
    /// Returns the [`HostError`] raised by the attribute probe.
    pub fn attribute<H: PageHost + ?Sized>(
        &self,
        host: &H,
        element: &ElementHandle,
        name: &str,
    ) -> Result<String, HostError> {
        let value =
            host.evaluate_script(ATTRIBUTE_SCRIPT, element, &[Value::String(name.to_string())])?;
        Ok(text_of(value))
    }
}
