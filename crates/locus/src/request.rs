//! Declarative wait requests.
//!
//! Flow documents store a wait step as a loose map:
//!
//! ```yaml
//! selector: {css: "#login"}
//! condition: visible
//! timeout: 10.0
//! check_interval: 0.5
//! ```
//!
//! [`WaitRequest`] mirrors that document shape. [`WaitRequest::plan`] turns it
//! into a typed [`WaitPlan`] or rejects it with a configuration error, so a
//! malformed step fails before any polling starts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::condition::{ActionKind, ConditionParams, WaitCondition};
use crate::host::{ElementHandle, PageHost};
use crate::locator::Locator;
use crate::result::{LocusError, LocusResult};
use crate::wait::{
    ElementWaiter, WaitOptions, WaitOutcome, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Parse a JSON or YAML document
///
/// Documents whose first non-blank character is `{` or `[` are read as JSON,
/// everything else as YAML.
///
/// # Errors
///
/// Returns [`LocusError::Json`] or [`LocusError::Yaml`] when the document
/// is malformed.
pub fn parse_document<T: DeserializeOwned>(source: &str) -> LocusResult<T> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Ok(serde_json::from_str(trimmed)?)
    } else {
        Ok(serde_yaml_ng::from_str(source)?)
    }
}

#[allow(clippy::cast_precision_loss)]
fn default_timeout_secs() -> f64 {
    DEFAULT_WAIT_TIMEOUT_MS as f64 / 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn default_interval_secs() -> f64 {
    DEFAULT_POLL_INTERVAL_MS as f64 / 1000.0
}

/// How a multi-locator request is satisfied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every locator in the same tick
    #[default]
    All,
    /// The first locator in list order
    Any,
}

/// A wait step as stored in a flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitRequest {
    /// Single `{strategy: value}` locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<BTreeMap<String, String>>,
    /// Several locators, combined according to `match`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<BTreeMap<String, String>>,
    /// Combination mode for `selectors`
    #[serde(default, rename = "match")]
    pub match_mode: MatchMode,
    /// Condition name, e.g. `visible` or `text_contains`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Action name for smart waiting, e.g. `click`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout: f64,
    /// Poll interval in seconds
    #[serde(default = "default_interval_secs")]
    pub check_interval: f64,
    /// Condition parameters
    #[serde(default)]
    pub params: ConditionParams,
}

impl WaitRequest {
    /// Parse a request from a JSON or YAML document
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Json`] or [`LocusError::Yaml`] when the document
    /// is malformed.
    pub fn from_document(source: &str) -> LocusResult<Self> {
        parse_document(source)
    }

    /// Validate into a typed plan
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] when the selector shape, the condition,
    /// its parameters or the timing values are invalid.
    pub fn plan(&self) -> LocusResult<WaitPlan> {
        let options = WaitOptions::new()
            .with_timeout(seconds_to_ms("timeout", self.timeout)?)
            .with_poll_interval(seconds_to_ms("check_interval", self.check_interval)?);
        options.validate()?;

        let target = match (&self.selector, self.selectors.is_empty()) {
            (Some(_), false) => {
                return Err(LocusError::config(
                    "use either 'selector' or 'selectors', not both",
                ))
            }
            (None, true) => return Err(LocusError::config("request has no selector")),
            (Some(map), true) => Target::One(Locator::from_map(map)?),
            (None, false) => {
                let locators = self
                    .selectors
                    .iter()
                    .map(Locator::from_map)
                    .collect::<LocusResult<Vec<_>>>()?;
                match self.match_mode {
                    MatchMode::All => Target::All(locators),
                    MatchMode::Any => Target::Any(locators),
                }
            }
        };

        let condition = match (&self.action, &self.condition) {
            (Some(_), Some(_)) => {
                return Err(LocusError::config(
                    "'action' and 'condition' are mutually exclusive",
                ))
            }
            (Some(action), None) => {
                if !matches!(target, Target::One(_)) {
                    return Err(LocusError::config(
                        "smart waiting takes a single selector",
                    ));
                }
                ActionKind::from_name(action).required_condition()
            }
            (None, Some(name)) => WaitCondition::parse(name, &self.params)?,
            (None, None) => {
                return Err(LocusError::config(
                    "request needs a 'condition' or an 'action'",
                ))
            }
        };

        Ok(WaitPlan {
            target,
            condition,
            options,
        })
    }
}

fn seconds_to_ms(field: &str, seconds: f64) -> LocusResult<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(LocusError::config(format!(
            "'{field}' must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok((seconds * 1000.0).round() as u64)
}

/// What a plan waits on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single locator
    One(Locator),
    /// Every locator simultaneously
    All(Vec<Locator>),
    /// The first satisfying locator
    Any(Vec<Locator>),
}

/// A validated, typed wait request
#[derive(Debug, Clone)]
pub struct WaitPlan {
    /// Locators to resolve
    pub target: Target,
    /// Condition to hold
    pub condition: WaitCondition,
    /// Timing
    pub options: WaitOptions,
}

impl WaitPlan {
    /// Run the plan; the success value lists the matched elements in
    /// locator order (empty for an `invisible` wait on a missing element)
    pub fn run<H: PageHost>(&self, waiter: &ElementWaiter<H>) -> WaitOutcome<Vec<ElementHandle>> {
        debug!(condition = %self.condition, timeout_ms = self.options.timeout_ms, "running wait plan");
        match &self.target {
            Target::One(locator) => waiter
                .wait_for_element(locator, &self.condition, &self.options)
                .map(|element| element.into_iter().collect()),
            Target::All(locators) => {
                waiter.wait_for_all_elements(locators, &self.condition, &self.options)
            }
            Target::Any(locators) => waiter
                .wait_for_any_element(locators, &self.condition, &self.options)
                .map(|(_, element)| vec![element]),
        }
    }
}
