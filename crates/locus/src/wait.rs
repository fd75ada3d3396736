//! Polling Scheduler.
//!
//! Blocking, single-threaded wait loops in the shape of
//! `while start.elapsed() < timeout { check; sleep }`. Every tick re-resolves
//! each locator from scratch with a zero host-side wait, so a node replaced
//! between ticks is never judged through a stale handle.
//!
//! Outcomes are values, not errors: a timeout or a cancellation is reported
//! through [`WaitOutcome`], and only malformed input short-circuits as
//! [`WaitOutcome::ConfigError`] before the first tick.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::condition::{ActionKind, ConditionParams, WaitCondition};
use crate::evaluator::ConditionEvaluator;
use crate::host::{ElementHandle, HostError, PageHost};
use crate::locator::Locator;
use crate::result::{LocusError, LocusResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Granularity at which a sleeping wait notices cancellation
const CANCEL_CHECK_MS: u64 = 10;

// =============================================================================
// CANCELLATION
// =============================================================================

/// Shared flag that aborts in-flight waits
///
/// Clones share the same flag. Cancellation is sticky: once set, every wait
/// observing the token resolves to [`WaitOutcome::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Optional cancellation token checked every tick
    pub cancel: Option<CancelToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            cancel: None,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the options can drive a poll loop
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Config`] for a zero poll interval.
    pub fn validate(&self) -> LocusResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(LocusError::config("poll interval must be greater than zero"));
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

// =============================================================================
// WAIT OUTCOME
// =============================================================================

/// Diagnostics attached to every polled outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitReport {
    /// What was waited for, e.g. `css='#login' to be visible`
    pub waited_for: String,
    /// Number of resolve+evaluate ticks performed
    pub attempts: u32,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Configured deadline
    pub timeout: Duration,
}

impl WaitReport {
    /// Human-readable timeout message
    #[must_use]
    pub fn timeout_message(&self) -> String {
        format!("timed out waiting for {}", self.waited_for)
    }
}

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome<T> {
    /// The condition held within the deadline
    Success(T, WaitReport),
    /// The deadline elapsed first
    Timeout(WaitReport),
    /// The cancel token was triggered first
    Cancelled(WaitReport),
    /// The request was malformed; no tick was performed
    ConfigError(String),
}

impl<T> WaitOutcome<T> {
    /// Whether the wait succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(..))
    }

    /// Whether the deadline elapsed
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether the wait was cancelled
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Whether the request was rejected before polling
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }

    /// Value produced on success
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value, _) => Some(value),
            _ => None,
        }
    }

    /// Diagnostics, absent for config errors
    #[must_use]
    pub const fn report(&self) -> Option<&WaitReport> {
        match self {
            Self::Success(_, report) | Self::Timeout(report) | Self::Cancelled(report) => {
                Some(report)
            }
            Self::ConfigError(_) => None,
        }
    }

    /// Transform the success value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WaitOutcome<U> {
        match self {
            Self::Success(value, report) => WaitOutcome::Success(f(value), report),
            Self::Timeout(report) => WaitOutcome::Timeout(report),
            Self::Cancelled(report) => WaitOutcome::Cancelled(report),
            Self::ConfigError(message) => WaitOutcome::ConfigError(message),
        }
    }

    /// Lift into a [`LocusResult`] for `?` propagation
    ///
    /// # Errors
    ///
    /// Timeout, cancellation and config errors map to the matching
    /// [`LocusError`] variant.
    pub fn into_result(self) -> LocusResult<T> {
        match self {
            Self::Success(value, _) => Ok(value),
            Self::Timeout(report) => Err(LocusError::Timeout {
                ms: millis(report.timeout),
                waited_for: report.waited_for,
            }),
            Self::Cancelled(report) => Err(LocusError::Cancelled {
                after_ms: millis(report.elapsed),
            }),
            Self::ConfigError(message) => Err(LocusError::Config { message }),
        }
    }
}

impl<T> fmt::Display for WaitOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(_, report) => write!(
                f,
                "{} after {}ms ({} attempts)",
                report.waited_for,
                millis(report.elapsed),
                report.attempts
            ),
            Self::Timeout(report) => f.write_str(&report.timeout_message()),
            Self::Cancelled(report) => write!(
                f,
                "cancelled waiting for {} after {}ms",
                report.waited_for,
                millis(report.elapsed)
            ),
            Self::ConfigError(message) => write!(f, "invalid wait request: {message}"),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn describe_all(locators: &[Locator], condition: &WaitCondition, joiner: &str) -> String {
    let names: Vec<String> = locators.iter().map(ToString::to_string).collect();
    format!("{} {condition}", names.join(joiner))
}

// =============================================================================
// ELEMENT WAITER
// =============================================================================

/// Drives locate+evaluate attempts against a [`PageHost`] under a deadline
#[derive(Debug, Clone)]
pub struct ElementWaiter<H> {
    host: H,
    evaluator: ConditionEvaluator,
}

impl<H: PageHost> ElementWaiter<H> {
    /// Create a waiter over `host`
    pub const fn new(host: H) -> Self {
        Self {
            host,
            evaluator: ConditionEvaluator::new(),
        }
    }

    /// The underlying host
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Wait until `locator` resolves to an element satisfying `condition`.
    ///
    /// For [`WaitCondition::Invisible`] an unresolved locator succeeds at
    /// once with `None`. Every other condition requires a resolved element.
    pub fn wait_for_element(
        &self,
        locator: &Locator,
        condition: &WaitCondition,
        options: &WaitOptions,
    ) -> WaitOutcome<Option<ElementHandle>> {
        if let Err(err) = locator.validate() {
            return reject(&err);
        }
        let waited_for = format!("{locator} {condition}");
        poll(waited_for, options, || {
            match self.host.locate(locator, Duration::ZERO) {
                Ok(None) if matches!(condition, WaitCondition::Invisible) => Some(None),
                Ok(None) => {
                    trace!(%locator, "not resolved yet");
                    None
                }
                Ok(Some(element)) => self
                    .evaluator
                    .evaluate(&self.host, &element, condition)
                    .then_some(Some(element)),
                Err(err) => {
                    swallow(locator, &err);
                    None
                }
            }
        })
    }

    /// Like [`wait_for_element`](Self::wait_for_element), parsing the
    /// condition from its name and parameter bag first.
    ///
    /// An unknown name or a missing parameter is returned as
    /// [`WaitOutcome::ConfigError`] without polling.
    pub fn wait_for(
        &self,
        locator: &Locator,
        condition: &str,
        params: &ConditionParams,
        options: &WaitOptions,
    ) -> WaitOutcome<Option<ElementHandle>> {
        match WaitCondition::parse(condition, params) {
            Ok(condition) => self.wait_for_element(locator, &condition, options),
            Err(err) => reject(&err),
        }
    }

    /// Wait until every locator satisfies `condition` within one tick.
    ///
    /// Each tick snapshots all locators in order; the first one that fails to
    /// resolve or to satisfy the condition ends the tick. Partial progress is
    /// not carried over.
    pub fn wait_for_all_elements(
        &self,
        locators: &[Locator],
        condition: &WaitCondition,
        options: &WaitOptions,
    ) -> WaitOutcome<Vec<ElementHandle>> {
        if let Err(err) = validate_list(locators) {
            return reject(&err);
        }
        let waited_for = describe_all(locators, condition, " and ");
        poll(waited_for, options, || {
            let mut elements = Vec::with_capacity(locators.len());
            for locator in locators {
                let element = match self.host.locate(locator, Duration::ZERO) {
                    Ok(Some(element)) => element,
                    Ok(None) => return None,
                    Err(err) => {
                        swallow(locator, &err);
                        return None;
                    }
                };
                if !self.evaluator.evaluate(&self.host, &element, condition) {
                    return None;
                }
                elements.push(element);
            }
            Some(elements)
        })
    }

    /// Wait until any locator satisfies `condition`.
    ///
    /// Locators are scanned in order and the first satisfying one wins the
    /// tick. Unresolved or failing locators are skipped. The success value is
    /// the winning index and its element.
    pub fn wait_for_any_element(
        &self,
        locators: &[Locator],
        condition: &WaitCondition,
        options: &WaitOptions,
    ) -> WaitOutcome<(usize, ElementHandle)> {
        if let Err(err) = validate_list(locators) {
            return reject(&err);
        }
        let waited_for = describe_all(locators, condition, " or ");
        poll(waited_for, options, || {
            locators.iter().enumerate().find_map(|(index, locator)| {
                match self.host.locate(locator, Duration::ZERO) {
                    Ok(Some(element)) => self
                        .evaluator
                        .evaluate(&self.host, &element, condition)
                        .then_some((index, element)),
                    Ok(None) => None,
                    Err(err) => {
                        swallow(locator, &err);
                        None
                    }
                }
            })
        })
    }

    /// Wait until `predicate` holds for the element `locator` resolves to.
    ///
    /// The predicate receives the host so it can run its own probes; any
    /// [`HostError`] it returns counts as "not yet".
    pub fn wait_with_custom_condition<F>(
        &self,
        locator: &Locator,
        mut predicate: F,
        options: &WaitOptions,
    ) -> WaitOutcome<ElementHandle>
    where
        F: FnMut(&H, &ElementHandle) -> Result<bool, HostError>,
    {
        if let Err(err) = locator.validate() {
            return reject(&err);
        }
        let waited_for = format!("{locator} to satisfy custom predicate");
        poll(waited_for, options, || {
            let element = match self.host.locate(locator, Duration::ZERO) {
                Ok(Some(element)) => element,
                Ok(None) => return None,
                Err(err) => {
                    swallow(locator, &err);
                    return None;
                }
            };
            match predicate(&self.host, &element) {
                Ok(true) => Some(element),
                Ok(false) => None,
                Err(err) => {
                    swallow(locator, &err);
                    None
                }
            }
        })
    }

    /// Wait for the condition an action of kind `action` needs.
    ///
    /// click-family waits for Clickable; input, hover, select and drag
    /// families wait for Visible; anything else waits for Exists.
    pub fn smart_wait(
        &self,
        locator: &Locator,
        action: ActionKind,
        options: &WaitOptions,
    ) -> WaitOutcome<Option<ElementHandle>> {
        let condition = action.required_condition();
        debug!(%locator, ?action, %condition, "smart wait");
        self.wait_for_element(locator, &condition, options)
    }
}

fn poll<T>(
    waited_for: String,
    options: &WaitOptions,
    mut attempt: impl FnMut() -> Option<T>,
) -> WaitOutcome<T> {
    if let Err(err) = options.validate() {
        return reject(&err);
    }

    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();
    let mut attempts = 0_u32;
    let report = |attempts: u32| WaitReport {
        waited_for: waited_for.clone(),
        attempts,
        elapsed: start.elapsed(),
        timeout,
    };

    while start.elapsed() < timeout {
        if options.is_cancelled() {
            let report = report(attempts);
            info!(waited_for = %report.waited_for, attempts, elapsed_ms = millis(report.elapsed), "wait cancelled");
            return WaitOutcome::Cancelled(report);
        }

        attempts += 1;
        trace!(waited_for = %waited_for, attempt = attempts, "poll tick");
        if let Some(value) = attempt() {
            let report = report(attempts);
            info!(waited_for = %report.waited_for, attempts, elapsed_ms = millis(report.elapsed), "wait satisfied");
            return WaitOutcome::Success(value, report);
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break;
        }
        pause(poll_interval.min(remaining), options.cancel.as_ref());
    }

    let report = report(attempts);
    if options.is_cancelled() {
        info!(waited_for = %report.waited_for, attempts, elapsed_ms = millis(report.elapsed), "wait cancelled");
        return WaitOutcome::Cancelled(report);
    }
    warn!(waited_for = %report.waited_for, attempts, elapsed_ms = millis(report.elapsed), "wait timed out");
    WaitOutcome::Timeout(report)
}

fn validate_list(locators: &[Locator]) -> LocusResult<()> {
    if locators.is_empty() {
        return Err(LocusError::config("locator list is empty"));
    }
    locators.iter().try_for_each(Locator::validate)
}

fn reject<T>(err: &LocusError) -> WaitOutcome<T> {
    warn!(error = %err, "wait request rejected");
    WaitOutcome::ConfigError(err.to_string())
}

fn swallow(locator: &Locator, err: &HostError) {
    debug!(%locator, error = %err, "host error during poll, retrying");
}

fn pause(duration: Duration, cancel: Option<&CancelToken>) {
    let Some(token) = cancel else {
        std::thread::sleep(duration);
        return;
    };
    let deadline = Instant::now() + duration;
    let slice = Duration::from_millis(CANCEL_CHECK_MS);
    loop {
        if token.is_cancelled() {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(slice));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage, Mutation};

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(200).with_poll_interval(10)
    }

    // =========================================================================
    // WaitOptions Tests
    // =========================================================================

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, 10_000);
            assert_eq!(options.poll_interval_ms, 500);
            assert!(options.cancel.is_none());
        }

        #[test]
        fn test_builder() {
            let options = WaitOptions::new().with_timeout(5000).with_poll_interval(100);
            assert_eq!(options.timeout(), Duration::from_secs(5));
            assert_eq!(options.poll_interval(), Duration::from_millis(100));
        }

        #[test]
        fn test_zero_interval_rejected() {
            let err = WaitOptions::new().with_poll_interval(0).validate().unwrap_err();
            assert!(matches!(err, LocusError::Config { .. }));
        }

        #[test]
        fn test_cancel_token_shared_between_clones() {
            let token = CancelToken::new();
            let clone = token.clone();
            assert!(!clone.is_cancelled());
            token.cancel();
            assert!(clone.is_cancelled());
        }
    }

    // =========================================================================
    // WaitOutcome Tests
    // =========================================================================

    mod outcome_tests {
        use super::*;

        fn report() -> WaitReport {
            WaitReport {
                waited_for: "css='#login' to be visible".into(),
                attempts: 3,
                elapsed: Duration::from_millis(1020),
                timeout: Duration::from_secs(1),
            }
        }

        #[test]
        fn test_timeout_message() {
            let outcome: WaitOutcome<()> = WaitOutcome::Timeout(report());
            assert_eq!(
                outcome.to_string(),
                "timed out waiting for css='#login' to be visible"
            );
        }

        #[test]
        fn test_into_result_timeout() {
            let err = WaitOutcome::<()>::Timeout(report()).into_result().unwrap_err();
            match err {
                LocusError::Timeout { ms, waited_for } => {
                    assert_eq!(ms, 1000);
                    assert!(waited_for.contains("#login"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_into_result_cancelled_and_config() {
            let err = WaitOutcome::<()>::Cancelled(report()).into_result().unwrap_err();
            assert!(matches!(err, LocusError::Cancelled { after_ms: 1020 }));
            let err = WaitOutcome::<()>::ConfigError("bad".into())
                .into_result()
                .unwrap_err();
            assert!(matches!(err, LocusError::Config { .. }));
        }

        #[test]
        fn test_map_and_accessors() {
            let outcome = WaitOutcome::Success(2, report()).map(|n| n * 21);
            assert!(outcome.is_success());
            assert_eq!(outcome.value(), Some(&42));
            assert_eq!(outcome.report().unwrap().attempts, 3);
            assert!(WaitOutcome::<u8>::ConfigError("x".into()).report().is_none());
        }
    }

    // =========================================================================
    // Single Element Tests
    // =========================================================================

    mod single_element_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let page = MockPage::new();
            page.insert(Locator::id("ok"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::id("ok"),
                &WaitCondition::Exists,
                &WaitOptions::new().with_timeout(5000),
            );
            assert!(outcome.is_success());
            let report = outcome.report().unwrap();
            assert_eq!(report.attempts, 1);
            assert!(report.elapsed < Duration::from_millis(500));
        }

        #[test]
        fn test_never_resolves_times_out() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::css("#missing"),
                &WaitCondition::Visible,
                &WaitOptions::new().with_timeout(100).with_poll_interval(30),
            );
            assert!(outcome.is_timeout());
            let report = outcome.report().unwrap();
            assert!(report.elapsed >= Duration::from_millis(100));
            assert!(report.elapsed < Duration::from_millis(130 + 50));
            assert_eq!(
                outcome.to_string(),
                "timed out waiting for css='#missing' to be visible"
            );
        }

        #[test]
        fn test_invisible_on_missing_element_succeeds_with_none() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::id("spinner"),
                &WaitCondition::Invisible,
                &fast(),
            );
            assert_eq!(outcome.value(), Some(&None));
            assert_eq!(outcome.report().unwrap().attempts, 1);
        }

        #[test]
        fn test_invisible_on_hidden_element_returns_it() {
            let page = MockPage::new();
            page.insert(Locator::id("spinner"), MockElement::new("div").with_display("none"));
            let waiter = ElementWaiter::new(&page);
            let outcome =
                waiter.wait_for_element(&Locator::id("spinner"), &WaitCondition::Invisible, &fast());
            assert!(matches!(outcome.value(), Some(Some(_))));
        }

        #[test]
        fn test_element_appears_later() {
            let page = MockPage::new();
            page.schedule(
                3,
                Mutation::Insert {
                    locator: Locator::id("late"),
                    element: MockElement::new("div"),
                },
            );
            let waiter = ElementWaiter::new(&page);
            let outcome =
                waiter.wait_for_element(&Locator::id("late"), &WaitCondition::Visible, &fast());
            assert!(outcome.is_success());
            assert_eq!(outcome.report().unwrap().attempts, 4);
        }

        #[test]
        fn test_host_errors_are_retried() {
            let page = MockPage::new();
            page.insert(Locator::id("a"), MockElement::new("div"));
            page.fail_next_locates(2);
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(&Locator::id("a"), &WaitCondition::Exists, &fast());
            assert!(outcome.is_success());
            assert_eq!(outcome.report().unwrap().attempts, 3);
        }

        #[test]
        fn test_zero_timeout_makes_no_attempt() {
            let page = MockPage::new();
            page.insert(Locator::id("a"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::id("a"),
                &WaitCondition::Exists,
                &WaitOptions::new().with_timeout(0),
            );
            assert!(outcome.is_timeout());
            assert_eq!(outcome.report().unwrap().attempts, 0);
            assert_eq!(page.locate_count(), 0);
        }

        #[test]
        fn test_invalid_condition_name_fails_fast() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for(
                &Locator::id("a"),
                "shiny",
                &ConditionParams::default(),
                &fast(),
            );
            assert!(outcome.is_config_error());
            assert_eq!(page.locate_count(), 0);
        }

        #[test]
        fn test_missing_parameter_fails_fast() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for(
                &Locator::id("a"),
                "text_matches",
                &ConditionParams::default(),
                &fast(),
            );
            assert!(outcome.is_config_error());
        }

        #[test]
        fn test_zero_interval_fails_fast() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::id("a"),
                &WaitCondition::Exists,
                &WaitOptions::new().with_poll_interval(0),
            );
            assert!(outcome.is_config_error());
            assert_eq!(page.locate_count(), 0);
        }

        #[test]
        fn test_empty_locator_value_fails_fast() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(&Locator::id(""), &WaitCondition::Exists, &fast());
            assert!(outcome.is_config_error());
        }
    }

    // =========================================================================
    // Multi Element Tests
    // =========================================================================

    mod multi_element_tests {
        use super::*;

        #[test]
        fn test_all_requires_every_locator() {
            let page = MockPage::new();
            page.insert(Locator::id("a"), MockElement::new("div"));
            page.insert(Locator::id("b"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let locators = [Locator::id("a"), Locator::id("b")];
            let outcome = waiter.wait_for_all_elements(&locators, &WaitCondition::Visible, &fast());
            assert_eq!(outcome.value().map(Vec::len), Some(2));
        }

        #[test]
        fn test_all_times_out_on_one_missing() {
            let page = MockPage::new();
            page.insert(Locator::id("a"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let locators = [Locator::id("a"), Locator::id("b")];
            let outcome = waiter.wait_for_all_elements(
                &locators,
                &WaitCondition::Exists,
                &WaitOptions::new().with_timeout(60).with_poll_interval(20),
            );
            assert!(outcome.is_timeout());
            assert!(outcome.to_string().contains("id='a' and id='b'"));
        }

        #[test]
        fn test_all_is_simultaneous_not_eventual() {
            // "a" vanishes exactly when "b" appears, so they never hold together.
            let page = MockPage::new();
            page.insert(Locator::id("a"), MockElement::new("div"));
            page.schedule(
                2,
                Mutation::Remove {
                    locator: Locator::id("a"),
                },
            );
            page.schedule(
                2,
                Mutation::Insert {
                    locator: Locator::id("b"),
                    element: MockElement::new("div"),
                },
            );
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_all_elements(
                &[Locator::id("a"), Locator::id("b")],
                &WaitCondition::Exists,
                &WaitOptions::new().with_timeout(80).with_poll_interval(10),
            );
            assert!(outcome.is_timeout());
        }

        #[test]
        fn test_empty_list_is_config_error() {
            let page = MockPage::new();
            let waiter = ElementWaiter::new(&page);
            assert!(waiter
                .wait_for_all_elements(&[], &WaitCondition::Exists, &fast())
                .is_config_error());
            assert!(waiter
                .wait_for_any_element(&[], &WaitCondition::Exists, &fast())
                .is_config_error());
        }

        #[test]
        fn test_any_skips_unresolved() {
            let page = MockPage::new();
            page.insert(Locator::id("l2"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_any_element(
                &[Locator::id("l1"), Locator::id("l2")],
                &WaitCondition::Visible,
                &fast(),
            );
            assert_eq!(outcome.value().map(|(index, _)| *index), Some(1));
        }

        #[test]
        fn test_any_prefers_list_order() {
            let page = MockPage::new();
            page.insert(Locator::id("first"), MockElement::new("div"));
            page.insert(Locator::id("second"), MockElement::new("div"));
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_any_element(
                &[Locator::id("second"), Locator::id("first")],
                &WaitCondition::Visible,
                &fast(),
            );
            assert_eq!(outcome.value().map(|(index, _)| *index), Some(0));
        }
    }

    // =========================================================================
    // Custom And Smart Wait Tests
    // =========================================================================

    mod custom_and_smart_tests {
        use super::*;
        use crate::evaluator::Probe;
        use serde_json::Value;

        #[test]
        fn test_custom_predicate() {
            let page = MockPage::new();
            page.insert(Locator::id("msg"), MockElement::new("p").with_text("ready"));
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_with_custom_condition(
                &Locator::id("msg"),
                |host, el| {
                    let text = host.evaluate_script(Probe::Text.script().unwrap_or(""), el, &[])?;
                    Ok(text == Value::String("ready".into()))
                },
                &fast(),
            );
            assert!(outcome.is_success());
        }

        #[test]
        fn test_custom_predicate_errors_are_retried() {
            let page = MockPage::new();
            page.insert(Locator::id("x"), MockElement::new("p"));
            let waiter = ElementWaiter::new(&page);
            let mut calls = 0;
            let outcome = waiter.wait_with_custom_condition(
                &Locator::id("x"),
                |_, el| {
                    calls += 1;
                    if calls < 3 {
                        Err(HostError::StaleElement(el.id.clone()))
                    } else {
                        Ok(true)
                    }
                },
                &fast(),
            );
            assert!(outcome.is_success());
            assert_eq!(outcome.report().unwrap().attempts, 3);
        }

        #[test]
        fn test_smart_wait_click_needs_clickable() {
            let page = MockPage::new();
            page.insert(Locator::id("go"), MockElement::new("button").disabled());
            let waiter = ElementWaiter::new(&page);
            let options = WaitOptions::new().with_timeout(50).with_poll_interval(10);
            assert!(waiter
                .smart_wait(&Locator::id("go"), ActionKind::Click, &options)
                .is_timeout());
            assert!(waiter
                .smart_wait(&Locator::id("go"), ActionKind::Hover, &options)
                .is_success());
        }

        #[test]
        fn test_smart_wait_other_needs_exists() {
            let page = MockPage::new();
            page.insert(Locator::id("h"), MockElement::new("div").with_display("none"));
            let waiter = ElementWaiter::new(&page);
            assert!(waiter
                .smart_wait(&Locator::id("h"), ActionKind::from_name("scroll"), &fast())
                .is_success());
        }
    }

    // =========================================================================
    // Cancellation Tests
    // =========================================================================

    mod cancellation_tests {
        use super::*;

        #[test]
        fn test_pre_cancelled_token() {
            let page = MockPage::new();
            let token = CancelToken::new();
            token.cancel();
            let waiter = ElementWaiter::new(&page);
            let outcome = waiter.wait_for_element(
                &Locator::id("x"),
                &WaitCondition::Exists,
                &fast().with_cancel_token(token),
            );
            assert!(outcome.is_cancelled());
            assert_eq!(outcome.report().unwrap().attempts, 0);
        }

        #[test]
        fn test_cancel_from_another_thread() {
            let page = MockPage::new();
            let token = CancelToken::new();
            let remote = token.clone();
            let handle = std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                remote.cancel();
            });
            let waiter = ElementWaiter::new(&page);
            let started = Instant::now();
            let outcome = waiter.wait_for_element(
                &Locator::id("never"),
                &WaitCondition::Visible,
                &WaitOptions::new()
                    .with_timeout(5_000)
                    .with_poll_interval(1_000)
                    .with_cancel_token(token),
            );
            handle.join().unwrap();
            assert!(outcome.is_cancelled());
            assert!(started.elapsed() < Duration::from_millis(1_000));
            assert!(matches!(
                outcome.into_result(),
                Err(LocusError::Cancelled { .. })
            ));
        }
    }
}
