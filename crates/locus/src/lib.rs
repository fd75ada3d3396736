//! Locus: element targeting and synchronization for browser automation
//!
//! Locus answers two questions a flow runner asks about a live page:
//!
//! 1. *Is it ready?* The [`ElementWaiter`] polls a [`PageHost`] until a
//!    located element satisfies a [`WaitCondition`], re-resolving the
//!    [`Locator`] on every tick so stale nodes are never trusted.
//! 2. *How should I find it next time?* The [`SelectorGenerator`] derives
//!    candidate locators from an [`ElementDescriptor`], scores each for
//!    robustness and recommends the best.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  locate / evaluate   ┌──────────────┐
//! │ PageHost   │◄─────────────────────│ ElementWaiter│◄── WaitRequest
//! │ (browser,  │                      │  + Condition │
//! │  MockPage) │◄──────┐              │    Evaluator │
//! └────────────┘       │ describe     └──────────────┘
//!                      │
//!               ┌──────┴──────────┐   score   ┌──────────────┐
//!               │SelectorGenerator│──────────►│ scoring      │
//!               └─────────────────┘           └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use locus::{ElementWaiter, Locator, MockElement, MockPage, WaitCondition, WaitOptions};
//!
//! let page = MockPage::new();
//! page.insert(Locator::css("#login"), MockElement::new("button"));
//!
//! let waiter = ElementWaiter::new(&page);
//! let outcome = waiter.wait_for_element(
//!     &Locator::css("#login"),
//!     &WaitCondition::Clickable,
//!     &WaitOptions::new().with_timeout(1_000).with_poll_interval(50),
//! );
//! assert!(outcome.is_success());
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod condition;
mod evaluator;
mod generator;
mod host;
mod locator;
/// Scripted in-memory page host
pub mod mock;
mod request;
mod result;
/// Selector robustness scoring
pub mod scoring;
mod wait;

pub use condition::{ActionKind, ConditionKind, ConditionParams, TextPattern, WaitCondition};
pub use evaluator::{custom_expression, custom_script, truthy, ConditionEvaluator, Probe};
pub use generator::{ElementDescriptor, SelectorGenerator, SelectorSet};
pub use host::{ElementHandle, HostError, PageHost, Rect};
pub use locator::{Locator, Strategy};
pub use mock::{MockElement, MockPage, Mutation};
pub use request::{parse_document, MatchMode, Target, WaitPlan, WaitRequest};
pub use result::{LocusError, LocusResult};
pub use scoring::{base_weight, score, score_locator, ScoredSelector};
pub use wait::{
    CancelToken, ElementWaiter, WaitOptions, WaitOutcome, WaitReport, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        ActionKind, CancelToken, ConditionParams, ElementDescriptor, ElementHandle, ElementWaiter,
        Locator, LocusError, LocusResult, PageHost, ScoredSelector, SelectorGenerator, Strategy,
        WaitCondition, WaitOptions, WaitOutcome, WaitRequest,
    };
}
