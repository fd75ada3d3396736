//! Host capability surface.
//!
//! The engine owns no browser. Whatever drives the page (a CDP session, a
//! WebDriver client, the in-memory [`MockPage`](crate::mock::MockPage))
//! implements [`PageHost`] and hands the engine two primitives: resolve a
//! locator right now, and run a script fragment against an element.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::locator::Locator;
use crate::result::LocusError;

/// Failures reported by a host collaborator
///
/// Inside a poll loop every variant is transient: the attempt counts as
/// "not yet satisfied" and the loop carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The handle refers to a node that was replaced
    #[error("stale element: {0}")]
    StaleElement(String),

    /// The node is no longer attached to the document
    #[error("element detached: {0}")]
    Detached(String),

    /// Script threw or could not be evaluated
    #[error("script failed: {0}")]
    Script(String),

    /// The page itself is not reachable (navigating, crashed, closed)
    #[error("page unavailable: {0}")]
    Unavailable(String),
}

impl From<HostError> for LocusError {
    fn from(err: HostError) -> Self {
        Self::Host {
            message: err.to_string(),
        }
    }
}

/// Opaque reference to a located node
///
/// Valid for a single evaluation. Callers must not cache it past one action,
/// the node may be replaced at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Host-assigned identifier
    pub id: String,
    /// Element tag name, when the host knows it cheaply
    pub tag_name: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: None,
        }
    }

    /// Attach the tag name
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = Some(tag.into());
        self
    }
}

/// Axis-aligned client rectangle of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometric center, the hit-test point for clickability
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Both dimensions strictly positive
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// The two capabilities the engine consumes from its host
pub trait PageHost {
    /// Resolve `locator` against the current document.
    ///
    /// The engine always passes [`Duration::ZERO`] as `wait`: resolution must
    /// be immediate and the polling is done by the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the document cannot be queried.
    fn locate(&self, locator: &Locator, wait: Duration)
        -> Result<Option<ElementHandle>, HostError>;

    /// Run `script` with `element` bound to `arguments[0]` and `args`
    /// following it, returning a JSON-serializable result.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the script throws or the element is stale.
    fn evaluate_script(
        &self,
        script: &str,
        element: &ElementHandle,
        args: &[Value],
    ) -> Result<Value, HostError>;
}

impl<H: PageHost + ?Sized> PageHost for &H {
    fn locate(
        &self,
        locator: &Locator,
        wait: Duration,
    ) -> Result<Option<ElementHandle>, HostError> {
        (**self).locate(locator, wait)
    }

    fn evaluate_script(
        &self,
        script: &str,
        element: &ElementHandle,
        args: &[Value],
    ) -> Result<Value, HostError> {
        (**self).evaluate_script(script, element, args)
    }
}
