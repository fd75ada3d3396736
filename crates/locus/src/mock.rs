//! Scripted in-memory page.
//!
//! [`MockPage`] implements [`PageHost`] without a browser. Elements are
//! registered under the exact [`Locator`] that resolves them, and changes can
//! be scheduled to land after a given number of `locate` calls, which makes
//! poll-loop behaviour deterministic in tests.
//!
//! Every `locate` hands out a fresh handle. A handle whose node has since
//! been removed or replaced answers every probe with
//! [`HostError::StaleElement`], exactly like a real detached node.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;
use uuid::Uuid;

use crate::evaluator::{custom_expression, Probe};
use crate::host::{ElementHandle, HostError, PageHost, Rect};
use crate::locator::Locator;
use crate::result::{LocusError, LocusResult};

fn default_rect() -> Rect {
    Rect::new(0.0, 0.0, 120.0, 32.0)
}

fn default_display() -> String {
    "block".to_string()
}

fn default_visibility() -> String {
    "visible".to_string()
}

const fn default_opacity() -> f64 {
    1.0
}

/// A fake DOM node with the properties the probes read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockElement {
    /// Tag name
    pub tag: String,
    /// Rendered text
    #[serde(default)]
    pub text: String,
    /// Attributes, including `id`, `name` and `class`
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Client rectangle
    #[serde(default = "default_rect")]
    pub rect: Rect,
    /// Computed `display`
    #[serde(default = "default_display")]
    pub display: String,
    /// Computed `visibility`
    #[serde(default = "default_visibility")]
    pub visibility: String,
    /// Computed `opacity`
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// `disabled` property
    #[serde(default)]
    pub disabled: bool,
    /// Another node wins the hit-test at this element's center
    #[serde(default)]
    pub occluded: bool,
    /// Results for custom expressions, keyed by expression source
    #[serde(default)]
    pub custom: BTreeMap<String, bool>,
}

impl MockElement {
    /// A visible, enabled, unobstructed element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            attributes: BTreeMap::new(),
            rect: default_rect(),
            display: default_display(),
            visibility: default_visibility(),
            opacity: default_opacity(),
            disabled: false,
            occluded: false,
            custom: BTreeMap::new(),
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the client rectangle
    #[must_use]
    pub const fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set computed `display`
    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// Set computed `visibility`
    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    /// Set computed `opacity`
    #[must_use]
    pub const fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Mark as covered by an overlay
    #[must_use]
    pub const fn occluded(mut self) -> Self {
        self.occluded = true;
        self
    }

    /// Register the result of a custom expression
    #[must_use]
    pub fn with_custom(mut self, expression: impl Into<String>, result: bool) -> Self {
        self.custom.insert(expression.into(), result);
        self
    }

    fn is_visible(&self) -> bool {
        self.display != "none"
            && self.visibility != "hidden"
            && self.opacity != 0.0
            && self.rect.has_area()
    }

    fn is_clickable(&self) -> bool {
        self.is_visible() && !self.disabled && !self.occluded
    }

    fn describe(&self) -> Value {
        json!({
            "tag": self.tag.to_ascii_lowercase(),
            "id": self.attributes.get("id"),
            "name": self.attributes.get("name"),
            "class": self.attributes.get("class"),
            "text": self.text.trim(),
            "attributes": self.attributes,
        })
    }
}

/// A DOM mutation applied by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Mutation {
    /// Attach a node (replacing any node under the same locator)
    Insert {
        /// Locator resolving the node
        locator: Locator,
        /// The node
        element: MockElement,
    },
    /// Detach the node
    Remove {
        /// Locator resolving the node
        locator: Locator,
    },
    /// Change properties of the existing node in place
    Update {
        /// Locator resolving the node
        locator: Locator,
        /// New properties
        element: MockElement,
    },
}

#[derive(Debug)]
struct Node {
    id: u64,
    element: MockElement,
}

#[derive(Debug, Default)]
struct PageState {
    nodes: HashMap<Locator, Node>,
    scheduled: Vec<(usize, Mutation)>,
    locate_calls: usize,
    failing_locates: usize,
    next_node: u64,
}

impl PageState {
    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Insert { locator, element } => {
                self.next_node += 1;
                self.nodes.insert(
                    locator,
                    Node {
                        id: self.next_node,
                        element,
                    },
                );
            }
            Mutation::Remove { locator } => {
                self.nodes.remove(&locator);
            }
            Mutation::Update { locator, element } => {
                if let Some(node) = self.nodes.get_mut(&locator) {
                    node.element = element;
                }
            }
        }
    }

    fn apply_due(&mut self) {
        let calls = self.locate_calls;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|(after, _)| *after <= calls);
        self.scheduled = pending;
        for (_, mutation) in due {
            self.apply(mutation);
        }
    }

    /// Handles are `<node id>:<uuid>`, so no per-handle state is kept
    fn live(&self, handle: &ElementHandle) -> Result<&MockElement, HostError> {
        let node_id = handle
            .id
            .split_once(':')
            .and_then(|(node, _)| node.parse::<u64>().ok())
            .filter(|node| (1..=self.next_node).contains(node))
            .ok_or_else(|| HostError::Detached(handle.id.clone()))?;
        self.nodes
            .values()
            .find(|node| node.id == node_id)
            .map(|node| &node.element)
            .ok_or_else(|| HostError::StaleElement(handle.id.clone()))
    }
}

/// In-memory [`PageHost`] with scripted DOM changes
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<PageState>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach `element` under `locator` now
    pub fn insert(&self, locator: Locator, element: MockElement) {
        self.state().apply(Mutation::Insert { locator, element });
    }

    /// Detach the node under `locator` now
    pub fn remove(&self, locator: &Locator) {
        self.state().apply(Mutation::Remove {
            locator: locator.clone(),
        });
    }

    /// Apply `mutation` once `after_locates` locate calls have been made
    pub fn schedule(&self, after_locates: usize, mutation: Mutation) {
        self.state().scheduled.push((after_locates, mutation));
    }

    /// Make the next `count` locate calls fail with a transient error
    pub fn fail_next_locates(&self, count: usize) {
        self.state().failing_locates = count;
    }

    /// Number of locate calls served so far
    #[must_use]
    pub fn locate_count(&self) -> usize {
        self.state().locate_calls
    }

    /// Load a page from a JSON or YAML fixture document
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Json`] or [`LocusError::Yaml`] when the document
    /// is malformed and
    /// [`LocusError::Config`] when a selector map is invalid.
    pub fn from_fixture(source: &str) -> LocusResult<Self> {
        let fixture: PageFixture = crate::request::parse_document(source)?;
        let page = Self::new();
        for entry in fixture.elements {
            page.insert(Locator::from_map(entry.selector)?, entry.element);
        }
        for change in fixture.changes {
            let locator = Locator::from_map(change.selector)?;
            let mutation = match (change.action, change.element) {
                (FixtureAction::Insert, Some(element)) => Mutation::Insert { locator, element },
                (FixtureAction::Update, Some(element)) => Mutation::Update { locator, element },
                (FixtureAction::Remove, _) => Mutation::Remove { locator },
                (action, None) => {
                    return Err(LocusError::config(format!(
                        "fixture change {action:?} requires an element"
                    )))
                }
            };
            page.schedule(change.after_locates, mutation);
        }
        Ok(page)
    }
}

impl PageHost for MockPage {
    fn locate(
        &self,
        locator: &Locator,
        _wait: Duration,
    ) -> Result<Option<ElementHandle>, HostError> {
        let mut state = self.state();
        state.apply_due();
        state.locate_calls += 1;
        if state.failing_locates > 0 {
            state.failing_locates -= 1;
            return Err(HostError::Unavailable("scripted locate failure".into()));
        }
        let Some((node_id, tag)) = state
            .nodes
            .get(locator)
            .map(|node| (node.id, node.element.tag.clone()))
        else {
            trace!(%locator, "mock locate: no match");
            return Ok(None);
        };
        Ok(Some(
            ElementHandle::new(format!("{node_id}:{}", Uuid::new_v4())).with_tag(tag),
        ))
    }

    fn evaluate_script(
        &self,
        script: &str,
        element: &ElementHandle,
        args: &[Value],
    ) -> Result<Value, HostError> {
        let state = self.state();
        let el = state.live(element)?;
        match Probe::identify(script) {
            Some(Probe::Visible) => Ok(Value::Bool(el.is_visible())),
            Some(Probe::Clickable) => Ok(Value::Bool(el.is_clickable())),
            Some(Probe::Text) => Ok(Value::String(el.text.trim().to_string())),
            Some(Probe::Attribute) => {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| HostError::Script("attribute name missing".into()))?;
                Ok(el
                    .attributes
                    .get(name)
                    .map_or(Value::Null, |v| Value::String(v.clone())))
            }
            Some(Probe::Custom) => {
                let expression = custom_expression(script)
                    .ok_or_else(|| HostError::Script("malformed custom probe".into()))?;
                el.custom
                    .get(expression)
                    .map(|result| Value::Bool(*result))
                    .ok_or_else(|| {
                        HostError::Script(format!("ReferenceError evaluating `{expression}`"))
                    })
            }
            Some(Probe::Describe) => Ok(el.describe()),
            None => Err(HostError::Script("unsupported script".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageFixture {
    #[serde(default)]
    elements: Vec<ElementFixture>,
    #[serde(default)]
    changes: Vec<ChangeFixture>,
}

#[derive(Debug, Deserialize)]
struct ElementFixture {
    selector: BTreeMap<String, String>,
    #[serde(flatten)]
    element: MockElement,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FixtureAction {
    Insert,
    Remove,
    Update,
}

#[derive(Debug, Deserialize)]
struct ChangeFixture {
    after_locates: usize,
    action: FixtureAction,
    selector: BTreeMap<String, String>,
    element: Option<MockElement>,
}
