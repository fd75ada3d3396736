//! Selector Generator.
//!
//! Derives candidate locators from an [`ElementDescriptor`] snapshot, scores
//! each one and recommends the most robust. Candidates are kept in a fixed
//! emission order (id, name, css, xpath, link_text) and ties on score go to
//! the earliest candidate, so recommendations are reproducible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::evaluator::Probe;
use crate::host::{ElementHandle, PageHost};
use crate::locator::{Locator, Strategy};
use crate::result::{LocusError, LocusResult};
use crate::scoring::{score, ScoredSelector};

/// Attributes consulted, in order, when no id, name or class is available
const FALLBACK_ATTRIBUTES: [&str; 3] = ["type", "role", "aria-label"];

/// Text at or above this many characters is not used as a selector
const MAX_TEXT_SELECTOR_CHARS: usize = 30;

/// Snapshot of an element's identifying features
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementDescriptor {
    /// Lower-case tag name
    pub tag: Option<String>,
    /// `id` attribute
    pub id: Option<String>,
    /// `name` attribute
    pub name: Option<String>,
    /// `class` attribute
    pub class: Option<String>,
    /// Rendered text
    pub text: Option<String>,
    /// All attributes
    pub attributes: BTreeMap<String, String>,
    /// Other top-level keys, e.g. a flat `type: submit`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn present(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|s| !s.is_empty())
}

impl ElementDescriptor {
    /// Descriptor with only a tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Set the `id`
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `name`
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the `class`
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Snapshot a live element with one describe probe
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Host`] when the probe fails and
    /// [`LocusError::Script`] when its result is not a descriptor object.
    pub fn capture<H: PageHost + ?Sized>(host: &H, element: &ElementHandle) -> LocusResult<Self> {
        let script = Probe::Describe
            .script()
            .ok_or_else(|| LocusError::Script {
                message: "describe probe has no script".into(),
            })?;
        let value = host.evaluate_script(script, element, &[])?;
        if !value.is_object() {
            return Err(LocusError::Script {
                message: format!("describe probe returned {value}"),
            });
        }
        let mut descriptor: Self =
            serde_json::from_value(value).map_err(|e| LocusError::Script {
                message: format!("malformed element description: {e}"),
            })?;
        if descriptor.tag.is_none() {
            descriptor.tag.clone_from(&element.tag_name);
        }
        Ok(descriptor)
    }

    fn tag(&self) -> Option<&str> {
        present(self.tag.as_ref())
    }

    fn first_class(&self) -> Option<&str> {
        self.class.as_deref().and_then(|c| c.split_whitespace().next())
    }

    /// Top-level keys win over the `attributes` map
    fn fallback_attribute(&self) -> Option<(&str, &str)> {
        FALLBACK_ATTRIBUTES.iter().find_map(|attr| {
            self.extra
                .get(*attr)
                .and_then(serde_json::Value::as_str)
                .filter(|v| !v.is_empty())
                .or_else(|| present(self.attributes.get(*attr)))
                .map(|value| (*attr, value))
        })
    }

    fn short_text(&self) -> Option<&str> {
        let text = self.text.as_deref()?;
        let trimmed = text.trim();
        (text.chars().count() < MAX_TEXT_SELECTOR_CHARS && !trimmed.is_empty()).then_some(trimmed)
    }
}

/// Scored candidates in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    candidates: Vec<ScoredSelector>,
}

impl SelectorSet {
    /// Candidates in emission order
    pub fn iter(&self) -> impl Iterator<Item = &ScoredSelector> {
        self.candidates.iter()
    }

    /// Candidate for `strategy`, if one was emitted
    #[must_use]
    pub fn get(&self, strategy: Strategy) -> Option<&ScoredSelector> {
        self.candidates
            .iter()
            .find(|c| c.locator.strategy == strategy)
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate was emitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest-scoring candidate; ties go to the earliest
    #[must_use]
    pub fn recommend(&self) -> Option<&ScoredSelector> {
        self.candidates
            .iter()
            .fold(None, |best: Option<&ScoredSelector>, candidate| match best {
                Some(b) if b.score >= candidate.score => Some(b),
                _ => Some(candidate),
            })
    }

    /// Candidates sorted by descending score, ties in emission order
    #[must_use]
    pub fn ranked(&self) -> Vec<&ScoredSelector> {
        let mut ranked: Vec<_> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    fn push(&mut self, strategy: Strategy, value: &str) {
        self.candidates.push(score(strategy, value));
    }
}

impl FromIterator<ScoredSelector> for SelectorSet {
    fn from_iter<I: IntoIterator<Item = ScoredSelector>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = &'a ScoredSelector;
    type IntoIter = std::slice::Iter<'a, ScoredSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Builds scored candidate locators for captured elements
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorGenerator;

impl SelectorGenerator {
    /// Create a new generator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate and score every applicable candidate for `descriptor`
    #[must_use]
    pub fn generate(&self, descriptor: &ElementDescriptor) -> SelectorSet {
        let mut set = SelectorSet::default();
        if let Some(id) = present(descriptor.id.as_ref()) {
            set.push(Strategy::Id, id);
        }
        if let Some(name) = present(descriptor.name.as_ref()) {
            set.push(Strategy::Name, name);
        }
        if let Some(css) = css_candidate(descriptor) {
            set.push(Strategy::Css, &css);
        }
        if let Some(xpath) = xpath_candidate(descriptor) {
            set.push(Strategy::Xpath, &xpath);
        }
        if descriptor.tag() == Some("a") {
            if let Some(text) = present(descriptor.text.as_ref()) {
                set.push(Strategy::LinkText, text);
            }
        }
        debug!(candidates = set.len(), "generated selector candidates");
        set
    }

    /// Resolve `locator` once, capture the element and generate candidates
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Host`] when the locator does not resolve or the
    /// host fails, and [`LocusError::Script`] for an unusable description.
    pub fn generate_for<H: PageHost + ?Sized>(
        &self,
        host: &H,
        locator: &Locator,
    ) -> LocusResult<SelectorSet> {
        let element = host
            .locate(locator, Duration::ZERO)?
            .ok_or_else(|| LocusError::Host {
                message: format!("no element matches {locator}"),
            })?;
        let descriptor = ElementDescriptor::capture(host, &element)?;
        Ok(self.generate(&descriptor))
    }
}

fn css_candidate(d: &ElementDescriptor) -> Option<String> {
    let tag = d.tag()?;
    let css = if let Some(id) = present(d.id.as_ref()) {
        format!("#{id}")
    } else if let Some(name) = present(d.name.as_ref()) {
        format!("{tag}[name='{name}']")
    } else if let Some(class) = d.first_class() {
        format!("{tag}.{class}")
    } else if let Some((attr, value)) = d.fallback_attribute() {
        format!("{tag}[{attr}='{value}']")
    } else if let Some(text) = d.short_text() {
        format!("{tag}:contains('{text}')")
    } else {
        tag.to_string()
    };
    Some(css)
}

fn xpath_candidate(d: &ElementDescriptor) -> Option<String> {
    let tag = d.tag()?;
    let xpath = if let Some(id) = present(d.id.as_ref()) {
        format!("//{tag}[@id='{id}']")
    } else if let Some(name) = present(d.name.as_ref()) {
        format!("//{tag}[@name='{name}']")
    } else if let Some(class) = d.first_class() {
        format!("//{tag}[contains(@class, '{class}')]")
    } else if let Some((attr, value)) = d.fallback_attribute() {
        format!("//{tag}[@{attr}='{value}']")
    } else if let Some(text) = d.short_text() {
        format!("//{tag}[contains(text(), '{text}')]")
    } else {
        format!("//{tag}")
    };
    Some(xpath)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage};

    mod generate_tests {
        use super::*;

        #[test]
        fn test_button_with_id() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::new("button").with_id("submitBtn"));
            assert_eq!(set.get(Strategy::Id).unwrap().locator.value, "submitBtn");
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "#submitBtn");
            let xpath = set.get(Strategy::Xpath).unwrap();
            assert_eq!(xpath.locator.value, "//button[@id='submitBtn']");
            assert_eq!(xpath.score, 7);
            assert!(set.get(Strategy::LinkText).is_none());
        }

        #[test]
        fn test_emission_order() {
            let set = SelectorGenerator::new().generate(
                &ElementDescriptor::new("a")
                    .with_id("home")
                    .with_name("nav-home")
                    .with_text("Home"),
            );
            let order: Vec<Strategy> = set.iter().map(|c| c.locator.strategy).collect();
            assert_eq!(
                order,
                vec![
                    Strategy::Id,
                    Strategy::Name,
                    Strategy::Css,
                    Strategy::Xpath,
                    Strategy::LinkText
                ]
            );
        }

        #[test]
        fn test_name_fallback() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::new("input").with_name("email"));
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "input[name='email']");
            assert_eq!(set.get(Strategy::Xpath).unwrap().locator.value, "//input[@name='email']");
        }

        #[test]
        fn test_first_class_token() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::new("div").with_class("card  card-lg shadow"));
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "div.card");
            assert_eq!(
                set.get(Strategy::Xpath).unwrap().locator.value,
                "//div[contains(@class, 'card')]"
            );
        }

        #[test]
        fn test_fallback_attribute_order() {
            let set = SelectorGenerator::new().generate(
                &ElementDescriptor::new("div")
                    .with_attribute("aria-label", "Close")
                    .with_attribute("role", "dialog"),
            );
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "div[role='dialog']");
            assert_eq!(set.get(Strategy::Xpath).unwrap().locator.value, "//div[@role='dialog']");
        }

        #[test]
        fn test_top_level_fallback_attribute() {
            let descriptor: ElementDescriptor =
                crate::request::parse_document(r#"{"tag": "input", "type": "submit"}"#).unwrap();
            let set = SelectorGenerator::new().generate(&descriptor);
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "input[type='submit']");
            assert_eq!(
                set.get(Strategy::Xpath).unwrap().locator.value,
                "//input[@type='submit']"
            );
        }

        #[test]
        fn test_top_level_key_wins_over_attributes_map() {
            let descriptor: ElementDescriptor = crate::request::parse_document(
                "tag: div\nrole: dialog\nattributes: {role: alert}\nrows: 4\n",
            )
            .unwrap();
            let set = SelectorGenerator::new().generate(&descriptor);
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "div[role='dialog']");
        }

        #[test]
        fn test_short_text_fallback_is_trimmed() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::new("span").with_text("  Save  "));
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "span:contains('Save')");
            assert_eq!(
                set.get(Strategy::Xpath).unwrap().locator.value,
                "//span[contains(text(), 'Save')]"
            );
        }

        #[test]
        fn test_long_text_falls_back_to_tag() {
            let text = "This paragraph is far too long to be a selector";
            let set = SelectorGenerator::new().generate(&ElementDescriptor::new("p").with_text(text));
            assert_eq!(set.get(Strategy::Css).unwrap().locator.value, "p");
            assert_eq!(set.get(Strategy::Xpath).unwrap().locator.value, "//p");
        }

        #[test]
        fn test_no_tag_skips_css_and_xpath() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::default().with_id("x").with_name("y"));
            assert_eq!(set.len(), 2);
            assert!(set.get(Strategy::Css).is_none());
            assert!(set.get(Strategy::Xpath).is_none());
        }

        #[test]
        fn test_empty_descriptor() {
            let set = SelectorGenerator::new().generate(&ElementDescriptor::default());
            assert!(set.is_empty());
            assert!(set.recommend().is_none());
        }

        #[test]
        fn test_link_text_needs_anchor_and_text() {
            let generator = SelectorGenerator::new();
            assert!(generator
                .generate(&ElementDescriptor::new("a"))
                .get(Strategy::LinkText)
                .is_none());
            assert!(generator
                .generate(&ElementDescriptor::new("button").with_text("Home"))
                .get(Strategy::LinkText)
                .is_none());
            let link = generator.generate(&ElementDescriptor::new("a").with_text("Home"));
            assert_eq!(link.get(Strategy::LinkText).unwrap().score, 5);
        }
    }

    mod recommend_tests {
        use super::*;

        #[test]
        fn test_recommend_highest() {
            let set = SelectorGenerator::new()
                .generate(&ElementDescriptor::new("button").with_id("submit"));
            let best = set.recommend().unwrap();
            assert_eq!(best.locator, Locator::id("submit"));
            assert_eq!(best.score, 10);
        }

        #[test]
        fn test_recommend_tie_goes_to_first() {
            // name scores 8 and css `input[name='q']` scores 8 as well.
            let set = SelectorGenerator::new().generate(&ElementDescriptor::new("input").with_name("q"));
            assert_eq!(set.get(Strategy::Css).unwrap().score, 8);
            assert_eq!(set.recommend().unwrap().locator.strategy, Strategy::Name);
        }

        #[test]
        fn test_recommend_caller_supplied_scores() {
            let set: SelectorSet = [score(Strategy::Id, "login"), score(Strategy::Css, "#login")]
                .into_iter()
                .collect();
            assert_eq!(set.len(), 2);
            let best = set.recommend().unwrap();
            assert_eq!(best.locator, Locator::id("login"));
            assert_eq!(best.score, 10);
            assert_eq!(set.get(Strategy::Css).unwrap().score, 9);
        }

        #[test]
        fn test_ranked_is_stable() {
            let set = SelectorGenerator::new().generate(&ElementDescriptor::new("input").with_name("q"));
            let ranked: Vec<Strategy> = set.ranked().iter().map(|c| c.locator.strategy).collect();
            assert_eq!(ranked, vec![Strategy::Name, Strategy::Css, Strategy::Xpath]);
        }
    }

    mod capture_tests {
        use super::*;

        #[test]
        fn test_generate_for_live_element() {
            let page = MockPage::new();
            page.insert(
                Locator::css("form button"),
                MockElement::new("button")
                    .with_attribute("id", "submitBtn")
                    .with_text("Submit"),
            );
            let set = SelectorGenerator::new()
                .generate_for(&page, &Locator::css("form button"))
                .unwrap();
            assert_eq!(set.recommend().unwrap().locator, Locator::id("submitBtn"));
        }

        #[test]
        fn test_capture_reads_attributes() {
            let page = MockPage::new();
            page.insert(
                Locator::id("q"),
                MockElement::new("input")
                    .with_attribute("id", "q")
                    .with_attribute("type", "search"),
            );
            let handle = page.locate(&Locator::id("q"), Duration::ZERO).unwrap().unwrap();
            let descriptor = ElementDescriptor::capture(&page, &handle).unwrap();
            assert_eq!(descriptor.tag.as_deref(), Some("input"));
            assert_eq!(descriptor.id.as_deref(), Some("q"));
            assert_eq!(descriptor.name, None);
            assert_eq!(descriptor.attributes.get("type").map(String::as_str), Some("search"));
        }

        #[test]
        fn test_generate_for_unresolved_is_host_error() {
            let page = MockPage::new();
            let err = SelectorGenerator::new()
                .generate_for(&page, &Locator::id("gone"))
                .unwrap_err();
            assert!(matches!(err, LocusError::Host { .. }));
            assert!(err.to_string().contains("id='gone'"));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_candidate_strategies_unique(
                tag in proptest::option::of("[a-z]{1,6}"),
                id in proptest::option::of("[a-zA-Z0-9]{0,8}"),
                name in proptest::option::of("[a-z]{0,8}"),
                class in proptest::option::of("[a-z ]{0,16}"),
                text in proptest::option::of("[ -~]{0,40}"),
            ) {
                let descriptor = ElementDescriptor { tag, id, name, class, text, ..ElementDescriptor::default() };
                let set = SelectorGenerator::new().generate(&descriptor);
                let mut seen = std::collections::HashSet::new();
                for candidate in &set {
                    prop_assert!(seen.insert(candidate.locator.strategy));
                    prop_assert!(!candidate.locator.value.is_empty());
                }
                if let Some(best) = set.recommend() {
                    prop_assert!(set.iter().all(|c| c.score <= best.score));
                }
            }
        }
    }
}
