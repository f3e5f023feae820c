//! In-memory document behind [`MockDriver`](super::MockDriver).
//!
//! Elements are keyed by the exact [`Locator`] a page object will ask for.
//! Every node gets a fresh id when inserted; a handle whose id is no longer
//! in the document is stale.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::driver::ElementHandle;
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};

/// One simulated DOM node
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Rendered text
    pub text: String,
    /// Rendered and not hidden
    pub displayed: bool,
    /// Not disabled
    pub enabled: bool,
    /// Input value
    pub value: String,
    /// Attributes other than `value`
    pub attributes: BTreeMap<String, String>,
    selected: bool,
    visible_at: Option<Instant>,
    early_text: Option<(Instant, String)>,
}

impl MockElement {
    /// Displayed, enabled element with `text`
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            displayed: true,
            enabled: true,
            value: String::new(),
            attributes: BTreeMap::new(),
            selected: false,
            visible_at: None,
            early_text: None,
        }
    }

    /// Present but not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Only displayed once `delay` has passed
    #[must_use]
    pub fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_at = Some(Instant::now() + delay);
        self
    }

    /// Shows `early` until `delay` has passed, then the real text
    #[must_use]
    pub fn text_after(mut self, delay: Duration, early: impl Into<String>) -> Self {
        self.early_text = Some((Instant::now() + delay, early.into()));
        self
    }

    /// Displayed right now
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.displayed && self.visible_at.map_or(true, |at| Instant::now() >= at)
    }

    /// Text right now
    #[must_use]
    pub fn current_text(&self) -> &str {
        match &self.early_text {
            Some((until, early)) if Instant::now() < *until => early,
            _ => &self.text,
        }
    }

    pub(crate) const fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    element: MockElement,
}

/// Simulated document state
#[derive(Debug, Default)]
pub struct MockDom {
    nodes: HashMap<Locator, Vec<Node>>,
    owners: HashMap<String, Locator>,
    next_id: u64,
    title: String,
    url: String,
    stale: HashMap<Locator, u32>,
    intercept: HashMap<Locator, u32>,
    script_result: serde_json::Value,
}

impl MockDom {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self, locator: &Locator, element: MockElement) -> Node {
        self.next_id += 1;
        let id = format!("e{}", self.next_id);
        self.owners.insert(id.clone(), locator.clone());
        Node { id, element }
    }

    fn forget(&mut self, locator: &Locator) -> Vec<Node> {
        let nodes = self.nodes.remove(locator).unwrap_or_default();
        for node in &nodes {
            self.owners.remove(&node.id);
        }
        nodes
    }

    /// Replace all matches of `locator` with a single new node
    pub fn insert(&mut self, locator: Locator, element: MockElement) {
        self.forget(&locator);
        let node = self.mint(&locator, element);
        self.nodes.insert(locator, vec![node]);
    }

    /// Add another match for `locator`
    pub fn push(&mut self, locator: Locator, element: MockElement) {
        let node = self.mint(&locator, element);
        self.nodes.entry(locator).or_default().push(node);
    }

    /// Remove all matches of `locator`
    pub fn remove(&mut self, locator: &Locator) {
        self.forget(locator);
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.owners.clear();
    }

    /// Give every match of `locator` a new id; existing handles go stale.
    pub fn rerender(&mut self, locator: &Locator) {
        let old = self.forget(locator);
        let fresh: Vec<Node> = old
            .into_iter()
            .map(|node| self.mint(locator, node.element))
            .collect();
        if !fresh.is_empty() {
            self.nodes.insert(locator.clone(), fresh);
        }
    }

    /// Make the document hold exactly `scene`.
    ///
    /// Locators already present keep their node ids position by position,
    /// so handles survive a re-render that leaves them in place. Selection
    /// state carries over; everything else comes from the scene.
    pub fn reconcile(&mut self, scene: Vec<(Locator, Vec<MockElement>)>) {
        let mut previous = std::mem::take(&mut self.nodes);
        self.owners.clear();
        for (locator, elements) in scene {
            let mut old = previous.remove(&locator).unwrap_or_default().into_iter();
            let mut nodes: Vec<Node> = self.nodes.remove(&locator).unwrap_or_default();
            for mut element in elements {
                let node = match old.next() {
                    Some(prior) => {
                        element.selected = prior.element.selected;
                        self.owners.insert(prior.id.clone(), locator.clone());
                        Node {
                            id: prior.id,
                            element,
                        }
                    }
                    None => self.mint(&locator, element),
                };
                nodes.push(node);
            }
            self.nodes.insert(locator, nodes);
        }
    }

    /// Apply `f` to every match of `locator`
    pub fn update(&mut self, locator: &Locator, mut f: impl FnMut(&mut MockElement)) {
        if let Some(nodes) = self.nodes.get_mut(locator) {
            for node in nodes {
                f(&mut node.element);
            }
        }
    }

    /// First match of `locator`
    #[must_use]
    pub fn element(&self, locator: &Locator) -> Option<&MockElement> {
        self.nodes
            .get(locator)
            .and_then(|nodes| nodes.first())
            .map(|node| &node.element)
    }

    /// Whether `locator` matches anything
    #[must_use]
    pub fn contains(&self, locator: &Locator) -> bool {
        self.nodes.get(locator).is_some_and(|nodes| !nodes.is_empty())
    }

    /// Number of matches of `locator`
    #[must_use]
    pub fn count(&self, locator: &Locator) -> usize {
        self.nodes.get(locator).map_or(0, Vec::len)
    }

    /// Set the document title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Document title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Value returned by page scripts
    pub fn set_script_result(&mut self, value: serde_json::Value) {
        self.script_result = value;
    }

    pub(crate) fn script_result(&self) -> serde_json::Value {
        self.script_result.clone()
    }

    /// Fail the next `count` actions on handles from `locator` as stale
    pub fn inject_stale(&mut self, locator: &Locator, count: u32) {
        self.stale.insert(locator.clone(), count);
    }

    /// Intercept the next `count` native clicks on `locator`
    pub fn inject_intercept(&mut self, locator: &Locator, count: u32) {
        self.intercept.insert(locator.clone(), count);
    }

    pub(crate) fn take_stale(&mut self, locator: &Locator) -> bool {
        take_one(&mut self.stale, locator)
    }

    pub(crate) fn take_intercept(&mut self, locator: &Locator) -> bool {
        take_one(&mut self.intercept, locator)
    }

    /// Handles for the current matches of `locator`
    pub(crate) fn handles(&self, locator: &Locator) -> Vec<ElementHandle> {
        self.nodes.get(locator).map_or_else(Vec::new, |nodes| {
            nodes
                .iter()
                .map(|node| ElementHandle::new(node.id.clone(), locator.clone()))
                .collect()
        })
    }

    /// Node behind `handle`, or `StaleReference` if it left the document
    pub(crate) fn resolve(&mut self, handle: &ElementHandle) -> E2eResult<&mut MockElement> {
        let owner = self
            .owners
            .get(handle.id())
            .ok_or_else(|| E2eError::stale(handle.locator()))?;
        self.nodes
            .get_mut(owner)
            .and_then(|nodes| nodes.iter_mut().find(|node| node.id == handle.id()))
            .map(|node| &mut node.element)
            .ok_or_else(|| E2eError::stale(handle.locator()))
    }
}

fn take_one(counters: &mut HashMap<Locator, u32>, locator: &Locator) -> bool {
    match counters.get_mut(locator) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}
