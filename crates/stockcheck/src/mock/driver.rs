//! Scriptable in-memory [`BrowserDriver`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::dom::{MockDom, MockElement};
use crate::driver::{
    BrowserDriver, ElementHandle, Key, WindowSize, SCRIPT_CLICK, SCROLL_INTO_VIEW,
};
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};

/// PNG signature returned as the screenshot payload
pub const MOCK_SCREENSHOT: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Reaction to a click on one locator
pub type ClickHook = Box<dyn FnMut(&mut MockDom) + Send>;

/// Application logic reacting to user input on the mock document
pub trait Behavior: Send {
    /// An element was clicked (natively or by script)
    fn clicked(&mut self, dom: &mut MockDom, locator: &Locator) {
        let _ = (dom, locator);
    }

    /// An input's value changed to `value`
    fn typed(&mut self, dom: &mut MockDom, locator: &Locator, value: &str) {
        let _ = (dom, locator, value);
    }

    /// The browser navigated to `url`
    fn navigated(&mut self, dom: &mut MockDom, url: &str) {
        let _ = (dom, url);
    }

    /// The page was reloaded
    fn refreshed(&mut self, dom: &mut MockDom) {
        let _ = dom;
    }
}

#[derive(Default)]
struct Reactions {
    behavior: Option<Box<dyn Behavior>>,
    clicks: HashMap<Locator, Vec<ClickHook>>,
}

#[derive(Clone, Copy)]
enum Event<'a> {
    Click(&'a Locator),
    Input(&'a Locator, &'a str),
    Navigate(&'a str),
    Refresh,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory driver for unit and integration tests.
///
/// Records every call as `op:locator` in a call log, and can inject
/// staleness and click interception per locator.
#[derive(Default)]
pub struct MockDriver {
    dom: Mutex<MockDom>,
    reactions: Mutex<Reactions>,
    calls: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("dom", &*lock(&self.dom))
            .field("calls", &lock(&self.calls).len())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock driver whose document is driven by `behavior`
    #[must_use]
    pub fn with_behavior(behavior: impl Behavior + 'static) -> Self {
        let driver = Self::new();
        lock(&driver.reactions).behavior = Some(Box::new(behavior));
        driver
    }

    // =========================================================================
    // DOCUMENT SETUP
    // =========================================================================

    /// Run `f` against the document
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut lock(&self.dom))
    }

    /// Replace all matches of `locator` with `element`
    pub fn insert(&self, locator: Locator, element: MockElement) {
        lock(&self.dom).insert(locator, element);
    }

    /// Add another match for `locator`
    pub fn push(&self, locator: Locator, element: MockElement) {
        lock(&self.dom).push(locator, element);
    }

    /// Apply `f` to every match of `locator`
    pub fn update(&self, locator: &Locator, f: impl FnMut(&mut MockElement)) {
        lock(&self.dom).update(locator, f);
    }

    /// Remove all matches of `locator`
    pub fn remove(&self, locator: &Locator) {
        lock(&self.dom).remove(locator);
    }

    /// Re-render `locator` so existing handles go stale
    pub fn rerender(&self, locator: &Locator) {
        lock(&self.dom).rerender(locator);
    }

    /// Fail the next `count` actions on `locator` as stale
    pub fn inject_stale(&self, locator: &Locator, count: u32) {
        lock(&self.dom).inject_stale(locator, count);
    }

    /// Intercept the next `count` native clicks on `locator`
    pub fn inject_intercept(&self, locator: &Locator, count: u32) {
        lock(&self.dom).inject_intercept(locator, count);
    }

    /// Run `hook` whenever `locator` is clicked
    pub fn on_click(&self, locator: Locator, hook: impl FnMut(&mut MockDom) + Send + 'static) {
        lock(&self.reactions)
            .clicks
            .entry(locator)
            .or_default()
            .push(Box::new(hook));
    }

    /// Input value of the first match
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        lock(&self.dom).element(locator).map(|el| el.value.clone())
    }

    /// Text of the first match
    #[must_use]
    pub fn text_of(&self, locator: &Locator) -> Option<String> {
        lock(&self.dom).element(locator).map(|el| el.text.clone())
    }

    // =========================================================================
    // CALL LOG
    // =========================================================================

    /// Every recorded call, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Check if any call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        lock(&self.calls).iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    fn open(&self) -> E2eResult<MutexGuard<'_, MockDom>> {
        if self.is_closed() {
            return Err(E2eError::driver("session closed"));
        }
        Ok(lock(&self.dom))
    }

    fn react(&self, dom: &mut MockDom, event: Event<'_>) {
        let mut reactions = lock(&self.reactions);
        if let Event::Click(locator) = event {
            if let Some(hooks) = reactions.clicks.get_mut(locator) {
                for hook in hooks.iter_mut() {
                    hook(dom);
                }
            }
        }
        if let Some(behavior) = reactions.behavior.as_mut() {
            match event {
                Event::Click(locator) => behavior.clicked(dom, locator),
                Event::Input(locator, value) => behavior.typed(dom, locator, value),
                Event::Navigate(url) => behavior.navigated(dom, url),
                Event::Refresh => behavior.refreshed(dom),
            }
        }
    }

    /// Resolve `handle` for an action, honouring injected staleness.
    fn act<R>(
        &self,
        op: &str,
        handle: &ElementHandle,
        f: impl FnOnce(&mut MockElement) -> R,
    ) -> E2eResult<(MutexGuard<'_, MockDom>, R)> {
        let mut dom = self.open()?;
        let locator = handle.locator();
        if dom.take_stale(locator) {
            self.record(format!("stale:{locator}"));
            return Err(E2eError::stale(locator));
        }
        let out = f(dom.resolve(handle)?);
        self.record(format!("{op}:{locator}"));
        Ok((dom, out))
    }

    fn read<R>(&self, handle: &ElementHandle, f: impl FnOnce(&MockElement) -> R) -> E2eResult<R> {
        let mut dom = self.open()?;
        let element = dom.resolve(handle)?;
        Ok(f(&*element))
    }

    fn input(
        &self,
        op: &str,
        handle: &ElementHandle,
        edit: impl FnOnce(&mut MockElement),
    ) -> E2eResult<()> {
        let (mut dom, value) = self.act(op, handle, |element| {
            edit(element);
            element.value.clone()
        })?;
        self.react(&mut dom, Event::Input(handle.locator(), &value));
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>> {
        let dom = self.open()?;
        self.record(format!("find:{locator}"));
        Ok(dom.handles(locator))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> E2eResult<bool> {
        self.read(element, MockElement::is_displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> E2eResult<bool> {
        self.read(element, |el| el.enabled)
    }

    async fn text(&self, element: &ElementHandle) -> E2eResult<String> {
        self.read(element, |el| el.current_text().to_string())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> E2eResult<Option<String>> {
        self.read(element, |el| match el.attributes.get(name) {
            Some(value) => Some(value.clone()),
            None if name == "value" => Some(el.value.clone()),
            None => None,
        })
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        let locator = element.locator();
        {
            let mut dom = self.open()?;
            if dom.take_intercept(locator) {
                self.record(format!("intercepted:{locator}"));
                return Err(E2eError::Intercepted {
                    locator: locator.to_string(),
                    message: "<div class=\"MuiBackdrop-root\"> would receive the click".into(),
                });
            }
        }
        let (mut dom, ()) = self.act("click", element, |_| ())?;
        self.react(&mut dom, Event::Click(locator));
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        self.input("clear", element, |el| el.value.clear())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.input("type", element, |el| {
            if el.is_selected() {
                el.value.clear();
                el.set_selected(false);
            }
            el.value.push_str(text);
        })
    }

    async fn press_key(&self, element: &ElementHandle, key: Key) -> E2eResult<()> {
        let op = format!("key:{key:?}");
        match key {
            Key::SelectAll => self.act(&op, element, |el| el.set_selected(true)).map(|_| ()),
            Key::Delete | Key::Backspace => self.input(&op, element, |el| {
                if el.is_selected() {
                    el.value.clear();
                    el.set_selected(false);
                } else if key == Key::Backspace {
                    el.value.pop();
                }
            }),
            Key::Enter => self.act(&op, element, |_| ()).map(|_| ()),
        }
    }

    async fn hover(&self, element: &ElementHandle) -> E2eResult<()> {
        self.act("hover", element, |_| ()).map(|_| ())
    }

    async fn call_function(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> E2eResult<serde_json::Value> {
        if function == SCROLL_INTO_VIEW {
            self.act("scroll", element, |_| ())?;
        } else if function == SCRIPT_CLICK {
            let (mut dom, ()) = self.act("script_click", element, |_| ())?;
            self.react(&mut dom, Event::Click(element.locator()));
        } else {
            self.act("call", element, |_| ())?;
        }
        Ok(serde_json::Value::Null)
    }

    async fn execute_script(&self, script: &str) -> E2eResult<serde_json::Value> {
        let dom = self.open()?;
        self.record(format!("script:{script}"));
        Ok(dom.script_result())
    }

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let mut dom = self.open()?;
        self.record(format!("navigate:{url}"));
        dom.set_url(url);
        self.react(&mut dom, Event::Navigate(url));
        Ok(())
    }

    async fn refresh(&self) -> E2eResult<()> {
        let mut dom = self.open()?;
        self.record("refresh".to_string());
        self.react(&mut dom, Event::Refresh);
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.open()?.title().to_string())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.open()?.url().to_string())
    }

    async fn set_window_size(&self, size: WindowSize) -> E2eResult<()> {
        let _dom = self.open()?;
        self.record(format!("window:{size:?}"));
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let _dom = self.open()?;
        self.record("screenshot".to_string());
        Ok(MOCK_SCREENSHOT.to_vec())
    }

    async fn quit(&self) -> E2eResult<()> {
        self.record("quit".to_string());
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Strategy;

    fn confirm() -> Locator {
        Locator::from_static(Strategy::XPath, "//*[text()=\"Confirm\"]")
    }

    mod driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_driver_navigate() {
            let driver = MockDriver::new();
            driver.navigate("https://inventory.test").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://inventory.test");
            assert!(driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_click_hook_runs() {
            let driver = MockDriver::new();
            driver.insert(confirm(), MockElement::new("Confirm"));
            let done = Locator::from_static(Strategy::Id, "done");
            let target = done.clone();
            driver.on_click(confirm(), move |dom| {
                dom.insert(target.clone(), MockElement::new("ok"));
            });
            let handle = driver.find_elements(&confirm()).await.unwrap().remove(0);
            driver.click(&handle).await.unwrap();
            assert_eq!(driver.text_of(&done).as_deref(), Some("ok"));
        }

        #[tokio::test]
        async fn test_removed_node_is_stale() {
            let driver = MockDriver::new();
            driver.insert(confirm(), MockElement::new("Confirm"));
            let handle = driver.find_elements(&confirm()).await.unwrap().remove(0);
            driver.rerender(&confirm());
            let err = driver.text(&handle).await.unwrap_err();
            assert!(matches!(err, E2eError::StaleReference { .. }));
        }

        #[tokio::test]
        async fn test_intercept_then_native_click() {
            let driver = MockDriver::new();
            driver.insert(confirm(), MockElement::new("Confirm"));
            driver.inject_intercept(&confirm(), 1);
            let handle = driver.find_elements(&confirm()).await.unwrap().remove(0);
            assert!(matches!(
                driver.click(&handle).await,
                Err(E2eError::Intercepted { .. })
            ));
            driver.click(&handle).await.unwrap();
            assert_eq!(driver.count("click:"), 1);
        }

        #[tokio::test]
        async fn test_keys_edit_value() {
            let driver = MockDriver::new();
            let input = Locator::from_static(Strategy::Name, "quantity");
            driver.insert(input.clone(), MockElement::new("").with_value("12"));
            let handle = driver.find_elements(&input).await.unwrap().remove(0);
            driver.press_key(&handle, Key::Backspace).await.unwrap();
            assert_eq!(driver.value_of(&input).as_deref(), Some("1"));
            driver.press_key(&handle, Key::SelectAll).await.unwrap();
            driver.type_text(&handle, "5").await.unwrap();
            assert_eq!(driver.value_of(&input).as_deref(), Some("5"));
            assert_eq!(
                driver.attribute(&handle, "value").await.unwrap().as_deref(),
                Some("5")
            );
        }

        #[tokio::test]
        async fn test_quit_closes_session() {
            let driver = MockDriver::new();
            driver.quit().await.unwrap();
            assert!(driver.is_closed());
            assert!(matches!(
                driver.title().await,
                Err(E2eError::Driver { .. })
            ));
            assert!(driver.quit().await.is_ok());
        }

        #[tokio::test]
        async fn test_screenshot_is_png() {
            let driver = MockDriver::new();
            let png = driver.screenshot().await.unwrap();
            assert!(png.starts_with(b"\x89PNG"));
        }
    }
}
