//! [`BrowserDriver`] over the Chrome DevTools Protocol.
//!
//! Matched nodes are kept in a registry on the page (`window.__stockcheck`)
//! keyed by handle id. A node that is gone from the registry or detached
//! from the document reports as stale, which is what the retry layer keys
//! on. Only the last few lookups per locator stay registered, so polling
//! waits do not pile up nodes the page has already dropped.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    ClearDeviceMetricsOverrideParams, SetDeviceMetricsOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::BrowserSettings;
use crate::driver::{BrowserDriver, ElementHandle, Key, WindowSize};
use crate::locator::{js_string, Locator};
use crate::result::{E2eError, E2eResult};

const REGISTRY: &str = "(window.__stockcheck = window.__stockcheck || { nodes: {} })";

/// Lookups per locator whose handles stay valid
const KEPT_GENERATIONS: usize = 4;

/// Which lookups are still registered on the page, per locator.
///
/// A lookup is a handle-id prefix plus the number of nodes it matched.
#[derive(Debug, Default)]
struct NodeGenerations {
    by_locator: HashMap<String, VecDeque<(String, u64)>>,
}

impl NodeGenerations {
    /// Start a lookup under `prefix` and return the handle ids to drop.
    fn admit(&mut self, locator: &str, prefix: &str) -> Vec<String> {
        let generations = self.by_locator.entry(locator.to_string()).or_default();
        generations.push_back((prefix.to_string(), 0));
        let mut evicted = Vec::new();
        while generations.len() > KEPT_GENERATIONS {
            if let Some((old, count)) = generations.pop_front() {
                evicted.extend((0..count).map(|i| format!("{old}:{i}")));
            }
        }
        evicted
    }

    /// Record how many nodes the lookup under `prefix` registered
    fn settle(&mut self, locator: &str, prefix: &str, count: u64) {
        if let Some(entry) = self
            .by_locator
            .get_mut(locator)
            .and_then(|gens| gens.iter_mut().find(|(p, _)| p == prefix))
        {
            entry.1 = count;
        }
    }

    /// Handle ids currently registered
    #[cfg(test)]
    fn live(&self) -> u64 {
        self.by_locator
            .values()
            .flat_map(|gens| gens.iter().map(|(_, count)| count))
            .sum()
    }
}

/// Where a native click would land
#[derive(Debug, Deserialize)]
struct HitTest {
    x: f64,
    y: f64,
    hit: bool,
    by: Option<String>,
}

/// Chromium session driven over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    generations: std::sync::Mutex<NodeGenerations>,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium with `settings` and open a blank tab
    pub async fn launch(settings: &BrowserSettings) -> E2eResult<Self> {
        let mut builder = CdpConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        builder = match settings.window {
            WindowSize::Maximized => builder.arg("--start-maximized"),
            WindowSize::Fixed { width, height } => builder.window_size(width, height),
        };

        let config = builder.build().map_err(launch_error)?;
        let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(launch_error)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(launch_error)?;
        tracing::info!(headless = settings.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            generations: std::sync::Mutex::new(NodeGenerations::default()),
            handler,
        })
    }

    /// Node handles the page registry currently holds
    pub async fn registered_nodes(&self) -> E2eResult<u64> {
        let script = format!("Object.keys({REGISTRY}.nodes).length");
        Ok(self.evaluate(script).await?.as_u64().unwrap_or(0))
    }

    fn with_generations<R>(&self, f: impl FnOnce(&mut NodeGenerations) -> R) -> E2eResult<R> {
        let mut gens = self
            .generations
            .lock()
            .map_err(|_| E2eError::driver("node registry lock poisoned"))?;
        Ok(f(&mut gens))
    }

    async fn evaluate(&self, script: String) -> E2eResult<Value> {
        let result = self.page.evaluate(script).await.map_err(script_error)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Evaluate `expression` with `el` bound to the handle's node.
    async fn on_element(&self, handle: &ElementHandle, expression: &str) -> E2eResult<Value> {
        let script = format!(
            "(() => {{ const el = {REGISTRY}.nodes[{id}]; \
             if (!el || !el.isConnected) return {{ stale: true }}; \
             return {{ stale: false, value: ({expression}) }}; }})()",
            id = js_string(handle.id()),
        );
        let mut outcome = self.evaluate(script).await?;
        if outcome.get("stale").and_then(Value::as_bool).unwrap_or(true) {
            return Err(E2eError::stale(handle.locator()));
        }
        Ok(outcome
            .get_mut("value")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn focus(&self, handle: &ElementHandle) -> E2eResult<()> {
        self.on_element(handle, "(el.focus(), null)").await.map(drop)
    }

    async fn hit_test(&self, handle: &ElementHandle) -> E2eResult<HitTest> {
        let value = self
            .on_element(
                handle,
                "(() => { el.scrollIntoView({block: 'center', inline: 'center'}); \
                 const r = el.getBoundingClientRect(); \
                 const x = r.left + r.width / 2; const y = r.top + r.height / 2; \
                 const top = document.elementFromPoint(x, y); \
                 return { x, y, hit: !!top && (top === el || el.contains(top)), \
                          by: top ? top.outerHTML.slice(0, 120) : null }; })()",
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> E2eResult<()> {
        let mut params = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
        if kind != DispatchMouseEventType::MouseMoved {
            params = params.button(MouseButton::Left).click_count(1);
        }
        let params = params.build().map_err(E2eError::driver)?;
        self.page.execute(params).await.map_err(driver_error)?;
        Ok(())
    }

    async fn key(&self, key: &str, code: &str, vk: i64, text: Option<&str>) -> E2eResult<()> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let mut params = DispatchKeyEventParams::builder()
                .r#type(kind.clone())
                .key(key)
                .code(code)
                .windows_virtual_key_code(vk);
            if let (DispatchKeyEventType::KeyDown, Some(text)) = (&kind, text) {
                params = params.text(text);
            }
            let params = params.build().map_err(E2eError::driver)?;
            self.page.execute(params).await.map_err(driver_error)?;
        }
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn launch_error(e: impl ToString) -> E2eError {
    E2eError::BrowserLaunch {
        message: e.to_string(),
    }
}

fn driver_error(e: impl ToString) -> E2eError {
    E2eError::driver(e.to_string())
}

fn script_error(e: impl ToString) -> E2eError {
    E2eError::script(e.to_string())
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>> {
        let prefix = uuid::Uuid::new_v4().simple().to_string();
        let key = locator.to_string();
        let evicted = self.with_generations(|gens| gens.admit(&key, &prefix))?;
        let script = format!(
            "(() => {{ const reg = {REGISTRY}; \
             {evicted}.forEach((id) => {{ delete reg.nodes[id]; }}); \
             const found = {query}; \
             found.forEach((el, i) => {{ reg.nodes[{prefix} + ':' + i] = el; }}); \
             return found.length; }})()",
            evicted = serde_json::to_string(&evicted)?,
            query = locator.to_query_all(),
            prefix = js_string(&prefix),
        );
        let count = self.evaluate(script).await?.as_u64().unwrap_or(0);
        self.with_generations(|gens| gens.settle(&key, &prefix, count))?;
        Ok((0..count)
            .map(|i| ElementHandle::new(format!("{prefix}:{i}"), locator.clone()))
            .collect())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> E2eResult<bool> {
        let value = self
            .on_element(
                element,
                "(() => { const s = getComputedStyle(el); \
                 return s.display !== 'none' && s.visibility !== 'hidden' \
                 && el.getClientRects().length > 0; })()",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> E2eResult<bool> {
        let value = self.on_element(element, "!el.disabled").await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    async fn text(&self, element: &ElementHandle) -> E2eResult<String> {
        let value = self
            .on_element(element, "el.innerText !== undefined ? el.innerText : el.textContent")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> E2eResult<Option<String>> {
        let expression = format!(
            "(() => {{ const n = {name}; \
             if (n === 'value' && 'value' in el) return String(el.value); \
             return el.getAttribute(n); }})()",
            name = js_string(name),
        );
        let value = self.on_element(element, &expression).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        let target = self.hit_test(element).await?;
        if !target.hit {
            return Err(E2eError::Intercepted {
                locator: element.locator().to_string(),
                message: target
                    .by
                    .unwrap_or_else(|| "point is outside the viewport".into()),
            });
        }
        self.mouse(DispatchMouseEventType::MouseMoved, target.x, target.y)
            .await?;
        self.mouse(DispatchMouseEventType::MousePressed, target.x, target.y)
            .await?;
        self.mouse(DispatchMouseEventType::MouseReleased, target.x, target.y)
            .await
    }

    async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        // React tracks the native setter, so assign through the prototype
        self.on_element(
            element,
            "(() => { const proto = Object.getPrototypeOf(el); \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value'); \
             if (setter && setter.set) { setter.set.call(el, ''); } else { el.value = ''; } \
             el.dispatchEvent(new Event('input', { bubbles: true })); \
             el.dispatchEvent(new Event('change', { bubbles: true })); return null; })()",
        )
        .await
        .map(drop)
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.focus(element).await?;
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    async fn press_key(&self, element: &ElementHandle, key: Key) -> E2eResult<()> {
        self.focus(element).await?;
        match key {
            Key::SelectAll => self
                .on_element(
                    element,
                    "(typeof el.select === 'function' ? el.select() \
                     : document.execCommand('selectAll'), null)",
                )
                .await
                .map(drop),
            Key::Delete => self.key("Delete", "Delete", 46, None).await,
            Key::Backspace => self.key("Backspace", "Backspace", 8, None).await,
            Key::Enter => self.key("Enter", "Enter", 13, Some("\r")).await,
        }
    }

    async fn hover(&self, element: &ElementHandle) -> E2eResult<()> {
        let target = self.hit_test(element).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, target.x, target.y)
            .await
    }

    async fn call_function(&self, element: &ElementHandle, function: &str) -> E2eResult<Value> {
        self.on_element(element, &format!("({function}).call(el)"))
            .await
    }

    async fn execute_script(&self, script: &str) -> E2eResult<Value> {
        self.evaluate(script.to_string()).await
    }

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| E2eError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn refresh(&self) -> E2eResult<()> {
        self.page.reload().await.map_err(driver_error)?;
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        let title = self.page.get_title().await.map_err(driver_error)?;
        Ok(title.unwrap_or_default())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let url = self.page.url().await.map_err(driver_error)?;
        Ok(url.unwrap_or_default())
    }

    async fn set_window_size(&self, size: WindowSize) -> E2eResult<()> {
        match size {
            WindowSize::Maximized => {
                self.page
                    .execute(ClearDeviceMetricsOverrideParams::default())
                    .await
                    .map_err(driver_error)?;
            }
            WindowSize::Fixed { width, height } => {
                let params = SetDeviceMetricsOverrideParams::new(
                    i64::from(width),
                    i64::from(height),
                    1.0,
                    false,
                );
                self.page.execute(params).await.map_err(driver_error)?;
            }
        }
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(driver_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(driver_error)
    }

    async fn quit(&self) -> E2eResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Err(E2eError::driver("session closed"));
        };
        browser.close().await.map_err(driver_error)?;
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "chromium exit status unavailable");
        }
        tracing::info!("chromium closed");
        Ok(())
    }
}
