//! Resilient element interactions.
//!
//! [`Interactor`] resolves a [`Locator`] afresh for every action and rides
//! out the usual single-page-app churn: nodes re-rendered between lookup
//! and use, overlays still fading out, buttons that stay disabled for a few
//! hundred milliseconds.
//!
//! ```text
//! click(locator)
//!   └─ retry (attempts = retries + 1, pause between)
//!        ├─ wait clickable (or present)     ── Timeout → retry
//!        ├─ scroll to viewport centre       ── Stale   → retry
//!        └─ native click
//!             └─ Intercepted → script click ── Stale/Intercepted → retry
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::driver::{BrowserDriver, ElementHandle, Key, SCRIPT_CLICK, SCROLL_INTO_VIEW};
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::retry::{retry, Attempt, RetryPolicy};
use crate::wait::{Condition, Timeouts, Waiter};

/// Options for [`Interactor::click_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// Per-attempt wait for the element
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retries: u32,
    /// Wait for clickable rather than merely present
    pub wait_for_clickable: bool,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            wait_for_clickable: true,
        }
    }
}

impl ClickOptions {
    /// Create click options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set per-attempt timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Only wait for presence before clicking
    #[must_use]
    pub const fn presence_only(mut self) -> Self {
        self.wait_for_clickable = false;
        self
    }
}

/// Find/click/type/wait primitives over a [`BrowserDriver`].
///
/// Cheap to clone; every page object holds its own copy.
#[derive(Debug, Clone)]
pub struct Interactor {
    driver: Arc<dyn BrowserDriver>,
    waiter: Waiter,
    timeouts: Timeouts,
}

impl Interactor {
    /// Create an interactor with the given timings
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, timeouts: Timeouts) -> Self {
        let waiter = Waiter::new(driver.clone(), timeouts.poll_interval_ms);
        Self {
            driver,
            waiter,
            timeouts,
        }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Configured timings
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Default click options, with the configured element timeout
    #[must_use]
    pub fn click_options(&self) -> ClickOptions {
        ClickOptions::new().with_timeout(self.timeouts.default_wait())
    }

    fn policy(&self, attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, self.timeouts.retry_pause())
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait for `condition`; `None` only for [`Condition::Invisible`].
    pub async fn wait_for(
        &self,
        locator: &Locator,
        condition: &Condition,
        timeout: Duration,
    ) -> E2eResult<Option<ElementHandle>> {
        self.waiter.until(locator, condition, timeout).await
    }

    /// Wait for `condition` and return the matched element.
    ///
    /// For [`Condition::Invisible`] use [`Interactor::wait_invisible`].
    pub async fn wait_element(
        &self,
        locator: &Locator,
        condition: &Condition,
        timeout: Duration,
    ) -> E2eResult<ElementHandle> {
        self.waiter
            .until(locator, condition, timeout)
            .await?
            .ok_or_else(|| E2eError::NotFound {
                locator: locator.to_string(),
                ms: timeout.as_millis() as u64,
            })
    }

    /// Wait for a displayed match
    pub async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> E2eResult<ElementHandle> {
        self.wait_element(locator, &Condition::Visible, timeout).await
    }

    /// Wait for a displayed, enabled match
    pub async fn wait_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> E2eResult<ElementHandle> {
        self.wait_element(locator, &Condition::Clickable, timeout).await
    }

    /// Wait until nothing matching is displayed
    pub async fn wait_invisible(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.waiter
            .until(locator, &Condition::Invisible, timeout)
            .await
            .map(|_| ())
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Wait for presence within the default timeout.
    ///
    /// Fails with `NotFound` rather than `Timeout`.
    pub async fn find(&self, locator: &Locator) -> E2eResult<ElementHandle> {
        self.find_within(locator, self.timeouts.default_wait()).await
    }

    /// Wait for presence within `timeout`
    pub async fn find_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> E2eResult<ElementHandle> {
        match self.wait_element(locator, &Condition::Present, timeout).await {
            Err(E2eError::Timeout { ms, .. }) => Err(E2eError::NotFound {
                locator: locator.to_string(),
                ms,
            }),
            other => other,
        }
    }

    /// Current matches, possibly none
    pub async fn find_all(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>> {
        self.driver.find_elements(locator).await
    }

    /// Whether anything matches right now
    pub async fn is_present(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(!self.driver.find_elements(locator).await?.is_empty())
    }

    /// Whether a match becomes visible within `timeout`; `false` on timeout.
    pub async fn is_visible(&self, locator: &Locator, timeout: Duration) -> E2eResult<bool> {
        match self.wait_visible(locator, timeout).await {
            Ok(_) => Ok(true),
            Err(e @ E2eError::Timeout { .. }) => {
                tracing::warn!(%locator, error = %e, "element not visible");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // CLICKS
    // =========================================================================

    /// Click with the default options
    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.click_with(locator, self.click_options()).await
    }

    /// Click, re-resolving the locator on every attempt.
    ///
    /// Transient failures are retried up to `options.retries` times. The
    /// last transient error is returned once the budget is spent; anything
    /// else aborts at once.
    pub async fn click_with(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        let policy = self.policy(options.retries.saturating_add(1));
        let what = format!("click {locator}");
        retry(&policy, &what, |attempt| async move {
            tracing::debug!(%locator, attempt, "click attempt");
            Attempt::from_result(self.click_once(locator, &options).await)
        })
        .await
    }

    async fn click_once(&self, locator: &Locator, options: &ClickOptions) -> E2eResult<()> {
        let condition = if options.wait_for_clickable {
            Condition::Clickable
        } else {
            Condition::Present
        };
        let element = self
            .wait_element(locator, &condition, options.timeout)
            .await?;
        self.scroll_into_view(&element).await?;
        self.click_element(&element).await
    }

    /// Native click, falling back to a script click when intercepted
    pub async fn click_element(&self, element: &ElementHandle) -> E2eResult<()> {
        match self.driver.click(element).await {
            Err(E2eError::Intercepted { message, .. }) => {
                tracing::warn!(%element, receiver = %message, "click intercepted, using script click");
                self.driver
                    .call_function(element, SCRIPT_CLICK)
                    .await
                    .map(|_| ())
            }
            other => other,
        }
    }

    /// Single clickable wait, then click.
    ///
    /// An element that never became clickable is reported as an assertion
    /// naming `label`; other failures pass through unchanged.
    pub async fn safe_click(&self, locator: &Locator, label: &str) -> E2eResult<()> {
        let timeout = Duration::from_millis(self.timeouts.safe_click_ms);
        let outcome = async {
            let element = self.wait_clickable(locator, timeout).await?;
            self.scroll_into_view(&element).await?;
            self.click_element(&element).await
        }
        .await;
        outcome.map_err(|e| match e {
            E2eError::Timeout { .. } | E2eError::NotFound { .. } => {
                E2eError::assertion(format!("Could not click on {label}: {e}"))
            }
            other => other,
        })
    }

    // =========================================================================
    // TEXT INPUT
    // =========================================================================

    /// Find, clear and type; retried while the input goes stale
    pub async fn send_keys(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let policy = self.policy(3);
        let what = format!("type into {locator}");
        retry(&policy, &what, |_| async move {
            Attempt::retry_stale(self.type_into(locator, text).await)
        })
        .await
    }

    async fn type_into(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let element = self.find(locator).await?;
        self.driver.clear(&element).await?;
        self.driver.type_text(&element, text).await
    }

    /// Click, select-all and delete, then type
    pub async fn replace_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let element = self
            .wait_clickable(locator, self.timeouts.default_wait())
            .await?;
        self.click_element(&element).await?;
        self.clear_by_keys(&element).await?;
        self.driver.type_text(&element, text).await
    }

    /// Select-all then delete on a focused input
    pub async fn clear_by_keys(&self, element: &ElementHandle) -> E2eResult<()> {
        self.driver.press_key(element, Key::SelectAll).await?;
        self.driver.press_key(element, Key::Delete).await
    }

    /// Type into an already-resolved element
    pub async fn type_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.driver.type_text(element, text).await
    }

    /// Clear an already-resolved input
    pub async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        self.driver.clear(element).await
    }

    /// Press an editing key on an already-resolved element
    pub async fn press_key(&self, element: &ElementHandle, key: Key) -> E2eResult<()> {
        self.driver.press_key(element, key).await
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Text of the first visible match within the default timeout
    pub async fn text(&self, locator: &Locator) -> E2eResult<String> {
        self.text_within(locator, self.timeouts.default_wait()).await
    }

    /// Text of the first visible match within `timeout`
    pub async fn text_within(&self, locator: &Locator, timeout: Duration) -> E2eResult<String> {
        let policy = self.policy(3);
        let what = format!("read text of {locator}");
        retry(&policy, &what, |_| async move {
            let read = async {
                let element = self.wait_visible(locator, timeout).await?;
                self.driver.text(&element).await
            };
            Attempt::retry_stale(read.await)
        })
        .await
    }

    /// Text of the first match once it is non-blank
    pub async fn settled_text(&self, locator: &Locator, timeout: Duration) -> E2eResult<String> {
        let policy = self.policy(3);
        let what = format!("read settled text of {locator}");
        retry(&policy, &what, |_| async move {
            let read = async {
                let element = self
                    .wait_element(locator, &Condition::TextNotEmpty, timeout)
                    .await?;
                self.driver.text(&element).await
            };
            Attempt::retry_stale(read.await)
        })
        .await
    }

    /// Attribute of the first present match
    pub async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let element = self.find(locator).await?;
        self.driver.attribute(&element, name).await
    }

    /// Document title
    pub async fn title(&self) -> E2eResult<String> {
        self.driver.title().await
    }

    /// Current URL
    pub async fn current_url(&self) -> E2eResult<String> {
        self.driver.current_url().await
    }

    // =========================================================================
    // PAGE
    // =========================================================================

    /// Scroll an element to the viewport centre
    pub async fn scroll_into_view(&self, element: &ElementHandle) -> E2eResult<()> {
        self.driver
            .call_function(element, SCROLL_INTO_VIEW)
            .await
            .map(|_| ())
    }

    /// Move the pointer over the first present match
    pub async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        let element = self.find(locator).await?;
        self.driver.hover(&element).await
    }

    /// Evaluate a script in the page
    pub async fn execute_script(&self, script: &str) -> E2eResult<serde_json::Value> {
        self.driver.execute_script(script).await
    }

    /// Navigate to URL
    pub async fn navigate(&self, url: &str) -> E2eResult<()> {
        tracing::info!(url, "navigate");
        self.driver.navigate(url).await
    }

    /// Reload the current page
    pub async fn refresh(&self) -> E2eResult<()> {
        self.driver.refresh().await
    }
}
