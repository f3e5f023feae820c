//! Explicit waits.
//!
//! Every wait in the crate funnels through [`poll_until`]: a bounded poll
//! that keeps probing until the probe reports a value or the deadline
//! passes. [`Waiter`] builds element conditions on top of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Timeout for screens backed by slow queries (90 seconds)
pub const DEFAULT_LONG_TIMEOUT_MS: u64 = 90_000;

/// Single-shot clickable wait used by safe clicks (5 seconds)
pub const DEFAULT_SAFE_CLICK_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default pause between retry attempts (250ms)
pub const DEFAULT_RETRY_PAUSE_MS: u64 = 250;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Timeout and polling interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
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
}

/// Suite-wide timing knobs, loaded from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element waits
    pub default_ms: u64,
    /// Slow screens (inventory table, admin date, person picker)
    pub long_ms: u64,
    /// Safe-click clickable wait
    pub safe_click_ms: u64,
    /// Poll interval of every wait
    pub poll_interval_ms: u64,
    /// Pause between retry attempts
    pub retry_pause_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_WAIT_TIMEOUT_MS,
            long_ms: DEFAULT_LONG_TIMEOUT_MS,
            safe_click_ms: DEFAULT_SAFE_CLICK_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry_pause_ms: DEFAULT_RETRY_PAUSE_MS,
        }
    }
}

impl Timeouts {
    /// Millisecond-scale timings for the in-memory driver
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            default_ms: 200,
            long_ms: 400,
            safe_click_ms: 100,
            poll_interval_ms: 5,
            retry_pause_ms: 1,
        }
    }

    /// Default element wait
    #[must_use]
    pub const fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    /// Long element wait
    #[must_use]
    pub const fn long_wait(&self) -> Duration {
        Duration::from_millis(self.long_ms)
    }

    /// Retry pause
    #[must_use]
    pub const fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    /// Wait options for `timeout` at the configured poll interval
    #[must_use]
    pub const fn options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions {
            timeout_ms: timeout.as_millis() as u64,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Probe until it yields a value or the timeout elapses.
///
/// The probe returns `Ok(Some(v))` when done and `Ok(None)` when not yet.
/// Not-found and stale errors count as "not yet"; any other error aborts
/// the poll. The probe runs at least once, and the sleep between probes is
/// clipped so the final probe happens at the deadline, not after it.
pub async fn poll_until<T, F, Fut>(
    options: &WaitOptions,
    description: &str,
    mut probe: F,
) -> E2eResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Option<T>>>,
{
    let timeout = options.timeout();
    let deadline = Instant::now() + timeout;
    let mut polls = 0_u32;

    loop {
        polls += 1;
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) if e.is_unresolved() => {
                tracing::trace!(condition = description, error = %e, "poll not ready");
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(condition = description, polls, "wait timed out");
            return Err(E2eError::Timeout {
                condition: description.to_string(),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval().min(deadline - now)).await;
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Element state a [`Waiter`] can wait for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// At least one match in the DOM
    Present,
    /// A match that is displayed
    Visible,
    /// No displayed match (absent or hidden)
    Invisible,
    /// A displayed, enabled match
    Clickable,
    /// A displayed match whose non-blank text contains the string
    TextContains(String),
    /// A displayed match with non-blank text
    TextNotEmpty,
    /// A match without the named attribute
    AttributeAbsent(String),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("presence"),
            Self::Visible => f.write_str("visibility"),
            Self::Invisible => f.write_str("invisibility"),
            Self::Clickable => f.write_str("clickability"),
            Self::TextContains(text) => write!(f, "text {text:?}"),
            Self::TextNotEmpty => f.write_str("non-empty text"),
            Self::AttributeAbsent(name) => write!(f, "absence of attribute {name:?}"),
        }
    }
}

/// Element-condition waits over a driver
#[derive(Debug, Clone)]
pub struct Waiter {
    driver: Arc<dyn BrowserDriver>,
    poll_interval_ms: u64,
}

impl Waiter {
    /// Create a waiter polling at `poll_interval_ms`
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, poll_interval_ms: u64) -> Self {
        Self {
            driver,
            poll_interval_ms,
        }
    }

    /// Wait until `condition` holds for `locator`.
    ///
    /// Returns the matching element, or `None` for [`Condition::Invisible`].
    /// Fails with `Timeout` once `timeout` elapses.
    pub async fn until(
        &self,
        locator: &Locator,
        condition: &Condition,
        timeout: Duration,
    ) -> E2eResult<Option<ElementHandle>> {
        let options = WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.poll_interval_ms);
        let description = format!("{condition} of {locator}");
        poll_until(&options, &description, || self.probe(locator, condition)).await
    }

    async fn probe(
        &self,
        locator: &Locator,
        condition: &Condition,
    ) -> E2eResult<Option<Option<ElementHandle>>> {
        let elements = self.driver.find_elements(locator).await?;

        if *condition == Condition::Invisible {
            for element in &elements {
                match self.driver.is_displayed(element).await {
                    Ok(true) => return Ok(None),
                    Ok(false) => {}
                    // a node detached mid-check is gone, which is what we want
                    Err(e) if e.is_unresolved() => {}
                    Err(e) => return Err(e),
                }
            }
            return Ok(Some(None));
        }

        for element in elements {
            if self.matches(&element, condition).await? {
                return Ok(Some(Some(element)));
            }
        }
        Ok(None)
    }

    async fn matches(&self, element: &ElementHandle, condition: &Condition) -> E2eResult<bool> {
        let driver = &self.driver;
        Ok(match condition {
            Condition::Present => true,
            Condition::Visible => driver.is_displayed(element).await?,
            Condition::Invisible => !driver.is_displayed(element).await?,
            Condition::Clickable => {
                driver.is_displayed(element).await? && driver.is_enabled(element).await?
            }
            Condition::TextContains(expected) => {
                if !driver.is_displayed(element).await? {
                    return Ok(false);
                }
                let text = driver.text(element).await?;
                !text.trim().is_empty() && text.contains(expected.as_str())
            }
            Condition::TextNotEmpty => {
                driver.is_displayed(element).await?
                    && !driver.text(element).await?.trim().is_empty()
            }
            Condition::AttributeAbsent(name) => driver.attribute(element, name).await?.is_none(),
        })
    }
}
