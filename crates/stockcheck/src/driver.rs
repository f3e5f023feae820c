//! Browser driver capability trait.
//!
//! The interaction layer only talks to [`BrowserDriver`]. Two back-ends
//! implement it:
//!
//! - `ChromiumDriver` drives a real browser over CDP (feature `browser`)
//! - [`MockDriver`](crate::mock::MockDriver) is an in-memory DOM for tests
//!
//! Element handles are ephemeral. Any method taking an [`ElementHandle`]
//! may fail with [`E2eError::StaleReference`](crate::E2eError::StaleReference)
//! once the page re-renders the node it points at.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::Locator;
use crate::result::E2eResult;

/// Script function body scrolling `this` to the centre of the viewport.
pub const SCROLL_INTO_VIEW: &str =
    "function() { this.scrollIntoView({block: 'center', inline: 'center'}); }";

/// Script function body clicking `this` without hit-testing.
pub const SCRIPT_CLICK: &str = "function() { this.click(); }";

/// Reference to a live DOM node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
    locator: Locator,
}

impl ElementHandle {
    /// Create a handle for a driver-assigned id
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }

    /// Driver-assigned opaque id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Locator this handle was resolved from
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.id)
    }
}

/// Editing keys sent to a focused element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Ctrl+A
    SelectAll,
    /// Delete the selection or the character after the caret
    Delete,
    /// Delete the character before the caret
    Backspace,
    /// Enter / Return
    Enter,
}

/// Window geometry applied at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WindowSize {
    /// Fill the screen
    Maximized,
    /// Fixed viewport
    Fixed {
        /// Width in CSS pixels
        width: u32,
        /// Height in CSS pixels
        height: u32,
    },
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::Maximized
    }
}

/// Capabilities the interaction layer needs from a browser.
///
/// Object safe; sessions hold it as `Arc<dyn BrowserDriver>`.
#[async_trait]
pub trait BrowserDriver: Send + Sync + fmt::Debug {
    /// All elements currently matching `locator`, in document order.
    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>>;

    /// Rendered and not hidden
    async fn is_displayed(&self, element: &ElementHandle) -> E2eResult<bool>;

    /// Not disabled
    async fn is_enabled(&self, element: &ElementHandle) -> E2eResult<bool>;

    /// Rendered text content
    async fn text(&self, element: &ElementHandle) -> E2eResult<String>;

    /// Attribute value, `None` when the attribute is absent
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> E2eResult<Option<String>>;

    /// Native click at the element centre.
    ///
    /// Fails with `Intercepted` when another element would receive it.
    async fn click(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Clear an input's value
    async fn clear(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Type text into the element
    async fn type_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()>;

    /// Press an editing key on the element
    async fn press_key(&self, element: &ElementHandle, key: Key) -> E2eResult<()>;

    /// Move the pointer over the element
    async fn hover(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Call a script function with `this` bound to the element
    async fn call_function(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> E2eResult<serde_json::Value>;

    /// Evaluate a script in the page
    async fn execute_script(&self, script: &str) -> E2eResult<serde_json::Value>;

    /// Navigate to URL
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Reload the current page
    async fn refresh(&self) -> E2eResult<()>;

    /// Document title
    async fn title(&self) -> E2eResult<String>;

    /// Current URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Resize the window
    async fn set_window_size(&self, size: WindowSize) -> E2eResult<()>;

    /// PNG of the viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    /// Close the browser. Further calls fail with `Driver`.
    async fn quit(&self) -> E2eResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Strategy;

    #[test]
    fn test_handle_accessors() {
        let locator = Locator::from_static(Strategy::Id, "select-unit-number");
        let handle = ElementHandle::new("e7", locator.clone());
        assert_eq!(handle.id(), "e7");
        assert_eq!(handle.locator(), &locator);
        assert_eq!(handle.to_string(), "id=select-unit-number#e7");
    }

    #[test]
    fn test_window_size_yaml() {
        let size: WindowSize =
            serde_yaml_ng::from_str("mode: fixed\nwidth: 1920\nheight: 1080\n").unwrap();
        assert_eq!(
            size,
            WindowSize::Fixed {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(WindowSize::default(), WindowSize::Maximized);
    }

    #[test]
    fn test_script_bodies_are_functions() {
        assert!(SCROLL_INTO_VIEW.starts_with("function()"));
        assert!(SCRIPT_CLICK.contains("this.click()"));
    }
}
