//! Result and error types for stockcheck.

use thiserror::Error;

/// Result type for stockcheck operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum E2eError {
    /// Locator matched nothing within the timeout
    #[error("Element not found: {locator} (waited {ms}ms)")]
    NotFound {
        /// Locator that was resolved
        locator: String,
        /// Time waited in milliseconds
        ms: u64,
    },

    /// Element reference was invalidated by a re-render
    #[error("Stale element reference for {locator}")]
    StaleReference {
        /// Locator the element was resolved from
        locator: String,
    },

    /// Click landed on a different, overlapping element
    #[error("Click on {locator} intercepted: {message}")]
    Intercepted {
        /// Locator of the intended target
        locator: String,
        /// What received the click instead
        message: String,
    },

    /// Wait condition never became true
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Description of the awaited condition
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Locator expression does not fit its strategy
    #[error("Invalid locator {strategy}={expression:?}: {reason}")]
    InvalidLocator {
        /// Strategy name
        strategy: String,
        /// Offending expression
        expression: String,
        /// Why it was rejected
        reason: String,
    },

    /// Quantity cell did not contain an integer
    #[error("Quantity for {item:?} is not a number: {text:?}")]
    InvalidQuantity {
        /// Inventory item name
        item: String,
        /// Raw cell text
        text: String,
    },

    /// Scenario assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Driver-level failure (session gone, protocol error)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Script evaluation failed in the page
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl E2eError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a stale reference error
    #[must_use]
    pub fn stale(locator: impl ToString) -> Self {
        Self::StaleReference {
            locator: locator.to_string(),
        }
    }

    /// Errors the interaction layer may retry after re-resolving the locator.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::StaleReference { .. }
                | Self::Intercepted { .. }
                | Self::Timeout { .. }
        )
    }

    /// Staleness and not-found only; what a poll treats as "not yet".
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StaleReference { .. })
    }
}

/// Fail with [`E2eError::AssertionFailed`] unless both sides are equal.
#[macro_export]
macro_rules! ensure_eq {
    ($actual:expr, $expected:expr, $what:expr $(,)?) => {{
        let actual = &$actual;
        let expected = &$expected;
        if actual != expected {
            return Err($crate::E2eError::assertion(format!(
                "{}\nExpected: {:?}\nActual: {:?}",
                $what, expected, actual
            )));
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(E2eError::stale("id=x").is_transient());
        assert!(E2eError::Timeout {
            condition: "visible".into(),
            ms: 10
        }
        .is_transient());
        assert!(E2eError::Intercepted {
            locator: "id=x".into(),
            message: "div.backdrop".into()
        }
        .is_transient());
        assert!(!E2eError::driver("session closed").is_transient());
        assert!(!E2eError::assertion("nope").is_transient());
    }

    #[test]
    fn test_unresolved_is_narrower_than_transient() {
        let timeout = E2eError::Timeout {
            condition: "clickable".into(),
            ms: 5,
        };
        assert!(timeout.is_transient());
        assert!(!timeout.is_unresolved());
        assert!(E2eError::NotFound {
            locator: "id=x".into(),
            ms: 0
        }
        .is_unresolved());
    }

    #[test]
    fn test_display_messages() {
        let err = E2eError::Timeout {
            condition: "text in xpath=//p".into(),
            ms: 1500,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 1500ms waiting for text in xpath=//p"
        );
        let err = E2eError::InvalidQuantity {
            item: "Baby Wipes".into(),
            text: "n/a".into(),
        };
        assert!(err.to_string().contains("Baby Wipes"));
    }

    fn compare(actual: i64, expected: i64) -> E2eResult<()> {
        ensure_eq!(actual, expected, "quantity after checkout");
        Ok(())
    }

    #[test]
    fn test_ensure_eq_macro() {
        assert!(compare(4, 4).is_ok());
        match compare(3, 4) {
            Err(E2eError::AssertionFailed { message }) => {
                assert!(message.contains("quantity after checkout"));
                assert!(message.contains("Expected: 4"));
                assert!(message.contains("Actual: 3"));
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }
}
