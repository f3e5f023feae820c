//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable `(strategy, expression)` pair. The pair is
//! validated on construction so an XPath never travels under the CSS tag and
//! an id never carries whitespace. Locators are resolved afresh on every
//! interaction; they never cache an element.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{E2eError, E2eResult};

/// How a locator's expression is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// `name` attribute
    Name,
    /// Single CSS class token
    ClassName,
    /// CSS selector
    Css,
    /// XPath 1.0 expression
    #[serde(rename = "xpath")]
    XPath,
}

impl Strategy {
    /// Short name used in logs and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::ClassName => "class",
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct RawLocator {
    by: Strategy,
    value: String,
}

impl TryFrom<RawLocator> for Locator {
    type Error = E2eError;

    fn try_from(raw: RawLocator) -> E2eResult<Self> {
        Self::new(raw.by, raw.value)
    }
}

/// A validated `(strategy, expression)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLocator")]
pub struct Locator {
    #[serde(rename = "by")]
    strategy: Strategy,
    #[serde(rename = "value")]
    expression: String,
}

impl Locator {
    /// Create a locator, checking that the expression fits the strategy.
    pub fn new(strategy: Strategy, expression: impl Into<String>) -> E2eResult<Self> {
        let expression = expression.into();
        validate(strategy, &expression)?;
        Ok(Self {
            strategy,
            expression,
        })
    }

    /// Locator for a known-good expression.
    ///
    /// # Panics
    ///
    /// Panics if the expression does not fit the strategy. Only use with
    /// literals; runtime values go through [`Locator::new`].
    #[must_use]
    #[track_caller]
    pub fn from_static(strategy: Strategy, expression: &str) -> Self {
        match Self::new(strategy, expression) {
            Ok(locator) => locator,
            Err(e) => panic!("{e}"),
        }
    }

    /// XPath built from a fixed `//` template around quoted runtime values.
    pub(crate) fn generated_xpath(expression: String) -> Self {
        debug_assert!(validate(Strategy::XPath, &expression).is_ok());
        Self {
            strategy: Strategy::XPath,
            expression,
        }
    }

    /// `id` locator
    pub fn id(id: impl Into<String>) -> E2eResult<Self> {
        Self::new(Strategy::Id, id)
    }

    /// `name` locator
    pub fn name(name: impl Into<String>) -> E2eResult<Self> {
        Self::new(Strategy::Name, name)
    }

    /// Class-name locator
    pub fn class_name(class: impl Into<String>) -> E2eResult<Self> {
        Self::new(Strategy::ClassName, class)
    }

    /// CSS locator
    pub fn css(selector: impl Into<String>) -> E2eResult<Self> {
        Self::new(Strategy::Css, selector)
    }

    /// XPath locator
    pub fn xpath(expression: impl Into<String>) -> E2eResult<Self> {
        Self::new(Strategy::XPath, expression)
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the raw expression
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// JavaScript expression evaluating to an `Array` of matching elements.
    #[must_use]
    pub fn to_query_all(&self) -> String {
        let quoted = js_string(&self.expression);
        match self.strategy {
            Strategy::Id => format!("[document.getElementById({quoted})].filter(Boolean)"),
            Strategy::Name => format!("Array.from(document.getElementsByName({quoted}))"),
            Strategy::ClassName => {
                format!("Array.from(document.getElementsByClassName({quoted}))")
            }
            Strategy::Css => format!("Array.from(document.querySelectorAll({quoted}))"),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({quoted}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.expression)
    }
}

fn validate(strategy: Strategy, expression: &str) -> E2eResult<()> {
    let reject = |reason: &str| {
        Err(E2eError::InvalidLocator {
            strategy: strategy.to_string(),
            expression: expression.to_string(),
            reason: reason.to_string(),
        })
    };

    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return reject("expression is empty");
    }

    match strategy {
        Strategy::Id | Strategy::Name => {
            if expression.chars().any(char::is_whitespace) {
                return reject("attribute values cannot contain whitespace");
            }
        }
        Strategy::ClassName => {
            if expression.chars().any(char::is_whitespace) {
                return reject("use a CSS locator for compound class names");
            }
            if expression.starts_with('.') {
                return reject("class name must not start with '.'");
            }
        }
        Strategy::Css => {
            if trimmed.starts_with('/') {
                return reject("looks like an XPath expression");
            }
        }
        Strategy::XPath => {
            if !(trimmed.starts_with('/') || trimmed.starts_with('(') || trimmed.starts_with('.'))
            {
                return reject("XPath must start with '/', '(' or '.'");
            }
        }
    }
    Ok(())
}

/// Quote a runtime value as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds is
/// spliced together with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Quote a value as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
