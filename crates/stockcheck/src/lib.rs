//! Stockcheck: page-object end-to-end suite for the inventory web app.
//!
//! The suite signs volunteers and admins into the inventory and checkout
//! application, walks them through stock lookups, checkouts and restocks,
//! and asserts on what the screens show afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Scenarios   │──►│ Page objects │──►│  Interactor  │──►│BrowserDriver │
//! │ (catalogue)  │   │ login, home, │   │ waits, retry │   │ chromium or  │
//! │              │   │ inventory... │   │ safe clicks  │   │ mock DOM     │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Every element lookup goes through [`Interactor`], which polls until the
//! element is in the state it needs and retries clicks that land while the
//! page is re-rendering. Page objects never sleep.
//!
//! # Running without a browser
//!
//! [`mock::simulated_driver`] renders a simulated copy of the application
//! into an in-memory DOM, so the whole catalogue runs under `cargo test`.
//! Build with the `browser` feature to drive Chromium instead.

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[cfg(feature = "browser")]
pub mod chromium;
pub mod config;
pub mod driver;
pub mod interaction;
pub mod locator;
pub mod locators;
pub mod logging;
pub mod mock;
pub mod pages;
pub mod result;
pub mod retry;
pub mod scenario;
pub mod session;
pub mod wait;

#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use config::{Credentials, Secret, SuiteConfig};
pub use driver::{BrowserDriver, ElementHandle, Key, WindowSize};
pub use interaction::{ClickOptions, Interactor};
pub use locator::{Locator, Strategy};
pub use locators::LocatorRegistry;
pub use pages::{PageObject, Pages};
pub use result::{E2eError, E2eResult};
pub use retry::{retry, Attempt, RetryPolicy};
pub use scenario::{Scenario, Tag};
pub use session::Session;
pub use wait::{poll_until, Condition, Timeouts, WaitOptions};

/// Everything a scenario body usually needs
pub mod prelude {
    pub use super::config::SuiteConfig;
    pub use super::driver::{BrowserDriver, ElementHandle, Key};
    pub use super::ensure_eq;
    pub use super::interaction::{ClickOptions, Interactor};
    pub use super::locator::{Locator, Strategy};
    pub use super::locators::LocatorRegistry;
    pub use super::pages::{
        banner_date, AddItemPage, CheckoutKind, CheckoutPage, HomePage, InventoryPage, LoginPage,
        LogoutPage, PageObject, StockStatus, UpdateConfirmation,
    };
    pub use super::result::{E2eError, E2eResult};
    pub use super::scenario::{Scenario, Tag};
    pub use super::session::Session;
    pub use super::wait::{Condition, Timeouts};
}
