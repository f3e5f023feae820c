//! In-memory browser for running the suite without Chromium.
//!
//! [`MockDriver`] implements [`BrowserDriver`](crate::driver::BrowserDriver)
//! over a [`MockDom`]. Tests can script it element by element, or attach
//! the [`InventoryApp`] simulation and drive whole scenarios through it.

mod app;
mod dom;
mod driver;

pub use app::{simulated_driver, AppModel, InventoryApp, StockItem};
pub use dom::{MockDom, MockElement};
pub use driver::{Behavior, ClickHook, MockDriver, MOCK_SCREENSHOT};
