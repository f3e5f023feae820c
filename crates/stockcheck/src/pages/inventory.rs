//! Inventory table: search, quantities and status filter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::driver::ElementHandle;
use crate::locators::{InventoryLocators, LocatorRegistry};
use crate::result::{E2eError, E2eResult};

/// Status filter labels, in menu order
pub const STATUS_LABELS: [&str; 3] = ["Out of Stock", "Low Stock", "Normal Stock"];

/// Highest quantity still reported as low stock
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Stock level shown in the status column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockStatus {
    /// Nothing on hand
    OutOfStock,
    /// At or below [`LOW_STOCK_THRESHOLD`]
    Low,
    /// Anything above
    Normal,
}

impl StockStatus {
    /// Status for a quantity on hand
    #[must_use]
    pub const fn of(quantity: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= LOW_STOCK_THRESHOLD {
            Self::Low
        } else {
            Self::Normal
        }
    }

    /// Label in the table and filter menu
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => STATUS_LABELS[0],
            Self::Low => STATUS_LABELS[1],
            Self::Normal => STATUS_LABELS[2],
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StockStatus {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::OutOfStock, Self::Low, Self::Normal]
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| E2eError::config(format!("unknown stock status: {s}")))
    }
}

fn parse_quantity(item: &str, text: &str) -> E2eResult<i64> {
    text.trim()
        .parse()
        .map_err(|_| E2eError::InvalidQuantity {
            item: item.to_string(),
            text: text.to_string(),
        })
}

page! {
    /// Inventory table with search and filters
    InventoryPage
}

impl InventoryPage {
    /// Short wait for optional widgets such as the clear icon
    fn short_wait(&self) -> Duration {
        Duration::from_millis(self.ui.timeouts().safe_click_ms)
    }

    /// Inventory column text for `item`; the table can take a while to fill.
    pub async fn inventory_text(&self, item: &str) -> E2eResult<String> {
        self.ui
            .text_within(
                &InventoryLocators::inventory_cell(item),
                self.ui.timeouts().long_wait(),
            )
            .await
    }

    /// Inventory column value for `item` as a number
    pub async fn inventory_quantity(&self, item: &str) -> E2eResult<i64> {
        let text = self.inventory_text(item).await?;
        parse_quantity(item, &text)
    }

    /// Quantity column value for `item`.
    ///
    /// Fails with `InvalidQuantity` when the cell is not an integer.
    pub async fn quantity(&self, item: &str) -> E2eResult<i64> {
        let text = self.ui.text(&InventoryLocators::quantity_cell(item)).await?;
        let quantity = parse_quantity(item, &text);
        if let Err(e) = &quantity {
            tracing::error!(item, error = %e, "quantity retrieval failed");
        }
        quantity
    }

    /// Type `item` into the table search box
    pub async fn search_item(&self, item: &str) -> E2eResult<()> {
        let search = &self.locators.inventory.search;
        let field = self
            .ui
            .wait_clickable(search, self.ui.timeouts().default_wait())
            .await?;
        self.ui.scroll_into_view(&field).await?;
        self.ui.send_keys(search, item).await
    }

    /// Wait for a row naming `item`, searching again once before failing.
    pub async fn wait_for_search_results(&self, item: &str) -> E2eResult<()> {
        let row = LocatorRegistry::row_containing(item);
        let wait = self.ui.timeouts().default_wait() / 2;
        for attempt in 1..=2 {
            match self.ui.find_within(&row, wait).await {
                Ok(_) => return Ok(()),
                Err(E2eError::NotFound { .. }) => {
                    tracing::warn!(item, attempt, "search result missing, searching again");
                    self.search_item(item).await?;
                }
                Err(e) => return Err(e),
            }
        }
        Err(E2eError::assertion(format!(
            "'{item}' not found in inventory table after retries"
        )))
    }

    /// Wait for the loading spinner to go away
    pub async fn wait_for_inventory_loaded(&self) -> E2eResult<()> {
        self.ui
            .wait_invisible(
                &self.locators.common.loading_spinner,
                self.ui.timeouts().default_wait(),
            )
            .await
    }

    /// Replace whatever is in the search box with `item`.
    ///
    /// Uses the clear icon when shown, then select-all and delete, and
    /// checks the box is empty before typing.
    pub async fn research_item(&self, item: &str) -> E2eResult<()> {
        let l = &self.locators.inventory;
        let field = self
            .ui
            .wait_clickable(&l.search, self.ui.timeouts().default_wait())
            .await?;
        self.ui.scroll_into_view(&field).await?;

        match self.ui.wait_visible(&l.clear_icon, self.short_wait()).await {
            Ok(icon) => self.ui.click_element(&icon).await?,
            Err(e) if e.is_transient() => {
                tracing::debug!("clear icon not shown, clearing by keys");
            }
            Err(e) => return Err(e),
        }

        self.ui.clear_by_keys(&field).await?;
        let leftover = self.ui.driver().attribute(&field, "value").await?;
        if leftover.is_some_and(|v| !v.trim().is_empty()) {
            self.ui.clear(&field).await?;
        }
        self.ui.type_text(&field, item).await
    }

    /// Open the status filter menu
    pub async fn click_status(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.status_button).await
    }

    pub async fn select_status(&self, status: StockStatus) -> E2eResult<()> {
        self.ui
            .click(&InventoryLocators::status_option(status.label()))
            .await
    }

    /// Rows currently shown with `status`; empty when the filter matches none
    pub async fn filtered_rows(&self, status: StockStatus) -> E2eResult<Vec<ElementHandle>> {
        let rows = InventoryLocators::rows_with_status(status.label());
        match self.ui.find(&rows).await {
            Ok(_) | Err(E2eError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        self.ui.find_all(&rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::interaction::Interactor;
    use crate::mock::{MockDriver, MockElement};
    use crate::wait::Timeouts;

    fn page() -> (Arc<MockDriver>, InventoryPage, LocatorRegistry) {
        let driver = Arc::new(MockDriver::new());
        let ui = Interactor::new(driver.clone(), Timeouts::fast());
        let locators = LocatorRegistry::new();
        (driver, InventoryPage::new(ui, Arc::new(locators.clone())), locators)
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_status_thresholds() {
            assert_eq!(StockStatus::of(0), StockStatus::OutOfStock);
            assert_eq!(StockStatus::of(-2), StockStatus::OutOfStock);
            assert_eq!(StockStatus::of(5), StockStatus::Low);
            assert_eq!(StockStatus::of(6), StockStatus::Normal);
        }

        #[test]
        fn test_status_parse() {
            assert_eq!("out of stock".parse::<StockStatus>().unwrap(), StockStatus::OutOfStock);
            assert_eq!("Low Stock".parse::<StockStatus>().unwrap(), StockStatus::Low);
            assert!("Backordered".parse::<StockStatus>().is_err());
        }
    }

    mod quantity_tests {
        use super::*;

        #[tokio::test]
        async fn test_quantity_parses_trimmed_cell() {
            let (driver, page, _) = page();
            driver.insert(
                InventoryLocators::quantity_cell("Clothing Rack"),
                MockElement::new(" 12 "),
            );
            assert_eq!(page.quantity("Clothing Rack").await.unwrap(), 12);
            // read-only, so asking twice gives the same answer
            assert_eq!(page.quantity("Clothing Rack").await.unwrap(), 12);
        }

        #[tokio::test]
        async fn test_quantity_not_a_number() {
            let (driver, page, _) = page();
            driver.insert(
                InventoryLocators::quantity_cell("Bath Towel"),
                MockElement::new("n/a"),
            );
            let err = page.quantity("Bath Towel").await.unwrap_err();
            assert!(matches!(err, E2eError::InvalidQuantity { ref text, .. } if text == "n/a"));
        }

        #[tokio::test]
        async fn test_quantity_missing_row_is_timeout() {
            let (_driver, page, _) = page();
            let err = page.quantity("Ghost").await.unwrap_err();
            assert!(err.is_transient());
        }
    }

    mod search_tests {
        use super::*;

        #[tokio::test]
        async fn test_search_types_into_box() {
            let (driver, page, l) = page();
            driver.insert(l.inventory.search.clone(), MockElement::new(""));
            page.search_item("Baby Wipes").await.unwrap();
            assert_eq!(driver.value_of(&l.inventory.search).as_deref(), Some("Baby Wipes"));
        }

        #[tokio::test]
        async fn test_missing_result_searches_again_then_fails() {
            let (driver, page, l) = page();
            driver.insert(l.inventory.search.clone(), MockElement::new(""));
            let err = page.wait_for_search_results("Ghost").await.unwrap_err();
            assert!(matches!(err, E2eError::AssertionFailed { .. }));
            assert_eq!(driver.count(&format!("type:{}", l.inventory.search)), 2);
        }

        #[tokio::test]
        async fn test_research_replaces_previous_text() {
            let (driver, page, l) = page();
            driver.insert(
                l.inventory.search.clone(),
                MockElement::new("").with_value("Clothing Rack"),
            );
            page.research_item("Baby Wipes").await.unwrap();
            assert_eq!(driver.value_of(&l.inventory.search).as_deref(), Some("Baby Wipes"));
            assert!(driver.was_called("key:SelectAll"));
        }

        #[tokio::test]
        async fn test_spinner_gone() {
            let (driver, page, l) = page();
            driver.insert(l.common.loading_spinner.clone(), MockElement::new("").hidden());
            page.wait_for_inventory_loaded().await.unwrap();
        }
    }

    mod filter_tests {
        use super::*;

        #[tokio::test]
        async fn test_filtered_rows_counts_matches() {
            let (driver, page, _) = page();
            let rows = InventoryLocators::rows_with_status("Out of Stock");
            driver.push(rows.clone(), MockElement::new("Bath Towel"));
            driver.push(rows, MockElement::new("Dish Soap"));
            let found = page.filtered_rows(StockStatus::OutOfStock).await.unwrap();
            assert_eq!(found.len(), 2);
        }

        #[tokio::test]
        async fn test_filtered_rows_empty() {
            let (_driver, page, _) = page();
            assert!(page.filtered_rows(StockStatus::Low).await.unwrap().is_empty());
        }
    }
}
