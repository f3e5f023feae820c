//! Add-item modal on the inventory screen.

use std::fmt;

use crate::locators::AddItemLocators;
use crate::result::E2eResult;
use crate::retry::{retry, Attempt, RetryPolicy};
use crate::wait::Condition;

/// How the add-item modal was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateConfirmation {
    /// Success message seen and the modal closed normally
    Confirmed,
    /// Closing failed; the page was reloaded instead
    Refreshed,
}

impl fmt::Display for UpdateConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Refreshed => f.write_str("refreshed"),
        }
    }
}

page! {
    /// Modal for adding stock to an existing item
    AddItemPage
}

impl AddItemPage {
    pub async fn click_inventory_type(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.inventory_type).await
    }

    pub async fn select_general_option(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.select_general).await
    }

    pub async fn select_welcome_basket_option(&self) -> E2eResult<()> {
        self.ui
            .click(&self.locators.inventory.select_welcome_basket)
            .await
    }

    /// Open the item-name autocomplete
    pub async fn open_item_dropdown(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.item_name).await
    }

    /// Type `value` into the autocomplete and pick the matching option.
    ///
    /// Returns once the option list has closed.
    pub async fn select_item(&self, value: &str) -> E2eResult<()> {
        let l = &self.locators;
        let wait = self.ui.timeouts().default_wait() * 2;

        let input = self.ui.wait_clickable(&l.add_item.item_name_input, wait).await?;
        self.ui.click_element(&input).await?;
        self.ui.clear_by_keys(&input).await?;
        self.ui.type_text(&input, value).await?;

        self.ui.wait_visible(&l.common.listbox, wait).await?;
        let option = AddItemLocators::listbox_option(value);
        let options = self.ui.click_options().with_timeout(wait).with_retries(2);
        self.ui.click_with(&option, options).await?;
        self.ui.wait_invisible(&l.common.listbox, wait).await
    }

    /// Replace the quantity, retrying while the input is re-rendered
    pub async fn set_quantity(&self, quantity: i64) -> E2eResult<()> {
        let input = &self.locators.add_item.quantity_input;
        let value = quantity.to_string();
        let policy = RetryPolicy::new(3, self.ui.timeouts().retry_pause());
        retry(&policy, "set quantity", |_| {
            let value = value.as_str();
            async move {
                let set = async {
                    let element = self
                        .ui
                        .wait_clickable(input, self.ui.timeouts().default_wait())
                        .await?;
                    self.ui.click_element(&element).await?;
                    self.ui.clear(&element).await?;
                    self.ui.type_text(&element, value).await
                };
                Attempt::retry_stale(set.await)
            }
        })
        .await
    }

    /// Click submit once the form has enabled it
    pub async fn click_submit(&self) -> E2eResult<()> {
        let submit = &self.locators.add_item.submit_button;
        let enabled = Condition::AttributeAbsent("disabled".into());
        let button = self
            .ui
            .wait_element(submit, &enabled, self.ui.timeouts().default_wait())
            .await?;
        self.ui.click_element(&button).await
    }

    /// Wait for the success message and close the modal.
    ///
    /// If the modal cannot be closed the page is refreshed instead and
    /// [`UpdateConfirmation::Refreshed`] is returned.
    pub async fn validate_update_success(
        &self,
        item: &str,
        quantity: i64,
    ) -> E2eResult<UpdateConfirmation> {
        let l = &self.locators;
        let wait = self.ui.timeouts().default_wait();
        let close = async {
            self.ui.wait_visible(&l.add_item.success_text, wait).await?;
            let button = self
                .ui
                .wait_clickable(&l.add_item.close_modal_button, wait)
                .await?;
            self.ui.click_element(&button).await?;
            self.ui.wait_invisible(&l.common.backdrop, wait).await
        };

        match close.await {
            Ok(()) => {
                tracing::info!(item, quantity, "inventory updated and modal closed");
                Ok(UpdateConfirmation::Confirmed)
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(item, error = %e, "modal closure failed, refreshing page");
                self.ui.refresh().await?;
                Ok(UpdateConfirmation::Refreshed)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn click_quantity(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.quantity).await
    }

    pub async fn click_add_button(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.add_button).await
    }

    pub async fn click_cancel(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.inventory.cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::interaction::Interactor;
    use crate::locators::LocatorRegistry;
    use crate::mock::{MockDriver, MockElement};
    use crate::result::E2eError;
    use crate::wait::Timeouts;

    fn page() -> (Arc<MockDriver>, AddItemPage, LocatorRegistry) {
        let driver = Arc::new(MockDriver::new());
        let ui = Interactor::new(driver.clone(), Timeouts::fast());
        let locators = LocatorRegistry::new();
        (driver, AddItemPage::new(ui, Arc::new(locators.clone())), locators)
    }

    mod quantity_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_quantity_replaces_value() {
            let (driver, page, l) = page();
            driver.insert(
                l.add_item.quantity_input.clone(),
                MockElement::new("").with_value("1"),
            );
            page.set_quantity(5).await.unwrap();
            assert_eq!(driver.value_of(&l.add_item.quantity_input).as_deref(), Some("5"));
        }

        #[tokio::test]
        async fn test_set_quantity_gives_up_after_three_stale() {
            let (driver, page, l) = page();
            driver.insert(l.add_item.quantity_input.clone(), MockElement::new(""));
            driver.inject_stale(&l.add_item.quantity_input, 3);
            let err = page.set_quantity(5).await.unwrap_err();
            assert!(matches!(err, E2eError::StaleReference { .. }));
        }
    }

    mod submit_tests {
        use super::*;
        use std::time::Duration;

        #[tokio::test]
        async fn test_submit_waits_for_enable() {
            let (driver, page, l) = page();
            let submit = l.add_item.submit_button.clone();
            driver.insert(
                submit.clone(),
                MockElement::new("Submit").attribute("disabled", "true"),
            );
            let enabler = {
                let driver = driver.clone();
                let submit = submit.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    driver.update(&submit, |el| {
                        el.attributes.remove("disabled");
                    });
                })
            };
            page.click_submit().await.unwrap();
            enabler.await.unwrap();
            assert!(driver.was_called(&format!("click:{submit}")));
        }

        #[tokio::test]
        async fn test_submit_never_enabled_times_out() {
            let (driver, page, l) = page();
            driver.insert(
                l.add_item.submit_button.clone(),
                MockElement::new("Submit").attribute("disabled", "true"),
            );
            let err = page.click_submit().await.unwrap_err();
            assert!(matches!(err, E2eError::Timeout { .. }));
            assert!(!driver.was_called("click:"));
        }
    }

    mod confirmation_tests {
        use super::*;

        #[tokio::test]
        async fn test_confirmed_when_modal_closes() {
            let (driver, page, l) = page();
            driver.insert(
                l.add_item.success_text.clone(),
                MockElement::new("Inventory Updated: Baby Wipes"),
            );
            driver.insert(l.add_item.close_modal_button.clone(), MockElement::new("Close"));
            driver.insert(l.common.backdrop.clone(), MockElement::new(""));
            let backdrop = l.common.backdrop.clone();
            driver.on_click(l.add_item.close_modal_button.clone(), move |dom| {
                dom.remove(&backdrop);
            });

            let outcome = page.validate_update_success("Baby Wipes", 5).await.unwrap();
            assert_eq!(outcome, UpdateConfirmation::Confirmed);
            assert!(!driver.was_called("refresh"));
        }

        #[tokio::test]
        async fn test_refresh_when_message_never_shows() {
            let (driver, page, _) = page();
            let outcome = page.validate_update_success("Baby Wipes", 5).await.unwrap();
            assert_eq!(outcome, UpdateConfirmation::Refreshed);
            assert!(driver.was_called("refresh"));
        }
    }

    mod select_tests {
        use super::*;

        #[tokio::test]
        async fn test_select_item_picks_option_and_waits_for_close() {
            let (driver, page, l) = page();
            driver.insert(l.add_item.item_name_input.clone(), MockElement::new(""));
            driver.insert(l.common.listbox.clone(), MockElement::new(""));
            let option = AddItemLocators::listbox_option("Baby Wipes");
            driver.insert(option.clone(), MockElement::new("Baby Wipes"));
            let listbox = l.common.listbox.clone();
            driver.on_click(option.clone(), move |dom| dom.remove(&listbox));

            page.select_item("Baby Wipes").await.unwrap();

            assert_eq!(
                driver.value_of(&l.add_item.item_name_input).as_deref(),
                Some("Baby Wipes")
            );
            assert!(driver.was_called(&format!("click:{option}")));
        }
    }
}
