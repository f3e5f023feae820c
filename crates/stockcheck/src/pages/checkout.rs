//! Checkout dialog, cart and confirmation.

use crate::locators::{CheckoutLocators, LocatorRegistry};
use crate::result::E2eResult;

page! {
    /// Resident checkout: building, unit and resident, then the cart
    CheckoutPage
}

impl CheckoutPage {
    /// Open checkout from the menu, failing as an assertion if unclickable
    pub async fn click_checkout(&self) -> E2eResult<()> {
        self.ui
            .safe_click(&self.locators.common.checkout_button, "Checkout")
            .await
    }

    pub async fn click_building_code(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.building_code).await
    }

    pub async fn select_first_building_option(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.first_list_item).await
    }

    pub async fn click_unit_number(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.unit_number).await
    }

    pub async fn select_first_unit_number(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.first_list_item).await
    }

    pub async fn click_name_input(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.name_input).await
    }

    /// The resident dropdown shares its list markup with the unit dropdown
    pub async fn select_first_resident(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.first_list_item).await
    }

    pub async fn click_continue(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.continue_button).await
    }

    /// Pick the first building, unit and resident, then continue to the cart
    pub async fn choose_first_resident(&self) -> E2eResult<()> {
        self.click_building_code().await?;
        self.select_first_building_option().await?;
        self.click_unit_number().await?;
        self.select_first_unit_number().await?;
        self.click_name_input().await?;
        self.select_first_resident().await?;
        self.click_continue().await
    }

    /// Type `item` into the cart search box
    pub async fn search_item(&self, item: &str) -> E2eResult<()> {
        let search = &self.locators.checkout.search;
        let field = self
            .ui
            .wait_clickable(search, self.ui.timeouts().default_wait())
            .await?;
        self.ui.scroll_into_view(&field).await?;
        self.ui.send_keys(search, item).await
    }

    /// Add one unit of `item` to the cart
    pub async fn add_item(&self, item: &str) -> E2eResult<()> {
        let button = CheckoutLocators::add_button_for(item);
        let options = self.ui.click_options().with_retries(1);
        self.ui.click_with(&button, options).await
    }

    /// Number of cart rows naming `item`
    pub async fn items_added(&self, item: &str) -> E2eResult<usize> {
        let rows = self
            .ui
            .find_all(&LocatorRegistry::row_containing(item))
            .await?;
        Ok(rows.len())
    }

    pub async fn click_proceed_to_checkout(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.proceed_to_checkout).await
    }

    pub async fn click_confirm(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.checkout.confirm).await
    }
}
