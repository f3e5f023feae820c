//! Page objects for each screen of the inventory app.
//!
//! Every page holds its own [`Interactor`] and a shared
//! [`LocatorRegistry`]. Navigation that appears on every screen lives on
//! the [`PageObject`] trait.
//!
//! # Example
//!
//! ```ignore
//! let inventory = session.inventory_page();
//! inventory.open_inventory().await?;
//! inventory.search_item("Clothing Rack").await?;
//! let quantity = inventory.quantity("Clothing Rack").await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::interaction::Interactor;
use crate::locators::LocatorRegistry;
use crate::result::E2eResult;

/// Declare a page struct holding an interactor and the locator registry.
macro_rules! page {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            ui: $crate::interaction::Interactor,
            locators: ::std::sync::Arc<$crate::locators::LocatorRegistry>,
        }

        impl $name {
            /// Create the page over a session's interactor
            #[must_use]
            pub fn new(
                ui: $crate::interaction::Interactor,
                locators: ::std::sync::Arc<$crate::locators::LocatorRegistry>,
            ) -> Self {
                Self { ui, locators }
            }
        }

        impl $crate::pages::PageObject for $name {
            fn interactor(&self) -> &$crate::interaction::Interactor {
                &self.ui
            }

            fn locators(&self) -> &$crate::locators::LocatorRegistry {
                &self.locators
            }
        }
    };
}

pub mod add_item;
pub mod checkout;
pub mod home;
pub mod inventory;
pub mod login;
pub mod logout;

pub use add_item::{AddItemPage, UpdateConfirmation};
pub use checkout::CheckoutPage;
pub use home::{banner_date, CheckoutKind, HomePage};
pub use inventory::{InventoryPage, StockStatus};
pub use login::LoginPage;
pub use logout::LogoutPage;

/// Behaviour shared by every screen.
///
/// Implementors only supply their interactor and locators; the navigation
/// menu actions come for free.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Interaction layer bound to the session
    fn interactor(&self) -> &Interactor;

    /// Locator tables
    fn locators(&self) -> &LocatorRegistry;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Open the inventory screen from the navigation menu
    async fn open_inventory(&self) -> E2eResult<()> {
        tracing::debug!(page = self.page_name(), "open inventory");
        self.interactor()
            .click(&self.locators().common.inventory_button)
            .await
    }

    /// Open the volunteer home screen from the navigation menu
    async fn open_volunteer_home(&self) -> E2eResult<()> {
        self.interactor()
            .click(&self.locators().common.volunteer_home_button)
            .await
    }

    /// Open the checkout dialog from the navigation menu
    async fn open_checkout(&self) -> E2eResult<()> {
        self.interactor()
            .click(&self.locators().common.checkout_button)
            .await
    }

    /// Open the add-item modal on the inventory screen
    async fn open_add_item(&self) -> E2eResult<()> {
        self.interactor()
            .click(&self.locators().inventory.add_button)
            .await
    }

    /// Wait until some element's text contains `value`
    async fn wait_for_data_load(&self, value: &str) -> E2eResult<()> {
        let ui = self.interactor();
        ui.find_within(
            &LocatorRegistry::text_contains(value),
            ui.timeouts().long_wait(),
        )
        .await
        .map(|_| ())
    }
}

/// Construct every page over one interactor
#[derive(Debug, Clone)]
pub struct Pages {
    /// Sign-in screens
    pub login: LoginPage,
    /// Admin and volunteer home
    pub home: HomePage,
    /// Inventory table
    pub inventory: InventoryPage,
    /// Checkout dialog and cart
    pub checkout: CheckoutPage,
    /// Add-item modal
    pub add_item: AddItemPage,
    /// Logged-out screen
    pub logout: LogoutPage,
}

impl Pages {
    /// Build all pages sharing `ui` and `locators`
    #[must_use]
    pub fn new(ui: &Interactor, locators: &Arc<LocatorRegistry>) -> Self {
        Self {
            login: LoginPage::new(ui.clone(), Arc::clone(locators)),
            home: HomePage::new(ui.clone(), Arc::clone(locators)),
            inventory: InventoryPage::new(ui.clone(), Arc::clone(locators)),
            checkout: CheckoutPage::new(ui.clone(), Arc::clone(locators)),
            add_item: AddItemPage::new(ui.clone(), Arc::clone(locators)),
            logout: LogoutPage::new(ui.clone(), Arc::clone(locators)),
        }
    }
}
