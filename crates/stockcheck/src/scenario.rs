//! End-to-end scenarios and their catalogue.
//!
//! Each scenario signs in, performs one user journey and asserts on what
//! the application shows afterwards. Scenarios run inside a
//! [`Session`](crate::session::Session) so the browser is always closed.

use std::fmt;
use std::str::FromStr;

use futures::future::BoxFuture;

use crate::ensure_eq;
use crate::pages::{banner_date, CheckoutKind, PageObject, StockStatus, UpdateConfirmation};
use crate::result::{E2eError, E2eResult};
use crate::session::Session;

/// Grouping used to pick scenarios for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Quick confidence checks
    Smoke,
    /// Full behavioural coverage
    Regression,
    /// Mutates shared data; never run concurrently with others
    Serial,
}

impl Tag {
    /// Tag name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Regression => "regression",
            Self::Serial => "serial",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smoke" => Ok(Self::Smoke),
            "regression" => Ok(Self::Regression),
            "serial" => Ok(Self::Serial),
            other => Err(E2eError::config(format!("unknown tag: {other}"))),
        }
    }
}

/// Scenario body
pub type ScenarioFn = for<'a> fn(&'a Session) -> BoxFuture<'a, E2eResult<()>>;

/// A named, tagged user journey
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Unique name
    pub name: &'static str,
    /// One-line summary
    pub description: &'static str,
    /// Tags
    pub tags: &'static [Tag],
    body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Whether the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Run the journey in an open session
    pub async fn run_in(&self, session: &Session) -> E2eResult<()> {
        tracing::info!(scenario = self.name, "scenario started");
        (self.body)(session).await
    }
}

static SCENARIOS: [Scenario; 9] = [
    Scenario {
        name: "login_volunteer",
        description: "Volunteer signs in and lands on the application",
        tags: &[Tag::Smoke],
        body: login_volunteer,
    },
    Scenario {
        name: "login_admin",
        description: "Admin signs in and sees the brand header",
        tags: &[Tag::Smoke],
        body: login_admin,
    },
    Scenario {
        name: "admin_home",
        description: "Admin home shows the menu label, account and today's date",
        tags: &[Tag::Regression],
        body: admin_home,
    },
    Scenario {
        name: "volunteer_header",
        description: "Volunteer home shows its header",
        tags: &[Tag::Regression],
        body: volunteer_header,
    },
    Scenario {
        name: "checkout_adjusts_inventory",
        description: "Checking out one unit lowers the quantity by one",
        tags: &[Tag::Regression, Tag::Serial],
        body: checkout_adjusts_inventory,
    },
    Scenario {
        name: "add_item_increases_inventory",
        description: "Adding stock raises the quantity by the amount added",
        tags: &[Tag::Regression, Tag::Serial],
        body: add_item_increases_inventory,
    },
    Scenario {
        name: "checkout_general",
        description: "A general checkout returns to volunteer home",
        tags: &[Tag::Smoke, Tag::Serial],
        body: checkout_general,
    },
    Scenario {
        name: "out_of_stock_filter",
        description: "The Out of Stock filter shows at least one row",
        tags: &[Tag::Regression, Tag::Serial],
        body: out_of_stock_filter,
    },
    Scenario {
        name: "logout",
        description: "Signing out shows the logged-out message",
        tags: &[Tag::Regression],
        body: logout,
    },
];

/// Every scenario, in run order
#[must_use]
pub fn catalogue() -> &'static [Scenario] {
    &SCENARIOS
}

/// Look a scenario up by name
#[must_use]
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Scenarios carrying `tag` (all when `None`) whose name contains `filter`
#[must_use]
pub fn select(tag: Option<Tag>, filter: Option<&str>) -> Vec<&'static Scenario> {
    SCENARIOS
        .iter()
        .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
        .filter(|s| filter.map_or(true, |f| s.name.contains(f)))
        .collect()
}

// =============================================================================
// SCENARIOS
// =============================================================================

fn login_volunteer(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        s.login_as_volunteer().await?;
        let title = s.login_page().title().await?;
        ensure_eq!(title, s.config().expected.app_name, "Unexpected page title");
        Ok(())
    })
}

fn login_admin(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        s.login_as_admin().await?;
        let brand = s.home_page().brand_text().await?;
        ensure_eq!(brand, s.config().expected.app_name, "Unexpected brand text on home page");
        Ok(())
    })
}

fn admin_home(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let expected = &s.config().expected;
        s.login_as_admin().await?;
        let home = s.home_page();

        let label = home.menu_home_text().await?;
        ensure_eq!(label, expected.admin_home_label, "Unexpected home button text");

        let email = home.email_id().await?.to_lowercase();
        let admin = s.config().admin.username.to_lowercase();
        ensure_eq!(email, admin, "Unexpected email ID");

        let date = home.date().await?;
        let today = banner_date(chrono::Local::now().date_naive());
        ensure_eq!(date, today, "Unexpected date");
        Ok(())
    })
}

fn volunteer_header(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        s.login_as_volunteer().await?;
        let header = s.home_page().header().await?;
        ensure_eq!(header, s.config().expected.volunteer_header, "Unexpected header");
        Ok(())
    })
}

fn checkout_adjusts_inventory(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let item = s.config().data.checkout_item.as_str();
        let inventory = s.inventory_page();
        let checkout = s.checkout_page();
        s.login_as_volunteer().await?;

        inventory.open_inventory().await?;
        inventory.search_item(item).await?;
        inventory.wait_for_search_results(item).await?;
        let before = inventory.quantity(item).await?;
        tracing::info!(item, quantity = before, "before checkout");

        checkout.click_checkout().await?;
        checkout.choose_first_resident().await?;
        checkout.search_item(item).await?;
        checkout.add_item(item).await?;
        if checkout.items_added(item).await? == 0 {
            return Err(E2eError::assertion(format!("'{item}' was not added to the cart")));
        }
        checkout.click_proceed_to_checkout().await?;
        checkout.click_confirm().await?;

        checkout.open_inventory().await?;
        inventory.wait_for_inventory_loaded().await?;
        inventory.research_item(item).await?;
        inventory.wait_for_search_results(item).await?;
        let after = inventory.quantity(item).await?;
        tracing::info!(item, quantity = after, "after checkout");

        ensure_eq!(
            after,
            before - 1,
            format!("Unexpected quantity change for '{item}'")
        );
        Ok(())
    })
}

fn add_item_increases_inventory(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let item = s.config().data.add_item.as_str();
        let amount = s.config().data.add_quantity;
        let inventory = s.inventory_page();
        let add = s.add_item_page();
        s.login_as_volunteer().await?;

        inventory.open_inventory().await?;
        inventory.search_item(item).await?;
        inventory.wait_for_search_results(item).await?;
        let before = inventory.inventory_quantity(item).await?;

        inventory.open_add_item().await?;
        add.click_inventory_type().await?;
        add.select_general_option().await?;
        add.open_item_dropdown().await?;
        add.wait_for_data_load(item).await?;
        add.select_item(item).await?;
        add.set_quantity(amount).await?;
        add.click_submit().await?;

        if add.validate_update_success(item, amount).await? == UpdateConfirmation::Refreshed {
            inventory.wait_for_inventory_loaded().await?;
            inventory.research_item(item).await?;
            inventory.wait_for_search_results(item).await?;
        }
        let after = inventory.inventory_quantity(item).await?;

        ensure_eq!(
            after,
            before + amount,
            format!("Unexpected quantity change for '{item}'")
        );
        Ok(())
    })
}

fn checkout_general(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let item = s.config().data.checkout_item.as_str();
        let header = s.config().expected.volunteer_header.as_str();
        let home = s.home_page();
        let checkout = s.checkout_page();
        s.login_as_volunteer().await?;

        home.verify_volunteer_home_header(header).await?;
        home.go_to_checkout(CheckoutKind::General).await?;
        checkout.choose_first_resident().await?;
        checkout.search_item(item).await?;
        checkout.add_item(item).await?;
        checkout.click_proceed_to_checkout().await?;
        checkout.click_confirm().await?;
        home.verify_volunteer_home_header(header).await
    })
}

fn out_of_stock_filter(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let inventory = s.inventory_page();
        s.login_as_volunteer().await?;

        inventory.open_inventory().await?;
        inventory.click_status().await?;
        inventory.select_status(StockStatus::OutOfStock).await?;
        let rows = inventory.filtered_rows(StockStatus::OutOfStock).await?;
        if rows.is_empty() {
            return Err(E2eError::assertion("No Out of Stock items found"));
        }
        Ok(())
    })
}

fn logout(s: &Session) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        let home = s.home_page();
        s.login_as_volunteer().await?;

        home.click_email_id().await?;
        home.click_logout().await?;
        let message = s.logout_page().logout_message().await?;
        ensure_eq!(message, s.config().expected.logout_message, "Unexpected logout message");
        Ok(())
    })
}
