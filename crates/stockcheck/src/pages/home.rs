//! Admin and volunteer home screens.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::ensure_eq;
use crate::locators::HomeLocators;
use crate::result::{E2eError, E2eResult};

/// Checkout category offered on the volunteer home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutKind {
    /// General items for a resident
    General,
    /// Move-in welcome basket
    WelcomeBasket,
}

impl CheckoutKind {
    /// Card label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::WelcomeBasket => "Welcome Basket",
        }
    }
}

impl fmt::Display for CheckoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CheckoutKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "general" => Ok(Self::General),
            "welcome basket" => Ok(Self::WelcomeBasket),
            other => Err(E2eError::config(format!("unknown checkout kind: {other}"))),
        }
    }
}

/// Date as the home banner shows it, e.g. "Monday, March 3".
#[must_use]
pub fn banner_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

page! {
    /// Home screen for both roles
    HomePage
}

impl HomePage {
    /// Open the account menu
    pub async fn click_email_id(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.home.email_id).await
    }

    pub async fn click_logout(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.home.logout_button).await
    }

    /// First entry of the side menu
    pub async fn menu_home_text(&self) -> E2eResult<String> {
        self.ui.text(&self.locators.home.menu_home_button).await
    }

    pub async fn brand_text(&self) -> E2eResult<String> {
        self.ui.text(&self.locators.home.brand_text).await
    }

    pub async fn header(&self) -> E2eResult<String> {
        self.ui.text(&self.locators.home.header).await
    }

    /// Banner date; rendered after the dashboard data arrives
    pub async fn date(&self) -> E2eResult<String> {
        self.ui
            .text_within(&self.locators.home.date, self.ui.timeouts().long_wait())
            .await
    }

    pub async fn email_id(&self) -> E2eResult<String> {
        self.ui.text(&self.locators.home.email_id).await
    }

    /// Fail unless the volunteer home header reads `expected`
    pub async fn verify_volunteer_home_header(&self, expected: &str) -> E2eResult<()> {
        let actual = self
            .ui
            .settled_text(
                &self.locators.login.homepage_text,
                self.ui.timeouts().long_wait(),
            )
            .await?;
        ensure_eq!(actual.trim(), expected, "Unexpected volunteer home header");
        Ok(())
    }

    /// Start a checkout of the given kind from its home card
    pub async fn go_to_checkout(&self, kind: CheckoutKind) -> E2eResult<()> {
        tracing::debug!(%kind, "start checkout");
        self.ui
            .click(&HomeLocators::checkout_category(kind.label()))
            .await
    }
}
