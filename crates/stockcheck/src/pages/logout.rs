//! Logged-out landing screen.

use crate::result::E2eResult;

page! {
    /// Screen shown after signing out
    LogoutPage
}

impl LogoutPage {
    /// Confirmation paragraph, once visible
    pub async fn logout_message(&self) -> E2eResult<String> {
        self.ui.text(&self.locators.logout.after_logout_message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::interaction::Interactor;
    use crate::locators::LocatorRegistry;
    use crate::mock::{MockDriver, MockElement};
    use crate::wait::Timeouts;

    #[tokio::test]
    async fn test_message_read_after_it_appears() {
        let driver = Arc::new(MockDriver::new());
        let ui = Interactor::new(driver.clone(), Timeouts::fast());
        let locators = LocatorRegistry::new();
        driver.insert(
            locators.logout.after_logout_message.clone(),
            MockElement::new("You are logged out. Please click the button to log in.")
                .visible_after(Duration::from_millis(20)),
        );
        let page = LogoutPage::new(ui, Arc::new(locators));
        assert_eq!(
            page.logout_message().await.unwrap(),
            "You are logged out. Please click the button to log in."
        );
    }
}
