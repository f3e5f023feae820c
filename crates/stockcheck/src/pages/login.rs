//! Sign-in: identity provider screens, person picker and PIN.

use crate::pages::PageObject;
use crate::result::{E2eError, E2eResult};
use crate::retry::{retry, Attempt, RetryPolicy};

page! {
    /// Sign-in flow shared by admins and volunteers
    LoginPage
}

impl LoginPage {
    pub async fn enter_username(&self, username: &str) -> E2eResult<()> {
        self.ui
            .send_keys(&self.locators.login.username_input, username)
            .await
    }

    pub async fn click_next(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.login.next_button).await
    }

    pub async fn enter_password(&self, password: &str) -> E2eResult<()> {
        self.ui
            .send_keys(&self.locators.login.password_input, password)
            .await
    }

    /// Click "Sign in", retrying when the button is swapped out under us.
    pub async fn click_sign_in(&self) -> E2eResult<()> {
        let policy = RetryPolicy::new(3, self.ui.timeouts().retry_pause());
        let button = &self.locators.login.sign_in_button;
        retry(&policy, "sign in", |_| async move {
            Attempt::retry_stale(self.ui.click(button).await)
        })
        .await
    }

    /// Accept "Stay signed in?"
    pub async fn click_yes(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.login.yes_button).await
    }

    /// Open the person picker.
    ///
    /// The picker appears only once the backend has woken up, so this waits
    /// for the long timeout, hovers and then clicks.
    pub async fn click_person(&self) -> E2eResult<()> {
        let person = &self.locators.login.user_person;
        let element = self
            .ui
            .wait_clickable(person, self.ui.timeouts().long_wait())
            .await?;
        self.ui.driver().hover(&element).await?;
        self.ui.click_element(&element).await
    }

    pub async fn select_first_option(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.login.first_option).await
    }

    pub async fn click_continue(&self) -> E2eResult<()> {
        self.ui.click(&self.locators.login.continue_button).await
    }

    /// Type one digit into each PIN box.
    pub async fn enter_pin(&self, pin: &str) -> E2eResult<()> {
        let boxes = &self.locators.login.pin_inputs;
        if pin.chars().count() != boxes.len() || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(E2eError::config(format!(
                "PIN must be exactly {} digits",
                boxes.len()
            )));
        }
        for (input, digit) in boxes.iter().zip(pin.chars()) {
            self.ui.send_keys(input, &digit.to_string()).await?;
        }
        Ok(())
    }

    /// Whether the "database is starting" notice shows up
    pub async fn is_database_popup_visible(&self) -> E2eResult<bool> {
        self.ui
            .is_visible(
                &self.locators.login.database_popup_text,
                self.ui.timeouts().default_wait(),
            )
            .await
    }

    pub async fn title(&self) -> E2eResult<String> {
        self.ui.title().await
    }

    /// Full volunteer sign-in through to the volunteer home screen
    pub async fn login_volunteer(&self, username: &str, password: &str, pin: &str) -> E2eResult<()> {
        tracing::info!(page = self.page_name(), user = username, "volunteer sign-in");
        self.login_admin(username, password).await?;
        self.click_person().await?;
        self.select_first_option().await?;
        self.click_continue().await?;
        self.enter_pin(pin).await?;
        self.click_continue().await
    }

    /// Identity-provider sign-in; admins land on their home screen
    pub async fn login_admin(&self, username: &str, password: &str) -> E2eResult<()> {
        self.enter_username(username).await?;
        self.click_next().await?;
        self.enter_password(password).await?;
        self.click_sign_in().await?;
        self.click_yes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::interaction::Interactor;
    use crate::locators::LocatorRegistry;
    use crate::mock::{MockDriver, MockElement};
    use crate::wait::Timeouts;

    fn page() -> (Arc<MockDriver>, LoginPage, LocatorRegistry) {
        let driver = Arc::new(MockDriver::new());
        let ui = Interactor::new(driver.clone(), Timeouts::fast());
        let locators = LocatorRegistry::new();
        let page = LoginPage::new(ui, Arc::new(locators.clone()));
        (driver, page, locators)
    }

    mod pin_tests {
        use super::*;

        #[tokio::test]
        async fn test_pin_digits_go_to_separate_boxes() {
            let (driver, page, l) = page();
            for input in &l.login.pin_inputs {
                driver.insert(input.clone(), MockElement::new(""));
            }
            page.enter_pin("1234").await.unwrap();
            let digits: Vec<String> = l
                .login
                .pin_inputs
                .iter()
                .map(|input| driver.value_of(input).unwrap())
                .collect();
            assert_eq!(digits, ["1", "2", "3", "4"]);
        }

        #[tokio::test]
        async fn test_short_pin_rejected() {
            let (driver, page, _) = page();
            let err = page.enter_pin("12").await.unwrap_err();
            assert!(matches!(err, E2eError::Config { .. }));
            assert!(driver.calls().is_empty());
        }
    }

    mod button_tests {
        use super::*;

        #[tokio::test]
        async fn test_sign_in_survives_stale_button() {
            let (driver, page, l) = page();
            driver.insert(l.login.sign_in_button.clone(), MockElement::new("Sign in"));
            // three per click call, so the outer retry has to step in
            driver.inject_stale(&l.login.sign_in_button, 4);
            page.click_sign_in().await.unwrap();
            assert_eq!(driver.count("click:"), 1);
        }

        #[tokio::test]
        async fn test_click_person_hovers_first() {
            let (driver, page, l) = page();
            driver.insert(l.login.user_person.clone(), MockElement::new(""));
            page.click_person().await.unwrap();
            let calls = driver.calls();
            let hover = calls.iter().position(|c| c.starts_with("hover:")).unwrap();
            let click = calls.iter().position(|c| c.starts_with("click:")).unwrap();
            assert!(hover < click);
        }

        #[tokio::test]
        async fn test_database_popup_absent_is_false() {
            let (_driver, page, _) = page();
            assert!(!page.is_database_popup_visible().await.unwrap());
        }
    }
}
