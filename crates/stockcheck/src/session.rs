//! One browser session per scenario.
//!
//! [`Session::run`] opens the application, hands the session to the
//! scenario body and always quits the browser afterwards, on success,
//! error or panic. A failing body leaves a screenshot in the artifacts
//! directory.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::SuiteConfig;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::locators::LocatorRegistry;
use crate::pages::{
    AddItemPage, CheckoutPage, HomePage, InventoryPage, LoginPage, LogoutPage, Pages,
};
use crate::result::E2eResult;

/// An open browser session bound to the application under test
#[derive(Debug)]
pub struct Session {
    driver: Arc<dyn BrowserDriver>,
    ui: Interactor,
    locators: Arc<LocatorRegistry>,
    config: Arc<SuiteConfig>,
    pages: Pages,
}

impl Session {
    /// Size the window and open the base URL.
    ///
    /// The browser is quit again if either step fails.
    pub async fn start(driver: Arc<dyn BrowserDriver>, config: Arc<SuiteConfig>) -> E2eResult<Self> {
        let locators = Arc::new(config.locators.clone());
        let ui = Interactor::new(driver.clone(), config.timeouts);
        let pages = Pages::new(&ui, &locators);

        let setup = async {
            driver.set_window_size(config.browser.window).await?;
            ui.navigate(&config.base_url).await
        };
        if let Err(e) = setup.await {
            if let Err(quit) = driver.quit().await {
                tracing::warn!(error = %quit, "quit after failed start");
            }
            return Err(e);
        }

        Ok(Self {
            driver,
            ui,
            locators,
            config,
            pages,
        })
    }

    /// Run `body` in a fresh session and tear it down afterwards.
    ///
    /// A panic inside `body` is resumed once the browser has been quit. The
    /// body's own error takes precedence over a failure to quit.
    pub async fn run<T, F>(
        driver: Arc<dyn BrowserDriver>,
        config: Arc<SuiteConfig>,
        name: &str,
        body: F,
    ) -> E2eResult<T>
    where
        F: for<'a> FnOnce(&'a Session) -> BoxFuture<'a, E2eResult<T>>,
    {
        let session = Self::start(driver, config).await?;
        tracing::info!(scenario = name, "session started");

        let outcome = AssertUnwindSafe(body(&session)).catch_unwind().await;
        if !matches!(outcome, Ok(Ok(_))) {
            session.capture_failure(name).await;
        }
        let closed = session.close().await;

        match outcome {
            Ok(Ok(value)) => closed.map(|()| value),
            Ok(Err(e)) => {
                if let Err(quit) = closed {
                    tracing::warn!(scenario = name, error = %quit, "quit failed");
                }
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Quit the browser
    pub async fn close(self) -> E2eResult<()> {
        self.driver.quit().await
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Effective configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Interaction layer for ad-hoc steps
    #[must_use]
    pub const fn interactor(&self) -> &Interactor {
        &self.ui
    }

    /// Locator tables in use
    #[must_use]
    pub fn locators(&self) -> &LocatorRegistry {
        &self.locators
    }

    /// All page objects
    #[must_use]
    pub const fn pages(&self) -> &Pages {
        &self.pages
    }

    #[must_use]
    pub const fn login_page(&self) -> &LoginPage {
        &self.pages.login
    }

    #[must_use]
    pub const fn home_page(&self) -> &HomePage {
        &self.pages.home
    }

    #[must_use]
    pub const fn inventory_page(&self) -> &InventoryPage {
        &self.pages.inventory
    }

    #[must_use]
    pub const fn checkout_page(&self) -> &CheckoutPage {
        &self.pages.checkout
    }

    #[must_use]
    pub const fn add_item_page(&self) -> &AddItemPage {
        &self.pages.add_item
    }

    #[must_use]
    pub const fn logout_page(&self) -> &LogoutPage {
        &self.pages.logout
    }

    // =========================================================================
    // SIGN-IN
    // =========================================================================

    /// Sign in with the configured volunteer account
    pub async fn login_as_volunteer(&self) -> E2eResult<()> {
        let c = &self.config;
        self.pages
            .login
            .login_volunteer(
                &c.volunteer.username,
                c.volunteer.password.expose(),
                c.volunteer_pin.expose(),
            )
            .await
    }

    /// Sign in with the configured admin account
    pub async fn login_as_admin(&self) -> E2eResult<()> {
        let c = &self.config;
        self.pages
            .login
            .login_admin(&c.admin.username, c.admin.password.expose())
            .await
    }

    // =========================================================================
    // ARTIFACTS
    // =========================================================================

    /// Capture the viewport as PNG into `path`
    pub async fn save_screenshot(&self, path: &Path) -> E2eResult<()> {
        let png = self.driver.screenshot().await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, png).await?;
        Ok(())
    }

    /// Screenshot path for a failed scenario
    #[must_use]
    pub fn failure_screenshot_path(&self, scenario: &str) -> PathBuf {
        self.config
            .artifacts_dir
            .join(format!("{}.png", file_stem(scenario)))
    }

    async fn capture_failure(&self, scenario: &str) {
        let path = self.failure_screenshot_path(scenario);
        match self.save_screenshot(&path).await {
            Ok(()) => tracing::warn!(scenario, path = %path.display(), "saved failure screenshot"),
            Err(e) => tracing::warn!(scenario, error = %e, "could not save failure screenshot"),
        }
    }
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "scenario".into()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MOCK_SCREENSHOT};
    use crate::result::E2eError;

    fn config(dir: &Path) -> Arc<SuiteConfig> {
        let mut config = SuiteConfig::simulated();
        config.artifacts_dir = dir.to_path_buf();
        Arc::new(config)
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("checkout_adjusts_inventory"), "checkout_adjusts_inventory");
        assert_eq!(file_stem("a/b c"), "a_b_c");
        assert_eq!(file_stem(""), "scenario");
    }

    #[tokio::test]
    async fn test_start_sizes_window_and_navigates() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(MockDriver::new());
        let session = Session::start(driver.clone(), config(dir.path())).await.unwrap();
        let calls = driver.calls();
        assert_eq!(calls[0], "window:Maximized");
        assert!(calls[1].starts_with("navigate:https://inventory.test"));
        session.close().await.unwrap();
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_success_quits_without_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(MockDriver::new());
        let value = Session::run(driver.clone(), config(dir.path()), "ok", |s| {
            Box::pin(async move { s.interactor().title().await.map(|_| 7) })
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert!(driver.is_closed());
        assert!(!driver.was_called("screenshot"));
    }

    #[tokio::test]
    async fn test_failure_saves_screenshot_and_quits() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(MockDriver::new());
        let err = Session::run(driver.clone(), config(dir.path()), "broken flow", |_| {
            Box::pin(async { Err::<(), _>(E2eError::assertion("expected 11, got 12")) })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, E2eError::AssertionFailed { .. }));
        assert!(driver.is_closed());
        let png = std::fs::read(dir.path().join("broken_flow.png")).unwrap();
        assert_eq!(png, MOCK_SCREENSHOT);
    }

    #[tokio::test]
    async fn test_panic_still_quits() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(MockDriver::new());
        let cfg = config(dir.path());
        let handle = {
            let driver = driver.clone();
            tokio::spawn(async move {
                Session::run(driver, cfg, "panics", |_| {
                    Box::pin(async {
                        let outcome: E2eResult<()> = Ok(());
                        if outcome.is_ok() {
                            panic!("boom");
                        }
                        outcome
                    })
                })
                .await
            })
        };
        let joined: Result<E2eResult<()>, _> = handle.await;
        assert!(joined.unwrap_err().is_panic());
        assert!(driver.is_closed());
    }
}
