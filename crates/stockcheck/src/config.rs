//! Suite configuration.
//!
//! Layers, later wins:
//!
//! 1. built-in defaults
//! 2. optional YAML file
//! 3. environment (a `.env` file in the working directory is read first)
//!
//! | Variable              | Field                    |
//! |-----------------------|--------------------------|
//! | `URL`                 | `base_url`               |
//! | `ADMIN_USERNAME`      | `admin.username`         |
//! | `ADMIN_PASSWORD`      | `admin.password`         |
//! | `VOLUNTEER_USERNAME`  | `volunteer.username`     |
//! | `VOLUNTEER_PASSWORD`  | `volunteer.password`     |
//! | `VOLUNTEER_PIN`       | `volunteer_pin`          |
//! | `STOCKCHECK_CHROMIUM` | `browser.chromium_path`  |
//! | `CI=true`             | headless 1920x1080, no sandbox |

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::driver::WindowSize;
use crate::locators::LocatorRegistry;
use crate::result::{E2eError, E2eResult};
use crate::wait::Timeouts;

/// Default artifacts directory for failure screenshots
pub const DEFAULT_ARTIFACTS_DIR: &str = "target/stockcheck/artifacts";

/// Base URL used when running against the simulated app
pub const SIMULATED_BASE_URL: &str = "https://inventory.test/";

/// A value that never appears in logs or printed configuration
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain value, for typing into the browser
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no value was configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn masked(&self) -> &'static str {
        if self.0.is_empty() {
            ""
        } else {
            "***"
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.masked())
    }
}

/// One sign-in account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Sign-in name (an email address)
    pub username: String,
    /// Password
    pub password: Secret,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

/// Texts the scenarios assert on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectations {
    /// Document title and brand text
    pub app_name: String,
    /// First side-menu entry for admins
    pub admin_home_label: String,
    /// Volunteer home header
    pub volunteer_header: String,
    /// Paragraph on the logged-out screen
    pub logout_message: String,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            app_name: "Plymouth Housing".into(),
            admin_home_label: "Admin Home".into(),
            volunteer_header: "Volunteer Home".into(),
            logout_message: "You are logged out. Please click the button to log in.".into(),
        }
    }
}

/// Items and amounts the scenarios work with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestData {
    /// Item checked out one unit at a time
    pub checkout_item: String,
    /// Item restocked by the add-item scenario
    pub add_item: String,
    /// Units added by the add-item scenario
    pub add_quantity: i64,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            checkout_item: "Clothing Rack".into(),
            add_item: "Baby Wipes".into(),
            add_quantity: 5,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Window geometry
    pub window: WindowSize,
    /// Keep the Chromium sandbox on
    pub sandbox: bool,
    /// Chromium binary, when not on the default search path
    pub chromium_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window: WindowSize::Maximized,
            sandbox: true,
            chromium_path: None,
        }
    }
}

/// Everything a suite run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application entry point
    pub base_url: String,
    /// Admin account
    pub admin: Credentials,
    /// Volunteer account
    pub volunteer: Credentials,
    /// Volunteer PIN, one digit per box
    pub volunteer_pin: Secret,
    /// Expected texts
    pub expected: Expectations,
    /// Scenario inputs
    pub data: TestData,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Wait and retry timings
    pub timeouts: Timeouts,
    /// Locator overrides
    pub locators: LocatorRegistry,
    /// Where failure screenshots go
    pub artifacts_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            admin: Credentials::default(),
            volunteer: Credentials::default(),
            volunteer_pin: Secret::default(),
            expected: Expectations::default(),
            data: TestData::default(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            locators: LocatorRegistry::default(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
        }
    }
}

impl SuiteConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus demo accounts and fast timings for the simulated app
    #[must_use]
    pub fn simulated() -> Self {
        let mut config = Self::default();
        config.fill_demo_accounts();
        config.timeouts = Timeouts::fast();
        config
    }

    /// Parse a YAML document; absent keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> E2eResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| {
            E2eError::config(format!("{}: {e}", path.display()))
        })
    }

    /// Load defaults, then `path` if given, then `.env` and the environment.
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        match dotenvy::dotenv() {
            Ok(file) => tracing::debug!(file = %file.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(E2eError::config(format!(".env: {e}"))),
        }
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment values from `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };
        set("URL", &mut self.base_url);
        set("ADMIN_USERNAME", &mut self.admin.username);
        set("VOLUNTEER_USERNAME", &mut self.volunteer.username);

        let secret = |key: &str, target: &mut Secret| {
            let mut value = String::new();
            set(key, &mut value);
            if !value.is_empty() {
                *target = Secret::new(value);
            }
        };
        secret("ADMIN_PASSWORD", &mut self.admin.password);
        secret("VOLUNTEER_PASSWORD", &mut self.volunteer.password);
        secret("VOLUNTEER_PIN", &mut self.volunteer_pin);

        if let Some(path) = lookup("STOCKCHECK_CHROMIUM").filter(|v| !v.is_empty()) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        if lookup("CI").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            self.apply_ci();
        }
    }

    /// CI runners: headless, fixed 1920x1080 viewport, sandbox off
    pub fn apply_ci(&mut self) {
        self.browser.headless = true;
        self.browser.window = WindowSize::Fixed {
            width: 1920,
            height: 1080,
        };
        self.browser.sandbox = false;
    }

    /// Fill any missing account details with the simulated app's demo values
    pub fn fill_demo_accounts(&mut self) {
        if self.base_url.trim().is_empty() {
            self.base_url = SIMULATED_BASE_URL.into();
        }
        if self.admin.username.trim().is_empty() {
            self.admin.username = "admin@plymouth.test".into();
        }
        if self.admin.password.is_empty() {
            self.admin.password = Secret::new("admin-pass");
        }
        if self.volunteer.username.trim().is_empty() {
            self.volunteer.username = "volunteer@plymouth.test".into();
        }
        if self.volunteer.password.is_empty() {
            self.volunteer.password = Secret::new("volunteer-pass");
        }
        if self.volunteer_pin.is_empty() {
            self.volunteer_pin = Secret::new("1234");
        }
    }

    /// Check everything a run against a real deployment needs is set
    pub fn validate_for_live(&self) -> E2eResult<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(E2eError::config("base URL is not set (URL)"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(E2eError::config(format!(
                "base URL must start with http:// or https://, got {url}"
            )));
        }
        if !self.admin.is_complete() {
            return Err(E2eError::config(
                "admin credentials are not set (ADMIN_USERNAME, ADMIN_PASSWORD)",
            ));
        }
        if !self.volunteer.is_complete() {
            return Err(E2eError::config(
                "volunteer credentials are not set (VOLUNTEER_USERNAME, VOLUNTEER_PASSWORD)",
            ));
        }
        self.validate()
    }

    /// Checks that hold for every run
    pub fn validate(&self) -> E2eResult<()> {
        let digits = self.locators.login.pin_inputs.len();
        let pin = self.volunteer_pin.expose();
        if !pin.is_empty() && (pin.len() != digits || !pin.chars().all(|c| c.is_ascii_digit())) {
            return Err(E2eError::config(format!(
                "volunteer PIN must be {digits} digits"
            )));
        }
        if self.data.add_quantity <= 0 {
            return Err(E2eError::config("data.add_quantity must be positive"));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(E2eError::config("timeouts.poll_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// YAML dump with secrets masked
    pub fn to_redacted_yaml(&self) -> E2eResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod layering_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SuiteConfig::new();
            assert_eq!(config.expected.app_name, "Plymouth Housing");
            assert_eq!(config.browser.window, WindowSize::Maximized);
            assert!(config.browser.sandbox);
            assert_eq!(config.artifacts_dir, PathBuf::from(DEFAULT_ARTIFACTS_DIR));
        }

        #[test]
        fn test_env_overrides() {
            let mut config = SuiteConfig::new();
            config.apply_env(env(&[
                ("URL", "https://inventory.example.org"),
                ("ADMIN_USERNAME", "admin@example.org"),
                ("ADMIN_PASSWORD", "hunter2"),
                ("VOLUNTEER_PIN", "4321"),
                ("VOLUNTEER_PASSWORD", "   "),
            ]));
            assert_eq!(config.base_url, "https://inventory.example.org");
            assert_eq!(config.admin.password.expose(), "hunter2");
            assert_eq!(config.volunteer_pin.expose(), "4321");
            assert!(config.volunteer.password.is_empty());
        }

        #[test]
        fn test_ci_forces_headless_fixed_window() {
            let mut config = SuiteConfig::new();
            config.apply_env(env(&[("CI", "true")]));
            assert!(config.browser.headless);
            assert!(!config.browser.sandbox);
            assert_eq!(
                config.browser.window,
                WindowSize::Fixed {
                    width: 1920,
                    height: 1080
                }
            );

            let mut local = SuiteConfig::new();
            local.apply_env(env(&[("CI", "false")]));
            assert!(!local.browser.headless);
        }

        #[test]
        fn test_yaml_then_env() {
            let yaml = r"
base_url: https://staging.example.org
timeouts:
  long_ms: 300000
data:
  checkout_item: Bath Towel
locators:
  login:
    user_person:
      by: id
      value: ':r9:'
";
            let mut config = SuiteConfig::from_yaml_str(yaml).unwrap();
            assert_eq!(config.timeouts.long_ms, 300_000);
            assert_eq!(config.timeouts.default_ms, Timeouts::default().default_ms);
            assert_eq!(config.data.checkout_item, "Bath Towel");
            assert_eq!(config.data.add_item, "Baby Wipes");
            assert_eq!(config.locators.login.user_person.expression(), ":r9:");

            config.apply_env(env(&[("URL", "https://prod.example.org")]));
            assert_eq!(config.base_url, "https://prod.example.org");
        }

        #[test]
        fn test_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "expected:\n  app_name: Staging Housing\n").unwrap();
            let config = SuiteConfig::from_file(&path).unwrap();
            assert_eq!(config.expected.app_name, "Staging Housing");
            assert_eq!(config.expected.admin_home_label, "Admin Home");
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let err = SuiteConfig::from_file(Path::new("/nonexistent/suite.yaml")).unwrap_err();
            assert!(matches!(err, E2eError::Io(_)));
        }
    }

    mod redaction_tests {
        use super::*;

        #[test]
        fn test_debug_hides_secrets() {
            let mut config = SuiteConfig::new();
            config.admin = Credentials::new("admin@example.org", "hunter2");
            config.volunteer_pin = Secret::new("1234");
            let debug = format!("{config:?}");
            assert!(!debug.contains("hunter2"));
            assert!(!debug.contains("1234"));
            assert!(debug.contains("admin@example.org"));
        }

        #[test]
        fn test_yaml_dump_hides_secrets() {
            let mut config = SuiteConfig::new();
            config.volunteer = Credentials::new("vol@example.org", "s3cret");
            let yaml = config.to_redacted_yaml().unwrap();
            assert!(!yaml.contains("s3cret"));
            assert!(yaml.contains("***"));
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_live_requires_url_and_accounts() {
            let config = SuiteConfig::new();
            assert!(matches!(config.validate_for_live(), Err(E2eError::Config { .. })));

            let mut config = SuiteConfig::new();
            config.fill_demo_accounts();
            config.validate_for_live().unwrap();

            config.base_url = "inventory.example.org".into();
            assert!(config.validate_for_live().is_err());
        }

        #[test]
        fn test_pin_shape() {
            let mut config = SuiteConfig::simulated();
            config.validate().unwrap();
            config.volunteer_pin = Secret::new("12a4");
            assert!(config.validate().is_err());
            config.volunteer_pin = Secret::new("12345");
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_fill_keeps_configured_values() {
            let mut config = SuiteConfig::new();
            config.admin.username = "me@example.org".into();
            config.fill_demo_accounts();
            assert_eq!(config.admin.username, "me@example.org");
            assert!(!config.admin.password.is_empty());
        }
    }
}
