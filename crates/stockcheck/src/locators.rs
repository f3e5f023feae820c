//! Locator registry for the inventory application.
//!
//! Semantic element names mapped to [`Locator`]s, grouped per screen, plus
//! functions that build locators from runtime values such as item names.
//! The registry is plain data: page objects receive an `Arc` of it at
//! construction and never mutate it. Every group derives `Deserialize`
//! with `#[serde(default)]`, so a YAML file only needs to list the entries
//! it overrides.

use serde::{Deserialize, Serialize};

use crate::locator::{xpath_literal, Locator, Strategy};

fn xpath(expression: &str) -> Locator {
    Locator::from_static(Strategy::XPath, expression)
}

fn id(value: &str) -> Locator {
    Locator::from_static(Strategy::Id, value)
}

fn name(value: &str) -> Locator {
    Locator::from_static(Strategy::Name, value)
}

fn css(selector: &str) -> Locator {
    Locator::from_static(Strategy::Css, selector)
}

fn class(value: &str) -> Locator {
    Locator::from_static(Strategy::ClassName, value)
}

/// All screens of the application under test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorRegistry {
    /// Navigation menu and shared widgets
    pub common: CommonLocators,
    /// Home screen (admin and volunteer)
    pub home: HomeLocators,
    /// Sign-in flow, person picker and PIN
    pub login: LoginLocators,
    /// Post-logout screen
    pub logout: LogoutLocators,
    /// Inventory table, filters and search
    pub inventory: InventoryLocators,
    /// Checkout dialog and cart
    pub checkout: CheckoutLocators,
    /// Add-item modal
    pub add_item: AddItemLocators,
}

impl LocatorRegistry {
    /// Create the registry with the application defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Any element whose own text contains `value`.
    #[must_use]
    pub fn text_contains(value: &str) -> Locator {
        Locator::generated_xpath(format!("//*[contains(text(), {})]", xpath_literal(value)))
    }

    /// Any element whose whitespace-normalised text equals `value`.
    #[must_use]
    pub fn text_equals(value: &str) -> Locator {
        Locator::generated_xpath(format!("//*[normalize-space()={}]", xpath_literal(value)))
    }

    /// Table row with a cell containing `item`, ignoring ASCII case.
    #[must_use]
    pub fn row_containing(item: &str) -> Locator {
        let needle = xpath_literal(&item.to_lowercase());
        Locator::generated_xpath(format!(
            "//tr[td[contains(translate(text(),'ABCDEFGHIJKLMNOPQRSTUVWXYZ',\
             'abcdefghijklmnopqrstuvwxyz'), {needle})]]"
        ))
    }
}

/// Navigation menu and widgets shared by every screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonLocators {
    /// "Inventory" menu entry
    pub inventory_button: Locator,
    /// "Volunteer Home" menu entry
    pub volunteer_home_button: Locator,
    /// "Checkout" menu entry
    pub checkout_button: Locator,
    /// Loading spinner
    pub loading_spinner: Locator,
    /// Modal backdrop
    pub backdrop: Locator,
    /// Open dropdown list
    pub listbox: Locator,
}

impl Default for CommonLocators {
    fn default() -> Self {
        Self {
            inventory_button: xpath(r#"//h6[text()="Inventory"]"#),
            volunteer_home_button: xpath(r#"//h6[text()="Volunteer Home"]"#),
            checkout_button: xpath(r#"//h6[text()="Checkout"]"#),
            loading_spinner: class("MuiCircularProgress-root"),
            backdrop: class("MuiBackdrop-root"),
            listbox: xpath("//ul[@role='listbox']"),
        }
    }
}

/// Home screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeLocators {
    /// First entry of the side menu ("Admin Home" / "Volunteer Home")
    pub menu_home_button: Locator,
    /// Signed-in user's email
    pub email_id: Locator,
    /// "Log out" entry of the account menu
    pub logout_button: Locator,
    /// Organisation name in the app bar
    pub brand_text: Locator,
    /// Page header
    pub header: Locator,
    /// Today's date banner
    pub date: Locator,
}

impl Default for HomeLocators {
    fn default() -> Self {
        Self {
            menu_home_button: xpath(r#"(//a[contains(@class,"MuiButtonBase")])[1]"#),
            email_id: xpath(
                r#"//*[contains(@class, "MuiTypography-root MuiTypography-subtitle1")]"#,
            ),
            logout_button: xpath(r#"//h6[contains(text(), "Log out")]"#),
            brand_text: xpath(r#"//h5[contains(@class,"MuiTypography-root MuiTypography-h5")]"#),
            header: xpath(r#"//*[contains(@class,"MuiTypography-root MuiTypography-body1")]"#),
            date: css(".MuiTypography-root.MuiTypography-h6"),
        }
    }
}

impl HomeLocators {
    /// Checkout category card on the volunteer home screen.
    #[must_use]
    pub fn checkout_category(label: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//button[contains(normalize-space(), {})]",
            xpath_literal(label)
        ))
    }
}

/// Sign-in flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginLocators {
    /// Identity provider username box
    pub username_input: Locator,
    /// "Next" after the username
    pub next_button: Locator,
    /// Identity provider password box
    pub password_input: Locator,
    /// "Sign in" after the password
    pub sign_in_button: Locator,
    /// "Yes" on the stay-signed-in prompt
    pub yes_button: Locator,
    /// "No" on the stay-signed-in prompt
    pub no_button: Locator,
    /// Cold-start notice from the backing database
    pub database_popup_text: Locator,
    /// Volunteer person picker
    pub user_person: Locator,
    /// First option of the person picker
    pub first_option: Locator,
    /// "Continue" on the picker and PIN screens
    pub continue_button: Locator,
    /// Marker that the volunteer home screen loaded
    pub homepage_text: Locator,
    /// PIN digit boxes, left to right
    pub pin_inputs: Vec<Locator>,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            username_input: name("loginfmt"),
            next_button: id("idSIButton9"),
            password_input: name("passwd"),
            sign_in_button: id("idSIButton9"),
            yes_button: id("idSIButton9"),
            no_button: id("idBtn_Back"),
            database_popup_text: xpath(r#"//*[text()="Database is starting up"]"#),
            user_person: id(":r8:"),
            first_option: xpath("//ul[contains(@class, 'MuiAutocomplete-listbox')]/li[1]"),
            continue_button: xpath(r#"//button[contains(text(),"Continue")]"#),
            homepage_text: xpath(r#"//*[text()="Volunteer Home"]"#),
            pin_inputs: (0..4).map(|i| id(&format!("pin-input-{i}"))).collect(),
        }
    }
}

/// Post-logout screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutLocators {
    /// Confirmation paragraph
    pub after_logout_message: Locator,
}

impl Default for LogoutLocators {
    fn default() -> Self {
        Self {
            after_logout_message: xpath(r#"//div[@class="container"]/p"#),
        }
    }
}

/// Inventory table, filters and search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryLocators {
    /// "Add" button opening the add-item modal
    pub add_button: Locator,
    /// Inventory type select
    pub inventory_type: Locator,
    /// "General" type option
    pub select_general: Locator,
    /// "Welcome Basket" type option
    pub select_welcome_basket: Locator,
    /// Item-name dropdown opener
    pub item_name: Locator,
    /// Quantity label
    pub quantity: Locator,
    /// "Cancel" in the modal
    pub cancel: Locator,
    /// Search box
    pub search: Locator,
    /// Clear icon inside the search box
    pub clear_icon: Locator,
    /// Status filter button
    pub status_button: Locator,
}

impl Default for InventoryLocators {
    fn default() -> Self {
        Self {
            add_button: xpath(r#"//*[text()="Add"]"#),
            inventory_type: xpath(
                "//div[@role='combobox' and contains(@class, 'MuiSelect-select')]",
            ),
            select_general: xpath("//li[@role='option' and @data-value='General']"),
            select_welcome_basket: xpath(
                "//input[@class='MuiSelect-nativeInput' and @value='Welcome Basket']",
            ),
            item_name: xpath("//button[@aria-label='Open' and @title='Open']"),
            quantity: xpath(r#"//*[text()="Quantity"]"#),
            cancel: xpath("//button[normalize-space(text())='Cancel']"),
            search: xpath(
                "//input[@type='search' and @placeholder='Search...' and \
                 contains(@class, 'MuiInputBase-input')]",
            ),
            clear_icon: xpath(
                r#"//div[contains(@class, "MuiInputAdornment-positionEnd")]//svg[contains(@class, "MuiSvgIcon-root")]"#,
            ),
            status_button: xpath("//div[@id='status-button-container']//button"),
        }
    }
}

impl InventoryLocators {
    /// Autocomplete option with exactly `value` as its text.
    #[must_use]
    pub fn option_by_value(value: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//li[contains(@class, \"MuiAutocomplete-option\") and text()={}]",
            xpath_literal(value)
        ))
    }

    /// Quantity cell of the row whose name cell is `item`.
    #[must_use]
    pub fn quantity_cell(item: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//td[text()={}]/following-sibling::td[5]",
            xpath_literal(item)
        ))
    }

    /// Quantity column of the row holding any element with text `item`.
    #[must_use]
    pub fn inventory_cell(item: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//*[text()={}]/following-sibling::td[5]",
            xpath_literal(item)
        ))
    }

    /// Entry of the status filter menu.
    #[must_use]
    pub fn status_option(label: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//li[@role='menuitem' and normalize-space()={}]",
            xpath_literal(label)
        ))
    }

    /// Table rows carrying `status` in one of their cells.
    #[must_use]
    pub fn rows_with_status(status: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//tbody/tr[td[normalize-space()={}]]",
            xpath_literal(status)
        ))
    }
}

/// Checkout dialog and cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutLocators {
    /// Building code select
    pub building_code: Locator,
    /// First option of any open select list
    pub first_list_item: Locator,
    /// Unit number select
    pub unit_number: Locator,
    /// Resident name autocomplete
    pub name_input: Locator,
    /// "continue" in the resident dialog
    pub continue_button: Locator,
    /// "Proceed to Checkout" in the cart
    pub proceed_to_checkout: Locator,
    /// "Confirm" in the review dialog
    pub confirm: Locator,
    /// Search box
    pub search: Locator,
    /// Clear icon inside the search box
    pub clear_icon: Locator,
}

impl Default for CheckoutLocators {
    fn default() -> Self {
        let inventory = InventoryLocators::default();
        Self {
            building_code: id("select-building-code"),
            first_list_item: css(r#"ul[role="listbox"] li[role="option"]"#),
            unit_number: id("select-unit-number"),
            name_input: id("resident-name-autocomplete"),
            continue_button: xpath(r#"//button[contains(text(),"continue")]"#),
            proceed_to_checkout: xpath(r#"//button[contains(text(), "Proceed to Checkout")]"#),
            confirm: xpath(r#"//*[text()="Confirm"]"#),
            search: inventory.search,
            clear_icon: inventory.clear_icon,
        }
    }
}

impl CheckoutLocators {
    /// "+" button on the card of `item`.
    #[must_use]
    pub fn add_button_for(item: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//p[@aria-label={}]/ancestor::div[contains(@class,\"MuiCardContent-root\")]\
             /following-sibling::div//button[contains(@class,\"MuiIconButton-root\")]",
            xpath_literal(item)
        ))
    }
}

/// Add-item modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddItemLocators {
    /// Text input of the item-name autocomplete
    pub item_name_input: Locator,
    /// Quantity number input
    pub quantity_input: Locator,
    /// "Submit" button
    pub submit_button: Locator,
    /// Success confirmation title
    pub success_text: Locator,
    /// Close button of the confirmation dialog
    pub close_modal_button: Locator,
}

impl Default for AddItemLocators {
    fn default() -> Self {
        Self {
            item_name_input: css("#add-item-name input"),
            quantity_input: css("#add-item-quantity input[name='quantity']"),
            submit_button: xpath("//div[@id='modal-buttons']//button[normalize-space()='Submit']"),
            success_text: xpath("//*[starts-with(normalize-space(), 'Inventory Updated')]"),
            close_modal_button: xpath("//div[@role='dialog']//button[normalize-space()='Close']"),
        }
    }
}

impl AddItemLocators {
    /// Option of the open listbox containing `value`.
    #[must_use]
    pub fn listbox_option(value: &str) -> Locator {
        Locator::generated_xpath(format!(
            "//ul[@role='listbox']//li[@role='option'][.//*[normalize-space()={lit}] or \
             normalize-space()={lit}]",
            lit = xpath_literal(value)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_construct() {
        let registry = LocatorRegistry::new();
        assert_eq!(registry.login.pin_inputs.len(), 4);
        assert_eq!(registry.login.pin_inputs[3].expression(), "pin-input-3");
        assert_eq!(registry.common.backdrop.strategy(), Strategy::ClassName);
    }

    #[test]
    fn test_parameterised_locators_quote_values() {
        let cell = InventoryLocators::quantity_cell("Men's Socks");
        assert_eq!(
            cell.expression(),
            "//td[text()=\"Men's Socks\"]/following-sibling::td[5]"
        );
        let row = LocatorRegistry::row_containing("Clothing Rack");
        assert!(row.expression().contains("'clothing rack'"));
        let add = CheckoutLocators::add_button_for("Twin-size Sheet Set");
        assert!(add.expression().starts_with("//p[@aria-label='Twin-size Sheet Set']"));
    }

    #[test]
    fn test_generated_locators_are_valid() {
        for locator in [
            LocatorRegistry::text_contains("Baby Wipes"),
            LocatorRegistry::text_equals("Inventory Updated"),
            InventoryLocators::option_by_value("Baby Wipes"),
            InventoryLocators::status_option("Out of Stock"),
            InventoryLocators::rows_with_status("Low Stock"),
            AddItemLocators::listbox_option("Baby Wipes"),
            HomeLocators::checkout_category("General"),
        ] {
            assert!(Locator::new(locator.strategy(), locator.expression()).is_ok());
        }
    }

    #[test]
    fn test_partial_yaml_override() {
        let yaml = r#"
login:
  user_person:
    by: xpath
    value: "//input[contains(@class, 'MuiInputBase-input')]"
"#;
        let registry: LocatorRegistry = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(registry.login.user_person.strategy(), Strategy::XPath);
        // untouched entries keep their defaults
        assert_eq!(registry.login.next_button, LocatorRegistry::new().login.next_button);
        assert_eq!(registry.checkout, CheckoutLocators::default());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let yaml = "logout:\n  after_logout_message:\n    by: css\n    value: //p\n";
        let parsed: Result<LocatorRegistry, _> = serde_yaml_ng::from_str(yaml);
        assert!(parsed.is_err());
    }
}
