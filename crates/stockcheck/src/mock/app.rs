//! Simulated inventory application.
//!
//! [`InventoryApp`] is a [`Behavior`] that renders each screen of the
//! inventory web app into a [`MockDom`] using the same [`LocatorRegistry`]
//! the page objects read from. Scenarios run against it unchanged, which
//! is how the suite is exercised without a browser.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::dom::{MockDom, MockElement};
use super::driver::{Behavior, MockDriver};
use crate::config::SuiteConfig;
use crate::locator::Locator;
use crate::locators::{AddItemLocators, CheckoutLocators, HomeLocators, InventoryLocators, LocatorRegistry};
use crate::pages::home::banner_date;
use crate::pages::inventory::{StockStatus, STATUS_LABELS};

/// One inventory line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockItem {
    /// Display name
    pub name: String,
    /// Units on hand
    pub quantity: i64,
}

impl StockItem {
    /// Create a stock line
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Fixed content of the simulated application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppModel {
    /// Document title and brand text
    pub app_name: String,
    /// First menu entry for admins
    pub admin_home_label: String,
    /// Volunteer home header
    pub volunteer_header: String,
    /// Paragraph shown after logout
    pub logout_message: String,
    /// Admin sign-in name
    pub admin_username: String,
    /// Admin password
    pub admin_password: String,
    /// Volunteer sign-in name
    pub volunteer_username: String,
    /// Volunteer password
    pub volunteer_password: String,
    /// Volunteer PIN
    pub pin: String,
    /// Stock on hand
    pub items: Vec<StockItem>,
    /// Show the database wake-up notice on the sign-in screen
    pub cold_start: bool,
}

impl Default for AppModel {
    fn default() -> Self {
        Self::from_config(&SuiteConfig::simulated())
    }
}

impl AppModel {
    /// Model matching the accounts and labels a suite run expects
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            app_name: config.expected.app_name.clone(),
            admin_home_label: config.expected.admin_home_label.clone(),
            volunteer_header: config.expected.volunteer_header.clone(),
            logout_message: config.expected.logout_message.clone(),
            admin_username: config.admin.username.clone(),
            admin_password: config.admin.password.expose().to_string(),
            volunteer_username: config.volunteer.username.clone(),
            volunteer_password: config.volunteer.password.expose().to_string(),
            pin: config.volunteer_pin.expose().to_string(),
            items: vec![
                StockItem::new("Clothing Rack", 12),
                StockItem::new("Baby Wipes", 40),
                StockItem::new("Twin-size Sheet Set", 7),
                StockItem::new("Men's Socks", 3),
                StockItem::new("Bath Towel", 0),
            ],
            cold_start: false,
        }
    }

    /// Quantity of `name`, if stocked
    #[must_use]
    pub fn quantity(&self, name: &str) -> Option<i64> {
        self.items.iter().find(|i| i.name == name).map(|i| i.quantity)
    }

    fn adjust(&mut self, name: &str, delta: i64) {
        if let Some(item) = self.items.iter_mut().find(|i| i.name == name) {
            item.quantity += delta;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Admin,
    Volunteer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Username,
    Password,
    StaySignedIn,
    PersonPicker,
    Pin,
    Home(Role),
    Inventory,
    Checkout,
    Cart,
    Review,
    LoggedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Building,
    Unit,
    Resident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    ItemOption(String),
    Status(String),
    AddToCart(String),
    Category,
}

#[derive(Debug, Default)]
struct AddItemDraft {
    type_menu_open: bool,
    kind: Option<String>,
    listbox_open: bool,
    query: String,
    item: Option<String>,
    quantity: String,
    confirmed: Option<String>,
}

impl AddItemDraft {
    fn amount(&self) -> Option<i64> {
        self.quantity.trim().parse().ok().filter(|n| *n > 0)
    }

    fn ready(&self) -> bool {
        self.kind.is_some() && self.item.is_some() && self.amount().is_some()
    }
}

#[derive(Debug, Default)]
struct CheckoutDraft {
    open_field: Option<Field>,
    building: bool,
    unit: bool,
    resident: bool,
    cart: BTreeMap<String, i64>,
}

type Scene = Vec<(Locator, Vec<MockElement>)>;

fn show(scene: &mut Scene, locator: &Locator, element: MockElement) {
    scene.push((locator.clone(), vec![element]));
}

fn matches_query(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.trim().to_lowercase())
}

/// Screen-by-screen simulation of the inventory web app
#[derive(Debug)]
pub struct InventoryApp {
    model: AppModel,
    locators: Arc<LocatorRegistry>,
    screen: Screen,
    username: String,
    password: String,
    picker_open: bool,
    person_chosen: bool,
    pin: Vec<String>,
    account_menu_open: bool,
    search: String,
    status_menu_open: bool,
    status_filter: Option<String>,
    modal: Option<AddItemDraft>,
    checkout: CheckoutDraft,
    targets: HashMap<Locator, Target>,
}

impl InventoryApp {
    /// Create the app on its sign-in screen
    #[must_use]
    pub fn new(model: AppModel, locators: Arc<LocatorRegistry>) -> Self {
        let pin = vec![String::new(); locators.login.pin_inputs.len()];
        Self {
            model,
            locators,
            screen: Screen::Username,
            username: String::new(),
            password: String::new(),
            picker_open: false,
            person_chosen: false,
            pin,
            account_menu_open: false,
            search: String::new(),
            status_menu_open: false,
            status_filter: None,
            modal: None,
            checkout: CheckoutDraft::default(),
            targets: HashMap::new(),
        }
    }

    fn role_for(&self, username: &str) -> Option<Role> {
        if username.eq_ignore_ascii_case(&self.model.admin_username) {
            Some(Role::Admin)
        } else if username.eq_ignore_ascii_case(&self.model.volunteer_username) {
            Some(Role::Volunteer)
        } else {
            None
        }
    }

    fn password_ok(&self) -> bool {
        match self.role_for(&self.username) {
            Some(Role::Admin) => self.password == self.model.admin_password,
            Some(Role::Volunteer) => self.password == self.model.volunteer_password,
            None => false,
        }
    }

    fn open_inventory(&mut self) {
        self.screen = Screen::Inventory;
        self.search.clear();
        self.status_filter = None;
        self.status_menu_open = false;
        self.modal = None;
    }

    fn open_checkout(&mut self) {
        self.screen = Screen::Checkout;
        self.checkout = CheckoutDraft::default();
        self.search.clear();
    }

    // =========================================================================
    // CLICKS
    // =========================================================================

    fn click_login(&mut self, locator: &Locator) {
        let l = Arc::clone(&self.locators);
        match self.screen {
            Screen::Username if *locator == l.login.next_button => {
                if !self.username.is_empty() {
                    self.screen = Screen::Password;
                }
            }
            Screen::Password if *locator == l.login.sign_in_button => {
                if self.password_ok() {
                    self.screen = Screen::StaySignedIn;
                }
            }
            Screen::StaySignedIn
                if *locator == l.login.yes_button || *locator == l.login.no_button =>
            {
                self.screen = match self.role_for(&self.username) {
                    Some(Role::Admin) => Screen::Home(Role::Admin),
                    _ => Screen::PersonPicker,
                };
            }
            Screen::PersonPicker => {
                if *locator == l.login.user_person {
                    self.picker_open = true;
                } else if *locator == l.login.first_option && self.picker_open {
                    self.person_chosen = true;
                    self.picker_open = false;
                } else if *locator == l.login.continue_button && self.person_chosen {
                    self.screen = Screen::Pin;
                }
            }
            Screen::Pin if *locator == l.login.continue_button => {
                if self.pin.concat() == self.model.pin {
                    self.screen = Screen::Home(Role::Volunteer);
                }
            }
            _ => {}
        }
    }

    fn click_modal(&mut self, locator: &Locator) {
        let l = Arc::clone(&self.locators);
        let target = self.targets.get(locator).cloned();
        let Some(draft) = self.modal.as_mut() else {
            return;
        };

        if let Some(item) = &draft.confirmed {
            if *locator == l.add_item.close_modal_button {
                tracing::debug!(item = %item, "add-item modal closed");
                self.modal = None;
            }
            return;
        }

        if *locator == l.inventory.inventory_type {
            draft.type_menu_open = true;
        } else if *locator == l.inventory.select_general && draft.type_menu_open {
            draft.kind = Some("General".into());
            draft.type_menu_open = false;
        } else if *locator == l.inventory.select_welcome_basket && draft.type_menu_open {
            draft.kind = Some("Welcome Basket".into());
            draft.type_menu_open = false;
        } else if *locator == l.inventory.item_name || *locator == l.add_item.item_name_input {
            draft.listbox_open = true;
        } else if *locator == l.inventory.cancel {
            self.modal = None;
        } else if *locator == l.add_item.submit_button {
            if draft.ready() {
                if let (Some(item), Some(amount)) = (draft.item.clone(), draft.amount()) {
                    self.model.adjust(&item, amount);
                    draft.confirmed = Some(item);
                }
            }
        } else if let Some(Target::ItemOption(name)) = target {
            if draft.listbox_open {
                draft.query.clone_from(&name);
                draft.item = Some(name);
                draft.listbox_open = false;
            }
        }
    }

    fn click_main(&mut self, locator: &Locator) {
        let l = Arc::clone(&self.locators);
        if self.modal.is_some() {
            self.click_modal(locator);
            return;
        }
        let target = self.targets.get(locator).cloned();

        if *locator == l.common.inventory_button {
            self.open_inventory();
        } else if *locator == l.common.volunteer_home_button {
            self.screen = Screen::Home(Role::Volunteer);
        } else if *locator == l.common.checkout_button || target == Some(Target::Category) {
            self.open_checkout();
        } else if *locator == l.home.email_id {
            self.account_menu_open = !self.account_menu_open;
        } else if *locator == l.home.logout_button && self.account_menu_open {
            self.account_menu_open = false;
            self.screen = Screen::LoggedOut;
        } else if self.screen == Screen::Inventory {
            if *locator == l.inventory.add_button {
                self.modal = Some(AddItemDraft::default());
            } else if *locator == l.inventory.status_button {
                self.status_menu_open = true;
            } else if *locator == l.inventory.clear_icon {
                self.search.clear();
            } else if let Some(Target::Status(label)) = target {
                self.status_filter = Some(label);
                self.status_menu_open = false;
            }
        }
    }

    fn click_checkout(&mut self, locator: &Locator) {
        let l = Arc::clone(&self.locators);
        let target = self.targets.get(locator).cloned();
        let draft = &mut self.checkout;
        match self.screen {
            Screen::Checkout => {
                if *locator == l.checkout.building_code {
                    draft.open_field = Some(Field::Building);
                } else if *locator == l.checkout.unit_number {
                    draft.open_field = Some(Field::Unit);
                } else if *locator == l.checkout.name_input {
                    draft.open_field = Some(Field::Resident);
                } else if *locator == l.checkout.first_list_item {
                    match draft.open_field.take() {
                        Some(Field::Building) => draft.building = true,
                        Some(Field::Unit) => draft.unit = true,
                        Some(Field::Resident) => draft.resident = true,
                        None => {}
                    }
                } else if *locator == l.checkout.continue_button
                    && draft.building
                    && draft.unit
                    && draft.resident
                {
                    self.screen = Screen::Cart;
                    self.search.clear();
                }
            }
            Screen::Cart => {
                if let Some(Target::AddToCart(name)) = target {
                    *draft.cart.entry(name).or_insert(0) += 1;
                } else if *locator == l.checkout.proceed_to_checkout && !draft.cart.is_empty() {
                    self.screen = Screen::Review;
                }
            }
            Screen::Review if *locator == l.checkout.confirm => {
                for (name, count) in std::mem::take(&mut draft.cart) {
                    self.model.adjust(&name, -count);
                }
                self.screen = Screen::Home(Role::Volunteer);
            }
            _ => {}
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    fn render(&mut self, dom: &mut MockDom) {
        let l = Arc::clone(&self.locators);
        let mut scene = Scene::new();
        self.targets.clear();

        let title = match self.screen {
            Screen::Username | Screen::Password | Screen::StaySignedIn => "Sign in to your account",
            _ => self.model.app_name.as_str(),
        }
        .to_string();

        match self.screen {
            Screen::Username => {
                show(&mut scene, &l.login.username_input, MockElement::new("").with_value(&self.username));
                show(&mut scene, &l.login.next_button, MockElement::new("Next"));
                if self.model.cold_start {
                    show(&mut scene, &l.login.database_popup_text, MockElement::new("Database is starting up"));
                }
            }
            Screen::Password => {
                show(&mut scene, &l.login.password_input, MockElement::new("").with_value(&self.password));
                show(&mut scene, &l.login.sign_in_button, MockElement::new("Sign in"));
            }
            Screen::StaySignedIn => {
                show(&mut scene, &l.login.yes_button, MockElement::new("Yes"));
                show(&mut scene, &l.login.no_button, MockElement::new("No"));
            }
            Screen::PersonPicker => {
                show(&mut scene, &l.login.user_person, MockElement::new(""));
                show(&mut scene, &l.login.continue_button, MockElement::new("Continue"));
                if self.picker_open {
                    show(&mut scene, &l.login.first_option, MockElement::new("Volunteer One"));
                }
            }
            Screen::Pin => {
                for (input, digit) in l.login.pin_inputs.iter().zip(&self.pin) {
                    show(&mut scene, input, MockElement::new("").with_value(digit));
                }
                show(&mut scene, &l.login.continue_button, MockElement::new("Continue"));
            }
            Screen::Home(role) => self.render_home(&mut scene, role),
            Screen::Inventory => self.render_inventory(&mut scene),
            Screen::Checkout | Screen::Cart | Screen::Review => self.render_checkout(&mut scene),
            Screen::LoggedOut => {
                show(
                    &mut scene,
                    &l.logout.after_logout_message,
                    MockElement::new(self.model.logout_message.as_str()),
                );
            }
        }

        dom.reconcile(scene);
        dom.set_title(title);
    }

    fn render_nav(&self, scene: &mut Scene) {
        let l = &self.locators;
        show(scene, &l.common.inventory_button, MockElement::new("Inventory"));
        show(scene, &l.common.volunteer_home_button, MockElement::new("Volunteer Home"));
        show(scene, &l.common.checkout_button, MockElement::new("Checkout"));
        show(scene, &l.home.brand_text, MockElement::new(self.model.app_name.as_str()));
        show(scene, &l.home.email_id, MockElement::new(self.username.as_str()));
        if self.account_menu_open {
            show(scene, &l.home.logout_button, MockElement::new("Log out"));
        }
    }

    fn render_home(&mut self, scene: &mut Scene, role: Role) {
        let l = Arc::clone(&self.locators);
        self.render_nav(scene);
        let label = match role {
            Role::Admin => self.model.admin_home_label.as_str(),
            Role::Volunteer => self.model.volunteer_header.as_str(),
        };
        show(scene, &l.home.menu_home_button, MockElement::new(label));
        show(scene, &l.home.header, MockElement::new(label));
        let today = chrono::Local::now().date_naive();
        show(scene, &l.home.date, MockElement::new(banner_date(today)));

        if role == Role::Volunteer {
            show(scene, &l.login.homepage_text, MockElement::new(label));
            for category in ["General", "Welcome Basket"] {
                let card = HomeLocators::checkout_category(category);
                self.targets.insert(card.clone(), Target::Category);
                show(scene, &card, MockElement::new(category));
            }
        }
    }

    fn render_inventory(&mut self, scene: &mut Scene) {
        let l = Arc::clone(&self.locators);
        self.render_nav(scene);
        show(scene, &l.inventory.search, MockElement::new("").with_value(&self.search));
        show(scene, &l.inventory.clear_icon, MockElement::new(""));
        show(scene, &l.inventory.add_button, MockElement::new("Add"));
        show(scene, &l.inventory.status_button, MockElement::new("Status"));
        show(scene, &l.common.loading_spinner, MockElement::new("").hidden());

        for item in &self.model.items {
            let status = StockStatus::of(item.quantity);
            if !matches_query(&item.name, &self.search) {
                continue;
            }
            if let Some(filter) = &self.status_filter {
                if status.label() != filter.as_str() {
                    continue;
                }
                show(scene, &InventoryLocators::rows_with_status(filter), MockElement::new(item.name.as_str()));
            }
            let quantity = item.quantity.to_string();
            show(scene, &LocatorRegistry::row_containing(&item.name), MockElement::new(item.name.as_str()));
            show(scene, &InventoryLocators::quantity_cell(&item.name), MockElement::new(quantity.as_str()));
            show(scene, &InventoryLocators::inventory_cell(&item.name), MockElement::new(quantity));
        }

        if self.status_menu_open {
            for label in STATUS_LABELS {
                let option = InventoryLocators::status_option(label);
                self.targets.insert(option.clone(), Target::Status(label.to_string()));
                show(scene, &option, MockElement::new(label));
            }
        }

        if let Some(draft) = &self.modal {
            show(scene, &l.common.backdrop, MockElement::new(""));
            if let Some(item) = &draft.confirmed {
                show(scene, &l.add_item.success_text, MockElement::new(format!("Inventory Updated: {item}")));
                show(scene, &l.add_item.close_modal_button, MockElement::new("Close"));
                return;
            }
            show(scene, &l.inventory.inventory_type, MockElement::new(draft.kind.as_deref().unwrap_or("Select")));
            show(scene, &l.inventory.item_name, MockElement::new(""));
            show(scene, &l.inventory.quantity, MockElement::new("Quantity"));
            show(scene, &l.inventory.cancel, MockElement::new("Cancel"));
            show(scene, &l.add_item.item_name_input, MockElement::new("").with_value(&draft.query));
            show(scene, &l.add_item.quantity_input, MockElement::new("").with_value(&draft.quantity));
            let submit = MockElement::new("Submit");
            let submit = if draft.ready() { submit } else { submit.attribute("disabled", "true").disabled() };
            show(scene, &l.add_item.submit_button, submit);

            if draft.type_menu_open {
                show(scene, &l.inventory.select_general, MockElement::new("General"));
                show(scene, &l.inventory.select_welcome_basket, MockElement::new("Welcome Basket"));
            }
            if draft.listbox_open {
                show(scene, &l.common.listbox, MockElement::new(""));
                for item in &self.model.items {
                    if !matches_query(&item.name, &draft.query) {
                        continue;
                    }
                    let option = AddItemLocators::listbox_option(&item.name);
                    self.targets.insert(option.clone(), Target::ItemOption(item.name.clone()));
                    show(scene, &option, MockElement::new(item.name.as_str()));
                    show(scene, &InventoryLocators::option_by_value(&item.name), MockElement::new(item.name.as_str()));
                    show(scene, &LocatorRegistry::text_contains(&item.name), MockElement::new(item.name.as_str()));
                }
            }
        }
    }

    fn render_checkout(&mut self, scene: &mut Scene) {
        let l = Arc::clone(&self.locators);
        match self.screen {
            Screen::Checkout => {
                show(scene, &l.common.backdrop, MockElement::new(""));
                show(scene, &l.checkout.building_code, MockElement::new("Building"));
                show(scene, &l.checkout.unit_number, MockElement::new("Unit"));
                show(scene, &l.checkout.name_input, MockElement::new(""));
                show(scene, &l.checkout.continue_button, MockElement::new("continue"));
                if self.checkout.open_field.is_some() {
                    show(scene, &l.checkout.first_list_item, MockElement::new("1"));
                }
            }
            Screen::Cart => {
                show(scene, &l.checkout.search, MockElement::new("").with_value(&self.search));
                show(scene, &l.checkout.clear_icon, MockElement::new(""));
                for item in &self.model.items {
                    if item.quantity <= 0 || !matches_query(&item.name, &self.search) {
                        continue;
                    }
                    let add = CheckoutLocators::add_button_for(&item.name);
                    self.targets.insert(add.clone(), Target::AddToCart(item.name.clone()));
                    show(scene, &add, MockElement::new("+"));
                }
                self.render_cart(scene);
                if !self.checkout.cart.is_empty() {
                    show(scene, &l.checkout.proceed_to_checkout, MockElement::new("Proceed to Checkout"));
                }
            }
            Screen::Review => {
                self.render_cart(scene);
                show(scene, &l.checkout.confirm, MockElement::new("Confirm"));
            }
            _ => {}
        }
    }

    fn render_cart(&self, scene: &mut Scene) {
        for (name, count) in &self.checkout.cart {
            show(
                scene,
                &LocatorRegistry::row_containing(name),
                MockElement::new(format!("{name} x{count}")),
            );
        }
    }
}

impl Behavior for InventoryApp {
    fn clicked(&mut self, dom: &mut MockDom, locator: &Locator) {
        match self.screen {
            Screen::Username
            | Screen::Password
            | Screen::StaySignedIn
            | Screen::PersonPicker
            | Screen::Pin => self.click_login(locator),
            Screen::Home(_) | Screen::Inventory => self.click_main(locator),
            Screen::Checkout | Screen::Cart | Screen::Review => self.click_checkout(locator),
            Screen::LoggedOut => {}
        }
        self.render(dom);
    }

    fn typed(&mut self, dom: &mut MockDom, locator: &Locator, value: &str) {
        let l = Arc::clone(&self.locators);
        if *locator == l.login.username_input {
            self.username = value.to_string();
        } else if *locator == l.login.password_input {
            self.password = value.to_string();
        } else if let Some(i) = l.login.pin_inputs.iter().position(|p| p == locator) {
            self.pin[i] = value.to_string();
        } else if *locator == l.inventory.search || *locator == l.checkout.search {
            self.search = value.to_string();
        } else if let Some(draft) = self.modal.as_mut() {
            if *locator == l.add_item.item_name_input {
                draft.query = value.to_string();
                draft.item = None;
                draft.listbox_open = true;
            } else if *locator == l.add_item.quantity_input {
                draft.quantity = value.to_string();
            }
        }
        self.render(dom);
    }

    fn navigated(&mut self, dom: &mut MockDom, url: &str) {
        tracing::debug!(url, "simulated app loaded");
        let fresh = Self::new(self.model.clone(), Arc::clone(&self.locators));
        *self = fresh;
        self.render(dom);
    }

    fn refreshed(&mut self, dom: &mut MockDom) {
        self.modal = None;
        self.status_menu_open = false;
        self.picker_open = false;
        self.account_menu_open = false;
        self.checkout.open_field = None;
        // a reload drops every node, so all held handles go stale
        dom.clear();
        self.render(dom);
    }
}

/// Mock driver running the simulated app for `config`
#[must_use]
pub fn simulated_driver(config: &SuiteConfig) -> MockDriver {
    let app = InventoryApp::new(
        AppModel::from_config(config),
        Arc::new(config.locators.clone()),
    );
    MockDriver::with_behavior(app)
}
