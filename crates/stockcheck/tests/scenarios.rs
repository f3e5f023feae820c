//! Catalogue scenarios against the simulated application.
//!
//! Every scenario runs through `Session::run` exactly as the CLI runs it,
//! with the in-memory app standing in for the browser.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use stockcheck::mock::{simulated_driver, MockDriver};
use stockcheck::pages::StockStatus;
use stockcheck::scenario::{catalogue, find, select};
use stockcheck::{E2eError, E2eResult, Secret, Session, SuiteConfig, Tag};

fn config(artifacts: &Path) -> SuiteConfig {
    let mut config = SuiteConfig::simulated();
    config.artifacts_dir = artifacts.to_path_buf();
    config
}

async fn run_named(name: &str, config: SuiteConfig) -> (Arc<MockDriver>, E2eResult<()>) {
    let scenario = find(name).expect("scenario in catalogue");
    let driver = Arc::new(simulated_driver(&SuiteConfig::simulated()));
    let outcome = Session::run(driver.clone(), Arc::new(config), scenario.name, move |s| {
        Box::pin(scenario.run_in(s))
    })
    .await;
    (driver, outcome)
}

// ============================================================================
// Catalogue
// ============================================================================

#[tokio::test]
async fn test_every_scenario_passes_against_simulated_app() {
    let dir = tempfile::tempdir().unwrap();
    for scenario in catalogue() {
        let (driver, outcome) = run_named(scenario.name, config(dir.path())).await;
        assert!(outcome.is_ok(), "{} failed: {:?}", scenario.name, outcome);
        assert!(driver.is_closed(), "{} left the browser open", scenario.name);
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_smoke_selection_runs() {
    let dir = tempfile::tempdir().unwrap();
    let smoke = select(Some(Tag::Smoke), None);
    assert_eq!(smoke.len(), 3);
    for scenario in smoke {
        let (_, outcome) = run_named(scenario.name, config(dir.path())).await;
        outcome.unwrap();
    }
}

// ============================================================================
// Inventory side effects
// ============================================================================

#[tokio::test]
async fn test_checkout_lowers_quantity_by_one() {
    let dir = tempfile::tempdir().unwrap();
    let (driver, outcome) = run_named("checkout_adjusts_inventory", config(dir.path())).await;
    outcome.unwrap();
    assert!(driver.was_called("type:"));
    assert!(driver.count("click:") > 10);
}

#[tokio::test]
async fn test_restock_with_custom_amount() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.data.add_item = "Men's Socks".into();
    config.data.add_quantity = 9;
    let (_, outcome) = run_named("add_item_increases_inventory", config).await;
    outcome.unwrap();
}

#[tokio::test]
async fn test_checkout_of_item_with_apostrophe() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.data.checkout_item = "Men's Socks".into();
    let (_, outcome) = run_named("checkout_adjusts_inventory", config).await;
    outcome.unwrap();
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_wrong_expectation_fails_with_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.expected.logout_message = "See you soon".into();

    let (driver, outcome) = run_named("logout", config).await;
    match outcome {
        Err(E2eError::AssertionFailed { message }) => {
            assert!(message.contains("Unexpected logout message"));
            assert!(message.contains("See you soon"));
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
    assert!(driver.is_closed());
    assert!(dir.path().join("logout.png").exists());
}

#[tokio::test]
async fn test_wrong_pin_cannot_reach_home() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.volunteer_pin = Secret::new("9999");
    let (driver, outcome) = run_named("volunteer_header", config).await;
    assert!(outcome.is_err());
    assert!(driver.is_closed());
}

#[tokio::test]
async fn test_unknown_item_reports_not_found_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.data.checkout_item = "Garden Hose".into();
    let (_, outcome) = run_named("checkout_adjusts_inventory", config).await;
    let err = outcome.unwrap_err();
    assert!(
        err.to_string().contains("'Garden Hose' not found in inventory table after retries"),
        "{err}"
    );
}

// ============================================================================
// Resilience
// ============================================================================

#[tokio::test]
async fn test_sign_in_survives_stale_button() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = find("login_admin").unwrap();
    let driver = Arc::new(simulated_driver(&SuiteConfig::simulated()));
    let button = SuiteConfig::simulated().locators.login.sign_in_button;

    let injected = driver.clone();
    Session::run(
        driver.clone(),
        Arc::new(config(dir.path())),
        scenario.name,
        move |s| {
            Box::pin(async move {
                injected.inject_stale(&button, 1);
                scenario.run_in(s).await
            })
        },
    )
    .await
    .unwrap();

    assert!(driver.was_called("stale:"));
}

#[tokio::test]
async fn test_intercepted_checkout_falls_back_to_script_click() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = find("checkout_adjusts_inventory").unwrap();
    let driver = Arc::new(simulated_driver(&SuiteConfig::simulated()));
    let checkout = SuiteConfig::simulated().locators.common.checkout_button;

    let injected = driver.clone();
    Session::run(
        driver.clone(),
        Arc::new(config(dir.path())),
        scenario.name,
        move |s| {
            Box::pin(async move {
                injected.inject_intercept(&checkout, 1);
                scenario.run_in(s).await
            })
        },
    )
    .await
    .unwrap();

    assert!(driver.was_called("intercepted:"));
    assert!(driver.was_called("script_click:"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_stock_status_bands(quantity in -50i64..500) {
        let status = StockStatus::of(quantity);
        let expected = if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= 5 {
            StockStatus::Low
        } else {
            StockStatus::Normal
        };
        prop_assert_eq!(status, expected);
        prop_assert_eq!(status.label().parse::<StockStatus>().unwrap(), status);
    }

    #[test]
    fn prop_tag_names_round_trip(tag in prop_oneof![
        Just(Tag::Smoke),
        Just(Tag::Regression),
        Just(Tag::Serial),
    ]) {
        prop_assert_eq!(tag.as_str().to_uppercase().parse::<Tag>().unwrap(), tag);
    }
}
