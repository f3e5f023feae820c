//! Scenario runner: one fresh browser session per scenario, in order

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use stockcheck::mock::simulated_driver;
use stockcheck::scenario::Scenario;
use stockcheck::{BrowserDriver, Session, SuiteConfig};

use crate::commands::DriverArg;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Whether it passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Wall-clock duration
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(millis(*duration))
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration,
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration,
        }
    }
}

/// Aggregated results
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    /// Individual results in run order
    pub results: Vec<ScenarioResult>,
    /// Total duration
    pub duration: Duration,
}

impl RunResults {
    /// Create new empty results
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result
    pub fn add(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Check if every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Machine-readable report for `run --json`
    pub fn to_json(&self) -> CliResult<String> {
        let report = serde_json::json!({
            "passed": self.passed(),
            "failed": self.failed(),
            "total": self.total(),
            "duration_ms": millis(self.duration),
            "results": self.results,
        });
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// Runs scenarios one after another
#[derive(Debug)]
pub struct ScenarioRunner {
    config: CliConfig,
    suite: Arc<SuiteConfig>,
    driver: DriverArg,
    reporter: ProgressReporter,
}

impl ScenarioRunner {
    /// Create a runner over a loaded suite configuration
    #[must_use]
    pub fn new(config: CliConfig, suite: SuiteConfig, driver: DriverArg) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            config,
            suite: Arc::new(suite),
            driver,
            reporter,
        }
    }

    /// Replace the stderr reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run `scenarios` in order
    pub async fn run(&mut self, scenarios: &[&'static Scenario]) -> CliResult<RunResults> {
        let start = Instant::now();
        let mut results = RunResults::new();

        let driver = format!("{:?}", self.driver).to_lowercase();
        self.reporter
            .begin(scenarios.len(), &driver, &self.suite.base_url);

        for (index, scenario) in scenarios.iter().copied().enumerate() {
            self.reporter.scenario_started(scenario.name);
            let result = self.run_single(scenario).await;
            self.reporter.scenario_finished(&result);

            let stop = !result.passed && self.config.fail_fast;
            results.add(result);
            if stop {
                self.reporter.stopped_early(scenarios.len() - index - 1);
                break;
            }
        }

        results.duration = start.elapsed();
        self.reporter.finish(&results);
        Ok(results)
    }

    async fn run_single(&self, scenario: &'static Scenario) -> ScenarioResult {
        let started = Instant::now();
        let outcome = match self.open_driver().await {
            Ok(driver) => {
                Session::run(driver, self.suite.clone(), scenario.name, move |s| {
                    Box::pin(scenario.run_in(s))
                })
                .await
                .map_err(CliError::from)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => ScenarioResult::pass(scenario.name, started.elapsed()),
            Err(e) => {
                tracing::error!(scenario = scenario.name, error = %e, "scenario failed");
                ScenarioResult::fail(scenario.name, e.to_string(), started.elapsed())
            }
        }
    }

    async fn open_driver(&self) -> CliResult<Arc<dyn BrowserDriver>> {
        match self.driver {
            DriverArg::Simulated => Ok(Arc::new(simulated_driver(&self.suite))),
            #[cfg(feature = "browser")]
            DriverArg::Chromium => {
                let driver = stockcheck::ChromiumDriver::launch(&self.suite.browser).await?;
                Ok(Arc::new(driver))
            }
            #[cfg(not(feature = "browser"))]
            DriverArg::Chromium => Err(CliError::config(
                "Chromium support not enabled. Rebuild with --features browser",
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use stockcheck::scenario::{find, select};
    use stockcheck::Tag;

    fn quiet() -> CliConfig {
        CliConfig::new().with_verbosity(crate::config::Verbosity::Quiet)
    }

    mod results_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let mut results = RunResults::new();
            results.add(ScenarioResult::pass("login_admin", Duration::from_millis(10)));
            results.add(ScenarioResult::fail("logout", "boom", Duration::from_millis(5)));
            assert_eq!(results.total(), 2);
            assert_eq!(results.passed(), 1);
            assert_eq!(results.failed(), 1);
            assert!(!results.all_passed());
            assert_eq!(results.failures()[0].name, "logout");
        }
    }

    mod runner_tests {
        use super::*;

        #[tokio::test]
        async fn test_simulated_smoke_run_passes() {
            let dir = tempfile::tempdir().unwrap();
            let mut suite = SuiteConfig::simulated();
            suite.artifacts_dir = dir.path().to_path_buf();
            let mut runner = ScenarioRunner::new(quiet(), suite, DriverArg::Simulated);

            let results = runner.run(&select(Some(Tag::Smoke), None)).await.unwrap();
            assert_eq!(results.total(), 3);
            assert!(results.all_passed(), "{:?}", results.failures());
        }

        #[tokio::test]
        async fn test_fail_fast_stops_after_first_failure() {
            let dir = tempfile::tempdir().unwrap();
            let mut suite = SuiteConfig::simulated();
            suite.artifacts_dir = dir.path().to_path_buf();
            suite.data.checkout_item = "Garden Hose".into();
            let mut runner =
                ScenarioRunner::new(quiet().with_fail_fast(true), suite, DriverArg::Simulated);

            let scenarios = [
                find("checkout_adjusts_inventory").unwrap(),
                find("logout").unwrap(),
            ];
            let results = runner.run(&scenarios).await.unwrap();
            assert_eq!(results.total(), 1);
            assert_eq!(results.failed(), 1);
            assert!(dir.path().join("checkout_adjusts_inventory.png").exists());
        }

        #[tokio::test]
        async fn test_progress_lines_name_each_scenario() {
            let dir = tempfile::tempdir().unwrap();
            let mut suite = SuiteConfig::simulated();
            suite.artifacts_dir = dir.path().to_path_buf();
            suite.expected.logout_message = "Goodbye".into();
            let (reporter, lines) = ProgressReporter::capturing(false, false);
            let mut runner = ScenarioRunner::new(CliConfig::new(), suite, DriverArg::Simulated)
                .with_reporter(reporter);

            let scenarios = [find("login_admin").unwrap(), find("logout").unwrap()];
            let results = runner.run(&scenarios).await.unwrap();
            assert_eq!(results.failed(), 1);

            let lines = lines.lock().unwrap();
            assert_eq!(lines.len(), 4);
            assert!(lines[0].starts_with("Running 2 scenario(s) with the simulated driver"));
            assert!(lines[1].starts_with("PASS login_admin ("));
            assert!(lines[2].starts_with("FAIL logout ("));
            assert!(lines[2].contains("Unexpected logout message"));
            assert!(lines[3].starts_with("FAILED 2 scenarios in "));
            assert!(lines[3].ends_with("(1 passed, 1 failed)"));
        }

        #[tokio::test]
        async fn test_fail_fast_reports_skipped_scenarios() {
            let dir = tempfile::tempdir().unwrap();
            let mut suite = SuiteConfig::simulated();
            suite.artifacts_dir = dir.path().to_path_buf();
            suite.expected.logout_message = "Goodbye".into();
            let (reporter, lines) = ProgressReporter::capturing(false, false);
            let mut runner = ScenarioRunner::new(
                CliConfig::new().with_fail_fast(true),
                suite,
                DriverArg::Simulated,
            )
            .with_reporter(reporter);

            let scenarios = [
                find("logout").unwrap(),
                find("login_admin").unwrap(),
                find("login_volunteer").unwrap(),
            ];
            runner.run(&scenarios).await.unwrap();
            let lines = lines.lock().unwrap();
            assert!(lines
                .iter()
                .any(|l| l == "Skipped 2 scenario(s) after the first failure"));
        }

        #[cfg(not(feature = "browser"))]
        #[tokio::test]
        async fn test_driver_launch_failure_is_recorded_per_scenario() {
            let mut runner =
                ScenarioRunner::new(quiet(), SuiteConfig::simulated(), DriverArg::Chromium);
            let scenarios = [find("login_admin").unwrap(), find("logout").unwrap()];
            let results = runner.run(&scenarios).await.unwrap();

            assert_eq!(results.total(), 2);
            assert_eq!(results.failed(), 2);
            let error = results.failures()[1].error.as_deref().unwrap();
            assert!(error.contains("Chromium support not enabled"), "{error}");
        }
    }

    mod json_tests {
        use super::*;

        #[test]
        fn test_report_shape() {
            let mut results = RunResults::new();
            results.add(ScenarioResult::pass("login_admin", Duration::from_millis(1500)));
            results.add(ScenarioResult::fail("logout", "boom", Duration::from_millis(20)));
            results.duration = Duration::from_secs(2);

            let report: serde_json::Value =
                serde_json::from_str(&results.to_json().unwrap()).unwrap();
            assert_eq!(report["passed"], 1);
            assert_eq!(report["failed"], 1);
            assert_eq!(report["total"], 2);
            assert_eq!(report["duration_ms"], 2000);
            assert_eq!(report["results"][0]["name"], "login_admin");
            assert_eq!(report["results"][0]["duration_ms"], 1500);
            assert_eq!(report["results"][1]["error"], "boom");
            assert!(report["results"][0]["error"].is_null());
        }
    }
}
