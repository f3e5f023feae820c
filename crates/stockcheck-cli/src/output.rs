//! Run progress on stderr: one line per scenario and a closing summary

use std::sync::{Arc, Mutex};
use std::time::Duration;

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::runner::{RunResults, ScenarioResult};

/// Where report lines go
#[derive(Debug)]
enum Sink {
    Term(Term),
    Memory(Arc<Mutex<Vec<String>>>),
}

/// Reports a scenario run as it happens
#[derive(Debug)]
pub struct ProgressReporter {
    sink: Sink,
    progress_bar: Option<ProgressBar>,
    use_color: bool,
    quiet: bool,
}

impl ProgressReporter {
    /// Reporter writing to stderr
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            sink: Sink::Term(Term::stderr()),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Reporter that keeps its lines in memory, readable through the
    /// returned buffer
    #[must_use]
    pub fn capturing(use_color: bool, quiet: bool) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let reporter = Self {
            sink: Sink::Memory(Arc::clone(&lines)),
            progress_bar: None,
            use_color,
            quiet,
        };
        (reporter, lines)
    }

    fn write(&self, line: &str) {
        match &self.sink {
            Sink::Term(term) => match self.progress_bar {
                Some(ref pb) => pb.println(line),
                None => {
                    let _ = term.write_line(line);
                }
            },
            Sink::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line.to_string());
                }
            }
        }
    }

    /// Announce the run and show a progress bar on interactive terminals
    pub fn begin(&mut self, total: usize, driver: &str, base_url: &str) {
        if self.quiet {
            return;
        }
        let banner = format!("Running {total} scenario(s) with the {driver} driver against {base_url}");
        if self.use_color {
            self.write(&style(banner).bold().to_string());
        } else {
            self.write(&banner);
        }

        if let Sink::Term(ref term) = self.sink {
            if term.is_term() {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=>-"),
                );
                pb.enable_steady_tick(Duration::from_millis(120));
                self.progress_bar = Some(pb);
            }
        }
    }

    /// Show which scenario is running
    pub fn scenario_started(&self, name: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(name.to_string());
        }
    }

    /// Report one finished scenario; failures show even when quiet
    pub fn scenario_finished(&self, result: &ScenarioResult) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        if result.passed && self.quiet {
            return;
        }
        self.write(&outcome_line(result, self.use_color));
    }

    /// Note that fail-fast cut the run short
    pub fn stopped_early(&self, remaining: usize) {
        if self.quiet || remaining == 0 {
            return;
        }
        self.write(&format!("Skipped {remaining} scenario(s) after the first failure"));
    }

    /// Clear the progress bar and print the summary
    pub fn finish(&self, results: &RunResults) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
        if self.quiet && results.all_passed() {
            return;
        }
        self.write(&summary_line(results, self.use_color));
    }
}

/// `PASS name (1.20s)` or `FAIL name (0.40s): error`
pub fn outcome_line(result: &ScenarioResult, use_color: bool) -> String {
    let secs = result.duration.as_secs_f64();
    let mark = match (result.passed, use_color) {
        (true, true) => style("✓").green().bold().to_string(),
        (true, false) => "PASS".to_string(),
        (false, true) => style("✗").red().bold().to_string(),
        (false, false) => "FAIL".to_string(),
    };
    match result.error {
        Some(ref error) if !result.passed => {
            format!("{mark} {} ({secs:.2}s): {error}", result.name)
        }
        _ => format!("{mark} {} ({secs:.2}s)", result.name),
    }
}

/// `PASSED 9 scenarios in 4.00s (9 passed, 0 failed)`
pub fn summary_line(results: &RunResults, use_color: bool) -> String {
    let verdict = if results.all_passed() { "PASSED" } else { "FAILED" };
    let verdict = match (use_color, results.all_passed()) {
        (false, _) => verdict.to_string(),
        (true, true) => style(verdict).green().bold().to_string(),
        (true, false) => style(verdict).red().bold().to_string(),
    };
    format!(
        "{verdict} {} scenarios in {:.2}s ({} passed, {} failed)",
        results.total(),
        results.duration.as_secs_f64(),
        results.passed(),
        results.failed()
    )
}
