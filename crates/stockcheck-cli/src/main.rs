//! Stockcheck CLI: end-to-end scenarios for the inventory app
//!
//! ## Usage
//!
//! ```bash
//! stockcheck list --tag smoke                 # Show smoke scenarios
//! stockcheck run --tag regression --fail-fast # Run against Chromium
//! stockcheck run --driver simulated           # Run against the simulated app
//! stockcheck run --driver simulated --json    # Results as JSON on stdout
//! stockcheck config --check                   # Validate live settings
//! ```

use clap::Parser;
use std::process::ExitCode;
use stockcheck::logging::{self, LogFormat};
use stockcheck::scenario::select;
use stockcheck::{SuiteConfig, Tag, Timeouts};
use stockcheck_cli::{
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ConfigArgs, DriverArg, ListArgs,
    RunArgs, ScenarioRunner, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init_with(config.verbosity.log_filter(), LogFormat::Pretty);

    match cli.command {
        Commands::List(args) => run_list(&args),
        Commands::Run(args) => run_scenarios(config.with_fail_fast(args.fail_fast), &args),
        Commands::Config(args) => run_config(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_config_path(cli.config.clone())
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = select(args.tag.map(Tag::from), None);

    if args.json {
        let listing: Vec<_> = scenarios
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "description": s.description,
                    "tags": s.tags.iter().map(Tag::as_str).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for scenario in scenarios {
        let tags: Vec<_> = scenario.tags.iter().map(Tag::as_str).collect();
        println!(
            "{:<30} {:<20} {}",
            scenario.name,
            tags.join(","),
            scenario.description
        );
    }
    Ok(())
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let scenarios = select(args.tag.map(Tag::from), args.filter.as_deref());
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument(
            "no scenarios match the given --tag/--filter",
        ));
    }

    let mut suite = SuiteConfig::load(config.config_path.as_deref())?;
    if let Some(ref dir) = args.artifacts {
        suite.artifacts_dir.clone_from(dir);
    }
    match args.driver {
        DriverArg::Simulated => {
            suite.fill_demo_accounts();
            suite.timeouts = Timeouts::fast();
        }
        DriverArg::Chromium => suite.validate_for_live()?,
    }
    suite.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut runner = ScenarioRunner::new(config, suite, args.driver);
    let results = runtime.block_on(runner.run(&scenarios))?;
    if args.json {
        println!("{}", results.to_json()?);
    }

    if results.all_passed() {
        Ok(())
    } else {
        Err(CliError::scenario_failure(format!(
            "{} of {} scenarios failed",
            results.failed(),
            results.total()
        )))
    }
}

fn run_config(config: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    let suite = SuiteConfig::load(config.config_path.as_deref())?;
    if args.check {
        suite.validate_for_live()?;
    }
    print!("{}", suite.to_redacted_yaml()?);
    if args.check && !config.verbosity.is_quiet() {
        eprintln!("Configuration is complete for a live run");
    }
    Ok(())
}
