use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::error;

use folio_probe::runner::{Outcome, ScenarioRunner};
use folio_probe::scenario::{load_all, Scenario};
use folio_probe::RunnerConfig;

/// Declarative end-to-end scenario runner for the portfolio site.
#[derive(Parser, Debug)]
#[command(name = "folio-probe", version, about)]
struct Cli {
    /// Scenario file or directory of .yaml scenario files
    #[arg(default_value = "scenarios")]
    scenarios: PathBuf,

    /// Base URL of the application under test
    #[arg(long, env = "FOLIO_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Run Chrome with a visible window
    #[arg(long)]
    headed: bool,

    /// Default timeout for element readiness and HTTP calls, in seconds
    #[arg(long, env = "FOLIO_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    /// Navigation timeout, in seconds
    #[arg(long, default_value_t = 10)]
    nav_timeout_secs: u64,

    /// Path to the Chrome/Chromium executable (auto-detected when unset)
    #[arg(long, env = "FOLIO_CHROME")]
    chrome: Option<String>,

    /// Run only scenarios whose name contains this substring
    #[arg(long)]
    filter: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _log_guard = folio_probe::init_logging();

    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

fn prepare(cli: &Cli) -> anyhow::Result<(Vec<Scenario>, ScenarioRunner)> {
    let mut scenarios = load_all(&cli.scenarios)
        .with_context(|| format!("loading scenarios from '{}'", cli.scenarios.display()))?;

    if let Some(filter) = &cli.filter {
        scenarios.retain(|s| s.name.contains(filter.as_str()));
        anyhow::ensure!(
            !scenarios.is_empty(),
            "no scenario matches filter '{}'",
            filter
        );
    }

    let config = RunnerConfig::default()
        .base_url(&cli.base_url)
        .headless(!cli.headed)
        .timeout(cli.timeout_secs)
        .nav_timeout(cli.nav_timeout_secs)
        .chrome_path(cli.chrome.clone());

    let runner = ScenarioRunner::new(config).context("configuring the runner")?;
    Ok((scenarios, runner))
}

async fn run(cli: Cli) -> i32 {
    let (scenarios, runner) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return 2;
        }
    };

    println!(
        "{} {} scenario(s) against {}",
        "running".cyan().bold(),
        scenarios.len(),
        cli.base_url
    );

    let started = Instant::now();
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut errored = 0usize;
    let mut exit_code = 0;

    for scenario in &scenarios {
        println!();
        println!("{} {}", "▶".cyan(), scenario.name.bold());
        if let Some(description) = &scenario.description {
            println!("  {}", description.dimmed());
        }

        let report = runner.run(scenario).await;

        match &report.outcome {
            Outcome::Passed => {
                passed += 1;
                println!(
                    "  {} {} ({} step(s), {:.1}s)",
                    "PASS".green().bold(),
                    scenario.name,
                    report.steps_run,
                    report.duration.as_secs_f64()
                );
            }
            Outcome::Failed(failures) => {
                failed += 1;
                println!(
                    "  {} {} ({} assertion(s) failed)",
                    "FAIL".red().bold(),
                    scenario.name,
                    failures.len()
                );
                for failure in failures {
                    println!("    {} {}", "✗".red(), failure);
                }
            }
            Outcome::Error { step, cause } => {
                errored += 1;
                let at = step.as_deref().unwrap_or("setup");
                println!("  {} {} at {}: {}", "ERROR".yellow().bold(), scenario.name, at, cause);
            }
        }

        exit_code = exit_code.max(report.outcome.exit_code());
    }

    println!();
    let summary = format!(
        "{} passed, {} failed, {} errored in {:.1}s",
        passed,
        failed,
        errored,
        started.elapsed().as_secs_f64()
    );
    if exit_code == 0 {
        println!("{} {}", "OK".green().bold(), summary);
    } else {
        println!("{} {}", "NOT OK".red().bold(), summary);
    }

    exit_code
}
