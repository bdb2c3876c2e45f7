//! portfolio-smoke: headless smoke test for the portfolio page
//!
//! Exit code 0 means no console or page errors were captured. Exit code 1
//! means the page failed to load, the browser failed, or the page raised
//! runtime errors. Missing elements are reported but do not change it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::{error, info};

use portfolio_e2e::{
    page_url, Browser, Checklist, DriverConfig, PlaywrightConfig, PlaywrightSession, SmokeReport, SmokeTest,
    WaitPolicy,
};

/// Headless-browser smoke test for the portfolio page
#[derive(Parser, Debug)]
#[command(name = "portfolio-smoke")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to open, relative to the working directory
    #[arg(long, env = "PORTFOLIO_SMOKE_PAGE", default_value = "index.html")]
    page: PathBuf,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, env = "PORTFOLIO_SMOKE_BROWSER", default_value = "chromium")]
    browser: Browser,

    /// Show the browser window
    #[arg(long, env = "PORTFOLIO_SMOKE_HEADED")]
    headed: bool,

    /// How long to wait for an interaction to take effect
    #[arg(long, env = "PORTFOLIO_SMOKE_TIMEOUT_MS", default_value_t = 2000)]
    timeout_ms: u64,

    /// Polling interval while waiting
    #[arg(long, env = "PORTFOLIO_SMOKE_POLL_MS", default_value_t = 50)]
    poll_ms: u64,

    /// How long a single browser command may take
    #[arg(long, env = "PORTFOLIO_SMOKE_COMMAND_TIMEOUT_MS", default_value_t = 30_000)]
    command_timeout_ms: u64,

    /// Checklist YAML replacing the built-in one
    #[arg(long, env = "PORTFOLIO_SMOKE_CHECKLIST")]
    checklist: Option<PathBuf>,

    /// Also write the report as JSON
    #[arg(long, env = "PORTFOLIO_SMOKE_JSON")]
    json: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match run(args).await {
        Ok(report) => {
            println!("{}", report.render());
            ExitCode::from(report.exit_code())
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<SmokeReport> {
    let checklist = match &args.checklist {
        Some(path) => Checklist::from_file(path)
            .with_context(|| format!("Failed to read checklist {}", path.display()))?,
        None => Checklist::builtin()?,
    };

    let url = page_url(&args.page)?;
    let mut config = DriverConfig::new(url);
    config.wait = WaitPolicy {
        timeout: Duration::from_millis(args.timeout_ms),
        interval: Duration::from_millis(args.poll_ms.max(1)),
    };

    let playwright = PlaywrightConfig {
        browser: args.browser,
        headless: !args.headed,
        command_timeout: Duration::from_millis(args.command_timeout_ms),
        ..PlaywrightConfig::default()
    };

    let test = SmokeTest::new(checklist, config);
    let mut session = PlaywrightSession::launch(&playwright)
        .await
        .context("Failed to start the browser")?;
    let report = test.run(&mut session).await;

    if let Some(path) = &args.json {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(report)
}
