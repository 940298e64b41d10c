// src/main.rs
// =============================================================================
// Entry point: parse arguments, configure logging, run the pipeline, and
// map the result to an exit code.
//
// Exit codes:
//   0 = no broken links
//   1 = at least one broken link
//   2 = startup error (invalid base URL, client build failure)
// =============================================================================

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use link_verifier::cli::Cli;
use link_verifier::{Settings, Verifier};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let settings = Settings {
        base_url: cli.url,
        timeout: Duration::from_secs(cli.timeout),
        delay: Duration::from_secs_f64(cli.delay),
        workers: cli.workers,
        sequential: cli.sequential,
    };

    let verifier = Verifier::new(settings)?;
    let report = verifier.run().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if report.is_success() {
        println!("✅ All links verified successfully!");
        Ok(0)
    } else {
        println!("❌ Found {} broken links!", report.broken_count);
        Ok(1)
    }
}
