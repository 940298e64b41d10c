// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
// =============================================================================

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "link-verifier",
    version,
    about = "Crawl a website and verify that every link on it still resolves",
    long_about = "link-verifier crawls a site breadth-first from a base URL, collects every \
                  anchor link on every internal page, and checks each unique link once. \
                  Links answering with HTTP 404 or 500 are reported as broken; exit code 1 \
                  makes it suitable for CI gating of documentation sites."
)]
pub struct Cli {
    /// Base URL to crawl
    #[arg(long, default_value = "https://llm-d.ai")]
    pub url: String,

    /// Timeout for HTTP requests in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Delay between requests in seconds
    #[arg(long, default_value_t = 1.0)]
    pub delay: f64,

    /// Worker pool size for concurrent checking
    #[arg(long, default_value_t = 10)]
    pub workers: usize,

    /// Check one page and one link at a time instead of concurrently
    #[arg(long)]
    pub sequential: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
