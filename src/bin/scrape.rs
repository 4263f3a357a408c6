//! Prints the alt text of the comic on a page.

use anyhow::{Context, Result};
use clap::Parser;

use image_classifier::scrape::{scrape, ScrapeTarget, DEFAULT_URL};
use image_classifier::utils::logging::{init_logging, LogConfig};

/// Fetch a page and print the `alt` text of its comic image
#[derive(Parser, Debug)]
#[command(name = "scrape")]
#[command(version)]
struct Args {
    /// Page to fetch
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::quiet()
    };
    let _ = init_logging(&log_config);

    let target = ScrapeTarget::default().with_url(&args.url);
    let alt = scrape(&target).with_context(|| format!("Scraping {} failed", args.url))?;
    println!("{}", alt);

    Ok(())
}
