//! scroll-harvest CLI
//!
//! Opens a page, harvests its infinitely-scrolling item list and prints the
//! session report as JSON.

use anyhow::Context;
use clap::{ArgAction, Parser};
use scroll_harvest::browser::{BrowserConfig, BrowserController};
use scroll_harvest::harvest::{ButtonDownload, HarvestSession};
use scroll_harvest::HarvestConfig;
use std::path::PathBuf;

/// Harvest items from an infinitely-scrolling list
#[derive(Parser, Debug)]
#[command(name = "scroll-harvest")]
#[command(version)]
#[command(about = "Harvest timestamped items from an infinitely-scrolling web list")]
struct Args {
    /// Page to harvest
    url: String,

    /// Selector matching every item in the list
    #[arg(long)]
    item_selector: Option<String>,

    /// Selector matching the active item
    #[arg(long)]
    active_selector: Option<String>,

    /// Element clicked to clear selection
    #[arg(long)]
    neutral_selector: Option<String>,

    /// Download button to click for each item
    #[arg(long)]
    download_button: Option<String>,

    /// Stop after this many items
    #[arg(short = 'n', long, default_value = "100")]
    max_items: usize,

    /// Stop after this many loads in a row produce nothing new
    #[arg(long, default_value = "3")]
    max_empty_loads: usize,

    /// Keep items classified as duplicates
    #[arg(long)]
    keep_duplicates: bool,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run in headless mode
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    headless: bool,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Chrome profile to reuse, e.g. one that is already signed in
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// Budget for opening the page
    #[arg(long, default_value = "30000")]
    load_timeout_ms: u64,
}

impl Args {
    fn harvest_config(&self) -> HarvestConfig {
        let mut builder = HarvestConfig::builder()
            .max_items(self.max_items)
            .max_empty_loads(self.max_empty_loads);
        if let Some(selector) = &self.item_selector {
            builder = builder.item_selector(selector.clone());
        }
        if let Some(selector) = &self.active_selector {
            builder = builder.active_selector(selector.clone());
        }
        if let Some(selector) = &self.neutral_selector {
            builder = builder.neutral_selector(selector.clone());
        }
        let mut config = builder.build();
        config.limits.skip_duplicates = !self.keep_duplicates;
        config
    }

    fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.headless,
            sandbox: !self.no_sandbox,
            chrome_path: self.chrome_path.clone(),
            profile_dir: self.profile_dir.clone(),
            load_timeout_ms: self.load_timeout_ms,
            ..BrowserConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("scroll-harvest {} starting on {}", scroll_harvest::VERSION, args.url);

    let controller = BrowserController::launch(&args.browser_config())
        .await
        .context("launching browser")?;
    let page = controller
        .open(&args.url)
        .await
        .with_context(|| format!("opening {}", args.url))?;

    let mut session =
        HarvestSession::new(&page, args.harvest_config()).context("building harvest session")?;
    if let Some(button) = &args.download_button {
        session = session.with_download(ButtonDownload::new(button.clone()));
    }

    let report = session.run().await;
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    controller.close().await.context("closing browser")?;
    Ok(())
}
