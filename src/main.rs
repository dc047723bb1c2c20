use anyhow::{Context, Result};
use clap::Parser;
use feedlens::{analyze, AnalysisReport, AnalyzeOptions, FailureReport, MappingConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "feedlens",
    about = "Analyze a feed's structure and recommend field mappings"
)]
struct Args {
    /// Feed URL to analyze
    url: String,

    /// Maximum number of items to sample
    #[arg(long, default_value_t = 5)]
    sample_size: usize,

    /// Disable the auto_* deep-scan fallback for unknown elements
    #[arg(long)]
    no_deep_scan: bool,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Also emit the mapping persistence payload for this feed id
    #[arg(long, value_name = "FEED_ID")]
    mapping_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let options = AnalyzeOptions {
        sample_size: args.sample_size,
        deep_scan: !args.no_deep_scan,
        timeout: Duration::from_secs(args.timeout_secs),
    };

    match analyze(&client, &args.url, &options).await {
        Ok(report) => {
            print_json(&report, args.pretty)?;
            if let Some(feed_id) = &args.mapping_config {
                let config = MappingConfig::from_report(feed_id, &report);
                print_json(&config, args.pretty)?;
            }
            exit_code_for(&report);
            Ok(())
        }
        Err(e) => {
            let failure = FailureReport::from(&e);
            print_json(&failure, args.pretty)?;
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

/// A report always prints, but an invalid feed still signals failure to
/// scripts via the exit code.
fn exit_code_for(report: &AnalysisReport) {
    if !report.validation.is_valid {
        std::process::exit(2);
    }
}
