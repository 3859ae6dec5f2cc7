#![forbid(unsafe_code)]

//! Command-line entry point: fetch a channel's uploads for a date window and
//! write `videos.csv` plus transcripts under the output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use channel_harvest::catalog::DataApiClient;
use channel_harvest::config::{SettingsOverrides, resolve_settings};
use channel_harvest::harvest::{self, HarvestRequest};
use channel_harvest::logging::init_tracing;
use channel_harvest::model::{DateWindow, parse_calendar_date};
use channel_harvest::output::write_output;
use channel_harvest::transcript::WatchPageTranscripts;
use chrono::NaiveDate;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "fetch_channel",
    about = "Fetch YouTube channel data and transcripts for a date range"
)]
struct Args {
    /// Channel handle (e.g. @ExampleChannel) or name
    #[arg(long)]
    handle: String,

    /// First day to include, YYYY-MM-DD (UTC)
    #[arg(long, value_parser = parse_date_arg)]
    start: NaiveDate,

    /// Last day to include, YYYY-MM-DD (UTC)
    #[arg(long, value_parser = parse_date_arg)]
    end: NaiveDate,

    /// Where videos.csv and transcripts/ are written [default: OUTPUT_DIR or ./output]
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// dotenv file consulted for YOUTUBE_API_KEY and friends
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_calendar_date(value).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let window = DateWindow::from_dates(args.start, args.end)?;
    let settings = resolve_settings(SettingsOverrides {
        output_dir: args.output_dir,
        env_path: args.env_file,
    })?;

    let catalog = DataApiClient::new(&settings);
    let transcripts = WatchPageTranscripts::new(&settings);
    let request = HarvestRequest {
        handle: args.handle,
        window,
    };

    let result = harvest::run(&catalog, &transcripts, &request)
        .with_context(|| format!("harvesting {}", request.handle))?;
    let summary = write_output(&settings.output_dir, &result.records)
        .with_context(|| format!("writing output to {}", settings.output_dir.display()))?;

    println!("===================================");
    println!("Harvest complete");
    println!("===================================");
    println!("Channel: {} ({})", request.handle, result.channel_id);
    println!("Uploads playlist: {}", result.playlist_id);
    println!(
        "Scanned {} playlist item(s) across {} page(s)",
        result.listing.scanned, result.listing.pages
    );
    println!(
        "Skipped {} unpublished and {} repeated item(s)",
        result.listing.skipped_unpublished, result.listing.duplicates
    );
    println!("Videos in range: {}", summary.rows);
    println!("Transcripts written: {}", summary.transcript_files);
    println!("CSV: {}", summary.csv_path.display());

    Ok(())
}
