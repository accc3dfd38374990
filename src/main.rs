//! Tweet Media Harvester - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tweet_media_harvester::{
    api::{TimelineStream, TwitterApi},
    cli::Args,
    config::{default_config_path, parse_username, validate_config, Config},
    download::{harvest, HarvestOptions, HarvestSummary, HttpFetcher},
    error::{exit_codes, Error, Result},
    fs::get_output_directory,
    output::{
        print_banner, print_config_summary, print_error, print_harvest_summary, print_info,
        print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(summary) => {
            if summary.marker_failures() > 0 {
                print_warning(&format!(
                    "The watermark could not be updated after {} download(s); \
                     the next run may revisit already harvested posts",
                    summary.marker_failures()
                ));
            }
            if summary.failed() > 0 {
                print_warning(&format!(
                    "{} file(s) could not be downloaded",
                    summary.failed()
                ));
            }
            ExitCode::from(outcome_code(&summary) as u8)
        }
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

/// Exit code of a completed run.
///
/// Only files that could not be fetched make the run fail; marker problems
/// are reported as a warning and still exit with success.
fn outcome_code(summary: &HarvestSummary) -> i32 {
    if summary.failed() > 0 {
        exit_codes::SOME_DOWNLOADS_FAILED
    } else {
        exit_codes::SUCCESS
    }
}

/// Exit code for an error that aborted the run.
fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Config(_)
        | Error::ConfigValidation { .. }
        | Error::MissingConfig(_)
        | Error::TomlParse(_) => exit_codes::CONFIG_ERROR,
        Error::Authentication(_)
        | Error::Api(_)
        | Error::AccountNotFound(_)
        | Error::RateLimited(_)
        | Error::Http(_) => exit_codes::API_ERROR,
        Error::StreamInterrupted { source, .. } => exit_code(source),
        Error::Download(_) => exit_codes::DOWNLOAD_ERROR,
        Error::OutputDirectory { .. } => exit_codes::ABORT,
        _ => exit_codes::UNEXPECTED_ERROR,
    }
}

async fn run() -> Result<HarvestSummary> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = load_config(&args)?;

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Accept @name and profile URLs
    if let Some(user) = config.target.username.take() {
        config.target.username = Some(parse_username(&user)?);
    }

    validate_config(&config)?;

    let target = config.target()?;
    let output_dir = get_output_directory(&config, &target)?;

    print_config_summary(
        &target.to_string(),
        config.options.max_downloads,
        &output_dir.display().to_string(),
    );

    let api = TwitterApi::new(
        config.account.bearer_token.clone(),
        &config.account.user_agent,
    )?;
    let mut stream = TimelineStream::from_config(&api, &config, target);
    let fetcher =
        HttpFetcher::new(&config.account.user_agent)?.show_progress(config.options.show_downloads);

    let summary = harvest(
        &mut stream,
        &fetcher,
        &HarvestOptions::from_config(&config),
        &output_dir,
    )
    .await?;

    tracing::debug!("Fetched {} page(s) of posts", stream.pages_fetched());
    print_harvest_summary(&summary);
    if summary.downloaded() > 0 {
        print_success(&format!(
            "Saved {} new file(s) to {}",
            summary.downloaded(),
            output_dir.display()
        ));
    }

    Ok(summary)
}

/// Load the config file named on the command line, then the per-user one.
fn load_config(args: &Args) -> Result<Config> {
    if args.config.exists() {
        return Config::load(&args.config);
    }

    if let Some(path) = default_config_path().filter(|p| p.exists()) {
        print_info(&format!("Using configuration from {}", path.display()));
        return Config::load(&path);
    }

    print_warning(&format!(
        "Configuration file not found: {}",
        args.config.display()
    ));
    print_info("Using default configuration with CLI arguments");
    Ok(Config::default())
}
