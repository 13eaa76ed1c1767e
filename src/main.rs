// src/main.rs

use clap::ArgMatches;
use colored::*;
use env_logger::Builder;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, LevelFilter};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tierload::cli::build_cli;
use tierload::config::{load_config, render_config};
use tierload::models::SavedFile;
use tierload::utils::{format_duration, format_option_label};
use tierload::{
    AppError, Backend, Config, Controller, FileSink, HttpBackend, Navigator, Notice,
    ReturnHandler, ReturnParams, Selection, TierPolicy, VerifyState, VERSION,
};

/// Prints the hosted checkout address for the user to open
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        println!("\n{}", "Open this address to complete the payment:".bright_cyan());
        println!("  {}\n", url.bold());
        println!(
            "{}",
            "After paying, run `tierload complete \"<address you were sent back to>\"`.".cyan()
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logger();
    info!("tierload starting up - version {}", VERSION);

    let matches = build_cli().get_matches();
    if let Err(e) = run(&matches).await {
        error!("{}", e);
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> Result<(), AppError> {
    let config = effective_config(matches)?;
    debug!("Effective config: {:?}", config);

    let policy = Arc::new(config.tier_policy());
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config)?);

    match matches.subcommand() {
        Some(("info", sub)) => {
            let url = required(sub, "url")?;
            show_info(backend, policy, &config, url).await
        }
        Some(("download", sub)) => {
            let url = required(sub, "url")?;
            let quality = required(sub, "quality")?;
            download(backend, policy, &config, url, quality, sub.get_flag("buy")).await
        }
        Some(("complete", sub)) => {
            let params = match sub.get_one::<String>("return-url") {
                Some(address) => ReturnParams::from_return_url(address)?,
                None => ReturnParams {
                    session_id: sub.get_one::<String>("session-id").cloned(),
                    video_url: sub.get_one::<String>("url").cloned(),
                    quality: sub.get_one::<String>("quality").cloned(),
                },
            };
            complete(backend, policy, &config, params).await
        }
        Some(("config", _)) => {
            print!("{}", render_config(&config)?);
            Ok(())
        }
        _ => Err(AppError::ValidationError("Unknown command".to_string())),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, AppError> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::ValidationError(format!("Missing argument: {}", name)))
}

// Config file < environment < command-line flags
fn effective_config(matches: &ArgMatches) -> Result<Config, AppError> {
    let mut config = load_config()?;
    if let Some(url) = matches.get_one::<String>("api-url") {
        config.api_url = url.clone();
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config.timeout_secs = *secs;
    }
    Ok(config)
}

async fn lookup(controller: &mut Controller, url: &str) -> Result<(), AppError> {
    controller.set_url(url);
    if !controller.can_lookup() {
        return Err(AppError::ValidationError(format!(
            "Not a valid video URL: {}",
            url
        )));
    }

    let spinner = spinner("Fetching video information...");
    let result = controller.lookup().await.map(|_| ());
    spinner.finish_and_clear();

    if let Err(e) = &result {
        eprintln!("{}", Notice::VideoInfo.message().red());
        error!("Lookup of {} failed: {}", url, e);
    }
    result
}

async fn show_info(
    backend: Arc<dyn Backend>,
    policy: Arc<TierPolicy>,
    config: &Config,
    url: &str,
) -> Result<(), AppError> {
    let mut controller = Controller::new(backend, Arc::clone(&policy), config.offer.clone());
    lookup(&mut controller, url).await?;

    if let Some(active) = &controller.state().active {
        let video = &active.descriptor;
        println!("{}", video.title.bright_cyan().bold());
        println!("Duration: {}", format_duration(video.duration));
        if !video.thumbnail_url.is_empty() {
            println!("Thumbnail: {}", video.thumbnail_url);
        }
        println!("\nAvailable qualities:");
        for format in &video.formats {
            let tier = policy.classify(&format.quality_label);
            let label = format_option_label(format, tier);
            if tier.is_premium() {
                println!("  {} {}", "★".yellow(), label.yellow());
            } else {
                println!("  - {}", label);
            }
        }
    }
    Ok(())
}

async fn download(
    backend: Arc<dyn Backend>,
    policy: Arc<TierPolicy>,
    config: &Config,
    url: &str,
    quality: &str,
    buy: bool,
) -> Result<(), AppError> {
    let mut controller = Controller::new(backend, policy, config.offer.clone());
    lookup(&mut controller, url).await?;

    let mut sink = FileSink::new(&config.output_dir)?;
    let spinner = spinner(&format!("Downloading {}...", quality));
    let selection = controller.select_quality(quality, &mut sink).await;
    spinner.finish_and_clear();

    match selection {
        Ok(Selection::Downloaded(saved)) => {
            print_saved(&saved);
            Ok(())
        }
        Ok(Selection::OfferShown(offer)) => {
            println!("{}", format!("{} is a premium quality", quality).bright_yellow().bold());
            println!(
                "{} {} ({})",
                format!("De {}", offer.original_price).dimmed(),
                format!("Por apenas {}", offer.price).green().bold(),
                offer.discount
            );
            if !buy {
                println!("Run again with {} to purchase it.", "--buy".bold());
                controller.close_offer();
                return Ok(());
            }
            let mut navigator = ConsoleNavigator;
            match controller.purchase(&mut navigator).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    eprintln!("{}", Notice::Payment.message().red());
                    Err(e)
                }
            }
        }
        Err(e) => {
            eprintln!("{}", Notice::Download.message().red());
            Err(e)
        }
    }
}

async fn complete(
    backend: Arc<dyn Backend>,
    policy: Arc<TierPolicy>,
    config: &Config,
    params: ReturnParams,
) -> Result<(), AppError> {
    if params.session_id.is_none() {
        println!("No checkout session to complete.");
        return Ok(());
    }

    let mut sink = FileSink::new(&config.output_dir)?;
    let handler = ReturnHandler::new(backend, policy);
    let spinner = spinner("Preparing your premium download...");
    let outcome = handler.activate(params, &mut sink).await;
    spinner.finish_and_clear();

    match outcome {
        VerifyState::Completed(saved) => {
            println!("{}", "Payment confirmed!".green().bold());
            print_saved(&saved);
            Ok(())
        }
        VerifyState::Verified => {
            println!("{}", "Payment confirmed, but the purchased video is unknown.".yellow());
            Ok(())
        }
        VerifyState::NotPaid => {
            println!("{}", "Payment not confirmed yet.".yellow());
            Ok(())
        }
        VerifyState::Failed(notice) => {
            eprintln!("{}", notice.message().red());
            Err(AppError::DownloadError(notice.message().to_string()))
        }
        VerifyState::Idle | VerifyState::Verifying | VerifyState::DownloadingPremium => Ok(()),
    }
}

fn print_saved(saved: &SavedFile) {
    println!(
        "{} {} ({})",
        "Saved".green().bold(),
        saved.path.display(),
        format_size(saved.bytes, BINARY)
    );
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn init_logger() {
    // Create a custom logger builder
    let mut builder = Builder::from_default_env();

    // Set the default level based on debug/release mode
    if cfg!(debug_assertions) {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }

    // Define a custom format with timestamp, level, module, and message
    builder.format(|buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            buf,
            "[{} {} {}] {}",
            timestamp,
            record.level().to_string().to_uppercase(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // Allow override through RUST_LOG environment variable
    builder.parse_env("RUST_LOG");

    builder.init();
}
