// src/cli.rs

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the command-line interface for the application
pub fn build_cli() -> Command {
    Command::new("tierload")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ibrahim Mohamed")
        .about("Download videos in free qualities, or buy premium qualities")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Base address of the backend (overrides config)")
                .value_name("URL"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .global(true)
                .help("Directory where downloads are saved")
                .value_name("DIRECTORY"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .global(true)
                .help("Request timeout in seconds")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .subcommand(
            Command::new("info")
                .about("Show title, duration and available qualities of a video")
                .arg(
                    Arg::new("url")
                        .help("The URL of the video")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("Download a video in the given quality")
                .arg(
                    Arg::new("url")
                        .help("The URL of the video")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("quality")
                        .long("quality")
                        .short('q')
                        .help("Quality label as listed by `info` (e.g. 360p, 720p)")
                        .required(true)
                        .value_name("QUALITY"),
                )
                .arg(
                    Arg::new("buy")
                        .long("buy")
                        .help("Start the checkout when the quality is premium")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("complete")
                .about("Verify a payment and download the purchased file")
                .arg(
                    Arg::new("return-url")
                        .help("Address the payment provider sent you back to")
                        .index(1)
                        .conflicts_with_all(["session-id", "url", "quality"]),
                )
                .arg(
                    Arg::new("session-id")
                        .long("session-id")
                        .help("Checkout session id")
                        .value_name("ID"),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("The URL of the purchased video")
                        .value_name("URL"),
                )
                .arg(
                    Arg::new("quality")
                        .long("quality")
                        .short('q')
                        .help("The purchased quality")
                        .value_name("QUALITY"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}
