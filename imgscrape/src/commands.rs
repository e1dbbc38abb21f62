use clap::{ArgAction, arg};

/// Upper bound accepted for worker counts and channel capacity.
pub const MAX_CONCURRENCY: u64 = 4096;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("imgscrape")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("imgscrape")
        .styles(CLAP_STYLING)
        .about("Crawl seed pages and save every image they reference")
        // Positionals are optional here; a missing folder or seed is
        // reported with our own usage message and exit status.
        .arg(
            arg!([FOLDER])
                .required(false)
                .help("Folder to save images into (created if missing)"),
        )
        .arg(
            arg!([URLS] ...)
                .required(false)
                .help("Seed pages to crawl; http:// is assumed when no scheme is given"),
        )
        .arg(
            arg!(-c --"crawl-workers" <NUM_WORKERS>)
                .required(false)
                .help("How many pages are fetched at once")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_CONCURRENCY))
                .default_value("5"),
        )
        .arg(
            arg!(-d --"download-workers" <NUM_WORKERS>)
                .required(false)
                .help("How many images are downloaded at once")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_CONCURRENCY))
                .default_value("5"),
        )
        .arg(
            arg!(--"channel-capacity" <SIZE>)
                .required(false)
                .help("Buffer size of the queues between stages")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_CONCURRENCY))
                .default_value("1"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds (default: none)")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Diagnostic line format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(--"summary")
                .required(false)
                .help("Print a summary of the run after completion")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Only print the final message")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Raise log verbosity on stderr (repeatable)")
                .action(ArgAction::Count),
        )
}
