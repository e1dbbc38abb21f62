use colored::Colorize;
use imgscrape::commands::command_argument_builder;
use imgscrape::{
    USAGE_EXIT_CODE, format_summary, init_tracing, parse_invocation, print_usage, run_scrape,
};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    let invocation = match parse_invocation(&matches) {
        Ok(invocation) => invocation,
        Err(reason) => {
            print_usage(&reason);
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    init_tracing(invocation.verbosity);
    let format = invocation.format;
    let show_summary = invocation.summary;

    match run_scrape(invocation).await {
        Ok(summary) => {
            println!("{}", "Scraped successfully".green().bold());
            if show_summary {
                println!("{}", format_summary(&summary, format));
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
