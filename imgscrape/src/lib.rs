pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    Invocation, OutputFormat, USAGE, USAGE_EXIT_CODE, expand_destination, format_summary,
    init_tracing, parse_invocation, print_usage, render_event, run_scrape,
};
