pub mod crawl;
pub mod dedup;
pub mod download;
pub mod events;
pub mod limiter;
pub mod link;
pub mod pipeline;
pub mod tracker;

pub use crawl::CrawlStage;
pub use dedup::{Deduplicator, spawn_dedup};
pub use download::DownloadStage;
pub use events::{EventCallback, PipelineEvent, PipelineSummary, Reporter};
pub use limiter::{ConcurrencyLimiter, Permit};
pub use link::{derived_name, normalize_link, normalize_seed};
pub use pipeline::{PipelineOptions, run_pipeline};
pub use tracker::{CompletionTracker, TrackedUnit};
