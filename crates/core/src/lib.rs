pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod ratelimit;
pub mod rewrite;

pub use batch::{BatchReport, ItemOutcome, PageRecord, generate_all, reclean_all, refetch_all};
pub use config::{BatchConfig, PipelineConfig};
pub use error::{FailureRecord, FetchError, PagecraftError, Result, RewriteError};
pub use extract::{ExtractedContent, extract_from_html, fetch_and_extract};
pub use fetch::{FetchConfig, FetchResult, MAX_BODY_BYTES, fetch_url, read_file, read_stdin};
pub use formatters::{FormattedLayout, format, format_result, format_versioned, html_to_text};
pub use parse::Document;
pub use postprocess::{reclean, remove_boilerplate};
#[doc(hidden)]
pub use preprocess::strip_noise;
pub use ratelimit::RateLimiter;
pub use rewrite::{
    Layout, LayoutSettings, PromptVersion, RewriteConfig, RewriteConfigBuilder, RewriteEngine, RewriteRequest,
    RewriteResult,
};
