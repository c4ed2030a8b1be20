mod fetcher;
mod models;
mod parser;

pub use fetcher::{Fetch, FeedFetcher};
pub use models::{article_id, Article, Payload, Source, SourceKind};
pub use parser::{collect_raw_entries, parse_feed, parse_feed_date, RawEntry};
