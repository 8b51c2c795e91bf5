pub mod config;
pub mod error;
pub mod db;
pub mod graph;
pub mod fetch;
pub mod cache;
pub mod crawl;
pub mod export;

pub use config::Config;
pub use crawl::{CrawlPhase, CrawlSettings, CrawlSummary, Crawler};
pub use error::{CrawlError, Result};
pub use graph::{Node, NodeId, NodeStore, UNKNOWN_DISTANCE};
