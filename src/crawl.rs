//! Crawl orchestration: seed, crawl the frontier, drain to cache, export.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::cache::{CacheBridge, KeyValueCache};
use crate::error::{CrawlError, Result};
use crate::export::{write_dot, ExportStats};
use crate::fetch::FriendSource;
use crate::graph::{merge_friend_list, Frontier, NodeId, NodeStore};

/// Default maximum distance at which nodes are still crawled.
pub const DEFAULT_CRAWL_RADIUS: u32 = 2;

/// Default display radius; nodes closer than this are exported.
pub const DEFAULT_DISPLAY_RADIUS: u32 = 3;

/// Plain settings the crawler runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub target: NodeId,
    pub start: NodeId,
    pub crawl_radius: u32,
    pub display_radius: u32,
}

impl CrawlSettings {
    pub fn new(target: NodeId, start: NodeId) -> Self {
        Self {
            target,
            start,
            crawl_radius: DEFAULT_CRAWL_RADIUS,
            display_radius: DEFAULT_DISPLAY_RADIUS,
        }
    }
}

/// Lifecycle of a crawl. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrawlPhase {
    Seeding,
    Crawling,
    Draining,
    Exporting,
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlPhase::Seeding => "seeding",
            CrawlPhase::Crawling => "crawling",
            CrawlPhase::Draining => "draining",
            CrawlPhase::Exporting => "exporting",
            CrawlPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a finished run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Nodes known at the end of the run.
    pub nodes: usize,
    /// Friend lists fetched and merged this run.
    pub crawled: usize,
    /// Nodes installed from the persisted cache.
    pub hydrated: usize,
    /// Node snapshots written back to the persisted cache.
    pub persisted: usize,
    pub export: ExportStats,
}

/// Drives one discovery pass over the friend graph.
pub struct Crawler<S> {
    settings: CrawlSettings,
    source: S,
    bridge: Option<CacheBridge>,
    store: NodeStore,
    frontier: Frontier,
    phase: CrawlPhase,
    summary: CrawlSummary,
}

impl<S: FriendSource> Crawler<S> {
    pub fn new(settings: CrawlSettings, source: S) -> Self {
        Self {
            settings,
            source,
            bridge: None,
            store: NodeStore::new(),
            frontier: Frontier::new(settings.crawl_radius),
            phase: CrawlPhase::Seeding,
            summary: CrawlSummary::default(),
        }
    }

    /// Hydrate from and drain to `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.bridge = Some(CacheBridge::new(cache));
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn summary(&self) -> CrawlSummary {
        self.summary
    }

    /// Run every phase and write the DOT graph to `sink`.
    ///
    /// A failed cache drain does not stop the export; the drain error is
    /// returned once the graph has been written.
    pub async fn run<W: Write>(&mut self, sink: &mut W) -> Result<CrawlSummary> {
        self.seed().await?;
        self.crawl().await?;
        let drained = self.drain().await;
        if let Err(e) = &drained {
            log::error!("Failed to store results in cache: {}", e);
        }
        self.export(sink)?;
        drained?;

        log::info!("Counted {} people", self.store.len());
        Ok(self.summary)
    }

    /// SEEDING: hydrate from the cache, then pin the target at 0 and the
    /// start node at 1. Seeding after hydration keeps a stale snapshot from
    /// overriding either.
    pub async fn seed(&mut self) -> Result<()> {
        self.expect_phase(CrawlPhase::Seeding, "seed")?;

        if let Some(bridge) = &self.bridge {
            self.summary.hydrated = bridge.hydrate(&mut self.store).await;
            log::info!("Hydrated {} users from cache", self.summary.hydrated);
        }

        self.store.set_distance(self.settings.target, 0);
        self.store.set_distance(self.settings.start, 1);
        self.frontier.seed_from(&self.store);

        self.phase = CrawlPhase::Crawling;
        Ok(())
    }

    /// CRAWLING: fetch and merge frontier nodes until none is eligible.
    ///
    /// Terminates: only nodes with distance <= crawl radius are ever
    /// selected, each at most once, and the relation is finite.
    pub async fn crawl(&mut self) -> Result<usize> {
        self.expect_phase(CrawlPhase::Crawling, "crawl")?;

        while self.step().await?.is_some() {}

        self.phase = CrawlPhase::Draining;
        log::info!(
            "Crawl finished: {} friend lists merged, {} users known",
            self.summary.crawled,
            self.store.len()
        );
        Ok(self.summary.crawled)
    }

    /// Crawl one frontier node. Returns the node crawled, or `None` once the
    /// frontier is exhausted. A fetch failure aborts the crawl.
    pub async fn step(&mut self) -> Result<Option<NodeId>> {
        self.expect_phase(CrawlPhase::Crawling, "step")?;

        let Some(id) = self.frontier.next_to_crawl(&self.store) else {
            return Ok(None);
        };

        let friends = match self.source.fetch_friends(id).await {
            Ok(friends) => friends,
            Err(e) => {
                log::error!("Fetching friends of {} failed: {}", id, e);
                return Err(e);
            }
        };

        let improved = merge_friend_list(&mut self.store, id, &friends);
        self.store.mark_crawled(id);
        self.summary.crawled += 1;

        for node in improved {
            self.frontier.offer(&self.store, node);
        }

        log::debug!(
            "Crawled {} ({} friends, {} queued)",
            id,
            friends.len(),
            self.frontier.pending()
        );
        Ok(Some(id))
    }

    /// DRAINING: write every changed node back to the cache. No-op without one.
    pub async fn drain(&mut self) -> Result<usize> {
        self.expect_phase(CrawlPhase::Draining, "drain")?;
        self.phase = CrawlPhase::Exporting;

        if let Some(bridge) = &self.bridge {
            self.summary.persisted = bridge.persist(&self.store).await?;
        }
        Ok(self.summary.persisted)
    }

    /// EXPORTING: render the graph within the display radius.
    pub fn export<W: Write>(&mut self, sink: &mut W) -> Result<ExportStats> {
        self.expect_phase(CrawlPhase::Exporting, "export")?;

        let stats = write_dot(&self.store, sink, self.settings.display_radius)?;
        self.summary.export = stats;
        self.summary.nodes = self.store.len();
        self.phase = CrawlPhase::Done;
        Ok(stats)
    }

    fn expect_phase(&self, expected: CrawlPhase, operation: &str) -> Result<()> {
        if self.phase != expected {
            return Err(CrawlError::InvalidInput(format!(
                "cannot {} while {} (expected {})",
                operation, self.phase, expected
            )));
        }
        Ok(())
    }
}
