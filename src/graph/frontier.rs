//! Crawl frontier: discovered, uncrawled nodes within the crawl radius.

use std::collections::{HashSet, VecDeque};

use super::node::NodeId;
use super::store::NodeStore;

/// FIFO worklist of nodes eligible for crawling.
///
/// A node is eligible while `distance <= radius` and it has not been crawled.
/// Nodes are queued in the order their distance first entered the radius,
/// which is close to breadth-first but not strictly layer by layer: a queued
/// node whose distance later drops keeps its place in the queue.
///
/// Nodes are offered only when their distance improves, so `radius` must be
/// below [`UNKNOWN_DISTANCE`](super::UNKNOWN_DISTANCE); config validation
/// enforces this.
#[derive(Debug)]
pub struct Frontier {
    radius: u32,
    queue: VecDeque<NodeId>,
    offered: HashSet<NodeId>,
}

impl Frontier {
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            queue: VecDeque::new(),
            offered: HashSet::new(),
        }
    }

    /// Queue every eligible node already in the store, in store order.
    pub fn seed_from(&mut self, store: &NodeStore) {
        for (id, _) in store.iter() {
            self.offer(store, id);
        }
    }

    /// Queue `id` if it is eligible and has not been queued before.
    pub fn offer(&mut self, store: &NodeStore, id: NodeId) -> bool {
        if self.offered.contains(&id) || !self.is_eligible(store, id) {
            return false;
        }
        self.offered.insert(id);
        self.queue.push_back(id);
        true
    }

    /// Next node to crawl, or `None` once no eligible node remains.
    pub fn next_to_crawl(&mut self, store: &NodeStore) -> Option<NodeId> {
        while let Some(id) = self.queue.pop_front() {
            if self.is_eligible(store, id) {
                return Some(id);
            }
        }
        None
    }

    /// Number of queued ids (some may have become ineligible).
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_eligible(&self, store: &NodeStore, id: NodeId) -> bool {
        store
            .get(id)
            .map(|node| node.distance() <= self.radius && !node.is_crawled())
            .unwrap_or(false)
    }
}
