//! Keyed node store with explicit lazy creation.

use std::collections::HashMap;

use super::node::{Node, NodeId, NodeSnapshot, UNKNOWN_DISTANCE};

/// Every discovered account, keyed by id.
///
/// Iteration follows first-reference order, never the hash map's order, so
/// exports and cache writes are reproducible between runs.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node for `id`, creating a default one if it was never seen.
    pub fn get_or_create(&mut self, id: NodeId) -> &Node {
        self.entry(id)
    }

    /// Look up a node without creating it.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Distance of `id`, [`UNKNOWN_DISTANCE`] for ids never referenced.
    pub fn distance(&self, id: NodeId) -> u32 {
        self.nodes
            .get(&id)
            .map(Node::distance)
            .unwrap_or(UNKNOWN_DISTANCE)
    }

    /// Lower the node's distance to `candidate` if that is shorter.
    ///
    /// Returns true when the distance changed; the change clears `cache_fresh`.
    pub fn set_distance(&mut self, id: NodeId, candidate: u32) -> bool {
        let node = self.entry(id);
        if candidate < node.distance {
            node.distance = candidate;
            node.cache_fresh = false;
            true
        } else {
            false
        }
    }

    /// Overwrite profile attributes. Always clears `cache_fresh`, even when
    /// every value is unchanged.
    pub fn merge_profile<I, K, V>(&mut self, id: NodeId, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let node = self.entry(id);
        for (key, value) in attrs {
            node.profile.insert(key.into(), value.into());
        }
        node.cache_fresh = false;
    }

    /// Append `to` to `from`'s friend list. One direction only, no dedup.
    /// Clears `from`'s `cache_fresh`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let node = self.entry(from);
        node.friends.push(to);
        node.cache_fresh = false;
        self.entry(to);
    }

    /// Record that the node's own friend list has been merged. Clears
    /// `cache_fresh` unless the node was already crawled.
    pub fn mark_crawled(&mut self, id: NodeId) {
        let node = self.entry(id);
        if !node.crawled {
            node.crawled = true;
            node.cache_fresh = false;
        }
    }

    /// Install a node loaded from the persisted cache as the fresh baseline,
    /// replacing whatever was known about `id`.
    pub fn install_cached(&mut self, id: NodeId, snapshot: NodeSnapshot) {
        let mut node = Node::from(snapshot);
        node.cache_fresh = true;
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
    }

    /// Nodes in first-reference order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.order.iter().filter_map(move |id| self.nodes.get(id).map(|n| (*id, n)))
    }

    /// All ids in first-reference order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn entry(&mut self, id: NodeId) -> &mut Node {
        if !self.nodes.contains_key(&id) {
            log::trace!("Creating node {}", id);
            self.order.push(id);
        }
        self.nodes.entry(id).or_default()
    }
}
