use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CrawlError;

/// Distance of a node no discovered path reaches yet.
pub const UNKNOWN_DISTANCE: u32 = 100;

/// Profile attribute holding the display name.
pub const DISPLAY_NAME_KEY: &str = "text";

/// Stable account identifier, as handed out by the friend-list service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| CrawlError::InvalidInput(format!("not a numeric user id: {:?}", s)))
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// One discovered account.
///
/// Fields are private so every mutation goes through [`crate::graph::NodeStore`],
/// which clears `cache_fresh` whenever the node is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) friends: Vec<NodeId>,
    pub(crate) distance: u32,
    pub(crate) crawled: bool,
    pub(crate) profile: HashMap<String, String>,
    pub(crate) cache_fresh: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            friends: Vec::new(),
            distance: UNKNOWN_DISTANCE,
            crawled: false,
            profile: HashMap::new(),
            cache_fresh: false,
        }
    }
}

impl Node {
    /// Friend ids in the order they were recorded (duplicates possible).
    pub fn friends(&self) -> &[NodeId] {
        &self.friends
    }

    /// Shortest known hop count to the target.
    pub fn distance(&self) -> u32 {
        self.distance
    }

    pub fn is_crawled(&self) -> bool {
        self.crawled
    }

    /// True only while the node is exactly as it was loaded from the cache.
    pub fn is_cache_fresh(&self) -> bool {
        self.cache_fresh
    }

    /// Profile attribute, empty when absent.
    pub fn attr(&self, key: &str) -> &str {
        self.profile.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.attr(DISPLAY_NAME_KEY)
    }

    pub fn profile(&self) -> &HashMap<String, String> {
        &self.profile
    }

    /// Persistable form of this node (freshness is never persisted).
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            friends: self.friends.clone(),
            distance: self.distance,
            crawled: self.crawled,
            profile: self.profile.clone(),
        }
    }
}

/// Serialized node as stored under `user_<id>` in the persisted cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default)]
    pub friends: Vec<NodeId>,
    #[serde(default = "unknown_distance")]
    pub distance: u32,
    #[serde(default)]
    pub crawled: bool,
    #[serde(default)]
    pub profile: HashMap<String, String>,
}

fn unknown_distance() -> u32 {
    UNKNOWN_DISTANCE
}

impl From<NodeSnapshot> for Node {
    fn from(snapshot: NodeSnapshot) -> Self {
        Self {
            friends: snapshot.friends,
            distance: snapshot.distance,
            crawled: snapshot.crawled,
            profile: snapshot.profile,
            cache_fresh: false,
        }
    }
}
