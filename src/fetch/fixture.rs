//! Offline friend source backed by a JSON fixture.
//!
//! The fixture is an object mapping user ids to friend-list entries, e.g.
//! `{"2": [{"uid": 3, "text": "Cy"}]}`. Ids absent from the fixture have no
//! friends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use super::{FriendEntry, FriendSource};
use crate::error::{CrawlError, Result};
use crate::graph::NodeId;

#[derive(Debug, Default)]
pub struct FixtureFriendSource {
    lists: HashMap<NodeId, Vec<FriendEntry>>,
    requests: Vec<NodeId>,
}

impl FixtureFriendSource {
    pub fn new(lists: HashMap<NodeId, Vec<FriendEntry>>) -> Self {
        Self {
            lists,
            requests: Vec::new(),
        }
    }

    /// Load a fixture file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<FriendEntry>> = serde_json::from_str(content)
            .map_err(|e| CrawlError::InvalidInput(format!("Invalid friend fixture: {}", e)))?;

        let mut lists = HashMap::with_capacity(raw.len());
        for (key, entries) in raw {
            lists.insert(key.parse::<NodeId>()?, entries);
        }
        Ok(Self::new(lists))
    }

    /// Ids requested so far, in request order.
    pub fn requests(&self) -> &[NodeId] {
        &self.requests
    }
}

#[async_trait]
impl FriendSource for FixtureFriendSource {
    async fn fetch_friends(&mut self, id: NodeId) -> Result<Vec<FriendEntry>> {
        self.requests.push(id);
        Ok(self.lists.get(&id).cloned().unwrap_or_default())
    }
}
