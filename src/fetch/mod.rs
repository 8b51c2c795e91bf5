//! Friend-list sources: the live session client, an offline fixture source,
//! and a cache-first wrapper around either.

pub mod cached;
pub mod fixture;
pub mod http;

pub use cached::{CachedFriendSource, FetchStats};
pub use fixture::FixtureFriendSource;
pub use http::{parse_friend_payload, HttpFriendSource, SessionCredentials};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::graph::{NodeId, DISPLAY_NAME_KEY};

/// One entry of a friend list as returned by the friend-list service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEntry {
    #[serde(deserialize_with = "deserialize_uid")]
    pub uid: NodeId,
    /// Display name, absent from some payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Remaining attributes, kept verbatim.
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl FriendEntry {
    pub fn new(uid: NodeId, text: impl Into<String>) -> Self {
        Self {
            uid,
            text: Some(text.into()),
            attrs: Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Profile attributes to merge into the friend's node. Only keys the
    /// entry carried are returned, so a missing name never blanks a known
    /// one. Strings are kept as-is, null becomes empty, other values are
    /// rendered as JSON text.
    pub fn profile_attrs(&self) -> Vec<(String, String)> {
        let mut attrs = Vec::with_capacity(self.attrs.len() + 1);
        if let Some(text) = &self.text {
            attrs.push((DISPLAY_NAME_KEY.to_string(), text.clone()));
        }
        for (key, value) in &self.attrs {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            attrs.push((key.clone(), value));
        }
        attrs
    }
}

/// The service sends ids as numbers, older payloads as numeric strings.
fn deserialize_uid<'de, D>(deserializer: D) -> std::result::Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUid {
        Number(u64),
        Text(String),
    }

    match RawUid::deserialize(deserializer)? {
        RawUid::Number(n) => Ok(NodeId(n)),
        RawUid::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Anything that can produce a node's friend list.
#[async_trait]
pub trait FriendSource: Send {
    /// Fetch the friends of `id`. Failures are fatal to the crawl.
    async fn fetch_friends(&mut self, id: NodeId) -> Result<Vec<FriendEntry>>;
}
