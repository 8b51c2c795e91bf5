use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{FriendEntry, FriendSource};
use crate::config::SessionConfig;
use crate::error::{CrawlError, Result};
use crate::graph::NodeId;

/// Path of the friend-list endpoint, relative to the service base URL.
const FRIENDS_PATH: &str = "/ajax/typeahead/profile_browser/friends/bootstrap.php";

/// Anti-JSON-hijacking prefix the service puts in front of every body.
const JSON_GUARD_PREFIX: &str = "for (;;);";

/// Account the crawler logs in as.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub email: String,
    pub password: String,
    pub user_id: NodeId,
}

#[derive(Deserialize)]
struct FriendsEnvelope {
    payload: Option<FriendsPayload>,
    error: Option<Value>,
    #[serde(rename = "errorSummary")]
    error_summary: Option<String>,
}

#[derive(Deserialize)]
struct FriendsPayload {
    entries: Vec<FriendEntry>,
}

/// Friend-list client backed by a cookie session.
///
/// Logs in lazily before the first request that needs it.
pub struct HttpFriendSource {
    client: Client,
    base_url: String,
    login_url: String,
    credentials: SessionCredentials,
    logged_in: bool,
}

impl HttpFriendSource {
    /// Create a client for the configured service.
    pub fn new(session: &SessionConfig, credentials: SessionCredentials) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(session.timeout_secs))
            .build()
            .map_err(|e| CrawlError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: session.base_url.trim_end_matches('/').to_string(),
            login_url: session.login_url.clone(),
            credentials,
            logged_in: false,
        })
    }

    /// Full URL of the friend-list endpoint.
    pub fn friends_url(&self) -> String {
        format!("{}{}", self.base_url, FRIENDS_PATH)
    }

    async fn login(&mut self) -> Result<()> {
        log::info!("Logging in...");

        let response = self
            .client
            .post(&self.login_url)
            .form(&[
                ("email", self.credentials.email.as_str()),
                ("pass", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CrawlError::Network(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Auth(format!("Login rejected with HTTP {}", status)));
        }

        self.logged_in = true;
        Ok(())
    }

    async fn ensure_logged_in(&mut self) -> Result<()> {
        if !self.logged_in {
            self.login().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FriendSource for HttpFriendSource {
    async fn fetch_friends(&mut self, id: NodeId) -> Result<Vec<FriendEntry>> {
        self.ensure_logged_in().await?;

        log::info!("Requesting userid {}", id);

        let viewer = self.credentials.user_id.to_string();
        let profile = id.to_string();
        let response = self
            .client
            .get(self.friends_url())
            .query(&[
                ("__a", "1"),
                ("viewer", viewer.as_str()),
                ("profile_id", profile.as_str()),
                ("__user", viewer.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CrawlError::Network(format!("Friend list request for {} failed: {}", id, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.logged_in = false;
            return Err(CrawlError::Auth(format!(
                "Session rejected fetching friends of {} (HTTP {})",
                id, status
            )));
        }
        if !status.is_success() {
            return Err(CrawlError::Network(format!(
                "Friend list request for {} returned HTTP {}",
                id, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::Network(format!("Failed to read response body: {}", e)))?;

        parse_friend_payload(&body)
    }
}

/// Parse a friend-list response body into entries.
///
/// Strips the `for (;;);` guard and reads `payload.entries`. A body carrying
/// an `error` instead of a payload means the session was not accepted.
pub fn parse_friend_payload(body: &str) -> Result<Vec<FriendEntry>> {
    let trimmed = body.trim_start();
    let json = trimmed.strip_prefix(JSON_GUARD_PREFIX).unwrap_or(trimmed);

    let envelope: FriendsEnvelope = serde_json::from_str(json)
        .map_err(|e| CrawlError::MalformedResponse(format!("Failed to parse friend list: {}", e)))?;

    match envelope.payload {
        Some(payload) => Ok(payload.entries),
        None if envelope.error.is_some() => Err(CrawlError::Auth(
            envelope
                .error_summary
                .unwrap_or_else(|| "Service returned an error instead of a friend list".to_string()),
        )),
        None => Err(CrawlError::MalformedResponse(
            "Response has no payload.entries".to_string(),
        )),
    }
}
