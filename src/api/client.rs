//! Timeline/search HTTP client.

use reqwest::{header, Client, Response, StatusCode};

use crate::api::types::{parse_post, ApiErrorBody, SearchResponse};
use crate::config::HarvestTarget;
use crate::error::{Error, Result};
use crate::media::Post;

/// API base URL.
pub const API_BASE: &str = "https://api.twitter.com/1.1";

/// Fallback wait when a 429 carries no reset header.
const DEFAULT_RATE_LIMIT_WAIT: u64 = 60;

/// API client authenticated with an app-only bearer token.
pub struct TwitterApi {
    client: Client,
    base_url: String,
    token: String,
}

impl TwitterApi {
    /// Create a client for the public API.
    pub fn new(token: String, user_agent: &str) -> Result<Self> {
        Self::with_base_url(API_BASE, token, user_agent)
    }

    /// Create a client against another base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: String,
        user_agent: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Make an authenticated GET request.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(rate_limit_wait(&response)));
        }

        // Check for auth errors
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Auth error response: {}", body);
            return Err(Error::Authentication(format!(
                "HTTP {}: {}",
                status,
                if body.is_empty() {
                    "Authentication failed".to_string()
                } else {
                    ApiErrorBody::describe(&body)
                }
            )));
        }

        Ok(response)
    }

    /// Get one page of a user's timeline, newest first.
    pub async fn get_user_timeline(
        &self,
        screen_name: &str,
        count: u32,
        max_id: Option<u64>,
        include_retweets: bool,
    ) -> Result<Vec<Post>> {
        let mut query = vec![
            ("screen_name", screen_name.to_string()),
            ("count", count.to_string()),
            ("tweet_mode", "extended".to_string()),
            ("include_rts", include_retweets.to_string()),
        ];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string()));
        }

        let response = self.get("/statuses/user_timeline.json", &query).await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::AccountNotFound(screen_name.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Api(format!(
                "Failed to get timeline: HTTP {} - {}",
                status,
                ApiErrorBody::describe(&text)
            )));
        }

        let statuses: Vec<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse timeline: {} - Response: {}",
                e,
                excerpt(&text)
            ))
        })?;

        statuses.into_iter().map(parse_post).collect()
    }

    /// Get one page of search results, newest first.
    pub async fn search(&self, query: &str, count: u32, max_id: Option<u64>) -> Result<Vec<Post>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("count", count.min(100).to_string()),
            ("result_type", "recent".to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if let Some(max_id) = max_id {
            params.push(("max_id", max_id.to_string()));
        }

        let response = self.get("/search/tweets.json", &params).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api(format!(
                "Failed to search: HTTP {} - {}",
                status,
                ApiErrorBody::describe(&text)
            )));
        }

        let search: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse search results: {} - Response: {}",
                e,
                excerpt(&text)
            ))
        })?;

        search.statuses.into_iter().map(parse_post).collect()
    }

    /// Get one page for a harvest target.
    pub async fn get_page(
        &self,
        target: &HarvestTarget,
        count: u32,
        max_id: Option<u64>,
        include_retweets: bool,
    ) -> Result<Vec<Post>> {
        match target {
            HarvestTarget::User(name) => {
                self.get_user_timeline(name, count, max_id, include_retweets)
                    .await
            }
            HarvestTarget::Search(query) => self.search(query, count, max_id).await,
        }
    }
}

/// First 500 characters of a response body.
fn excerpt(text: &str) -> String {
    text.chars().take(500).collect()
}

/// Seconds until the rate limit window resets.
fn rate_limit_wait(response: &Response) -> u64 {
    response
        .headers()
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map(|reset| (reset - chrono::Utc::now().timestamp()).max(1) as u64)
        .or_else(|| {
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
}
