//! API response type definitions and conversion into posts.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::media::{MediaEntity, MediaKind, Post, VideoVariant};

/// Timestamp format of `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A tweet as returned by the timeline and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTweet {
    pub id_str: String,
    pub created_at: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(default)]
    pub extended_entities: Option<Entities>,
}

/// Entity container; only media is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub media: Vec<RawMedia>,
}

/// Media attachment record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMedia {
    pub id_str: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

/// Video encodings of a video or animated GIF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<RawVariant>,
}

/// One encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    pub url: String,
}

/// Search endpoint response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}

/// Error body returned alongside non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ApiErrorBody {
    /// Human-readable summary of the error body, falling back to the raw text.
    pub fn describe(text: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(text) {
            Ok(body) if !body.errors.is_empty() => body
                .errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.message, code),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            _ => text.chars().take(200).collect(),
        }
    }
}

/// Parse one tweet payload into a post, keeping the payload as `raw`.
pub fn parse_post(value: serde_json::Value) -> Result<Post> {
    let tweet: RawTweet = serde_json::from_value(value.clone())?;
    let created_at = parse_created_at(&tweet.created_at)?;

    // Extended entities carry every attachment; plain entities only the first.
    let media = tweet
        .extended_entities
        .filter(|e| !e.media.is_empty())
        .or(tweet.entities)
        .map(|e| e.media)
        .unwrap_or_default()
        .into_iter()
        .map(media_entity)
        .collect();

    Ok(Post {
        id: tweet.id_str,
        created_at,
        text: tweet.full_text.or(tweet.text).unwrap_or_default(),
        media,
        raw: Some(value),
    })
}

/// Parse a `created_at` value.
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Api(format!("Invalid created_at '{}': {}", value, e)))
}

fn media_entity(raw: RawMedia) -> MediaEntity {
    MediaEntity {
        id: raw.id_str,
        kind: MediaKind::from_tag(&raw.kind),
        media_url: raw.media_url_https.or(raw.media_url).unwrap_or_default(),
        variants: raw
            .video_info
            .map(|info| info.variants)
            .unwrap_or_default()
            .into_iter()
            .map(|v| VideoVariant {
                url: v.url,
                content_type: v.content_type,
                bitrate: v.bitrate,
            })
            .collect(),
    }
}
