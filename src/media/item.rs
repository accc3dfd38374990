//! Post and media representation.

use std::fmt;

use chrono::{DateTime, Utc};

/// Kind of a raw attachment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedImage,
    /// Any kind the extractor does not handle, carrying the source's tag.
    Unrecognized(String),
}

impl MediaKind {
    /// Map the service's `type` tag onto a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "photo" => MediaKind::Photo,
            "video" => MediaKind::Video,
            "animated_gif" => MediaKind::AnimatedImage,
            other => MediaKind::Unrecognized(other.to_string()),
        }
    }

    /// File extension used for this kind, if it is downloadable.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            MediaKind::Photo => Some("jpg"),
            MediaKind::Video | MediaKind::AnimatedImage => Some("mp4"),
            MediaKind::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::AnimatedImage => write!(f, "animated_gif"),
            MediaKind::Unrecognized(tag) => write!(f, "{}", tag),
        }
    }
}

/// One encoded rendition of a video or animated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoVariant {
    pub url: String,
    pub content_type: Option<String>,
    pub bitrate: Option<u64>,
}

/// Raw attachment record as delivered with a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntity {
    /// Stable media identifier.
    pub id: String,

    pub kind: MediaKind,

    /// Base media URL (photos).
    pub media_url: String,

    /// Encoded variants in source order (videos and animated images).
    pub variants: Vec<VideoVariant>,
}

/// A single post from the stream.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub media: Vec<MediaEntity>,

    /// Original payload the post was parsed from, when the producer keeps it.
    pub raw: Option<serde_json::Value>,
}

impl Post {
    /// Creation time as fractional seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.created_at.timestamp() as f64
            + f64::from(self.created_at.timestamp_subsec_nanos()) / 1e9
    }
}

/// A normalized unit of download work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub filename: String,
    pub url: String,
    pub kind: MediaKind,
}
