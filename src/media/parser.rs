//! Media extraction: post -> ordered download descriptors.

use url::Url;

use crate::config::VariantSelection;
use crate::media::item::{MediaDescriptor, MediaEntity, MediaKind, Post, VideoVariant};

/// Photo quality/format selector appended to the base media URL.
const PHOTO_QUERY: [(&str, &str); 2] = [("format", "jpg"), ("name", "large")];

/// Extract the media descriptors of a post.
///
/// Photos come first, then videos and animated images, each group in
/// source order. Unrecognized kinds are logged and produce nothing.
pub fn extract_media(post: &Post, selection: VariantSelection) -> Vec<MediaDescriptor> {
    let mut photos = Vec::new();
    let mut videos = Vec::new();

    for entity in &post.media {
        match &entity.kind {
            MediaKind::Photo => photos.extend(photo_descriptor(entity)),
            MediaKind::Video | MediaKind::AnimatedImage => {
                videos.extend(video_descriptor(entity, selection))
            }
            MediaKind::Unrecognized(tag) => {
                tracing::warn!(
                    "Unhandled media type '{}' (media {} in post {})",
                    tag,
                    entity.id,
                    post.id
                );
            }
        }
    }

    photos.extend(videos);
    photos
}

/// Build the canonical large-JPEG URL for a photo.
pub fn photo_url(base: &str) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    url.query_pairs_mut().extend_pairs(PHOTO_QUERY);
    Some(url.into())
}

fn photo_descriptor(entity: &MediaEntity) -> Option<MediaDescriptor> {
    let Some(url) = photo_url(&entity.media_url) else {
        tracing::warn!(
            "Skipping photo {}: invalid media URL '{}'",
            entity.id,
            entity.media_url
        );
        return None;
    };

    Some(MediaDescriptor {
        filename: descriptor_filename(entity)?,
        url,
        kind: entity.kind.clone(),
    })
}

fn video_descriptor(entity: &MediaEntity, selection: VariantSelection) -> Option<MediaDescriptor> {
    let Some(variant) = select_variant(&entity.variants, selection) else {
        tracing::warn!("Skipping {} {}: no variants listed", entity.kind, entity.id);
        return None;
    };

    Some(MediaDescriptor {
        filename: descriptor_filename(entity)?,
        url: variant.url.clone(),
        kind: entity.kind.clone(),
    })
}

/// `<media id>.<extension of its kind>`.
fn descriptor_filename(entity: &MediaEntity) -> Option<String> {
    entity
        .kind
        .extension()
        .map(|ext| format!("{}.{}", entity.id, ext))
}

/// Pick one variant deterministically.
///
/// `HighestBitrate` breaks ties by source order and falls back to the
/// first variant when none declares a bitrate.
fn select_variant(variants: &[VideoVariant], selection: VariantSelection) -> Option<&VideoVariant> {
    match selection {
        VariantSelection::First => variants.first(),
        VariantSelection::HighestBitrate => {
            let mut best: Option<&VideoVariant> = None;
            for variant in variants.iter().filter(|v| v.bitrate.is_some()) {
                if best.map_or(true, |b| variant.bitrate > b.bitrate) {
                    best = Some(variant);
                }
            }
            best.or_else(|| variants.first())
        }
    }
}
