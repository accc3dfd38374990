//! Media module for post representation and extraction.

pub mod item;
pub mod parser;

pub use item::{MediaDescriptor, MediaEntity, MediaKind, Post, VideoVariant};
pub use parser::{extract_media, photo_url};
