//! Resolves SproutVideo embed pages into signed HLS playback descriptors.
//!
//! The entry point is [`extractor::factory::ExtractorFactory`], which dispatches an
//! embed URL to the [`extractor::platforms::sproutvideo::SproutVideo`] extractor.
//! Embed discovery on arbitrary third-party pages is available through
//! [`extractor::platforms::sproutvideo::extract_embedded_urls`].

pub mod extractor;
pub mod media;
