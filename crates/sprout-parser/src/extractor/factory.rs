use std::sync::LazyLock;

use super::error::ExtractorError;
use super::platform_extractor::{Extractor, PlatformExtractor};
use crate::extractor::platforms::{
    self,
    sproutvideo::{SproutVideo, SproutVideoHost},
};
use regex::Regex;
use reqwest::Client;
use tracing::debug;

// A type alias for a thread-safe constructor function.
type ExtractorConstructor = fn(String, Client, &SproutVideoHost) -> Box<dyn PlatformExtractor>;

struct PlatformEntry {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
    constructor: ExtractorConstructor,
}

fn new_sproutvideo(url: String, client: Client, host: &SproutVideoHost) -> Box<dyn PlatformExtractor> {
    Box::new(SproutVideo::with_host(url, client, host.clone()))
}

// Static platform registry
static PLATFORMS: &[PlatformEntry] = &[PlatformEntry {
    name: "SproutVideo",
    regex: &platforms::sproutvideo::URL_REGEX,
    constructor: new_sproutvideo,
}];

/// A factory for creating platform-specific extractors.
pub struct ExtractorFactory {
    client: Client,
    host: SproutVideoHost,
}

impl ExtractorFactory {
    pub fn new(client: Client) -> Self {
        Self::with_host(client, SproutVideoHost::default())
    }

    pub fn with_host(client: Client, host: SproutVideoHost) -> Self {
        Self { client, host }
    }

    /// Names and URL patterns of the supported platforms.
    pub fn supported_platforms() -> impl Iterator<Item = (&'static str, &'static str)> {
        PLATFORMS
            .iter()
            .map(|platform| (platform.name, platform.regex.as_str()))
    }

    pub fn create_extractor(&self, url: &str) -> Result<Box<dyn PlatformExtractor>, ExtractorError> {
        for platform in PLATFORMS {
            if platform.regex.is_match(url) {
                debug!("Matched {} for {}", platform.name, url);
                return Ok((platform.constructor)(
                    url.to_string(),
                    self.client.clone(),
                    &self.host,
                ));
            }
        }
        Err(ExtractorError::UnsupportedExtractor)
    }

    /// Fetches an arbitrary webpage and returns the embed URLs found in it,
    /// normalized to carry a scheme.
    pub async fn discover(&self, page_url: &str) -> Result<Vec<String>, ExtractorError> {
        let extractor = Extractor::new("Webpage", page_url, self.client.clone());
        let webpage = extractor.fetch_text(page_url).await?;

        let urls: Vec<String> = platforms::sproutvideo::extract_embedded_urls(&webpage)
            .map(platforms::sproutvideo::normalize_embed_url)
            .collect();
        debug!("Found {} embeds on {}", urls.len(), page_url);

        if urls.is_empty() {
            return Err(ExtractorError::NoEmbedsFound);
        }
        Ok(urls)
    }
}
