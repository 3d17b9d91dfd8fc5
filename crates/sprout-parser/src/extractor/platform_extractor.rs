use crate::extractor::default::{DEFAULT_ACCEPT, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_UA};
use crate::media::PlaybackDescriptor;

use super::error::ExtractorError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;

/// Shared request state for a single extraction.
///
/// Holds the URL being extracted, the client used for every request, and the
/// header set sent along with page requests. The default header set mimics a
/// desktop browser so that pages are served the same way they are to users.
#[derive(Debug, Clone)]
pub struct Extractor {
    // url to extract from, e.g., "https://videos.sproutvideo.com/embed/<id>/<token>"
    pub url: String,
    // name of the platform, e.g., "SproutVideo"
    pub platform_name: String,
    // The reqwest client
    pub client: Client,
    platform_headers: HeaderMap,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        platform_url: S2,
        client: Client,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(DEFAULT_ACCEPT),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        Self {
            platform_name: platform_name.into(),
            url: platform_url.into(),
            client,
            platform_headers: default_headers,
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Create an HTTP request carrying the platform headers.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.platform_headers.clone())
    }

    /// GET `url` and return the body as text, failing on non-success statuses.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ExtractorError> {
        let body = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }
}

/// Converts a header map into plain strings, dropping values that are not visible ASCII.
pub fn header_map_to_strings(headers: &HeaderMap) -> FxHashMap<String, String> {
    headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (canonical_header_name(key.as_str()), v.to_string()))
        })
        .collect()
}

// "referer" -> "Referer", "accept-language" -> "Accept-Language"
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    async fn extract(&self) -> Result<PlaybackDescriptor, ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_look_like_a_browser() {
        let extractor = Extractor::new("Test", "https://example.com", Client::new());
        let headers = header_map_to_strings(extractor.get_platform_headers());

        assert_eq!(headers.get("User-Agent").map(String::as_str), Some(DEFAULT_UA));
        assert!(headers.contains_key("Accept"));
        assert!(headers.contains_key("Accept-Language"));
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("referer"), "Referer");
        assert_eq!(canonical_header_name("accept-language"), "Accept-Language");
        assert_eq!(canonical_header_name("x-"), "X-");
    }
}
