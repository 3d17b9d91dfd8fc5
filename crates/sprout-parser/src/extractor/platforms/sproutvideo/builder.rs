use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::{
    extractor::{
        error::ExtractorError,
        hls_extractor::HlsExtractor,
        platform_extractor::{Extractor, PlatformExtractor, header_map_to_strings},
        platforms::sproutvideo::{models::PolicyPayload, signing::SigningQueries},
    },
    media::{FormatDescriptor, MediaFormat, PlaybackDescriptor, Protocol},
};

const PLATFORM_NAME: &str = "SproutVideo";

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?:)?//videos\.sproutvideo\.com/embed/(?P<id>[a-f0-9]+)/(?P<token>[a-f0-9]+)(?:[?#]|$)",
    )
    .unwrap()
});

static EMBED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<iframe[^>]+src=['"](?P<url>(?:https?:|)//videos\.sproutvideo\.com/embed/(?P<id>[a-f0-9]+)/[a-f0-9]+[^'"]+)['"]"#,
    )
    .unwrap()
});

static DATA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\s+dat\s+=\s+'([^']+)';").unwrap());

/// Returns true if `url` is a SproutVideo embed URL, with or without a scheme.
pub fn matches_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

/// Lists the SproutVideo embed URLs of every matching `<iframe>` in `html`.
///
/// URLs come back exactly as written in the page, schema-relative ones included,
/// in document order and with duplicates kept. The iterator borrows `html`;
/// call again to start over.
pub fn extract_embedded_urls(html: &str) -> impl Iterator<Item = &str> {
    EMBED_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.name("url"))
        .map(|m| m.as_str())
}

/// Gives schema-relative embed URLs an `https:` scheme.
pub fn normalize_embed_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// The two hex path segments of an embed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReference {
    pub video_id: String,
    // only checked for shape, never sent anywhere else
    pub token: String,
}

impl EmbedReference {
    pub fn parse(url: &str) -> Result<Self, ExtractorError> {
        let caps = URL_REGEX.captures(url).ok_or_else(|| {
            ExtractorError::InvalidUrl(format!("not a SproutVideo embed url: {url}"))
        })?;
        match (caps.name("id"), caps.name("token")) {
            (Some(id), Some(token)) => Ok(Self {
                video_id: id.as_str().to_string(),
                token: token.as_str().to_string(),
            }),
            _ => Err(ExtractorError::InvalidUrl(url.to_string())),
        }
    }
}

/// Finds the base64 policy payload assigned to `dat` in the embed page.
pub fn search_policy_data(webpage: &str) -> Result<&str, ExtractorError> {
    DATA_REGEX
        .captures(webpage)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(ExtractorError::MissingField("data"))
}

/// Where SproutVideo is reached.
///
/// The manifest lives on `{scheme}://{base}.{domain}` and every manifest,
/// segment and key request carries `Origin: {scheme}://{domain}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SproutVideoHost {
    pub scheme: String,
    pub domain: String,
}

impl Default for SproutVideoHost {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            domain: "videos.sproutvideo.com".to_string(),
        }
    }
}

impl SproutVideoHost {
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.domain)
    }

    /// Path components are used as-is, they are hex ids in practice.
    pub fn manifest_url(&self, payload: &PolicyPayload, manifest_query: &str) -> String {
        format!(
            "{}://{}.{}/{}/{}/video/index.m3u8?{}",
            self.scheme,
            payload.base,
            self.domain,
            payload.s3_user_hash,
            payload.s3_video_hash,
            manifest_query
        )
    }

    /// Headers for manifest, segment and key requests.
    pub fn manifest_headers(&self, referer: &str) -> Result<HeaderMap, ExtractorError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&self.origin())
                .map_err(|e| ExtractorError::InvalidUrl(e.to_string()))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer).map_err(|e| ExtractorError::InvalidUrl(e.to_string()))?,
        );
        Ok(headers)
    }
}

pub struct SproutVideo {
    pub extractor: Extractor,
    host: SproutVideoHost,
}

impl SproutVideo {
    pub fn new(url: String, client: Client) -> Self {
        Self::with_host(url, client, SproutVideoHost::default())
    }

    pub fn with_host(url: String, client: Client, host: SproutVideoHost) -> Self {
        let extractor = Extractor::new(PLATFORM_NAME, normalize_embed_url(&url), client);
        Self { extractor, host }
    }

    async fn fetch_payload(&self) -> Result<PolicyPayload, ExtractorError> {
        let webpage = self.extractor.fetch_text(&self.extractor.url).await?;
        let data = search_policy_data(&webpage)?;
        let payload = PolicyPayload::decode(data)?;
        debug!(
            "Decoded policy payload: base={}, title={}",
            payload.base, payload.title
        );
        Ok(payload)
    }

    /// Lists the manifest formats, or nothing if the manifest cannot be read.
    async fn fetch_formats(&self, manifest_url: &str, headers: HeaderMap) -> Vec<FormatDescriptor> {
        match self
            .extract_m3u8_formats(
                &self.extractor.client,
                headers,
                manifest_url,
                MediaFormat::Mp4,
                Protocol::M3u8Native,
                "hls",
            )
            .await
        {
            Ok(formats) => formats,
            Err(e) => {
                warn!("Failed to extract formats from {}: {}", manifest_url, e);
                vec![]
            }
        }
    }

    /// Resolves the embed page into a signed playback descriptor.
    ///
    /// Every failure up to and including the payload decode is returned as an
    /// error. A manifest that cannot be fetched or parsed only leaves `formats`
    /// empty.
    pub async fn resolve(&self) -> Result<PlaybackDescriptor, ExtractorError> {
        let url = &self.extractor.url;
        let reference = EmbedReference::parse(url)?;
        debug!("Resolving SproutVideo embed {}", reference.video_id);

        let payload = self.fetch_payload().await?;
        let queries = SigningQueries::from_payload(&payload);

        let headers = self.host.manifest_headers(url)?;
        let manifest_url = self.host.manifest_url(&payload, &queries.manifest);
        debug!("Manifest URL: {}", manifest_url);

        let header_strings = header_map_to_strings(&headers);
        let mut formats = self.fetch_formats(&manifest_url, headers).await;
        for format in &mut formats {
            format.attach_signing(
                &queries.manifest,
                &queries.segment,
                &queries.key,
                header_strings.clone(),
            );
        }

        Ok(PlaybackDescriptor::new(
            reference.video_id,
            payload.title,
            formats,
        ))
    }
}

impl HlsExtractor for SproutVideo {}

#[async_trait]
impl PlatformExtractor for SproutVideo {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self) -> Result<PlaybackDescriptor, ExtractorError> {
        self.resolve().await
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;
    use crate::extractor::default::default_client;

    #[test]
    fn test_matches_url() {
        assert!(matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        assert!(matches_url(
            "http://videos.sproutvideo.com/embed/a79fdcb21f1be2c62e/93bf31e41e39ca27"
        ));
        assert!(matches_url(
            "//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        // query and fragment
        assert!(matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd"
        ));
        assert!(matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3#t=10"
        ));
    }

    #[test]
    fn test_rejects_other_urls() {
        // host
        assert!(!matches_url(
            "https://videos.example.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        assert!(!matches_url(
            "https://videosXsproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        // path depth
        assert!(!matches_url("https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4"));
        assert!(!matches_url(
            "https://videos.sproutvideo.com/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        // id charset
        assert!(!matches_url(
            "https://videos.sproutvideo.com/embed/XYZdddb01910e3c9c4/0fc24387c4f24ee3"
        ));
        assert!(!matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/ZZZ24387c4f24ee3"
        ));
        // deeper path
        assert!(!matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3/extra"
        ));
        // non-hex tail after the token
        assert!(!matches_url(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387ZZZZ"
        ));
        // scheme
        assert!(!matches_url(
            "ftp://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3"
        ));
    }

    #[test]
    fn test_parse_embed_reference() {
        let reference = EmbedReference::parse(
            "//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd",
        )
        .unwrap();
        assert_eq!(reference.video_id, "4c9dddb01910e3c9c4");
        assert_eq!(reference.token, "0fc24387c4f24ee3");

        let err = EmbedReference::parse("https://example.com/embed/abc/def").unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidUrl(_)));
    }

    #[test]
    fn test_extract_embedded_urls_none() {
        let html = r#"<html><body><iframe src="https://www.youtube.com/embed/xyz"></iframe></body></html>"#;
        assert_eq!(extract_embedded_urls(html).count(), 0);
        assert_eq!(extract_embedded_urls("").count(), 0);
    }

    #[test]
    fn test_extract_embedded_urls_order_and_duplicates() {
        let html = r#"
            <p>intro</p>
            <iframe class='sproutvideo-player' src='//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd' width='630'></iframe>
            <iframe src="https://player.vimeo.com/video/1"></iframe>
            <iframe width="630" src="https://videos.sproutvideo.com/embed/a79fdcb21f1be2c62e/93bf31e41e39ca27"></iframe>
            <iframe src='//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd'></iframe>
        "#;

        let urls: Vec<&str> = extract_embedded_urls(html).collect();
        assert_eq!(
            urls,
            vec![
                "//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd",
                "https://videos.sproutvideo.com/embed/a79fdcb21f1be2c62e/93bf31e41e39ca27",
                "//videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3?type=hd",
            ]
        );

        // restartable
        assert_eq!(extract_embedded_urls(html).count(), 3);
    }

    #[test]
    fn test_normalize_embed_url() {
        assert_eq!(
            normalize_embed_url("//videos.sproutvideo.com/embed/ab/cd"),
            "https://videos.sproutvideo.com/embed/ab/cd"
        );
        assert_eq!(
            normalize_embed_url("http://videos.sproutvideo.com/embed/ab/cd"),
            "http://videos.sproutvideo.com/embed/ab/cd"
        );
    }

    #[test]
    fn test_search_policy_data() {
        let page = "<script>\n  var dat = 'eyJhIjoxfQ==';\n  var other = 'x';\n</script>";
        assert_eq!(search_policy_data(page).unwrap(), "eyJhIjoxfQ==");

        let err = search_policy_data("<script>var data = {};</script>").unwrap_err();
        assert!(matches!(err, ExtractorError::MissingField("data")));
    }

    #[test]
    fn test_manifest_url_and_headers() {
        let payload: PolicyPayload = serde_json::from_str(
            r#"{"base":"cdn1","s3_user_hash":"uh","s3_video_hash":"vh","title":"t",
                "sessionID":"s","signatures":{"m":{},"k":{},"t":{}}}"#,
        )
        .unwrap();

        let host = SproutVideoHost::default();
        assert_eq!(
            host.manifest_url(&payload, "Policy=P&sessionID=s"),
            "https://cdn1.videos.sproutvideo.com/uh/vh/video/index.m3u8?Policy=P&sessionID=s"
        );

        let referer = "https://videos.sproutvideo.com/embed/ab/cd";
        let headers = host.manifest_headers(referer).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[ACCEPT], "*/*");
        assert_eq!(headers[ORIGIN], "https://videos.sproutvideo.com");
        assert_eq!(headers[REFERER], referer);
    }

    #[tokio::test]
    #[ignore]
    async fn test_sproutvideo_extractor() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();

        let extractor = SproutVideo::new(
            "https://videos.sproutvideo.com/embed/4c9dddb01910e3c9c4/0fc24387c4f24ee3".to_string(),
            default_client().unwrap(),
        );
        let descriptor = extractor.extract().await.unwrap();
        println!("{descriptor:?}");
        assert_eq!(descriptor.id, "4c9dddb01910e3c9c4");
    }
}
