use crate::media::{MediaFormat, Protocol};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    // e.g. "hls-1280"
    pub format_id: String,
    // Url of the variant playlist, signed for manifest access once resolved
    pub url: String,
    // Url of the playlist this format was discovered in
    pub manifest_url: String,
    pub ext: MediaFormat,
    pub protocol: Protocol,
    // Total bitrate in kbps
    pub tbr: Option<f64>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub fps: Option<f64>,
    pub codecs: Option<String>,
    // Query string appended to every media segment request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_param_to_segment_url: Option<String>,
    // Query string appended to every decryption key request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_param_to_key_url: Option<String>,
    #[serde(default)]
    pub http_headers: FxHashMap<String, String>,
}

impl FormatDescriptor {
    /// Signs this format for playback.
    ///
    /// `manifest_query` is appended to the url verbatim after a `?`, even when the
    /// url already carries a query string. The segment and key queries are kept
    /// aside for the downloader to append to its sub-requests.
    pub fn attach_signing(
        &mut self,
        manifest_query: &str,
        segment_query: &str,
        key_query: &str,
        headers: FxHashMap<String, String>,
    ) {
        self.url = format!("{}?{}", self.url, manifest_query);
        self.extra_param_to_segment_url = Some(segment_query.to_string());
        self.extra_param_to_key_url = Some(key_query.to_string());
        self.http_headers = headers;
    }

    /// Human readable quality label, e.g. "1280x720 (2000 kbps)".
    pub fn quality(&self) -> String {
        let resolution = match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        };
        match (resolution, self.tbr) {
            (Some(res), Some(tbr)) => format!("{res} ({tbr:.0} kbps)"),
            (Some(res), None) => res,
            (None, Some(tbr)) => format!("{tbr:.0} kbps"),
            (None, None) => "unknown".to_string(),
        }
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}) - {}",
            self.format_id,
            self.ext,
            self.protocol,
            self.quality()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormatDescriptor {
        FormatDescriptor {
            format_id: "hls-1280".to_string(),
            url: "https://cdn.example.com/u/v/video/720.m3u8".to_string(),
            manifest_url: "https://cdn.example.com/u/v/video/index.m3u8?a=b".to_string(),
            ext: MediaFormat::Mp4,
            protocol: Protocol::M3u8Native,
            tbr: Some(1280.0),
            width: Some(1280),
            height: Some(720),
            fps: None,
            codecs: None,
            extra_param_to_segment_url: None,
            extra_param_to_key_url: None,
            http_headers: FxHashMap::default(),
        }
    }

    #[test]
    fn test_attach_signing_appends_without_merging() {
        let mut format = sample();
        format.url.push_str("?x=1");

        let mut headers = FxHashMap::default();
        headers.insert("Accept".to_string(), "*/*".to_string());
        format.attach_signing("Policy=P&sessionID=abc", "t=1", "k=1", headers);

        assert_eq!(
            format.url,
            "https://cdn.example.com/u/v/video/720.m3u8?x=1?Policy=P&sessionID=abc"
        );
        assert_eq!(format.extra_param_to_segment_url.as_deref(), Some("t=1"));
        assert_eq!(format.extra_param_to_key_url.as_deref(), Some("k=1"));
        assert_eq!(format.http_headers.get("Accept").map(String::as_str), Some("*/*"));
    }

    #[test]
    fn test_quality_label() {
        let mut format = sample();
        assert_eq!(format.quality(), "1280x720 (1280 kbps)");
        format.width = None;
        assert_eq!(format.quality(), "1280 kbps");
        format.tbr = None;
        assert_eq!(format.quality(), "unknown");
    }
}
