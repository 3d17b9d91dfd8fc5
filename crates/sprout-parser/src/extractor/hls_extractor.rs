use async_trait::async_trait;
use m3u8_rs::{MasterPlaylist, Playlist};
use reqwest::Client;
use reqwest::header::HeaderMap;
use rustc_hash::FxHashMap;
use url::Url;

use super::error::ExtractorError;
use crate::media::{FormatDescriptor, MediaFormat, Protocol};

#[async_trait]
pub trait HlsExtractor {
    /// Fetches an HLS playlist and lists the formats it offers.
    ///
    /// A master playlist yields one format per (non I-frame) variant, a media
    /// playlist yields a single format pointing at the playlist itself.
    /// Format ids are `{m3u8_id}-{tbr}` where the bitrate is known.
    #[allow(clippy::too_many_arguments)]
    async fn extract_m3u8_formats(
        &self,
        client: &Client,
        headers: HeaderMap,
        m3u8_url: &str,
        ext: MediaFormat,
        protocol: Protocol,
        m3u8_id: &str,
    ) -> Result<Vec<FormatDescriptor>, ExtractorError> {
        let base_url =
            Url::parse(m3u8_url).map_err(|e| ExtractorError::HlsPlaylistError(e.to_string()))?;

        let response = client
            .get(m3u8_url)
            .headers(headers)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        parse_m3u8_formats(&response, &base_url, ext, protocol, m3u8_id)
    }
}

/// Parses playlist bytes fetched from `base_url` into formats.
pub fn parse_m3u8_formats(
    data: &[u8],
    base_url: &Url,
    ext: MediaFormat,
    protocol: Protocol,
    m3u8_id: &str,
) -> Result<Vec<FormatDescriptor>, ExtractorError> {
    let playlist = m3u8_rs::parse_playlist_res(data)
        .map_err(|e| ExtractorError::HlsPlaylistError(e.to_string()))?;

    match playlist {
        Playlist::MasterPlaylist(pl) => process_master_playlist(pl, base_url, ext, protocol, m3u8_id),
        Playlist::MediaPlaylist(_) => Ok(vec![FormatDescriptor {
            format_id: m3u8_id.to_string(),
            url: base_url.to_string(),
            manifest_url: base_url.to_string(),
            ext,
            protocol,
            tbr: None,
            width: None,
            height: None,
            fps: None,
            codecs: None,
            extra_param_to_segment_url: None,
            extra_param_to_key_url: None,
            http_headers: FxHashMap::default(),
        }]),
    }
}

fn process_master_playlist(
    playlist: MasterPlaylist,
    base_url: &Url,
    ext: MediaFormat,
    protocol: Protocol,
    m3u8_id: &str,
) -> Result<Vec<FormatDescriptor>, ExtractorError> {
    playlist
        .variants
        .into_iter()
        .filter(|variant| !variant.is_i_frame)
        .map(|variant| {
            let stream_url = base_url
                .join(&variant.uri)
                .map_err(|e| ExtractorError::HlsPlaylistError(e.to_string()))?;

            let bandwidth = variant.average_bandwidth.unwrap_or(variant.bandwidth);
            let tbr = (bandwidth > 0).then(|| bandwidth as f64 / 1000.0);
            let format_id = match tbr {
                Some(tbr) => format!("{m3u8_id}-{}", tbr as u64),
                None => m3u8_id.to_string(),
            };

            Ok(FormatDescriptor {
                format_id,
                url: stream_url.to_string(),
                manifest_url: base_url.to_string(),
                ext,
                protocol,
                tbr,
                width: variant.resolution.map(|r| r.width),
                height: variant.resolution.map(|r| r.height),
                fps: variant.frame_rate,
                codecs: variant.codecs,
                extra_param_to_segment_url: None,
                extra_param_to_key_url: None,
                http_headers: FxHashMap::default(),
            })
        })
        .collect()
}
