use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Container extension reported for a format.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
}

impl MediaFormat {
    pub fn as_str(&self) -> &str {
        match self {
            MediaFormat::Mp4 => "mp4",
        }
    }
}

impl Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fmp4" | "mp4" => Ok(MediaFormat::Mp4),
            _ => Err(()),
        }
    }
}

/// How a downloader is expected to fetch a format.
///
/// `M3u8Native` means segments are fetched one by one by the downloader itself,
/// which is what makes the per-segment and per-key signing parameters usable.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    M3u8Native,
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::M3u8Native => "m3u8_native",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m3u8_native" => Ok(Protocol::M3u8Native),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_format_from_str() {
        assert_eq!("MP4".parse::<MediaFormat>(), Ok(MediaFormat::Mp4));
        assert_eq!("fmp4".parse::<MediaFormat>(), Ok(MediaFormat::Mp4));
        assert!("ts".parse::<MediaFormat>().is_err());
        assert!("flv".parse::<MediaFormat>().is_err());
    }

    #[test]
    fn test_protocol_serializes_snake_case() {
        let json = serde_json::to_string(&Protocol::M3u8Native).unwrap();
        assert_eq!(json, "\"m3u8_native\"");
        assert_eq!(Protocol::M3u8Native.to_string(), "m3u8_native");
        assert_eq!("M3U8_NATIVE".parse::<Protocol>(), Ok(Protocol::M3u8Native));
        assert!("m3u8".parse::<Protocol>().is_err());
    }
}
