use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("http client error: {0}")]
    ClientError(String),
    #[error("unsupported extractor")]
    UnsupportedExtractor,
    #[error("unable to extract {0}")]
    MissingField(&'static str),
    #[error("base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("utf-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("no embeds found")]
    NoEmbedsFound,
    #[error("hls playlist error: {0}")]
    HlsPlaylistError(String),
}
