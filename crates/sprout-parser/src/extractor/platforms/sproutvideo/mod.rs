mod builder;
pub mod models;
pub mod signing;

pub use builder::{
    EmbedReference, SproutVideo, SproutVideoHost, URL_REGEX, extract_embedded_urls, matches_url,
    normalize_embed_url, search_policy_data,
};
