use super::format_descriptor::FormatDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Everything needed to play back one resolved video.
///
/// # Fields
///
/// * `id` - The video id taken from the embed URL
/// * `title` - The display title from the policy payload
/// * `formats` - Signed stream variants, empty when the manifest could not be read
///
/// # Examples
///
/// ```rust
/// use sprout_parser::media::PlaybackDescriptor;
///
/// let descriptor = PlaybackDescriptor::new("4c9dddb01910e3c9c4", "Sample", vec![]);
/// assert!(!descriptor.has_formats());
/// ```
pub struct PlaybackDescriptor {
    pub id: String,
    pub title: String,
    pub formats: Vec<FormatDescriptor>,
}

impl PlaybackDescriptor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        id: S1,
        title: S2,
        formats: Vec<FormatDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            formats,
        }
    }

    pub fn has_formats(&self) -> bool {
        !self.formats.is_empty()
    }
}
