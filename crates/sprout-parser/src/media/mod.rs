pub mod format_descriptor;
pub mod formats;
pub mod playback;

pub use format_descriptor::FormatDescriptor;
pub use formats::{MediaFormat, Protocol};
pub use playback::PlaybackDescriptor;
