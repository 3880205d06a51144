pub mod stream_info;

pub use stream_info::{STREAM_INF_TAG, StreamInfo};

/// Present in every master playlist, once per variant stream.
pub const VARIANT_MARKER: &str = "#EXT-X-STREAM-INF";

/// Present only in media (segment) playlists.
pub const SEGMENT_DURATION_MARKER: &str = "#EXT-X-TARGETDURATION";

/// File extension of HLS playlists.
pub const PLAYLIST_EXTENSION: &str = ".m3u8";
