use crate::hls::{PLAYLIST_EXTENSION, SEGMENT_DURATION_MARKER, STREAM_INF_TAG, VARIANT_MARKER};
use url::Url;

/// Streaming host whose playlists are intercepted unless configured otherwise.
pub const DEFAULT_PLAYLIST_HOST: &str = "video.twimg.com";

/// Represents the type of a line in an M3U8 playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Empty,
    ExtXStreamInf,
    UnknownExtTag,
    Comment,
    Uri,
}

impl LineType {
    pub fn is_uri(&self) -> bool {
        matches!(self, Self::Uri)
    }

    pub fn signals_next_uri_is_variant(&self) -> bool {
        matches!(self, Self::ExtXStreamInf)
    }
}

/// Classifier for M3U8 lines.
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a line from an M3U8 playlist. Trailing line-ending characters
    /// are ignored; a tag must start in the first column.
    pub fn classify(line: &str) -> LineType {
        let line = line.trim_end();

        if line.trim_start().is_empty() {
            return LineType::Empty;
        }

        if !line.starts_with('#') {
            return LineType::Uri;
        }

        if line.starts_with(STREAM_INF_TAG) {
            LineType::ExtXStreamInf
        } else if line.starts_with("#EXT") {
            LineType::UnknownExtTag
        } else {
            LineType::Comment
        }
    }
}

/// What a playlist body looks like, judged by content sniffing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    /// Declares variant streams and carries no segment timing.
    Master,
    /// Carries segment timing.
    Media,
    Unrecognized,
}

/// Decides which requests and which response bodies are rewrite candidates.
#[derive(Debug, Clone)]
pub struct PlaylistClassifier {
    host: String,
    port: Option<u16>,
    allow_http: bool,
}

impl PlaylistClassifier {
    /// `authority` is a host name with an optional `:port`. URLs must carry
    /// exactly that port, or none when it is omitted.
    pub fn new(authority: impl Into<String>) -> Self {
        let mut host = authority.into().to_ascii_lowercase();
        let port = host
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok());
        if let (Some(_), Some(colon)) = (port, host.rfind(':')) {
            host.truncate(colon);
        }

        Self {
            host,
            port,
            allow_http: false,
        }
    }

    /// Also accept plain `http` URLs on the playlist host.
    pub fn allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// True for `https://<host>/<path>.m3u8[?query]`. Scheme, host and
    /// extension compare case-insensitively. Fragments are rejected.
    pub fn is_playlist_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        let scheme_ok = match parsed.scheme() {
            "https" => true,
            "http" => self.allow_http,
            _ => false,
        };
        if !scheme_ok
            || !parsed.username().is_empty()
            || parsed.password().is_some()
            || parsed.fragment().is_some()
        {
            return false;
        }

        if !parsed
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            || parsed.port() != self.port
        {
            return false;
        }

        // At least one character of path before the extension.
        let path = parsed.path();
        path.len() > PLAYLIST_EXTENSION.len() + 1
            && path
                .get(path.len() - PLAYLIST_EXTENSION.len()..)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(PLAYLIST_EXTENSION))
    }
}

impl Default for PlaylistClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYLIST_HOST)
    }
}

/// Sniff a playlist body.
pub fn classify_body(body: &str) -> PlaylistKind {
    if body.contains(SEGMENT_DURATION_MARKER) {
        PlaylistKind::Media
    } else if body.contains(VARIANT_MARKER) {
        PlaylistKind::Master
    } else {
        PlaylistKind::Unrecognized
    }
}

/// True iff the body declares variant streams and carries no segment
/// duration marker. Content sniffing only, not a grammar check.
pub fn is_master_playlist(body: &str) -> bool {
    classify_body(body) == PlaylistKind::Master
}
