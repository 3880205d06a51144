//! Variant-stream extraction from master playlist text.
//!
//! [`parse_variants`] returns a lazy iterator that owns its own cursor, so
//! every call starts a fresh scan and two scans never share position state.

use super::classifier::LineClassifier;
use crate::{Error, Result, hls::StreamInfo};

/// One `#EXT-X-STREAM-INF` declaration and the URI line that follows it,
/// borrowed from the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord<'a> {
    /// Peak bandwidth advertised by the declaration.
    pub bandwidth: u64,
    /// Declaration line with its line ending, then the URI line without its
    /// line ending.
    pub block: &'a str,
    /// Byte offset of the first character of `block` in the source.
    pub offset: usize,
}

impl VariantRecord<'_> {
    /// The declaration line, without its line ending.
    pub fn declaration(&self) -> &str {
        self.block.lines().next().unwrap_or_default()
    }

    /// The variant's own URI.
    pub fn uri(&self) -> &str {
        self.block.lines().nth(1).unwrap_or_default().trim()
    }

    pub fn end(&self) -> usize {
        self.offset + self.block.len()
    }
}

/// Scan `body` for variant declarations, in document order.
pub fn parse_variants(body: &str) -> Variants<'_> {
    Variants { body, cursor: 0 }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    /// Includes the terminating `\n`, if any.
    text: &'a str,
}

impl Line<'_> {
    /// Length without the `\n` / `\r\n` terminator.
    fn content_len(&self) -> usize {
        let text = self.text.strip_suffix('\n').unwrap_or(self.text);
        text.strip_suffix('\r').unwrap_or(text).len()
    }
}

/// Lazy iterator over the well-formed variants of a playlist.
#[derive(Debug, Clone)]
pub struct Variants<'a> {
    body: &'a str,
    cursor: usize,
}

impl<'a> Variants<'a> {
    fn next_line(&mut self) -> Option<Line<'a>> {
        let rest = self.body.get(self.cursor..).filter(|rest| !rest.is_empty())?;
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let line = Line {
            start: self.cursor,
            text: &rest[..len],
        };
        self.cursor += len;
        Some(line)
    }

    fn read_variant(&mut self, declaration: Line<'a>) -> Result<VariantRecord<'a>> {
        let bandwidth = StreamInfo::parse(declaration.text)
            .and_then(|info| info.bandwidth)
            .ok_or_else(|| Error::malformed(declaration.start, "missing or invalid BANDWIDTH"))?;

        let resume = self.cursor;
        let uri = self
            .next_line()
            .ok_or_else(|| Error::malformed(declaration.start, "no URI line follows"))?;

        if !LineClassifier::classify(uri.text).is_uri() {
            // Leave the line for the outer scan; it may be a declaration itself.
            self.cursor = resume;
            return Err(Error::malformed(
                declaration.start,
                "declaration is not followed by a URI line",
            ));
        }

        let body = self.body;
        let end = uri.start + uri.content_len();
        Ok(VariantRecord {
            bandwidth,
            block: &body[declaration.start..end],
            offset: declaration.start,
        })
    }
}

impl<'a> Iterator for Variants<'a> {
    type Item = VariantRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.next_line() {
            if !LineClassifier::classify(line.text).signals_next_uri_is_variant() {
                continue;
            }

            match self.read_variant(line) {
                Ok(record) => return Some(record),
                Err(e) => tracing::debug!(error = %e, "Skipping variant declaration"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-STREAM-INF:BANDWIDTH=500000\n\
low.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2000000\n\
high.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=1000000\n\
mid.m3u8\n";

    #[test]
    fn test_parse_in_document_order() {
        let variants: Vec<_> = parse_variants(MASTER).collect();
        assert_eq!(variants.len(), 3);

        let bandwidths: Vec<u64> = variants.iter().map(|v| v.bandwidth).collect();
        assert_eq!(bandwidths, vec![500000, 2000000, 1000000]);

        assert_eq!(variants[0].offset, "#EXTM3U\n#EXT-X-VERSION:3\n".len());
        assert_eq!(
            variants[1].block,
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000\nhigh.m3u8"
        );
        assert_eq!(variants[1].uri(), "high.m3u8");
        assert_eq!(
            variants[1].declaration(),
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000"
        );
    }

    #[test]
    fn test_block_matches_source_offset() {
        for variant in parse_variants(MASTER) {
            assert_eq!(&MASTER[variant.offset..variant.end()], variant.block);
        }
    }

    #[test]
    fn test_crlf_preserved_inside_block() {
        let body = "#EXTM3U\r\n#EXT-X-STREAM-INF:BANDWIDTH=7,CODECS=\"avc1,mp4a\"\r\nv.m3u8\r\n";
        let variants: Vec<_> = parse_variants(body).collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(
            variants[0].block,
            "#EXT-X-STREAM-INF:BANDWIDTH=7,CODECS=\"avc1,mp4a\"\r\nv.m3u8"
        );
        assert_eq!(variants[0].offset, 9);
    }

    #[test]
    fn test_trailing_declaration_is_skipped() {
        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\na.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=9";
        let variants: Vec<_> = parse_variants(body).collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].bandwidth, 1);

        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=9\n";
        assert_eq!(parse_variants(body).count(), 0);
    }

    #[test]
    fn test_missing_bandwidth_is_skipped() {
        let body = "#EXTM3U\n\
#EXT-X-STREAM-INF:RESOLUTION=1280x720\n\
nobw.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=abc\n\
bad.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=3\n\
good.m3u8\n";
        let variants: Vec<_> = parse_variants(body).collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].uri(), "good.m3u8");
    }

    #[test]
    fn test_declaration_followed_by_declaration() {
        let body = "#EXT-X-STREAM-INF:BANDWIDTH=1\n#EXT-X-STREAM-INF:BANDWIDTH=2\nb.m3u8\n";
        let variants: Vec<_> = parse_variants(body).collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].bandwidth, 2);
        assert_eq!(variants[0].offset, "#EXT-X-STREAM-INF:BANDWIDTH=1\n".len());
    }

    #[test]
    fn test_declaration_followed_by_blank_line() {
        let body = "#EXT-X-STREAM-INF:BANDWIDTH=1\n\na.m3u8\n";
        assert_eq!(parse_variants(body).count(), 0);
    }

    #[test]
    fn test_indented_tag_is_not_a_declaration() {
        let body = " #EXT-X-STREAM-INF:BANDWIDTH=1\na.m3u8\n";
        assert_eq!(parse_variants(body).count(), 0);
    }

    #[test]
    fn test_scan_is_restartable() {
        let scan = parse_variants(MASTER);
        let first: Vec<_> = scan.clone().collect();
        let second: Vec<_> = scan.collect();
        assert_eq!(first, second);

        let mut a = parse_variants(MASTER);
        let mut b = parse_variants("#EXT-X-STREAM-INF:BANDWIDTH=4\nx.m3u8");
        assert_eq!(a.next().map(|v| v.bandwidth), Some(500000));
        assert_eq!(b.next().map(|v| v.bandwidth), Some(4));
        assert_eq!(a.next().map(|v| v.bandwidth), Some(2000000));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_variants("").count(), 0);
    }
}
