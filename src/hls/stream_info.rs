pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

/// Attributes of a single `#EXT-X-STREAM-INF` declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    pub bandwidth: Option<u64>,
    pub average_bandwidth: Option<u64>,
    pub resolution: Option<(u32, u32)>,
    pub codecs: Option<String>,
    pub frame_rate: Option<f64>,
}

impl StreamInfo {
    /// Parse from a declaration line. Returns `None` if the line is not a
    /// `#EXT-X-STREAM-INF` tag at all.
    pub fn parse(line: &str) -> Option<Self> {
        let content = line.trim_end().strip_prefix(STREAM_INF_TAG)?;
        let mut info = Self::default();

        for attr in split_attributes(content) {
            let Some((key, value)) = attr.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_uppercase().as_str() {
                "BANDWIDTH" => info.bandwidth = parse_decimal(value),
                "AVERAGE-BANDWIDTH" => info.average_bandwidth = parse_decimal(value),
                "RESOLUTION" => info.resolution = parse_resolution(value),
                "CODECS" => info.codecs = Some(value.trim_matches('"').to_string()),
                "FRAME-RATE" => info.frame_rate = value.parse().ok(),
                _ => {}
            }
        }

        Some(info)
    }
}

/// Decimal-integer attribute: ASCII digits only, no sign, must fit in `u64`.
fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_resolution(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// Split an attribute list on commas that are not inside a quoted string.
fn split_attributes(s: &str) -> impl Iterator<Item = &str> {
    let mut start = 0;
    let mut in_quotes = false;
    let mut bounds = Vec::new();

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                bounds.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    bounds.push((start, s.len()));

    bounds
        .into_iter()
        .map(move |(a, b)| s[a..b].trim())
        .filter(|attr| !attr.is_empty())
}
