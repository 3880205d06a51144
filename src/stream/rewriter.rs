use super::{
    classifier::is_master_playlist,
    parser::{VariantRecord, parse_variants},
};
use crate::{Error, Result, hls::StreamInfo};

/// Result of rewriting a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterRewrite {
    /// Not a master playlist, no usable variants, or already minimal.
    Unchanged,
    Rewritten {
        text: String,
        variant_count: usize,
        bandwidth: u64,
    },
}

/// Pick the variant with the highest bandwidth. Ties go to the one seen first.
pub fn select_best<'v, 'a>(variants: &'v [VariantRecord<'a>]) -> Result<&'v VariantRecord<'a>> {
    let (first, rest) = variants.split_first().ok_or(Error::EmptyVariantSet)?;

    Ok(rest.iter().fold(first, |best, candidate| {
        if candidate.bandwidth > best.bandwidth {
            candidate
        } else {
            best
        }
    }))
}

/// Keep the global header (everything before the first variant) and the best
/// variant block. With no variants the body is returned as is.
pub fn rewrite(body: &str, variants: &[VariantRecord<'_>]) -> Result<String> {
    let Some(first) = variants.first() else {
        return Ok(body.to_owned());
    };

    let header = body
        .get(..first.offset)
        .ok_or_else(|| Error::malformed(first.offset, "variant offset outside document"))?;
    let best = select_best(variants)?;

    let mut output = String::with_capacity(header.len() + best.block.len());
    output.push_str(header);
    output.push_str(best.block);
    Ok(output)
}

/// Parse and rewrite a body if it is a master playlist.
pub fn rewrite_master(body: &str) -> Result<MasterRewrite> {
    if !is_master_playlist(body) {
        return Ok(MasterRewrite::Unchanged);
    }

    let variants: Vec<_> = parse_variants(body).collect();
    if variants.is_empty() {
        tracing::debug!("Master playlist has no well-formed variant declarations");
        return Ok(MasterRewrite::Unchanged);
    }

    let best = select_best(&variants)?;
    if let Some(info) = StreamInfo::parse(best.declaration()) {
        tracing::debug!(
            bandwidth = best.bandwidth,
            resolution = ?info.resolution,
            codecs = ?info.codecs,
            uri = best.uri(),
            "Selected variant"
        );
    }

    let text = rewrite(body, &variants)?;
    if text == body {
        return Ok(MasterRewrite::Unchanged);
    }

    Ok(MasterRewrite::Rewritten {
        text,
        variant_count: variants.len(),
        bandwidth: best.bandwidth,
    })
}

/// What [`modify_reported`] did to a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyReport {
    Unchanged,
    Rewritten { variant_count: usize, bandwidth: u64 },
    /// Rewriting failed and the body was returned as is.
    FellBack(String),
}

/// [`modify`], also reporting what happened.
pub fn modify_reported(body: &str) -> (String, ModifyReport) {
    match rewrite_master(body) {
        Ok(MasterRewrite::Rewritten {
            text,
            variant_count,
            bandwidth,
        }) => (
            text,
            ModifyReport::Rewritten {
                variant_count,
                bandwidth,
            },
        ),
        Ok(MasterRewrite::Unchanged) => (body.to_owned(), ModifyReport::Unchanged),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to rewrite playlist, passing through");
            (body.to_owned(), ModifyReport::FellBack(e.to_string()))
        }
    }
}

/// Reduce a master playlist to its best variant. Any failure falls back to
/// the unmodified body.
pub fn modify(body: &str) -> String {
    modify_reported(body).0
}
