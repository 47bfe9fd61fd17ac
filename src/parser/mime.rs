//! MIME structure walking: part tree construction and text/URL extraction.
//!
//! A message is first turned into a [`MimePart`] tree (multipart framing,
//! transfer decoding), then walked depth-first in declaration order. Every
//! text leaf is charset-normalized, tag-stripped if HTML, harvested for
//! URLs and appended to the body. Broken children are skipped, never fatal.

use std::borrow::Cow;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::part::{LeafPart, MediaKind, MimePart};
use crate::parser::charset;
use crate::parser::header::{split_header_block, ContentInfo, HeaderBlock};
use crate::parser::transfer;
use crate::parser::urls::{self, UrlSet};

/// Maximum depth for recursive multipart parsing (to prevent stack overflow on adversarial input).
pub const MAX_DEPTH: usize = 10;

/// Why a part could not be turned into a tree node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartError {
    /// The part's header block is not a header block.
    #[error("malformed part headers: {0}")]
    Headers(String),

    /// The part is nested deeper than the configured limit.
    #[error("multipart nesting deeper than {0} levels")]
    TooDeep(usize),
}

/// Combined body text and URL list of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutput {
    pub body: String,
    pub urls: Vec<String>,
}

/// Parse one entity (header block + body) into a part tree.
///
/// `depth` is the nesting level of this entity; the top-level message is 0.
pub fn parse_part(entity: &[u8], depth: usize, max_depth: usize) -> Result<MimePart<'_>, PartError> {
    if depth > max_depth {
        return Err(PartError::TooDeep(max_depth));
    }
    let (raw_headers, body) = split_header_block(entity);
    let headers = HeaderBlock::parse(raw_headers).map_err(PartError::Headers)?;
    Ok(build_part(headers.content_info(), body, depth, max_depth))
}

/// Build the tree node for a body whose headers were already parsed.
pub fn build_part<'a>(
    info: ContentInfo,
    body: &'a [u8],
    depth: usize,
    max_depth: usize,
) -> MimePart<'a> {
    if info.is_multipart() {
        let boundary = info
            .boundary
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty());
        let Some(boundary) = boundary else {
            warn!(
                media_type = %info.media_type,
                "Multipart part without boundary, keeping payload as raw text"
            );
            return MimePart::Unframed(body);
        };

        let children = split_multipart(body, boundary)
            .into_iter()
            .enumerate()
            .filter_map(|(i, child)| match parse_part(child, depth + 1, max_depth) {
                Ok(part) => Some(part),
                Err(e) => {
                    warn!(child = i, depth = depth + 1, error = %e, "Skipping multipart child");
                    None
                }
            })
            .collect();
        return MimePart::Container(children);
    }

    let kind = MediaKind::from_media_type(&info.media_type);
    let payload = if kind.is_text() {
        transfer::decode(body, info.transfer_encoding.as_deref())
    } else {
        // Never read, so not worth decoding.
        Cow::Borrowed(body)
    };
    MimePart::Leaf(LeafPart {
        kind,
        charset: info.charset,
        payload,
    })
}

/// Walk a part tree and collect its body text and URLs.
///
/// Leaves directly inside a container are each followed by a newline; the
/// aggregate is trimmed once at the end.
pub fn walk(root: &MimePart<'_>) -> WalkOutput {
    let mut body = String::new();
    let mut found = UrlSet::new();
    visit(root, false, &mut body, &mut found);
    WalkOutput {
        body: body.trim().to_string(),
        urls: found.into_vec(),
    }
}

/// Parse and walk a complete entity in one step.
pub fn walk_entity(entity: &[u8], max_depth: usize) -> Result<WalkOutput, PartError> {
    parse_part(entity, 0, max_depth).map(|root| walk(&root))
}

fn visit(part: &MimePart<'_>, in_container: bool, body: &mut String, found: &mut UrlSet) {
    match part {
        MimePart::Container(children) => {
            for child in children {
                visit(child, true, body, found);
            }
        }
        MimePart::Unframed(raw) => {
            body.push_str(&String::from_utf8_lossy(raw));
            if in_container {
                body.push('\n');
            }
        }
        MimePart::Leaf(leaf) if leaf.kind.is_text() => {
            let text = charset::normalize(&leaf.payload, leaf.charset.as_deref());
            let extracted = urls::extract(&text, leaf.kind == MediaKind::Html);
            body.push_str(&extracted.text);
            if in_container {
                body.push('\n');
            }
            found.extend(extracted.urls);
        }
        MimePart::Leaf(leaf) => {
            debug!(kind = ?leaf.kind, bytes = leaf.payload.len(), "Ignoring non-text part");
        }
    }
}

/// Split a multipart body into its child entities (RFC 2046 §5.1.1).
///
/// The preamble and epilogue are dropped, and so is the line break before
/// each delimiter. A body that never reaches its close delimiter keeps its
/// last part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);
        let line = &body[pos..line_end];

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let (is_close, padding) = match rest.strip_prefix(b"--") {
                Some(after) => (true, after),
                None => (false, rest),
            };
            if is_transport_padding(padding) {
                if let Some(start) = current.take() {
                    parts.push(strip_line_break(&body[start..pos]));
                }
                if is_close {
                    return parts;
                }
                current = Some(line_end);
            }
        }
        pos = line_end;
    }

    if let Some(start) = current {
        warn!(boundary, "Multipart body has no close delimiter");
        parts.push(&body[start..]);
    }
    parts
}

/// Whitespace allowed after a delimiter on its line.
fn is_transport_padding(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| b == b' ' || b == b'\t' || b == b'\r' || b == b'\n')
}

/// Remove one trailing `\r\n` or `\n`.
fn strip_line_break(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}
