//! MIME part tree.
//!
//! Built per message by [`crate::parser::mime::parse_part`], borrowed from
//! the raw message bytes wherever no decoding was needed, and dropped once
//! the message is normalized.

use std::borrow::Cow;

/// How a leaf part is treated, resolved once from its declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// `text/plain`
    PlainText,
    /// `text/html`
    Html,
    /// Anything else; ignored for body text and URLs.
    Other,
}

impl MediaKind {
    /// Resolve a lower-cased `type/subtype`.
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "text/plain" => Self::PlainText,
            "text/html" => Self::Html,
            _ => Self::Other,
        }
    }

    /// `true` for the kinds that contribute body text and URLs.
    pub fn is_text(self) -> bool {
        matches!(self, Self::PlainText | Self::Html)
    }
}

/// A part with a concrete payload.
#[derive(Debug, Clone)]
pub struct LeafPart<'a> {
    pub kind: MediaKind,
    /// Declared `charset` parameter.
    pub charset: Option<String>,
    /// Payload with the transfer encoding already removed.
    pub payload: Cow<'a, [u8]>,
}

/// A node in a message's content tree.
#[derive(Debug, Clone)]
pub enum MimePart<'a> {
    /// A single-body part.
    Leaf(LeafPart<'a>),
    /// A `multipart/*` part with its children in declaration order.
    Container(Vec<MimePart<'a>>),
    /// A `multipart/*` part declared without a usable boundary. Its payload
    /// is kept as opaque text: no charset conversion, no URL harvesting.
    Unframed(&'a [u8]),
}

impl MimePart<'_> {
    /// Number of leaf parts in this subtree (unframed payloads count as one).
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) | Self::Unframed(_) => 1,
            Self::Container(children) => children.iter().map(MimePart::leaf_count).sum(),
        }
    }
}
