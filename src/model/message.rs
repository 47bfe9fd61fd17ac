//! The normalized output record.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// One message, normalized for downstream analysis.
///
/// Created once per raw message by [`crate::parser::message::assemble`] and
/// never modified afterwards.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NormalizedMessage {
    /// Position of the message in the input stream (0, 1, 2, …).
    pub index: usize,

    /// Byte offset of the message inside the input
    /// (points to the `From ` separator line in container mode).
    pub offset: u64,

    /// `Message-ID` without angle brackets or surrounding whitespace.
    pub message_id: String,

    /// Sender list (`From:`).
    pub from: Vec<EmailAddress>,

    /// Primary recipients (`To:`).
    pub to: Vec<EmailAddress>,

    /// Carbon-copy recipients (`Cc:`).
    pub cc: Vec<EmailAddress>,

    /// `Reply-To:` addresses.
    pub reply_to: Vec<EmailAddress>,

    /// `Return-Path:` address, without angle brackets.
    pub return_path: Option<String>,

    /// Decoded subject line (RFC 2047 encoded-words resolved).
    pub subject: String,

    /// Parsed `Date:` header.
    pub date: Option<DateTime<Utc>>,

    /// Concatenated text of every text leaf, tags stripped from HTML.
    pub body: String,

    /// URLs in first-seen order, deduplicated.
    pub urls: Vec<String>,
}
