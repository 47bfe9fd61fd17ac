//! Message assembly and the message-sequence entry point.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ParsingConfig;
use crate::error::{MailError, Result};
use crate::model::address::EmailAddress;
use crate::model::message::NormalizedMessage;
use crate::parser::header::{extract_angle_bracket, split_header_block, HeaderBlock};
use crate::parser::mbox::{self, InputMode, RawMessage, RawMessages};
use crate::parser::mime::{self, WalkOutput};

/// Normalize one raw message.
///
/// Fails only when the header block is unreadable; every problem below the
/// top-level headers is recovered inside the walker.
pub fn assemble(raw: &RawMessage<'_>, max_depth: usize) -> Result<NormalizedMessage> {
    let entity = skip_from_line(raw.bytes);
    if entity.iter().all(u8::is_ascii_whitespace) {
        return Err(MailError::framing(raw.offset, "message is empty"));
    }

    let (raw_headers, body) = split_header_block(entity);
    let headers =
        HeaderBlock::parse(raw_headers).map_err(|reason| MailError::framing(raw.offset, reason))?;

    let info = headers.content_info();
    debug!(
        index = raw.index,
        offset = raw.offset,
        media_type = %info.media_type,
        "Normalizing message"
    );
    let tree = mime::build_part(info, body, 0, max_depth);
    let WalkOutput { body, urls } = mime::walk(&tree);

    let parsed = headers.message();
    let message_id = parsed
        .and_then(|m| m.message_id())
        .map(|id| id.trim_matches(|c: char| c == '<' || c == '>' || c.is_whitespace()))
        .unwrap_or_default()
        .to_string();

    Ok(NormalizedMessage {
        index: raw.index,
        offset: raw.offset,
        message_id,
        from: EmailAddress::from_list(parsed.and_then(|m| m.from())),
        to: EmailAddress::from_list(parsed.and_then(|m| m.to())),
        cc: EmailAddress::from_list(parsed.and_then(|m| m.cc())),
        reply_to: EmailAddress::from_list(parsed.and_then(|m| m.reply_to())),
        return_path: headers
            .get("return-path")
            .map(extract_angle_bracket)
            .filter(|p| !p.is_empty()),
        subject: parsed
            .and_then(|m| m.subject())
            .unwrap_or_default()
            .trim()
            .to_string(),
        date: parsed.and_then(|m| m.date()).and_then(|dt| {
            DateTime::parse_from_rfc3339(&dt.to_rfc3339())
                .ok()
                .map(|d| d.with_timezone(&Utc))
        }),
        body,
        urls,
    })
}

/// Lazy sequence of normalized messages (or per-message errors).
///
/// A failed message never ends the sequence.
pub struct MessageStream<'a> {
    messages: RawMessages<'a>,
    max_depth: usize,
}

impl MessageStream<'_> {
    /// The framing mode actually in use (never `Auto`).
    pub fn mode(&self) -> InputMode {
        self.messages.mode()
    }
}

impl Iterator for MessageStream<'_> {
    type Item = Result<NormalizedMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.messages.next()?;
        Some(assemble(&raw, self.max_depth))
    }
}

/// Split `input` according to `options.mode` and normalize every message.
pub fn normalize_stream<'a>(input: &'a [u8], options: &ParsingConfig) -> MessageStream<'a> {
    MessageStream {
        messages: mbox::split(input, options.mode),
        max_depth: options.clamped().max_depth,
    }
}

/// Skip the `From ` separator line at the start of MBOX messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        return match data.iter().position(|&b| b == b'\n') {
            Some(pos) => &data[pos + 1..],
            None => &[],
        };
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::mime::MAX_DEPTH;

    fn raw(bytes: &[u8]) -> RawMessage<'_> {
        RawMessage {
            index: 0,
            offset: 0,
            bytes,
        }
    }

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        let result = skip_from_line(data);
        assert!(result.starts_with(b"Subject:"));
    }

    #[test]
    fn test_skip_from_line_no_from() {
        let data = b"Subject: Test\n\nBody\n";
        let result = skip_from_line(data);
        assert_eq!(result, data);
    }

    #[test]
    fn test_assemble_header_fields() {
        let data = b"From: \"HTML Sender\" <sender@example.com>\r\n\
To: \"HTML Recipient\" <recipient@example.com>, other@example.com\r\n\
Reply-To: replies@example.com\r\n\
Return-Path: <bounce@example.com>\r\n\
Subject: =?UTF-8?B?SG9sYSBtdW5kbw==?=\r\n\
Date: Thu, 04 Jan 2024 10:00:00 +0000\r\n\
Message-ID:  <html@example.com> \r\n\
Content-Type: text/html\r\n\
\r\n\
<h1>Hello</h1><p>This is a <a href=\"https://example.org\">link</a>.</p>";
        let msg = assemble(&raw(data), MAX_DEPTH).unwrap();
        assert_eq!(msg.message_id, "html@example.com");
        assert_eq!(msg.from.len(), 1);
        assert_eq!(msg.from[0].to_string(), "\"HTML Sender\" <sender@example.com>");
        assert_eq!(msg.to.len(), 2);
        assert_eq!(msg.to[1].address, "other@example.com");
        assert_eq!(msg.reply_to[0].address, "replies@example.com");
        assert_eq!(msg.return_path.as_deref(), Some("bounce@example.com"));
        assert_eq!(msg.subject, "Hola mundo");
        assert_eq!(
            msg.date.map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
            Some("2024-01-04 10:00".to_string())
        );
        assert_eq!(
            msg.body.split_whitespace().collect::<Vec<_>>().join(" "),
            "Hello This is a link ."
        );
        assert_eq!(msg.urls, vec!["https://example.org"]);
    }

    #[test]
    fn test_assemble_missing_fields_are_empty() {
        let msg = assemble(&raw(b"X-Custom: 1\n\nhello\n"), MAX_DEPTH).unwrap();
        assert!(msg.message_id.is_empty());
        assert!(msg.from.is_empty());
        assert!(msg.subject.is_empty());
        assert!(msg.date.is_none());
        assert!(msg.return_path.is_none());
        assert_eq!(msg.body, "hello");
    }

    #[test]
    fn test_assemble_framing_errors() {
        let err = assemble(&raw(b"garbage without colon\n\nbody\n"), MAX_DEPTH).unwrap_err();
        assert!(matches!(err, MailError::Framing { offset: 0, .. }));

        let err = assemble(&raw(b"From someone Thu Jan 01\n\n"), MAX_DEPTH).unwrap_err();
        assert!(matches!(err, MailError::Framing { .. }));
    }

    #[test]
    fn test_stream_continues_after_failure() {
        let input = b"From a Thu\nSubject: one\n\nfirst\n\n\
From b Thu\nnot a header line\n\nsecond\n\n\
From c Thu\nSubject: three\n\nthird\n";
        let options = ParsingConfig {
            mode: InputMode::Auto,
            max_depth: MAX_DEPTH,
        };
        let stream = normalize_stream(input, &options);
        assert_eq!(stream.mode(), InputMode::Mbox);

        let results: Vec<_> = stream.collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().subject, "one");
        assert!(results[1].is_err());
        let third = results[2].as_ref().unwrap();
        assert_eq!(third.subject, "three");
        assert_eq!(third.index, 2);
        assert_eq!(third.body, "third");
    }
}
