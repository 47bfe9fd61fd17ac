//! Header-block framing and field access.
//!
//! This module decides where a header block ends and whether it is a header
//! block at all. Structured fields (content type, addresses, encoded-word
//! subjects, dates) are delegated to `mail-parser`.

use mail_parser::{Message, MessageParser, MimeHeaders};

/// Declared media type and the parameters the walker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    /// Lower-cased `type/subtype`.
    pub media_type: String,
    /// The `charset` parameter, if any.
    pub charset: Option<String>,
    /// The `boundary` parameter, if any (may be empty).
    pub boundary: Option<String>,
    /// The `Content-Transfer-Encoding` value, if any.
    pub transfer_encoding: Option<String>,
}

impl Default for ContentInfo {
    /// RFC 2045 default: `text/plain; charset=us-ascii`, identity encoding.
    fn default() -> Self {
        Self {
            media_type: "text/plain".to_string(),
            charset: None,
            boundary: None,
            transfer_encoding: None,
        }
    }
}

impl ContentInfo {
    pub fn is_multipart(&self) -> bool {
        self.media_type.starts_with("multipart/")
    }
}

/// A validated header block: unfolded `(lowercase_name, value)` pairs plus
/// the structured view from `mail-parser`.
pub struct HeaderBlock<'a> {
    fields: Vec<(String, String)>,
    parsed: Option<Message<'a>>,
}

impl<'a> HeaderBlock<'a> {
    /// Validate and parse a raw header block (as returned by
    /// [`split_header_block`]).
    ///
    /// An empty block is valid (every field takes its default). A line that
    /// is neither a `name: value` field nor a continuation is an error.
    pub fn parse(raw: &'a [u8]) -> Result<Self, String> {
        let text = decode_header_bytes(raw);
        let fields = unfold_headers(&text)?;
        if fields.is_empty() {
            return Ok(Self {
                fields,
                parsed: None,
            });
        }

        let parsed = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| "header block could not be parsed".to_string())?;

        Ok(Self {
            fields,
            parsed: Some(parsed),
        })
    }

    /// `true` when the block carried no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the first raw (unfolded, undecoded) value for a header name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The structured message view, if the block had any fields.
    pub fn message(&self) -> Option<&Message<'a>> {
        self.parsed.as_ref()
    }

    /// Content type and parameters, defaulting to `text/plain` when the
    /// header is absent or unparseable.
    pub fn content_info(&self) -> ContentInfo {
        let Some(part) = self.parsed.as_ref().map(|m| m.root_part()) else {
            return ContentInfo::default();
        };

        let transfer_encoding = part
            .content_transfer_encoding()
            .map(|enc| enc.trim().to_ascii_lowercase());

        match part.content_type() {
            Some(ct) => {
                let main = ct.ctype().to_ascii_lowercase();
                let media_type = match ct.subtype() {
                    Some(sub) => format!("{main}/{}", sub.to_ascii_lowercase()),
                    None => main,
                };
                ContentInfo {
                    media_type,
                    charset: ct.attribute("charset").map(|c| c.trim().to_string()),
                    boundary: ct.attribute("boundary").map(|b| b.to_string()),
                    transfer_encoding,
                }
            }
            None => ContentInfo {
                transfer_encoding,
                ..ContentInfo::default()
            },
        }
    }
}

/// Split an entity into its header block and body.
///
/// The header block keeps its final line terminator; the blank separator
/// line belongs to neither half. Without a blank line everything is header.
pub fn split_header_block(data: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = data.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = data.strip_prefix(b"\n") {
        return (&[], rest);
    }

    for (i, &b) in data.iter().enumerate() {
        if b != b'\n' {
            continue;
        }
        let after = &data[i + 1..];
        if after.starts_with(b"\r\n") {
            return (&data[..i + 1], &after[2..]);
        }
        if after.starts_with(b"\n") {
            return (&data[..i + 1], &after[1..]);
        }
    }
    (data, &[])
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold headers: join continuation lines (starting with space or tab) with the previous header.
///
/// Returns a list of `(lowercase_name, raw_value)` pairs, or a description
/// of the first line that is not a header field.
fn unfold_headers(text: &str) -> Result<Vec<(String, String)>, String> {
    let mut result: Vec<(String, String)> = Vec::new();

    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            match result.last_mut() {
                Some(last) => {
                    last.1.push(' ');
                    last.1.push_str(line.trim());
                }
                None => return Err(format!("line {}: continuation before any field", n + 1)),
            }
        } else if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim_end();
            if !is_field_name(name) {
                return Err(format!("line {}: invalid field name {name:?}", n + 1));
            }
            let value = line[colon_pos + 1..].trim().to_string();
            result.push((name.to_ascii_lowercase(), value));
        } else {
            return Err(format!("line {}: not a header field", n + 1));
        }
    }

    Ok(result)
}

/// RFC 5322 field name: one or more printable ASCII characters except `:`.
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// Extract content between `<` and `>` (for Return-Path, Message-ID).
pub fn extract_angle_bracket(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(end) = trimmed[start..].find('>') {
            return trimmed[start + 1..start + end].trim().to_string();
        }
    }
    trimmed.to_string()
}
