//! Container splitting: one input buffer → raw message byte ranges.
//!
//! In container (MBOX) mode a message starts at every line beginning with
//! `From `. Escaped `>From ` lines are ordinary body lines. The splitter is
//! tolerant of:
//!
//! - Mixed `\n` and `\r\n` line endings
//! - `From ` lines not preceded by a blank line (logs a warning)
//! - Truncated messages at EOF
//! - UTF-8 BOM at the start of the input

use std::fmt;
use std::str::FromStr;

use tracing::warn;

/// How the input buffer is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Container mode if the first non-blank line is a `From ` separator,
    /// single-message mode otherwise.
    #[default]
    Auto,
    /// The whole input is one message.
    Single,
    /// The input is an MBOX container.
    Mbox,
}

impl InputMode {
    /// Resolve `Auto` against the actual input.
    pub fn resolve(self, data: &[u8]) -> Self {
        match self {
            Self::Auto if looks_like_mbox(data) => Self::Mbox,
            Self::Auto => Self::Single,
            other => other,
        }
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "single" | "eml" => Ok(Self::Single),
            "mbox" | "container" => Ok(Self::Mbox),
            other => Err(format!("unknown input mode '{other}' (expected auto, single or mbox)")),
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Single => "single",
            Self::Mbox => "mbox",
        })
    }
}

/// One raw message inside the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a> {
    /// Sequential index within the input (0, 1, 2, …).
    pub index: usize,
    /// Byte offset of the message start (the `From ` line in container mode).
    pub offset: u64,
    /// The message bytes, including any `From ` envelope line.
    pub bytes: &'a [u8],
}

/// Lazy, single-pass sequence of raw messages.
pub struct RawMessages<'a> {
    data: &'a [u8],
    mode: InputMode,
    pos: usize,
    index: usize,
    started: bool,
    done: bool,
}

/// Split `data` into raw messages according to `mode`.
///
/// Empty input, or container input with no `From ` separator at all, yields
/// nothing.
pub fn split(data: &[u8], mode: InputMode) -> RawMessages<'_> {
    RawMessages {
        data,
        mode: mode.resolve(data),
        pos: 0,
        index: 0,
        started: false,
        done: false,
    }
}

impl<'a> RawMessages<'a> {
    /// The mode actually in use (never `Auto`).
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    fn emit(&mut self, start: usize, end: usize) -> RawMessage<'a> {
        let message = RawMessage {
            index: self.index,
            offset: start as u64,
            bytes: &self.data[start..end],
        };
        self.index += 1;
        message
    }

    fn next_single(&mut self) -> Option<RawMessage<'a>> {
        self.done = true;
        if is_blank_line(self.data) {
            return None;
        }
        Some(self.emit(0, self.data.len()))
    }

    fn next_mbox(&mut self) -> Option<RawMessage<'a>> {
        if !self.started {
            self.started = true;
            let Some(first) = find_separator(self.data, 0) else {
                if !is_blank_line(self.data) {
                    warn!("No 'From ' separator found, container holds no messages");
                }
                self.done = true;
                return None;
            };
            if !is_blank_line(&self.data[..first]) {
                warn!(
                    bytes = first,
                    "Discarding data before the first 'From ' separator"
                );
            }
            self.pos = first;
        }

        let start = self.pos;
        let end = match find_separator(self.data, next_line_start(self.data, start)) {
            Some(next) => {
                if !preceded_by_blank_line(self.data, next) {
                    warn!(
                        offset = next,
                        "Found 'From ' separator without preceding blank line"
                    );
                }
                next
            }
            None => {
                self.done = true;
                self.data.len()
            }
        };
        self.pos = end;
        Some(self.emit(start, end))
    }
}

impl<'a> Iterator for RawMessages<'a> {
    type Item = RawMessage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.mode {
            InputMode::Mbox => self.next_mbox(),
            InputMode::Single | InputMode::Auto => self.next_single(),
        }
    }
}

/// `true` if the first non-blank line is a `From ` separator.
pub fn looks_like_mbox(data: &[u8]) -> bool {
    let mut pos = 0;
    while pos < data.len() {
        let line_end = next_line_start(data, pos);
        let line = &data[pos..line_end];
        if !is_blank_line(line) {
            return is_mbox_separator(line);
        }
        pos = line_end;
    }
    false
}

/// Find the first separator line starting at or after the line start `from`.
fn find_separator(data: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < data.len() {
        let line = &data[pos..];
        let is_separator = if pos == 0 {
            is_mbox_separator(line)
        } else {
            line.starts_with(b"From ")
        };
        if is_separator {
            return Some(pos);
        }
        pos = next_line_start(data, pos);
    }
    None
}

/// Offset just past the `\n` ending the line that starts at `pos`.
fn next_line_start(data: &[u8], pos: usize) -> usize {
    match memchr_newline(&data[pos..]) {
        Some(i) => pos + i + 1,
        None => data.len(),
    }
}

/// Whether the line right before offset `at` is blank.
fn preceded_by_blank_line(data: &[u8], at: usize) -> bool {
    let before = &data[..at];
    let before = before.strip_suffix(b"\n").unwrap_or(before);
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    is_blank_line(&before[line_start..])
}

/// Fast newline search (equivalent to memchr for `\n`).
#[inline]
fn memchr_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE: &[u8] = b"From a@example.com Thu Jan 01 00:00:00 2024\n\
Subject: one\n\
\n\
first body\n\
\n\
From b@example.com Thu Jan 01 00:00:00 2024\n\
Subject: two\n\
\n\
>From the top, this is not a separator\n\
\n\
From c@example.com Thu Jan 01 00:00:00 2024\n\
Subject: three\n\
\n\
third body\n";

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator(
            b"From user@example.com Thu Jan 01 00:00:00 2024\n"
        ));
        assert!(!is_mbox_separator(b"from user@example.com\n")); // lowercase
        assert!(!is_mbox_separator(b">From user@example.com\n")); // escaped
        assert!(!is_mbox_separator(b"Subject: From here\n"));
        assert!(!is_mbox_separator(b"From: header@example.com\n"));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(is_blank_line(b"  \n"));
        assert!(!is_blank_line(b"hello\n"));
    }

    #[test]
    fn test_is_mbox_separator_with_bom() {
        let mut line = vec![0xEF, 0xBB, 0xBF];
        line.extend_from_slice(b"From user@example.com Thu Jan 01 00:00:00 2024\n");
        assert!(is_mbox_separator(&line));
        assert_eq!(split(&line, InputMode::Mbox).count(), 1);
    }

    #[test]
    fn test_split_three_messages_in_order() {
        let messages: Vec<_> = split(THREE, InputMode::Mbox).collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].index, 0);
        assert_eq!(messages[0].offset, 0);
        assert!(messages[1].bytes.starts_with(b"From b@example.com"));
        assert!(messages[2].bytes.starts_with(b"From c@example.com"));
        assert!(messages[1]
            .bytes
            .windows(b">From the top".len())
            .any(|w| w == b">From the top"));
        let total: usize = messages.iter().map(|m| m.bytes.len()).sum();
        assert_eq!(total, THREE.len());
    }

    #[test]
    fn test_split_crlf() {
        let data = String::from_utf8_lossy(THREE).replace('\n', "\r\n");
        assert_eq!(split(data.as_bytes(), InputMode::Mbox).count(), 3);
    }

    #[test]
    fn test_separator_without_blank_line_still_splits() {
        let data = b"From a Thu\nSubject: x\n\nbody\nFrom b Thu\nSubject: y\n\nbody\n";
        assert_eq!(split(data, InputMode::Mbox).count(), 2);
    }

    #[test]
    fn test_empty_and_unframed_container() {
        assert_eq!(split(b"", InputMode::Mbox).count(), 0);
        assert_eq!(split(b"\n\n", InputMode::Mbox).count(), 0);
        assert_eq!(split(b"Subject: x\n\nno separator\n", InputMode::Mbox).count(), 0);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let data = b"garbage\n\nFrom a Thu\nSubject: x\n\nbody\n";
        let messages: Vec<_> = split(data, InputMode::Mbox).collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].offset, 9);
    }

    #[test]
    fn test_single_mode() {
        let messages: Vec<_> = split(THREE, InputMode::Single).collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].bytes, THREE);
        assert_eq!(split(b"  \n", InputMode::Single).count(), 0);
    }

    #[test]
    fn test_auto_mode_detection() {
        assert_eq!(InputMode::Auto.resolve(THREE), InputMode::Mbox);
        assert_eq!(
            InputMode::Auto.resolve(b"From: a@b.com\n\nbody"),
            InputMode::Single
        );
        assert_eq!(InputMode::Auto.resolve(b"\nFrom x Thu\n"), InputMode::Mbox);
        assert_eq!(split(THREE, InputMode::Auto).mode(), InputMode::Mbox);
    }

    #[test]
    fn test_input_mode_from_str() {
        assert_eq!("MBOX".parse::<InputMode>(), Ok(InputMode::Mbox));
        assert_eq!("single".parse::<InputMode>(), Ok(InputMode::Single));
        assert!("zip".parse::<InputMode>().is_err());
    }
}
