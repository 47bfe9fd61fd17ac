//! Content-Transfer-Encoding decoding for leaf payloads.
//!
//! Undecodable payloads fall back to the raw bytes; a part is never lost
//! because its transfer encoding is broken.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::warn;

/// Standard alphabet that accepts missing padding and non-zero trailing
/// bits, both common in mail produced by real clients.
static LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a leaf payload according to its `Content-Transfer-Encoding`.
///
/// `7bit`, `8bit`, `binary`, missing and unknown encodings are identity.
pub fn decode<'a>(payload: &'a [u8], encoding: Option<&str>) -> Cow<'a, [u8]> {
    let Some(encoding) = encoding.map(str::trim) else {
        return Cow::Borrowed(payload);
    };

    if encoding.eq_ignore_ascii_case("base64") {
        match decode_base64(payload) {
            Some(bytes) => Cow::Owned(bytes),
            None => {
                warn!("Invalid base64 payload, keeping raw bytes");
                Cow::Borrowed(payload)
            }
        }
    } else if encoding.eq_ignore_ascii_case("quoted-printable") {
        Cow::Owned(decode_quoted_printable(payload))
    } else {
        Cow::Borrowed(payload)
    }
}

/// Base64 with line breaks and other whitespace removed.
fn decode_base64(payload: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(&compact).ok()
}

/// Quoted-printable (RFC 2045 §6.7): `=XX` → byte, `=` at end of line is a
/// soft break, even with transport padding (spaces or tabs) before the line
/// break. Malformed escapes are kept literally.
fn decode_quoted_printable(payload: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(payload.len());
    let mut i = 0;
    while i < payload.len() {
        match payload[i] {
            b'=' => {
                let rest = &payload[i + 1..];
                let padding = rest
                    .iter()
                    .take_while(|&&b| b == b' ' || b == b'\t')
                    .count();
                let after = &rest[padding..];
                if after.starts_with(b"\r\n") {
                    i += 1 + padding + 2;
                } else if after.starts_with(b"\n") {
                    i += 1 + padding + 1;
                } else if let Some(byte) = rest.get(..2).and_then(hex_pair) {
                    result.push(byte);
                    i += 3;
                } else {
                    result.push(b'=');
                    i += 1;
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

fn hex_pair(pair: &[u8]) -> Option<u8> {
    let hi = (pair[0] as char).to_digit(16)?;
    let lo = (pair[1] as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_encodings() {
        let body = b"hello\r\nworld";
        for enc in [None, Some("7bit"), Some("8BIT"), Some("binary"), Some("x-weird")] {
            assert_eq!(decode(body, enc).as_ref(), body);
        }
    }

    #[test]
    fn test_base64_with_line_breaks() {
        let body = b"SGVsbG8g\r\nd29ybGQ=\r\n";
        assert_eq!(decode(body, Some("Base64")).as_ref(), b"Hello world");
    }

    #[test]
    fn test_base64_without_padding() {
        assert_eq!(decode(b"SGk", Some("base64")).as_ref(), b"Hi");
    }

    #[test]
    fn test_base64_with_nonzero_trailing_bits() {
        assert_eq!(decode(b"SGl=", Some("base64")).as_ref(), b"Hi");
        assert_eq!(decode(b"SGl", Some("base64")).as_ref(), b"Hi");
    }

    #[test]
    fn test_invalid_base64_keeps_raw() {
        let body = b"not*base64!";
        assert_eq!(decode(body, Some("base64")).as_ref(), body);
    }

    #[test]
    fn test_quoted_printable() {
        let body = b"caf=C3=A9 =\r\nsoft break, a=3Db, bad =ZZ, end=";
        assert_eq!(
            decode(body, Some("quoted-printable")).as_ref(),
            "café soft break, a=b, bad =ZZ, end=".as_bytes()
        );
    }

    #[test]
    fn test_quoted_printable_padded_soft_break() {
        assert_eq!(
            decode(b"hello=  \r\nworld", Some("quoted-printable")).as_ref(),
            b"helloworld"
        );
        assert_eq!(
            decode(b"a=\t\nb= \t\r\nc", Some("quoted-printable")).as_ref(),
            b"abc"
        );
        // Padding that is not followed by a line break is not a soft break.
        assert_eq!(
            decode(b"x= y", Some("quoted-printable")).as_ref(),
            b"x= y"
        );
    }
}
