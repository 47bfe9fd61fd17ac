//! Charset normalization: declared legacy charsets to UTF-8.
//!
//! The label table is built once and never mutated, so it can be shared
//! freely between threads. Anything the table cannot handle is passed
//! through unchanged: callers always get text back, never an error.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use encoding_rs::Encoding;
use tracing::{debug, warn};

/// Lower-cased charset label → decoder.
static DECODERS: LazyLock<HashMap<&'static str, &'static Encoding>> = LazyLock::new(|| {
    use encoding_rs::*;

    let table: [(&str, &'static Encoding); 25] = [
        // Japanese
        ("iso-2022-jp", ISO_2022_JP),
        ("csiso2022jp", ISO_2022_JP),
        ("shift_jis", SHIFT_JIS),
        ("shift-jis", SHIFT_JIS),
        ("sjis", SHIFT_JIS),
        ("x-sjis", SHIFT_JIS),
        ("windows-31j", SHIFT_JIS),
        ("cp932", SHIFT_JIS),
        ("euc-jp", EUC_JP),
        ("euc_jp", EUC_JP),
        // Western
        ("us-ascii", WINDOWS_1252),
        ("iso-8859-1", WINDOWS_1252),
        ("latin1", WINDOWS_1252),
        ("windows-1252", WINDOWS_1252),
        ("iso-8859-15", ISO_8859_15),
        // Cyrillic
        ("windows-1251", WINDOWS_1251),
        ("koi8-r", KOI8_R),
        // Chinese
        ("gb2312", GBK),
        ("gbk", GBK),
        ("gb18030", GB18030),
        ("big5", BIG5),
        // Korean
        ("euc-kr", EUC_KR),
        ("ks_c_5601-1987", EUC_KR),
        // Already UTF-8, but spelled differently
        ("utf8", UTF_8),
        ("unicode-1-1-utf-8", UTF_8),
    ];
    table.into_iter().collect()
});

/// Look up the decoder for a charset label (case-insensitive, surrounding
/// whitespace and quotes ignored).
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    let key = label.trim().trim_matches('"').to_ascii_lowercase();
    DECODERS.get(key.as_str()).copied()
}

/// Decode `bytes` declared as `label` into UTF-8 text.
///
/// - `None`, an empty label or `utf-8` → bytes are taken as UTF-8 as-is.
/// - A label in the table → decoded with that charset.
/// - An unknown label, or malformed input for the charset → pass-through.
///
/// Pass-through never fails: bytes that are not valid UTF-8 are replaced
/// with U+FFFD, so the result is always valid UTF-8 and is byte-identical to
/// the input whenever the input already was.
pub fn normalize<'a>(bytes: &'a [u8], label: Option<&str>) -> Cow<'a, str> {
    let label = label.map(str::trim).unwrap_or("");
    if label.is_empty() || label.eq_ignore_ascii_case("utf-8") {
        return String::from_utf8_lossy(bytes);
    }

    let Some(encoding) = lookup(label) else {
        warn!(charset = label, "Unsupported charset, passing bytes through");
        return String::from_utf8_lossy(bytes);
    };

    debug!(charset = label, decoder = encoding.name(), "Decoding part");
    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => {
            warn!(
                charset = label,
                "Malformed input for declared charset, passing bytes through"
            );
            String::from_utf8_lossy(bytes)
        }
    }
}
