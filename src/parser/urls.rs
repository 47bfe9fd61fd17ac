//! URL harvesting from text and HTML parts.
//!
//! Two passes per text unit: `href` attribute values (HTML only), then
//! free-text `http(s)://` tokens from the tag-stripped text. The scheme is
//! matched case-insensitively in both passes and kept as written. Every URL
//! has its trailing sentence punctuation trimmed before deduplication.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static RE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["'](https?://[^"']+)["']"#).expect("valid href pattern")
});

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s"<>]+"#).expect("valid url pattern"));

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("valid tag pattern"));

/// Characters trimmed from the end of every extracted URL.
const TRAILING_PUNCTUATION: &[char] = &['.', '?', '!', ',', ';', ')'];

/// Insertion-ordered set of URLs; the first occurrence keeps its position.
#[derive(Debug, Clone, Default)]
pub struct UrlSet {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL after trimming. Returns `false` if it was already present
    /// or trimmed down to nothing but a scheme.
    pub fn insert(&mut self, url: &str) -> bool {
        let Some(url) = trim_url(url) else {
            return false;
        };
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.urls.push(url.to_string());
        true
    }

    pub fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.insert(url.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Result of running both passes over one text unit.
#[derive(Debug)]
pub struct Extracted<'a> {
    /// The text with markup replaced by spaces (unchanged for plain text).
    pub text: Cow<'a, str>,
    /// URLs in first-seen order, trimmed and deduplicated.
    pub urls: Vec<String>,
}

/// Strip markup and harvest URLs from one text unit.
pub fn extract(text: &str, is_html: bool) -> Extracted<'_> {
    let mut urls = UrlSet::new();

    if is_html {
        urls.extend(
            RE_HREF
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str()),
        );
    }

    let text = if is_html {
        strip_tags(text)
    } else {
        Cow::Borrowed(text)
    };

    urls.extend(RE_URL.find_iter(&text).map(|m| m.as_str()));

    Extracted {
        text,
        urls: urls.into_vec(),
    }
}

/// Harvest URLs from one text unit without keeping the stripped text.
pub fn harvest(text: &str, is_html: bool) -> Vec<String> {
    extract(text, is_html).urls
}

/// Replace every `<...>` tag span with a single space.
pub fn strip_tags(html: &str) -> Cow<'_, str> {
    RE_TAG.replace_all(html, " ")
}

/// Trim trailing sentence punctuation; `None` if only the scheme is left.
fn trim_url(url: &str) -> Option<&str> {
    let trimmed = url.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let scheme_only = ["https://", "http://"]
        .iter()
        .any(|scheme| trimmed.eq_ignore_ascii_case(scheme));
    if trimmed.is_empty() || scheme_only {
        None
    } else {
        Some(trimmed)
    }
}
