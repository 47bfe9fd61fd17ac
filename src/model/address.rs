//! Email address records built from `mail-parser` address lists.

/// A parsed email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Build from a single `mail-parser` address.
    pub fn from_addr(addr: &mail_parser::Addr<'_>) -> Self {
        Self {
            display_name: addr.name().unwrap_or_default().trim().to_string(),
            address: addr.address().unwrap_or_default().trim().to_string(),
        }
    }

    /// Flatten a `mail-parser` address list (groups included), dropping
    /// entries without an address.
    pub fn from_list(list: Option<&mail_parser::Address<'_>>) -> Vec<Self> {
        list.map(|list| {
            list.iter()
                .map(Self::from_addr)
                .filter(|a| !a.address.is_empty())
                .collect()
        })
        .unwrap_or_default()
    }

    /// Format for display: `"Display Name <address>"` or just `"<address>"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            format!("<{}>", self.address)
        } else {
            format!("\"{}\" <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_parser::MessageParser;

    fn from_header(raw: &[u8]) -> Vec<EmailAddress> {
        let msg = MessageParser::default().parse(raw).unwrap();
        EmailAddress::from_list(msg.from())
    }

    #[test]
    fn test_bare_address() {
        let list = from_header(b"From: user@example.com\n\n");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].address, "user@example.com");
        assert_eq!(list[0].display_name, "");
    }

    #[test]
    fn test_quoted_name_with_comma() {
        let list = from_header(b"From: \"Last, First\" <user@example.com>, other@c.com\n\n");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].display_name, "Last, First");
        assert_eq!(list[0].address, "user@example.com");
        assert_eq!(list[1].address, "other@c.com");
    }

    #[test]
    fn test_encoded_display_name() {
        let list = from_header(b"From: =?UTF-8?B?Sm9zw6k=?= <jose@example.com>\n\n");
        assert_eq!(list[0].display_name, "José");
    }

    #[test]
    fn test_missing_header_is_empty() {
        assert!(EmailAddress::from_list(None).is_empty());
    }

    #[test]
    fn test_display_with_name() {
        let addr = EmailAddress {
            display_name: "HTML Sender".to_string(),
            address: "sender@example.com".to_string(),
        };
        assert_eq!(addr.display(), "\"HTML Sender\" <sender@example.com>");
    }

    #[test]
    fn test_display_without_name() {
        let addr = EmailAddress {
            display_name: String::new(),
            address: "alice@example.com".to_string(),
        };
        assert_eq!(addr.to_string(), "<alice@example.com>");
    }
}
