//! Email normalization: container splitting, header framing, MIME walking,
//! charset conversion, and URL harvesting.

pub mod charset;
pub mod header;
pub mod mbox;
pub mod message;
pub mod mime;
pub mod transfer;
pub mod urls;
