//! `mailnorm`: raw email to analysis-ready text.
//!
//! This crate splits MBOX containers into messages, walks each message's
//! MIME tree, converts text parts to UTF-8, strips HTML markup, and collects
//! a deduplicated list of the URLs found along the way.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;

pub use model::message::NormalizedMessage;
pub use parser::mbox::InputMode;
pub use parser::message::{assemble, normalize_stream, MessageStream};
