//! Core data model types: addresses, MIME part trees, and normalized messages.

pub mod address;
pub mod message;
pub mod part;
