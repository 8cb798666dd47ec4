//! Core data model: history entries, voices, conversations and segments.

pub mod conversation;
pub mod message;
pub mod voice;

pub use conversation::*;
pub use message::*;
pub use voice::*;
