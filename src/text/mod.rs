//! Auxiliary text operations offered next to spellchecking.

pub mod redact;
pub mod summary;

pub use redact::{redact, DEFAULT_MARKER};
pub use summary::summarize;
