//! Presentation of run results.
//!
//! - [`text`]: the human-readable listing (sizes, numbered duplicates,
//!   freed space)
//! - [`json`]: one JSON document for scripting

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
