//! Extraction engine - from freeform assistant text to a structured request
//!
//! Pipeline: reformat the raw reply, split it into heading-delimited sections,
//! run the field extractors over the preferred and fallback scopes, then
//! classify the result.

pub mod classify;
pub mod decode;
pub mod fields;
pub mod reformat;
pub mod sections;
pub mod synth;

pub use classify::is_executable;
pub use decode::{normalize_value, unescape_angles};
pub use reformat::normalize_reply;
pub use sections::{find_headings, Heading};
pub use synth::{synthesize, synthesize_for_section, synthesize_scoped};
