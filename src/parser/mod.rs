//! Parsing for Markdown preset documents and preset JSON.
//!
//! The Markdown pipeline runs frontmatter → device templates → sections and
//! tables → address and value cells → control model. Preset JSON is read
//! back by a separate, lossy importer.

pub mod address;
pub mod builder;
pub mod frontmatter;
pub mod markdown;
pub mod preprocess;
pub mod preset_json;
pub mod table;
pub mod values;

// Re-export commonly used functions
pub use frontmatter::{generate_frontmatter, parse_frontmatter, Metadata};
pub use markdown::parse_document;
pub use preset_json::{import_preset, Diagnostic, DiagnosticKind, ImportedPreset};
