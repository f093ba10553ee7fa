//! Output formats: preset JSON for the device and Markdown for people.

pub mod markdown;
pub mod preset_json;

pub use markdown::render_document;
pub use preset_json::{emit_preset, preset_file};
