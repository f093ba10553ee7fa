//! md2preset library
//!
//! This library converts Markdown documents of MIDI control tables into
//! controller preset JSON, and reads such presets back into Markdown.
//! Parsing, grid layout and export are pure functions over in-memory text;
//! file I/O lives in the service layer.

// Module declarations
pub mod cli;
pub mod constants;
pub mod error;
pub mod export;
pub mod layout;
pub mod models;
pub mod parser;
pub mod services;
