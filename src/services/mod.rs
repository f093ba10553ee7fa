//! Service layer for business logic.
//!
//! This module contains services that coordinate parsing, layout and export,
//! and the file I/O around them.

pub mod conversion;
pub mod presets;

// Re-export commonly used types and functions
pub use conversion::{ConversionService, ForwardOutput, ReverseOutput};
pub use presets::PresetService;
