//! Data models for documents, controls and laid-out presets.
//!
//! This module contains all the core data structures used throughout the application.
//! Models are independent of parsing, layout and file I/O.

pub mod color;
pub mod control;
pub mod device;
pub mod document;
pub mod preset;
pub mod preset_file;

// Re-export all model types
pub use color::Color;
pub use control::{
    Address, Choice, Control, ControlMode, ControlType, EnvelopeKind, Message, MessageKind,
    ValueRange,
};
pub use device::Device;
pub use document::{Document, Entry, GroupMarker, GroupStyle, Section, Table};
pub use preset::{Bounds, GridPosition, Page, PlacedControl, PlacedGroup, Preset};
