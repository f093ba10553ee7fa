//! Canonical document model shared by the Markdown parser, the preset
//! importer and the Markdown renderer.

use crate::layout::GridConfig;
use crate::models::{Color, Control, Device};
use serde::{Deserialize, Serialize};

/// How group header strips are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStyle {
    /// Plain group headers
    #[default]
    Default,
    /// Highlighted group headers
    Highlighted,
}

impl GroupStyle {
    /// Variant name written to preset JSON, if any.
    #[must_use]
    pub const fn variant(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Highlighted => Some("highlighted"),
        }
    }
}

/// Group header row: a named strip over the next `span` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMarker {
    /// Header text
    pub label: String,
    /// Number of cells covered
    pub span: u8,
    /// Strip color
    pub color: Option<Color>,
}

impl GroupMarker {
    /// Creates a group marker without a color.
    pub fn new(label: impl Into<String>, span: u8) -> Self {
        Self {
            label: label.into(),
            span,
            color: None,
        }
    }

    /// Sets the strip color.
    #[must_use]
    pub const fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }
}

/// One meaningful table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// A control
    Control(Control),
    /// A group header
    Group(GroupMarker),
    /// An empty grid cell
    Blank,
}

/// Rows of one Markdown table, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table entries
    pub entries: Vec<Entry>,
}

impl Table {
    /// Creates a table from its entries.
    #[must_use]
    pub const fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Iterates over the controls of this table.
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Control(control) => Some(control),
            Entry::Group(_) | Entry::Blank => None,
        })
    }
}

/// A `##` section and the tables under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text
    pub name: String,
    /// Tables in document order
    pub tables: Vec<Table>,
}

impl Section {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Iterates over every control in the section.
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.tables.iter().flat_map(Table::controls)
    }
}

/// A whole preset description, independent of where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Preset name (the `# Title`)
    pub title: String,
    /// Preset schema version
    pub version: u32,
    /// Declared devices, indexed from 1
    pub devices: Vec<Device>,
    /// Group header style
    pub group_style: GroupStyle,
    /// Grid geometry
    pub grid: GridConfig,
    /// Sections in document order
    pub sections: Vec<Section>,
}

impl Document {
    /// Looks up a device by its 1-based index.
    #[must_use]
    pub fn device(&self, index: u8) -> Option<&Device> {
        self.devices.iter().find(|device| device.index == index)
    }

    /// True when more than one device is declared.
    #[must_use]
    pub fn is_multi_device(&self) -> bool {
        self.devices.len() > 1
    }

    /// Iterates over every control in the document.
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.sections.iter().flat_map(Section::controls)
    }

    /// Number of controls in the document.
    #[must_use]
    pub fn control_count(&self) -> usize {
        self.controls().count()
    }
}
