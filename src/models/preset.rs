//! Laid-out preset: pages of positioned controls and group strips.

use crate::models::{Color, Control, Device, GroupStyle};

/// Cell coordinate on a page grid (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    /// Grid row
    pub row: u32,
    /// Grid column
    pub col: u32,
}

impl GridPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Pixel rectangle on the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Bounds {
    /// Creates bounds.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `[x, y, width, height]` as written to preset JSON.
    #[must_use]
    pub const fn to_array(self) -> [u32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// A group strip placed on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedGroup {
    /// Preset-wide group id
    pub id: u32,
    /// Header text
    pub label: String,
    /// Declared span in cells
    pub span: u8,
    /// Strip color
    pub color: Option<Color>,
    /// Header style
    pub style: GroupStyle,
    /// Strip rectangle
    pub bounds: Bounds,
}

/// A control placed on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedControl {
    /// Preset-wide control id
    pub id: u32,
    /// The control itself
    pub control: Control,
    /// Enclosing group, if any
    pub group_id: Option<u32>,
    /// First cell the control occupies
    pub position: GridPosition,
    /// Widget rectangle
    pub bounds: Bounds,
}

/// One screen of controls bound to a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page id
    pub id: u32,
    /// Page title
    pub name: String,
    /// Device the page talks to
    pub device: u8,
    /// Group strips in placement order
    pub groups: Vec<PlacedGroup>,
    /// Controls in placement order
    pub controls: Vec<PlacedControl>,
}

/// Final laid-out preset, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// Preset name
    pub name: String,
    /// Schema version
    pub version: u32,
    /// Declared devices
    pub devices: Vec<Device>,
    /// Pages in order
    pub pages: Vec<Page>,
}

impl Preset {
    /// Iterates over every placed control.
    pub fn controls(&self) -> impl Iterator<Item = &PlacedControl> {
        self.pages.iter().flat_map(|page| page.controls.iter())
    }
}
