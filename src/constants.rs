//! Application-wide constants.
//!
//! This module defines the application name and the built-in defaults used
//! when a document's frontmatter leaves a value unspecified.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "md2preset";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "md2preset";

/// Title used when a document has no `# Heading`.
pub const DEFAULT_TITLE: &str = "Untitled Preset";

/// Section name for tables that appear before the first `##` heading.
pub const DEFAULT_SECTION: &str = "MAIN";

/// Device name used when frontmatter declares none.
pub const DEFAULT_DEVICE_NAME: &str = "Generic MIDI";

/// Preset schema version written when frontmatter declares none.
pub const DEFAULT_PRESET_VERSION: u32 = 2;

/// Default MIDI port.
pub const DEFAULT_PORT: u8 = 1;

/// Default MIDI channel.
pub const DEFAULT_CHANNEL: u8 = 1;

/// Default usable screen width in pixels (the layout width budget).
pub const DEFAULT_SCREEN_WIDTH: u32 = 1024;

/// Default width of one grid cell in pixels.
pub const DEFAULT_CELL_WIDTH: u32 = 146;

/// Default gap to the right of every cell in pixels.
pub const DEFAULT_RIGHT_PADDING: u32 = 24;

/// Default number of grid rows per page.
pub const DEFAULT_ROWS: u32 = 6;

/// Default height of one grid cell in pixels.
pub const DEFAULT_CELL_HEIGHT: u32 = 83;

/// Default vertical gap between grid rows in pixels.
pub const DEFAULT_ROW_SPACING: u32 = 10;

/// Default left margin of the grid in pixels.
pub const DEFAULT_LEFT_OFFSET: u32 = 10;

/// Default top margin of the grid in pixels.
pub const DEFAULT_TOP_OFFSET: u32 = 25;

/// Columns per row when `cell_width: auto` is used without `cols`.
pub const DEFAULT_AUTO_COLUMNS: u32 = 6;

/// Largest accepted value for any layout knob.
pub const MAX_LAYOUT_KNOB: u32 = 65_535;

/// Height of a group header strip in pixels.
pub const GROUP_HEADER_HEIGHT: u32 = 16;

/// Token replaced by the device index in templated sections.
pub const DEVICE_TOKEN: &str = "<device>";
