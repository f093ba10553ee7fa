//! Grid geometry: cell counts and pixel bounds.

use crate::constants::{
    DEFAULT_AUTO_COLUMNS, DEFAULT_CELL_HEIGHT, DEFAULT_CELL_WIDTH, DEFAULT_LEFT_OFFSET,
    DEFAULT_RIGHT_PADDING, DEFAULT_ROWS, DEFAULT_ROW_SPACING, DEFAULT_SCREEN_WIDTH,
    DEFAULT_TOP_OFFSET, GROUP_HEADER_HEIGHT, MAX_LAYOUT_KNOB,
};
use crate::error::{ConvertError, Result};
use crate::models::{Bounds, GridPosition};
use serde::{Deserialize, Serialize};

/// `cell_width` knob: a pixel width, or `auto` to fill the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CellWidthValue", into = "CellWidthValue")]
pub enum CellWidth {
    /// Derived from the screen width and column count
    Auto,
    /// Fixed width in pixels
    Fixed(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CellWidthValue {
    Pixels(u32),
    Keyword(String),
}

impl TryFrom<CellWidthValue> for CellWidth {
    type Error = String;

    fn try_from(value: CellWidthValue) -> std::result::Result<Self, Self::Error> {
        match value {
            CellWidthValue::Pixels(width) => Ok(Self::Fixed(width)),
            CellWidthValue::Keyword(word) if word.trim().eq_ignore_ascii_case("auto") => {
                Ok(Self::Auto)
            }
            CellWidthValue::Keyword(word) => Err(format!(
                "cell_width must be a number of pixels or 'auto', got '{word}'"
            )),
        }
    }
}

impl From<CellWidth> for CellWidthValue {
    fn from(width: CellWidth) -> Self {
        match width {
            CellWidth::Auto => Self::Keyword("auto".to_string()),
            CellWidth::Fixed(width) => Self::Pixels(width),
        }
    }
}

/// Layout knobs, read from the `layout:` frontmatter block.
///
/// Every knob is optional in the document; missing knobs take the built-in
/// defaults. `padding` sets the gap between cells (defaulting to
/// `right_padding`) and `cols` fixes the column count instead of deriving it
/// from the screen width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Usable screen width in pixels
    #[serde(alias = "screen_width_controls")]
    pub screen_width: u32,
    /// Width of one cell
    pub cell_width: CellWidth,
    /// Gap to the right of every cell, and the right margin for `auto` widths
    pub right_padding: u32,
    /// Gap between adjacent cells
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
    /// Explicit columns per row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    /// Rows per page
    pub rows: u32,
    /// Height of one cell
    pub cell_height: u32,
    /// Gap between rows
    pub row_spacing: u32,
    /// Left margin
    pub left_offset: u32,
    /// Top margin
    pub top_offset: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            screen_width: DEFAULT_SCREEN_WIDTH,
            cell_width: CellWidth::Fixed(DEFAULT_CELL_WIDTH),
            right_padding: DEFAULT_RIGHT_PADDING,
            padding: None,
            cols: None,
            rows: DEFAULT_ROWS,
            cell_height: DEFAULT_CELL_HEIGHT,
            row_spacing: DEFAULT_ROW_SPACING,
            left_offset: DEFAULT_LEFT_OFFSET,
            top_offset: DEFAULT_TOP_OFFSET,
        }
    }
}

impl GridConfig {
    /// Rejects knobs too large to lay out.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Metadata`] naming the first knob above
    /// [`MAX_LAYOUT_KNOB`].
    pub fn validate(&self) -> Result<()> {
        let fixed_width = match self.cell_width {
            CellWidth::Fixed(width) => Some(width),
            CellWidth::Auto => None,
        };
        let knobs = [
            ("screen_width", Some(self.screen_width)),
            ("cell_width", fixed_width),
            ("right_padding", Some(self.right_padding)),
            ("padding", self.padding),
            ("cols", self.cols),
            ("rows", Some(self.rows)),
            ("cell_height", Some(self.cell_height)),
            ("row_spacing", Some(self.row_spacing)),
            ("left_offset", Some(self.left_offset)),
            ("top_offset", Some(self.top_offset)),
        ];

        for (name, value) in knobs {
            if let Some(value) = value.filter(|&v| v > MAX_LAYOUT_KNOB) {
                return Err(ConvertError::Metadata(format!(
                    "layout {name} is {value}, at most {MAX_LAYOUT_KNOB} is supported"
                )));
            }
        }
        Ok(())
    }

    /// Gap between adjacent cells.
    #[must_use]
    pub fn gap(&self) -> u32 {
        self.padding.unwrap_or(self.right_padding)
    }

    /// Cells per row.
    ///
    /// `cols` when given; otherwise `floor(screen_width / (cell_width + gap))`
    /// for fixed widths and 6 for `auto`. Never less than 1.
    #[must_use]
    pub fn columns(&self) -> u32 {
        match (self.cols, self.cell_width) {
            (Some(cols), _) => cols.max(1),
            (None, CellWidth::Auto) => DEFAULT_AUTO_COLUMNS,
            (None, CellWidth::Fixed(width)) => self
                .screen_width
                .checked_div(width.saturating_add(self.gap()))
                .unwrap_or(1)
                .max(1),
        }
    }

    /// Width of one cell in pixels, resolving `auto`.
    #[must_use]
    pub fn cell_width(&self) -> u32 {
        match self.cell_width {
            CellWidth::Fixed(width) => width,
            CellWidth::Auto => {
                let columns = self.columns();
                let margins = self
                    .left_offset
                    .saturating_add(self.right_padding)
                    .saturating_add((columns - 1).saturating_mul(self.gap()));
                (self.screen_width.saturating_sub(margins) / columns).max(1)
            }
        }
    }

    /// Horizontal distance between the left edges of adjacent cells.
    #[must_use]
    pub fn column_pitch(&self) -> u32 {
        self.cell_width().saturating_add(self.gap())
    }

    /// Vertical distance between the top edges of adjacent rows.
    #[must_use]
    pub const fn row_pitch(&self) -> u32 {
        self.cell_height.saturating_add(self.row_spacing)
    }

    /// Rows per page, at least 1.
    #[must_use]
    pub fn rows_per_page(&self) -> u32 {
        self.rows.max(1)
    }

    fn origin(&self, position: GridPosition) -> (u32, u32) {
        (
            self.left_offset
                .saturating_add(position.col.saturating_mul(self.column_pitch())),
            self.top_offset
                .saturating_add(position.row.saturating_mul(self.row_pitch())),
        )
    }

    /// Rectangle of a widget starting at `position` and spanning `cells` columns.
    #[must_use]
    pub fn cell_bounds(&self, position: GridPosition, cells: u32) -> Bounds {
        let (x, y) = self.origin(position);
        Bounds::new(x, y, self.span_width(cells), self.cell_height)
    }

    /// Rectangle of a group header strip above the row of `position`.
    #[must_use]
    pub fn group_bounds(&self, position: GridPosition, span: u32) -> Bounds {
        let (x, cell_top) = self.origin(position);
        Bounds::new(
            x,
            cell_top.saturating_sub(GROUP_HEADER_HEIGHT),
            self.span_width(span),
            GROUP_HEADER_HEIGHT,
        )
    }

    /// Width of `cells` adjacent cells including the gaps between them.
    fn span_width(&self, cells: u32) -> u32 {
        if cells == 0 {
            return 0;
        }
        cells
            .saturating_mul(self.cell_width())
            .saturating_add((cells - 1).saturating_mul(self.gap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        // 1024 / (146 + 24) = 6.02
        assert_eq!(GridConfig::default().columns(), 6);
    }

    #[test]
    fn test_columns_never_zero() {
        let grid = GridConfig {
            screen_width: 50,
            ..GridConfig::default()
        };
        assert_eq!(grid.columns(), 1);

        let degenerate = GridConfig {
            cell_width: CellWidth::Fixed(0),
            right_padding: 0,
            ..GridConfig::default()
        };
        assert_eq!(degenerate.columns(), 1);
    }

    #[test]
    fn test_cell_bounds() {
        let grid = GridConfig::default();
        assert_eq!(
            grid.cell_bounds(GridPosition::new(0, 0), 1),
            Bounds::new(10, 25, 146, 83)
        );
        assert_eq!(
            grid.cell_bounds(GridPosition::new(1, 2), 1),
            Bounds::new(10 + 2 * 170, 25 + 93, 146, 83)
        );
        // Envelope: two cells plus the padding between them
        assert_eq!(grid.cell_bounds(GridPosition::new(0, 0), 2).width, 316);
    }

    #[test]
    fn test_group_bounds_sit_above_row() {
        let grid = GridConfig::default();
        let strip = grid.group_bounds(GridPosition::new(1, 0), 3);
        assert_eq!(strip.y, 25 + 93 - 16);
        assert_eq!(strip.height, 16);
        assert_eq!(strip.width, 3 * 146 + 2 * 24);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let grid: GridConfig = serde_yml::from_str("rows: 4\ncell_width: 120\n").unwrap();
        assert_eq!(grid.rows, 4);
        assert_eq!(grid.cell_width, CellWidth::Fixed(120));
        assert_eq!(grid.screen_width, DEFAULT_SCREEN_WIDTH);
    }

    #[test]
    fn test_auto_width_fills_screen() {
        let grid: GridConfig =
            serde_yml::from_str("cell_width: auto\nscreen_width: 800\ncols: 4\npadding: 10\nright_padding: 30\n")
                .unwrap();
        assert_eq!(grid.cell_width, CellWidth::Auto);
        assert_eq!(grid.columns(), 4);
        // (800 - 10 - 30 - 3 * 10) / 4
        assert_eq!(grid.cell_width(), 182);
        assert_eq!(
            grid.cell_bounds(GridPosition::new(0, 1), 1),
            Bounds::new(10 + 192, 25, 182, 83)
        );
    }

    #[test]
    fn test_auto_width_defaults_to_six_columns() {
        let grid: GridConfig = serde_yml::from_str("cell_width: AUTO\n").unwrap();
        assert_eq!(grid.columns(), 6);
        assert_eq!(grid.cell_width(), (1024 - 10 - 24 - 5 * 24) / 6);
    }

    #[test]
    fn test_cell_width_rejects_other_words() {
        assert!(serde_yml::from_str::<GridConfig>("cell_width: wide\n").is_err());
    }

    #[test]
    fn test_huge_knobs_are_rejected() {
        let grid = GridConfig {
            cell_width: CellWidth::Fixed(4_294_967_290),
            right_padding: 100,
            ..GridConfig::default()
        };
        let err = grid.validate().unwrap_err();
        assert!(matches!(err, ConvertError::Metadata(_)));
        assert!(err.to_string().contains("cell_width"));
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_geometry_saturates_instead_of_overflowing() {
        let grid = GridConfig {
            cell_width: CellWidth::Fixed(u32::MAX - 5),
            right_padding: 100,
            cols: Some(u32::MAX),
            ..GridConfig::default()
        };
        let bounds = grid.cell_bounds(GridPosition::new(u32::MAX, 3), 2);
        assert_eq!(bounds.x, u32::MAX);
        assert_eq!(bounds.width, u32::MAX);
    }
}
