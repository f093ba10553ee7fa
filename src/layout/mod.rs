//! Layout engine: places a document's entries onto paginated grids.
//!
//! Each section is walked in document order with its own cursor. Controls take
//! one cell (envelopes two), blanks take one cell without producing anything,
//! and group markers reserve a run of cells in a single row for the entries
//! that follow. A section that overflows `columns × rows` continues on a new
//! page; sections never share a page.

pub mod grid;

pub use grid::{CellWidth, GridConfig};

use crate::models::{
    Control, Document, Entry, GridPosition, GroupMarker, GroupStyle, Message, Page, PlacedControl,
    PlacedGroup, Preset, Section,
};
use std::collections::HashMap;
use tracing::debug;

/// Lays out every section of `document` and returns the resulting preset.
///
/// Group spans wider than a row are rejected while the document is built, so
/// this step cannot fail; a span that still exceeds the row is clipped.
#[must_use]
pub fn layout_document(document: &Document) -> Preset {
    let mut ids = IdAllocator::default();
    let mut pages = Vec::new();
    let mut seen_messages: HashMap<(u8, Message), String> = HashMap::new();

    for section in &document.sections {
        let Some(first) = section.controls().next() else {
            debug!("Section '{}' has no controls, no page emitted", section.name);
            continue;
        };

        for control in section.controls() {
            for message in control.address.messages() {
                let key = (control.device, message);
                match seen_messages.get(&key) {
                    Some(previous) if previous != &section.name => debug!(
                        "'{}' in section '{}' reuses a parameter from section '{}'",
                        control.label, section.name, previous
                    ),
                    Some(_) => {}
                    None => {
                        seen_messages.insert(key, section.name.clone());
                    }
                }
            }
        }

        let device = first.device;
        debug!(
            "Section '{}' targets {}",
            section.name,
            document
                .device(device)
                .map_or("an undeclared device", |d| d.name.as_str())
        );
        let mut walker = SectionWalker::new(&document.grid, document.group_style, device);
        walker.walk(section, &mut ids);
        pages.extend(walker.finish(&section.name, &mut ids));
    }

    debug!("Laid out {} page(s)", pages.len());

    Preset {
        name: document.title.clone(),
        version: document.version,
        devices: document.devices.clone(),
        pages,
    }
}

/// Sequential preset-wide ids.
#[derive(Debug, Default)]
struct IdAllocator {
    page: u32,
    group: u32,
    control: u32,
}

impl IdAllocator {
    fn next_page(&mut self) -> u32 {
        self.page += 1;
        self.page
    }

    fn next_group(&mut self) -> u32 {
        self.group += 1;
        self.group
    }

    fn next_control(&mut self) -> u32 {
        self.control += 1;
        self.control
    }
}

/// A group still absorbing entries.
#[derive(Debug, Clone, Copy)]
struct ActiveGroup {
    id: u32,
    remaining: u32,
}

/// Page content before the page is named and numbered.
#[derive(Debug, Default)]
struct PageContent {
    groups: Vec<PlacedGroup>,
    controls: Vec<PlacedControl>,
}

impl PageContent {
    fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.controls.is_empty()
    }
}

/// Cursor state for one section.
struct SectionWalker<'a> {
    grid: &'a GridConfig,
    style: GroupStyle,
    device: u8,
    columns: u32,
    rows: u32,
    row: u32,
    col: u32,
    group: Option<ActiveGroup>,
    pages: Vec<PageContent>,
}

impl<'a> SectionWalker<'a> {
    fn new(grid: &'a GridConfig, style: GroupStyle, device: u8) -> Self {
        Self {
            grid,
            style,
            device,
            columns: grid.columns(),
            rows: grid.rows_per_page(),
            row: 0,
            col: 0,
            group: None,
            pages: vec![PageContent::default()],
        }
    }

    fn walk(&mut self, section: &Section, ids: &mut IdAllocator) {
        for (index, table) in section.tables.iter().enumerate() {
            if index > 0 {
                // Groups never reach across tables
                self.group = None;
                if self.col > 0 {
                    self.next_row();
                }
            }
            for entry in &table.entries {
                match entry {
                    Entry::Control(control) => self.place_control(control, ids),
                    Entry::Blank => {
                        self.reserve(1);
                        self.consume(1);
                    }
                    Entry::Group(marker) => self.open_group(marker, ids),
                }
            }
        }
    }

    /// Moves to the start of the next row, breaking the page when it is full.
    fn next_row(&mut self) {
        self.row += 1;
        self.col = 0;
        if self.row >= self.rows {
            self.pages.push(PageContent::default());
            self.row = 0;
            self.group = None;
        }
    }

    /// Ensures `cells` adjacent cells are free in the current row.
    fn reserve(&mut self, cells: u32) {
        if self.col > 0 && self.col + cells > self.columns {
            self.next_row();
        }
    }

    /// Advances the cursor past `cells` cells and charges the active group.
    fn consume(&mut self, cells: u32) {
        self.col += cells;
        if let Some(group) = self.group.as_mut() {
            group.remaining = group.remaining.saturating_sub(cells);
            if group.remaining == 0 {
                self.group = None;
            }
        }
        if self.col >= self.columns {
            self.next_row();
        }
    }

    fn current_page(&mut self) -> &mut PageContent {
        if self.pages.is_empty() {
            self.pages.push(PageContent::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn open_group(&mut self, marker: &GroupMarker, ids: &mut IdAllocator) {
        let span = u32::from(marker.span).clamp(1, self.columns);
        self.group = None;
        self.reserve(span);

        let position = GridPosition::new(self.row, self.col);
        let placed = PlacedGroup {
            id: ids.next_group(),
            label: marker.label.clone(),
            span: marker.span,
            color: marker.color,
            style: self.style,
            bounds: self.grid.group_bounds(position, span),
        };
        self.group = Some(ActiveGroup {
            id: placed.id,
            remaining: span,
        });
        self.current_page().groups.push(placed);
    }

    fn place_control(&mut self, control: &Control, ids: &mut IdAllocator) {
        let cells = control.control_type.cell_width().min(self.columns);
        self.reserve(cells);

        let position = GridPosition::new(self.row, self.col);
        let placed = PlacedControl {
            id: ids.next_control(),
            control: control.clone(),
            group_id: self.group.map(|group| group.id),
            position,
            bounds: self.grid.cell_bounds(position, cells),
        };
        self.current_page().controls.push(placed);
        self.consume(cells);
    }

    /// Names and numbers the section's non-empty pages.
    fn finish(self, name: &str, ids: &mut IdAllocator) -> Vec<Page> {
        let device = self.device;
        let contents: Vec<PageContent> =
            self.pages.into_iter().filter(|page| !page.is_empty()).collect();
        let total = contents.len();

        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| Page {
                id: ids.next_page(),
                name: if total > 1 {
                    format!("{name} ({}/{total})", index + 1)
                } else {
                    name.to_string()
                },
                device,
                groups: content.groups,
                controls: content.controls,
            })
            .collect()
    }
}
