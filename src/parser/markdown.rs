//! Markdown preset documents: frontmatter, sections and control tables.
//!
//! # Document Format
//!
//! ```markdown
//! ---
//! name: Subsequent 37
//! channel: 3
//! ---
//!
//! # My Preset
//!
//! ## Filter
//!
//! | CC | Label     | Range | Choices | Color   |
//! |----|-----------|-------|---------|---------|
//! | 74 | Cutoff    | 0-127 |         | #F45C51 |
//! | 71 | Resonance | 0-127 |         |         |
//! ```

use crate::error::{ConvertError, Result};
use crate::models::{Document, Section};
use crate::parser::builder::TableBuilder;
use crate::parser::frontmatter::parse_frontmatter;
use crate::parser::preprocess::expand_device_sections;
use crate::parser::table::{parse_tables, split_sections};
use tracing::debug;

/// Parses a Markdown preset document.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`] for bad frontmatter,
/// [`ConvertError::Structural`] when no control table is recognised, and the
/// first row-level error otherwise.
pub fn parse_document(content: &str) -> Result<Document> {
    let lines: Vec<&str> = content.lines().collect();

    let (metadata, content_start) = parse_frontmatter(&lines)?;
    let devices = metadata.resolve_devices()?;
    let group_style = metadata.group_style()?;
    let grid = metadata.grid()?;

    let body: Vec<(usize, &str)> = lines[content_start..]
        .iter()
        .enumerate()
        .map(|(offset, &line)| (content_start + offset + 1, line))
        .collect();
    let expanded = expand_device_sections(&body, devices.len());
    let expanded: Vec<(usize, &str)> = expanded
        .iter()
        .map(|(number, line)| (*number, line.as_str()))
        .collect();

    let (title, raw_sections) = split_sections(&expanded);
    let builder = TableBuilder::new(devices.len(), grid.columns());

    let mut sections = Vec::new();
    for raw in &raw_sections {
        let tables = parse_tables(raw);
        if tables.is_empty() {
            debug!("Section '{}' has no control tables", raw.name);
            continue;
        }

        let mut section = Section::new(raw.name.clone());
        for table in &tables {
            section.tables.push(builder.build(table)?);
        }
        sections.push(section);
    }

    if sections.is_empty() {
        return Err(ConvertError::Structural(
            "no control tables found (a table needs a header row with Address and Label \
             columns followed by a |---| divider row)"
                .to_string(),
        ));
    }

    let document = Document {
        title,
        version: metadata.version(),
        devices,
        group_style,
        grid,
        sections,
    };
    debug!(
        "Parsed '{}': {} section(s), {} control(s)",
        document.title,
        document.sections.len(),
        document.control_count()
    );

    Ok(document)
}
