//! Pipe-table tokenizer: headings, tables and column mapping.
//!
//! Tables are recognised only by a header row immediately followed by a GFM
//! divider row. Anything else is prose and is skipped.

use crate::constants::{DEFAULT_SECTION, DEFAULT_TITLE};
use regex::Regex;
use std::sync::LazyLock;

static DIVIDER_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-{2,}:?$").expect("divider cell regex is valid"));

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").expect("heading regex is valid"));

/// Logical columns a control table can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Address / CC / parameter number
    Address,
    /// Control label
    Label,
    /// Value range
    Range,
    /// Choice list or envelope keyword
    Choices,
    /// Hex color
    Color,
    /// Free-form notes
    Description,
}

impl Column {
    /// Maps a header cell to a column, case- and whitespace-insensitively.
    #[must_use]
    pub fn from_header(header: &str) -> Option<Self> {
        match normalize_header(header).as_str() {
            "address" | "cc" | "cc (dec)" | "cc (hex)" | "control" | "control (dec)"
            | "control (hex)" | "hex" | "cc#" | "parameter" => Some(Self::Address),
            "label" | "target" | "target label" | "name" => Some(Self::Label),
            "range" | "value range" | "values" => Some(Self::Range),
            "choices" | "options" | "option(s)" => Some(Self::Choices),
            "color" | "colour" => Some(Self::Color),
            "description" | "desc" | "notes" => Some(Self::Description),
            _ => None,
        }
    }
}

fn normalize_header(header: &str) -> String {
    clean_cell(header)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One data row with its cells mapped to columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source document
    pub line: usize,
    /// Address cell
    pub address: String,
    /// Label cell
    pub label: String,
    /// Range cell
    pub range: String,
    /// Choices cell
    pub choices: String,
    /// Color cell
    pub color: String,
    /// Description cell
    pub description: String,
}

impl RawRow {
    /// True when every cell that drives layout is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.label.is_empty() && self.range.is_empty()
    }
}

/// A recognised control table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Enclosing section name
    pub section: String,
    /// Address column is hexadecimal
    pub hex: bool,
    /// Data rows in order
    pub rows: Vec<RawRow>,
}

/// A section heading and the lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection<'a> {
    /// Heading text
    pub name: String,
    /// `(1-based line number, text)` pairs
    pub lines: Vec<(usize, &'a str)>,
}

/// Strips surrounding whitespace, `**` emphasis and backticks from a cell.
#[must_use]
pub fn clean_cell(cell: &str) -> String {
    cell.trim()
        .trim_matches('*')
        .trim()
        .trim_matches('`')
        .trim()
        .to_string()
}

/// Splits a table line into cleaned cells, tolerating missing outer pipes.
#[must_use]
pub fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(clean_cell).collect()
}

/// True for a GFM divider row such as `|---|:--:|---:|`.
#[must_use]
pub fn is_divider_line(line: &str) -> bool {
    if !line.contains('|') {
        return false;
    }
    let cells = split_row(line);
    !cells.is_empty() && cells.iter().all(|cell| DIVIDER_CELL.is_match(cell))
}

/// Splits a document body into its title and sections.
///
/// Lines carry their 1-based source line number, so rows keep their position
/// in the original file. Content before the first `##` heading belongs to the
/// `MAIN` section.
#[must_use]
pub fn split_sections<'a>(body: &[(usize, &'a str)]) -> (String, Vec<RawSection<'a>>) {
    let mut title: Option<String> = None;
    let mut sections: Vec<RawSection<'a>> = Vec::new();
    let mut current = RawSection {
        name: DEFAULT_SECTION.to_string(),
        lines: Vec::new(),
    };

    for &(number, line) in body {
        if let Some(caps) = HEADING.captures(line.trim()) {
            let level = caps[1].len();
            let text = clean_cell(&caps[2]);
            if level == 1 {
                if title.is_none() {
                    title = Some(text);
                }
                continue;
            }
            let finished = std::mem::replace(
                &mut current,
                RawSection {
                    name: text,
                    lines: Vec::new(),
                },
            );
            if finished.name != DEFAULT_SECTION || !finished.lines.is_empty() {
                sections.push(finished);
            }
            continue;
        }
        current.lines.push((number, line));
    }
    sections.push(current);

    (title.unwrap_or_else(|| DEFAULT_TITLE.to_string()), sections)
}

/// Column positions resolved from a header row.
#[derive(Debug, Default)]
struct ColumnMap {
    address: Option<usize>,
    hex: bool,
    label: Option<usize>,
    range: Option<usize>,
    choices: Option<usize>,
    color: Option<usize>,
    description: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let mut map = Self::default();
        for (index, cell) in header.iter().enumerate() {
            let Some(column) = Column::from_header(cell) else {
                continue;
            };
            let slot = match column {
                Column::Address => {
                    let hex = normalize_header(cell).contains("hex");
                    // A decimal address column beats a hex one
                    match map.address {
                        Some(_) if hex || !map.hex => continue,
                        _ => {
                            map.address = Some(index);
                            map.hex = hex;
                        }
                    }
                    continue;
                }
                Column::Label => &mut map.label,
                Column::Range => &mut map.range,
                Column::Choices => &mut map.choices,
                Column::Color => &mut map.color,
                Column::Description => &mut map.description,
            };
            if slot.is_none() {
                *slot = Some(index);
            }
        }
        map
    }

    fn is_control_table(&self) -> bool {
        self.address.is_some() && self.label.is_some()
    }

    fn row(&self, line: usize, cells: &[String]) -> RawRow {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| cells.get(i))
                .cloned()
                .unwrap_or_default()
        };
        RawRow {
            line,
            address: cell(self.address),
            label: cell(self.label),
            range: cell(self.range),
            choices: cell(self.choices),
            color: cell(self.color),
            description: cell(self.description),
        }
    }
}

/// Finds every control table in a section.
///
/// Tables without a divider row, or whose header lacks an address or label
/// column, are skipped.
#[must_use]
pub fn parse_tables(section: &RawSection<'_>) -> Vec<RawTable> {
    let lines = &section.lines;
    let mut tables = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let (_, line) = lines[index];
        let has_divider = lines
            .get(index + 1)
            .is_some_and(|(_, next)| is_divider_line(next));
        if !line.contains('|') || !has_divider || is_divider_line(line) {
            index += 1;
            continue;
        }

        let header = split_row(line);
        let columns = ColumnMap::from_header(&header);
        index += 2;

        let mut rows = Vec::new();
        while index < lines.len() {
            let (number, row_line) = lines[index];
            if !row_line.contains('|') || is_divider_line(row_line) {
                break;
            }
            let mut cells = split_row(row_line);
            if cells.len() < header.len() {
                cells.resize(header.len(), String::new());
            } else if cells.len() > header.len() && !header.is_empty() {
                let overflow = cells.split_off(header.len() - 1).join(" | ");
                cells.push(overflow);
            }
            rows.push(columns.row(number, &cells));
            index += 1;
        }

        if columns.is_control_table() {
            tables.push(RawTable {
                section: section.name.clone(),
                hex: columns.hex,
                rows,
            });
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(text: &str) -> RawSection<'_> {
        RawSection {
            name: "TEST".to_string(),
            lines: text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect(),
        }
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  **Cutoff**  "), "Cutoff");
        assert_eq!(clean_cell("`0x1A`"), "0x1A");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn test_divider_detection() {
        assert!(is_divider_line("|---|---|"));
        assert!(is_divider_line("| :--- | ---: | :--: |"));
        assert!(is_divider_line("---|---"));
        assert!(!is_divider_line("| 1 | Cutoff |"));
        assert!(!is_divider_line("---"));
    }

    #[test]
    fn test_header_aliases() {
        assert_eq!(Column::from_header("CC (Dec)"), Some(Column::Address));
        assert_eq!(Column::from_header("  Target   Label "), Some(Column::Label));
        assert_eq!(Column::from_header("Option(s)"), Some(Column::Choices));
        assert_eq!(Column::from_header("Colour"), Some(Column::Color));
        assert_eq!(Column::from_header("Notes"), Some(Column::Description));
        assert_eq!(Column::from_header("Whatever"), None);
    }

    #[test]
    fn test_table_without_divider_is_skipped() {
        let text = "| CC | Label |\n| 1 | Cutoff |\n";
        assert!(parse_tables(&section(text)).is_empty());
    }

    #[test]
    fn test_table_needs_address_and_label() {
        let text = "| Foo | Label |\n|---|---|\n| 1 | Cutoff |\n";
        assert!(parse_tables(&section(text)).is_empty());
    }

    #[test]
    fn test_rows_are_padded_and_folded() {
        let text = "| CC | Label | Range |\n|---|---|---|\n| 1 | Cutoff |\n| 2 | A | b | c |\n";
        let tables = parse_tables(&section(text));
        assert_eq!(tables.len(), 1);

        let rows = &tables[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].range, "");
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[1].range, "b | c");
    }

    #[test]
    fn test_decimal_address_column_wins() {
        let text = "| CC (Hex) | CC (Dec) | Label |\n|---|---|---|\n| 1A | 26 | Cutoff |\n";
        let tables = parse_tables(&section(text));
        assert!(!tables[0].hex);
        assert_eq!(tables[0].rows[0].address, "26");

        let hex_only = "| CC (Hex) | Label |\n|---|---|\n| 1A | Cutoff |\n";
        let tables = parse_tables(&section(hex_only));
        assert!(tables[0].hex);
    }

    #[test]
    fn test_table_ends_at_line_without_pipe() {
        let text = "| CC | Label |\n|---|---|\n| 1 | A |\n\n| 2 | B |\n";
        let tables = parse_tables(&section(text));
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 1);
    }

    #[test]
    fn test_split_sections() {
        let body: Vec<(usize, &str)> = ["# My Synth", "intro", "## OSC", "| a |", "### Filter", "text"]
            .into_iter()
            .enumerate()
            .map(|(i, l)| (i + 1, l))
            .collect();
        let (title, sections) = split_sections(&body);
        assert_eq!(title, "My Synth");

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["MAIN", "OSC", "Filter"]);
        assert_eq!(sections[1].lines, vec![(4, "| a |")]);
    }

    #[test]
    fn test_default_title() {
        let (title, sections) = split_sections(&[(1, "## Only")]);
        assert_eq!(title, "Untitled Preset");
        assert_eq!(sections.len(), 1);
    }
}
