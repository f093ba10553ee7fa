//! Control model builder: folds a table's raw rows into entries.
//!
//! The fold carries a [`RowState`] from row to row. It starts fresh for every
//! table, so colors never leak from one table into the next.

use crate::error::{ConvertError, Result, RowLocation};
use crate::models::{Address, Color, Control, Entry, GroupMarker, Table};
use crate::parser::address::{parse_address, AddressCell};
use crate::parser::table::{RawRow, RawTable};
use crate::parser::values::{
    envelope_keyword, infer_choices, parse_choices, parse_color, parse_range, ChoicesCell,
};

/// State carried from one row to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    /// Last explicit color seen in this table
    pub color: Option<Color>,
}

impl RowState {
    /// Resolves a row's color: an explicit value wins and becomes the new
    /// carried color, otherwise the carried color applies.
    #[must_use]
    pub fn resolve(self, explicit: Option<Color>) -> (Self, Option<Color>) {
        let color = explicit.or(self.color);
        (Self { color }, color)
    }
}

/// Builds [`Table`]s for one document.
#[derive(Debug, Clone, Copy)]
pub struct TableBuilder {
    device_count: usize,
    columns: u32,
}

impl TableBuilder {
    /// Creates a builder for a document with `device_count` devices laid out
    /// on `columns` columns.
    #[must_use]
    pub const fn new(device_count: usize, columns: u32) -> Self {
        Self {
            device_count,
            columns,
        }
    }

    /// Folds every row of `raw` into an entry.
    ///
    /// # Errors
    ///
    /// Returns the first row error, tagged with its section and line.
    pub fn build(&self, raw: &RawTable) -> Result<Table> {
        let (_, entries) = raw.rows.iter().try_fold(
            (RowState::default(), Vec::with_capacity(raw.rows.len())),
            |(state, mut entries), row| {
                let (state, entry) = self.build_row(raw, row, state)?;
                entries.push(entry);
                Ok::<_, ConvertError>((state, entries))
            },
        )?;
        Ok(Table::new(entries))
    }

    fn build_row(&self, raw: &RawTable, row: &RawRow, state: RowState) -> Result<(RowState, Entry)> {
        let location = RowLocation::new(raw.section.clone(), row.line);
        let explicit_color = parse_color(&row.color, &location)?;
        let range = parse_range(&row.range, &location)?;
        let envelope = envelope_keyword(&row.choices);

        let parsed = parse_address(
            &AddressCell {
                text: &row.address,
                hex: raw.hex,
                label: &row.label,
                range,
                envelope,
            },
            self.device_count,
            &location,
        )?;

        match parsed.address {
            // A blank's color cell is validated above but never carried
            Address::Blank => Ok((state, Entry::Blank)),
            Address::GroupMarker { span } => {
                if u32::from(span) > self.columns {
                    return Err(ConvertError::range(
                        &location,
                        format!(
                            "group '{}' spans {span} cells but a row only has {}",
                            row.label, self.columns
                        ),
                    ));
                }
                let (state, color) = state.resolve(explicit_color);
                let marker = GroupMarker::new(row.label.clone(), span).with_color(color);
                Ok((state, Entry::Group(marker)))
            }
            address => {
                if row.label.trim().is_empty() {
                    return Err(ConvertError::address(
                        &location,
                        format!("control '{}' has no label", row.address),
                    ));
                }
                let range = range.unwrap_or_default();
                let choices = match parse_choices(&row.choices, &range, &location)? {
                    // An empty Choices cell may still be listed in the description
                    ChoicesCell::Choices(choices) if choices.is_empty() && row.choices.is_empty() => {
                        infer_choices(&row.description, &range)
                    }
                    ChoicesCell::Choices(choices) => choices,
                    ChoicesCell::Envelope(_) => Vec::new(),
                };
                let device = parsed.device.unwrap_or(1);
                let (state, color) = state.resolve(explicit_color);

                let mut control = Control::new(address, row.label.clone(), device, range, choices)
                    .with_color(color);
                if !row.description.is_empty() {
                    control = control.with_description(row.description.clone());
                }
                Ok((state, Entry::Control(control)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ControlMode, ControlType, EnvelopeKind};

    fn row(line: usize, address: &str, label: &str, range: &str, choices: &str, color: &str) -> RawRow {
        RawRow {
            line,
            address: address.to_string(),
            label: label.to_string(),
            range: range.to_string(),
            choices: choices.to_string(),
            color: color.to_string(),
            description: String::new(),
        }
    }

    fn table(rows: Vec<RawRow>) -> RawTable {
        RawTable {
            section: "TEST".to_string(),
            hex: false,
            rows,
        }
    }

    fn builder() -> TableBuilder {
        TableBuilder::new(2, 6)
    }

    fn control(entry: &Entry) -> &Control {
        match entry {
            Entry::Control(control) => control,
            other => panic!("expected control, got {other:?}"),
        }
    }

    #[test]
    fn test_color_carries_forward() {
        let raw = table(vec![
            row(1, "1", "A", "", "", "#FF0000"),
            row(2, "2", "B", "", "", ""),
            row(3, "3", "C", "", "", "00FF00"),
            row(4, "4", "D", "", "", ""),
            row(5, "5", "E", "", "", "#0000FF"),
        ]);
        let built = builder().build(&raw).unwrap();

        let colors: Vec<Option<Color>> = built.entries.iter().map(|e| control(e).color).collect();
        let red = Some(Color::new(255, 0, 0));
        let green = Some(Color::new(0, 255, 0));
        assert_eq!(
            colors,
            vec![red, red, green, green, Some(Color::new(0, 0, 255))]
        );
    }

    #[test]
    fn test_color_state_resets_per_table() {
        let first = builder()
            .build(&table(vec![row(1, "1", "A", "", "", "#FF0000")]))
            .unwrap();
        let second = builder().build(&table(vec![row(5, "2", "B", "", "", "")])).unwrap();

        assert!(control(&first.entries[0]).color.is_some());
        assert!(control(&second.entries[0]).color.is_none());
    }

    #[test]
    fn test_blank_and_group_rows() {
        let raw = table(vec![
            row(1, "", "Filter", "2", "", "#112233"),
            row(2, "74", "Cutoff", "", "", ""),
            row(3, "", "", "", "", "#FFFFFF"),
            row(4, "71", "Resonance", "", "", ""),
        ]);
        let built = builder().build(&raw).unwrap();

        assert!(matches!(&built.entries[0], Entry::Group(g) if g.span == 2));
        assert_eq!(built.entries[2], Entry::Blank);
        // The blank's color is not carried; the group's is
        assert_eq!(
            control(&built.entries[3]).color,
            Some(Color::new(0x11, 0x22, 0x33))
        );
    }

    #[test]
    fn test_group_wider_than_row_is_range_error() {
        let raw = table(vec![row(9, "", "Huge", "7", "", "")]);
        let err = builder().build(&raw).unwrap_err();
        assert!(matches!(err, ConvertError::Range { .. }));
        assert_eq!(err.location().map(|l| l.line), Some(9));
    }

    #[test]
    fn test_control_types_and_modes() {
        let raw = table(vec![
            row(1, "1", "Sync", "", "Off, On", ""),
            row(2, "2", "Wave", "0-3", "Saw, Square, Tri, Noise", ""),
            row(3, "3", "Detune", "-64-63", "", ""),
            row(4, "10,11,12,13", "Amp Env", "", "ADSR", ""),
        ]);
        let built = builder().build(&raw).unwrap();
        let types: Vec<ControlType> = built.entries.iter().map(|e| control(e).control_type).collect();
        assert_eq!(
            types,
            vec![
                ControlType::Pad,
                ControlType::List,
                ControlType::Fader,
                ControlType::Envelope(EnvelopeKind::Adsr)
            ]
        );
        assert_eq!(control(&built.entries[0]).mode, ControlMode::Toggle);
        assert_eq!(control(&built.entries[2]).mode, ControlMode::Bipolar);
        assert!(control(&built.entries[3]).choices.is_empty());
    }

    #[test]
    fn test_choices_from_description() {
        let mut listed = row(1, "5", "Wave", "0-2", "", "");
        listed.description = "Saw, Square & Triangle".to_string();
        let mut opted_out = row(2, "6", "Shape", "0-2", "none", "");
        opted_out.description = "Saw, Square & Triangle".to_string();

        let built = builder().build(&table(vec![listed, opted_out])).unwrap();
        let labels: Vec<&str> = control(&built.entries[0])
            .choices
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Saw", "Square", "Triangle"]);
        assert_eq!(control(&built.entries[0]).control_type, ControlType::List);
        assert!(control(&built.entries[1]).choices.is_empty());
    }

    #[test]
    fn test_missing_label_is_address_error() {
        let raw = table(vec![row(4, "20", "", "", "", "")]);
        assert!(matches!(
            builder().build(&raw),
            Err(ConvertError::Address { .. })
        ));
    }

    #[test]
    fn test_device_prefix_sets_device() {
        let raw = table(vec![
            row(1, "2:N:1024", "Far", "0-16383", "", ""),
            row(2, "N:1024", "Near", "0-16383", "", ""),
        ]);
        let built = builder().build(&raw).unwrap();
        assert_eq!(control(&built.entries[0]).device, 2);
        assert_eq!(control(&built.entries[1]).device, 1);
    }

    #[test]
    fn test_invalid_color_is_fatal() {
        let raw = table(vec![row(2, "1", "A", "", "", "#XYZ")]);
        assert!(matches!(
            builder().build(&raw),
            Err(ConvertError::Color { .. })
        ));
    }
}
