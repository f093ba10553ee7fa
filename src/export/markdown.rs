//! Markdown renderer for documents.
//!
//! Produces the same table format the parser reads, so a rendered document
//! converts back to an equivalent preset.

use crate::error::Result;
use crate::models::{
    Address, Color, Control, ControlType, Document, Entry, Message, MessageKind, Table,
};
use crate::parser::address::SEVEN_BIT_MAX;
use crate::parser::frontmatter::{generate_frontmatter, Metadata};
use crate::parser::values::{
    choice_cell_text, envelope_keyword, is_bare_label, is_empty_marker, table_cell_text,
};
use std::fmt::Write as _;

/// Renders a document as Markdown.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`](crate::error::ConvertError::Metadata)
/// if the frontmatter cannot be serialized.
pub fn render_document(document: &Document) -> Result<String> {
    let mut output = String::new();

    output.push_str(&generate_frontmatter(&Metadata::from_document(document))?);
    output.push('\n');
    let _ = writeln!(output, "# {}", document.title);

    let multi_device = document.is_multi_device();
    for section in &document.sections {
        output.push('\n');
        let _ = writeln!(output, "## {}", section.name);
        for table in &section.tables {
            output.push('\n');
            output.push_str(&render_table(table, multi_device));
        }
    }

    Ok(output)
}

/// Renders one table, with a Description column only when needed.
fn render_table(table: &Table, multi_device: bool) -> String {
    let with_description = table.controls().any(|c| c.description.is_some());
    let mut output = String::new();

    if with_description {
        output.push_str("| Address | Label | Range | Choices | Color | Description |\n");
        output.push_str("|---------|-------|-------|---------|-------|-------------|\n");
    } else {
        output.push_str("| Address | Label | Range | Choices | Color |\n");
        output.push_str("|---------|-------|-------|---------|-------|\n");
    }

    let mut last_color: Option<Color> = None;
    let mut color_cell = |color: Option<Color>| match color {
        Some(color) if last_color != Some(color) => {
            last_color = Some(color);
            color.to_hex()
        }
        _ => String::new(),
    };

    for entry in &table.entries {
        let cells: [String; 6] = match entry {
            Entry::Control(control) => [
                address_cell(control, multi_device),
                table_cell_text(&control.label),
                control.range.to_string(),
                choices_cell(control),
                color_cell(control.color),
                control
                    .description
                    .as_deref()
                    .map(table_cell_text)
                    .unwrap_or_default(),
            ],
            Entry::Group(group) => [
                String::new(),
                table_cell_text(&group.label),
                group.span.to_string(),
                String::new(),
                color_cell(group.color),
                String::new(),
            ],
            Entry::Blank => Default::default(),
        };

        let used = if with_description { 6 } else { 5 };
        let _ = writeln!(output, "| {} |", cells[..used].join(" | "));
    }

    output
}

/// Address cell, with a `C:` prefix where the range's upper bound would
/// otherwise select 14-bit CC and a `k:` device prefix in multi-device
/// documents.
fn address_cell(control: &Control, multi_device: bool) -> String {
    let forced_seven_bit = control.range.hi > SEVEN_BIT_MAX;
    let numbers = |messages: &[Message]| {
        messages
            .iter()
            .filter_map(|m| m.parameter)
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };

    let address = match &control.address {
        Address::Cc7(n) if forced_seven_bit => format!("C:{n}"),
        Address::Cc7(n) | Address::Cc14(n) => n.to_string(),
        Address::Nrpn7(n) | Address::Nrpn14(n) => format!("N:{n}"),
        Address::ProgramChange => "P".to_string(),
        Address::EnvelopeGroup(messages) => match messages.first().map(|m| m.kind) {
            Some(kind) if kind.is_nrpn() => format!("N:{}", numbers(messages)),
            Some(MessageKind::Cc7) if forced_seven_bit => format!("C:{}", numbers(messages)),
            _ => numbers(messages),
        },
        Address::GroupMarker { .. } | Address::Blank => String::new(),
    };

    if multi_device {
        format!("{}:{address}", control.device)
    } else {
        address
    }
}

/// True when bare labels would not read back as the same choices: values
/// out of order, a label that looks like a `value:label` or `Label(value)`
/// form, or a lone label the parser takes for a keyword.
fn needs_explicit_values(control: &Control, labels: &[String]) -> bool {
    if !control.has_sequential_choices() || labels.iter().any(|label| !is_bare_label(label)) {
        return true;
    }
    match labels {
        [only] => is_empty_marker(only) || envelope_keyword(only).is_some(),
        _ => false,
    }
}

/// Choices cell: envelope keyword, bare labels when they read back
/// unchanged, `Label(value)` otherwise.
fn choices_cell(control: &Control) -> String {
    if let ControlType::Envelope(kind) = control.control_type {
        return kind.keyword().to_string();
    }
    if control.choices.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = control
        .choices
        .iter()
        .map(|choice| choice_cell_text(&choice.label))
        .collect();
    if !needs_explicit_values(control, &labels) {
        return labels.join(", ");
    }
    control
        .choices
        .iter()
        .zip(labels)
        .map(|(choice, label)| format!("{label}({})", choice.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, Device, GroupMarker, Section, ValueRange};
    use crate::parser::parse_document;

    fn document(entries: Vec<Entry>) -> Document {
        let mut section = Section::new("OSC");
        section.tables.push(Table::new(entries));
        Document {
            title: "Synth".to_string(),
            version: 2,
            devices: vec![Device::new(1, "Generic MIDI")],
            group_style: Default::default(),
            grid: Default::default(),
            sections: vec![section],
        }
    }

    fn fader(address: Address, label: &str) -> Control {
        Control::new(address, label, 1, ValueRange::default(), Vec::new())
    }

    fn rows(markdown: &str) -> Vec<&str> {
        markdown
            .lines()
            .filter(|line| line.starts_with('|'))
            .skip(2)
            .collect()
    }

    #[test]
    fn test_renders_frontmatter_title_and_table() {
        let markdown =
            render_document(&document(vec![Entry::Control(fader(Address::Cc7(74), "Cutoff"))]))
                .unwrap();

        assert!(markdown.starts_with("---\n"));
        assert!(markdown.contains("name: Generic MIDI"));
        assert!(markdown.contains("# Synth\n"));
        assert!(markdown.contains("## OSC\n"));
        assert_eq!(rows(&markdown), vec!["| 74 | Cutoff | 0-127 |  |  |"]);
    }

    #[test]
    fn test_color_only_on_first_of_run() {
        let red = Some(Color::new(255, 0, 0));
        let blue = Some(Color::new(0, 0, 255));
        let markdown = render_document(&document(vec![
            Entry::Control(fader(Address::Cc7(1), "A").with_color(red)),
            Entry::Control(fader(Address::Cc7(2), "B").with_color(red)),
            Entry::Blank,
            Entry::Control(fader(Address::Cc7(3), "C").with_color(blue)),
        ]))
        .unwrap();

        let rows = rows(&markdown);
        assert!(rows[0].ends_with("| #FF0000 |"));
        assert!(rows[1].ends_with("|  |"));
        assert_eq!(rows[2], "|  |  |  |  |  |");
        assert!(rows[3].ends_with("| #0000FF |"));
    }

    #[test]
    fn test_address_forms() {
        let wide = ValueRange::new(0, 1000);
        let envelope = Address::EnvelopeGroup(vec![
            Message::new(MessageKind::Nrpn7, 10),
            Message::new(MessageKind::Nrpn7, 11),
            Message::new(MessageKind::Nrpn7, 12),
        ]);
        let markdown = render_document(&document(vec![
            Entry::Control(Control::new(Address::Cc7(5), "Forced", 1, wide, Vec::new())),
            Entry::Control(fader(Address::Nrpn14(1024), "Fine")),
            Entry::Control(fader(Address::ProgramChange, "Patch")),
            Entry::Control(fader(envelope, "Env")),
        ]))
        .unwrap();

        let rows = rows(&markdown);
        assert!(rows[0].starts_with("| C:5 |"));
        assert!(rows[1].starts_with("| N:1024 |"));
        assert!(rows[2].starts_with("| P |"));
        assert!(rows[3].starts_with("| N:10,11,12 | Env | 0-127 | ADR |"));
    }

    #[test]
    fn test_seven_bit_prefix_follows_upper_bound() {
        let high = ValueRange::new(8000, 8100);
        let markdown = render_document(&document(vec![
            Entry::Control(Control::new(Address::Cc7(5), "Narrow High", 1, high, Vec::new())),
            Entry::Control(Control::new(Address::Cc14(6), "Wide", 1, high, Vec::new())),
            Entry::Control(Control::new(
                Address::Cc7(7),
                "Bipolar",
                1,
                ValueRange::new(-64, 63),
                Vec::new(),
            )),
        ]))
        .unwrap();

        let rows = rows(&markdown);
        assert!(rows[0].starts_with("| C:5 |"));
        assert!(rows[1].starts_with("| 6 |"));
        assert!(rows[2].starts_with("| 7 |"));

        let reparsed = parse_document(&markdown).unwrap();
        let addresses: Vec<&Address> = reparsed.controls().map(|c| &c.address).collect();
        assert_eq!(
            addresses,
            vec![&Address::Cc7(5), &Address::Cc14(6), &Address::Cc7(7)]
        );
    }

    #[test]
    fn test_labels_that_look_like_values_render_explicitly() {
        let control = Control::new(
            Address::Cc7(1),
            "Mode",
            1,
            ValueRange::new(0, 1),
            vec![Choice::new("Mode (9)", 0), Choice::new("B", 1)],
        );
        let lone = Control::new(
            Address::Cc7(2),
            "Shape",
            1,
            ValueRange::new(0, 1),
            vec![Choice::new("ADSR", 0)],
        );
        let markdown = render_document(&document(vec![
            Entry::Control(control.clone()),
            Entry::Control(lone.clone()),
        ]))
        .unwrap();

        let rows = rows(&markdown);
        assert!(rows[0].contains("| Mode (9)(0), B(1) |"));
        assert!(rows[1].contains("| ADSR(0) |"));

        let reparsed = parse_document(&markdown).unwrap();
        let controls: Vec<&Control> = reparsed.controls().collect();
        assert_eq!(controls[0].choices, control.choices);
        assert_eq!(controls[1].choices, lone.choices);
    }

    #[test]
    fn test_choice_forms() {
        let sequential = Control::new(
            Address::Cc7(1),
            "Wave",
            1,
            ValueRange::new(0, 2),
            vec![Choice::new("Saw", 0), Choice::new("Square", 1)],
        );
        let explicit = Control::new(
            Address::Cc7(2),
            "Sync",
            1,
            ValueRange::default(),
            vec![Choice::new("Off", 0), Choice::new("On", 63)],
        );
        let markdown = render_document(&document(vec![
            Entry::Control(sequential),
            Entry::Control(explicit),
        ]))
        .unwrap();

        let rows = rows(&markdown);
        assert!(rows[0].contains("| Saw, Square |"));
        assert!(rows[1].contains("| Off(0), On(63) |"));
    }

    #[test]
    fn test_group_row_and_description_column() {
        let markdown = render_document(&document(vec![
            Entry::Group(GroupMarker::new("Mixer", 2)),
            Entry::Control(fader(Address::Cc7(7), "Vol").with_description("Main | level")),
        ]))
        .unwrap();

        assert!(markdown.contains("| Address | Label | Range | Choices | Color | Description |"));
        let rows = rows(&markdown);
        assert_eq!(rows[0], "|  | Mixer | 2 |  |  |  |");
        assert!(rows[1].ends_with("| Main / level |"));
    }

    #[test]
    fn test_device_prefix_in_multi_device_documents() {
        let mut doc = document(vec![Entry::Control(Control::new(
            Address::Nrpn7(3),
            "Far",
            2,
            ValueRange::default(),
            Vec::new(),
        ))]);
        doc.devices.push(Device::new(2, "Drum"));

        let markdown = render_document(&doc).unwrap();
        assert!(rows(&markdown)[0].starts_with("| 2:N:3 |"));
        assert!(markdown.contains("devices:"));
    }
}
