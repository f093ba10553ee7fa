//! Preset JSON importer.
//!
//! Reading a preset back is deliberately lossy. Every device, page, group and
//! control is decoded on its own; anything outside the subset this tool emits
//! is filtered out and reported as a [`Diagnostic`]. The rest is rebuilt into
//! a [`Document`] that renders back to Markdown, and whatever that rendering
//! cannot carry exactly is reported too.

use crate::constants::DEFAULT_DEVICE_NAME;
use crate::error::{ConvertError, Result};
use crate::layout::GridConfig;
use crate::models::preset_file::{
    ControlFile, DeviceFile, ExtraFields, GroupFile, PageInput, PresetInput,
};
use crate::models::{
    Address, Choice, Control, ControlType, Device, Document, Entry, GroupMarker, GroupStyle,
    Message, MessageKind, Section, Table, ValueRange,
};
use crate::parser::address::{FOURTEEN_BIT_MAX, SEVEN_BIT_MAX};
use crate::parser::values::{choice_cell_text, table_cell_text};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static SPLIT_PAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*\S)\s+\((\d+)/(\d+)\)$").expect("split page name regex is valid")
});

/// Category of a dropped or altered preset feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Control `type` outside fader/list/pad/adsr/adr
    UnsupportedControlType,
    /// Message `type`/`bits` outside cc/nrpn/program
    UnsupportedMessage,
    /// Control with no usable values
    MissingValues,
    /// Envelope whose value count does not match its type
    EnvelopeArity,
    /// Group nested inside a group
    NestedGroup,
    /// Page-level `scroll` or `containers`
    PageContainer,
    /// Field this tool does not model
    UnknownField,
    /// Extra metadata on a device other than the first
    DeviceMetadata,
    /// Value, range or choice that the Markdown form cannot express
    InvalidValue,
    /// Entry whose JSON does not fit the preset schema
    MalformedEntry,
    /// Kept, but changed so that it reads back the same from Markdown
    Approximated,
}

impl DiagnosticKind {
    /// Short name used in log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnsupportedControlType => "unsupported control type",
            Self::UnsupportedMessage => "unsupported message",
            Self::MissingValues => "missing values",
            Self::EnvelopeArity => "envelope arity",
            Self::NestedGroup => "nested group",
            Self::PageContainer => "page container",
            Self::UnknownField => "unknown field",
            Self::DeviceMetadata => "device metadata",
            Self::InvalidValue => "invalid value",
            Self::MalformedEntry => "malformed entry",
            Self::Approximated => "approximated",
        }
    }
}

/// A preset feature that was dropped or altered during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What kind of feature was affected
    pub kind: DiagnosticKind,
    /// Where it was found (e.g., "page 'OSC', control 12 'Cutoff'")
    pub context: String,
    /// Human-readable explanation
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.context, self.message, self.kind.name())
    }
}

/// Result of importing a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPreset {
    /// Reconstructed document
    pub document: Document,
    /// Everything that was dropped or altered on the way
    pub diagnostics: Vec<Diagnostic>,
}

/// A control that passed the filter, with its group membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeptControl {
    /// Rebuilt control
    pub control: Control,
    /// Group id from the preset
    pub group_id: Option<u32>,
}

fn unknown_fields(extra: &ExtraFields, context: &str, diagnostics: &mut Vec<Diagnostic>) {
    for key in extra.keys() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnknownField,
            context,
            format!("field '{key}' is not supported and was dropped"),
        ));
    }
}

/// Names a raw entry by whatever `id` and `name` it carries.
fn describe(what: &str, raw: &Value) -> String {
    let id = raw.get("id").map(ToString::to_string);
    let name = raw.get("name").and_then(Value::as_str);
    match (id, name) {
        (Some(id), Some(name)) => format!("{what} {id} '{name}'"),
        (Some(id), None) => format!("{what} {id}"),
        (None, Some(name)) => format!("{what} '{name}'"),
        (None, None) => what.to_string(),
    }
}

/// Decodes one raw entry, reporting it as malformed when it does not fit.
fn decode<T: DeserializeOwned>(
    raw: &Value,
    context: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    match serde_json::from_value(raw.clone()) {
        Ok(entry) => Some(entry),
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedEntry,
                context,
                format!("entry was dropped: {e}"),
            ));
            None
        }
    }
}

/// Text as it reads back from a table cell, with a fallback for empty text.
fn cell_text(
    text: &str,
    fallback: impl FnOnce() -> String,
    clean: fn(&str) -> String,
    context: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let cleaned = clean(text);
    let result = if cleaned.is_empty() { fallback() } else { cleaned };
    if result != text.trim() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::Approximated,
            context,
            format!("text '{text}' becomes '{result}'"),
        ));
    }
    result
}

/// Maps preset device ids to 1-based document indices.
struct DeviceTable {
    devices: Vec<Device>,
    by_id: HashMap<u8, u8>,
}

impl DeviceTable {
    fn new(entries: &[Value], diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut devices = Vec::new();
        let mut by_id = HashMap::new();
        for raw in entries {
            let context = describe("device", raw);
            let Some(file) = decode::<DeviceFile>(raw, &context, diagnostics) else {
                continue;
            };
            let Ok(index) = u8::try_from(devices.len() + 1) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DeviceMetadata,
                    context,
                    "more than 255 devices; device dropped",
                ));
                continue;
            };

            if devices.is_empty() {
                unknown_fields(&file.extra, &context, diagnostics);
            } else {
                for key in file.extra.keys() {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DeviceMetadata,
                        context.clone(),
                        format!("metadata '{key}' on additional devices is not supported"),
                    ));
                }
            }

            let name = if file.name.trim().is_empty() {
                DEFAULT_DEVICE_NAME.to_string()
            } else {
                file.name.trim().to_string()
            };
            let channel = if (1..=16).contains(&file.channel) {
                file.channel
            } else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidValue,
                    context.clone(),
                    format!("channel {} is outside 1-16, using 1", file.channel),
                ));
                1
            };
            let mut device = Device::new(index, name)
                .with_port(file.port.max(1))
                .with_channel(channel);
            if let Some(manufacturer) = &file.manufacturer {
                device = device.with_manufacturer(manufacturer.clone());
            }
            devices.push(device);
            by_id.insert(file.id, index);
        }

        if devices.is_empty() {
            devices.push(Device::new(1, DEFAULT_DEVICE_NAME));
            by_id.insert(1, 1);
        }
        Self { devices, by_id }
    }

    fn resolve(&self, device_id: u8) -> Option<u8> {
        self.by_id.get(&device_id).copied()
    }
}

/// Splits a page's controls into those the document can express and the
/// diagnostics for those it cannot, or can only approximate.
#[must_use]
pub fn filter_controls(
    page: &PageInput,
    devices: &HashMap<u8, u8>,
) -> (Vec<KeptControl>, Vec<Diagnostic>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    for raw in &page.controls {
        let context = format!("page '{}', {}", page.name, describe("control", raw));
        let Some(file) = decode::<ControlFile>(raw, &context, &mut dropped) else {
            continue;
        };
        match rebuild_control(&file, devices, &context, &mut dropped) {
            Ok(control) => {
                if let Some(default) = file.values.first().and_then(|v| v.default_value) {
                    if control.range.default.is_none() {
                        dropped.push(Diagnostic::new(
                            DiagnosticKind::InvalidValue,
                            context.clone(),
                            format!("default {default} lies outside the range and was dropped"),
                        ));
                    }
                }
                unknown_fields(&file.extra, &context, &mut dropped);
                for value in &file.values {
                    unknown_fields(&value.extra, &context, &mut dropped);
                    unknown_fields(&value.message.extra, &context, &mut dropped);
                }
                kept.push(KeptControl {
                    control,
                    group_id: file.group_id,
                });
            }
            Err(diagnostic) => dropped.push(diagnostic),
        }
    }

    (kept, dropped)
}

/// Message kind the Markdown address reads back as, given the range's upper
/// bound. `None` when the bound is too wide for any form.
fn readback_kind(kind: MessageKind, hi: i32) -> Option<MessageKind> {
    let wide = match hi {
        hi if hi <= SEVEN_BIT_MAX => false,
        hi if hi <= FOURTEEN_BIT_MAX => true,
        _ => return matches!(kind, MessageKind::Cc7 | MessageKind::ProgramChange).then_some(kind),
    };
    Some(match (kind, wide) {
        // `C:` keeps a wide 7-bit CC
        (MessageKind::Cc7 | MessageKind::ProgramChange, _) => kind,
        (MessageKind::Cc14, false) => MessageKind::Cc7,
        (MessageKind::Nrpn7, true) => MessageKind::Nrpn14,
        (MessageKind::Nrpn14, false) => MessageKind::Nrpn7,
        (MessageKind::Cc14 | MessageKind::Nrpn7 | MessageKind::Nrpn14, _) => kind,
    })
}

fn rebuild_control(
    file: &ControlFile,
    devices: &HashMap<u8, u8>,
    context: &str,
    notes: &mut Vec<Diagnostic>,
) -> std::result::Result<Control, Diagnostic> {
    let reject = |kind, message: String| Diagnostic::new(kind, context, message);
    let note = |message: String| Diagnostic::new(DiagnosticKind::Approximated, context, message);

    let Some(control_type) = ControlType::from_wire(&file.control_type) else {
        return Err(reject(
            DiagnosticKind::UnsupportedControlType,
            format!("control type '{}' is not supported", file.control_type),
        ));
    };
    let Some(first) = file.values.first() else {
        return Err(reject(DiagnosticKind::MissingValues, "control has no values".to_string()));
    };

    let expected = match control_type {
        ControlType::Envelope(kind) => kind.arity(),
        ControlType::Fader | ControlType::List | ControlType::Pad => 1,
    };
    if file.values.len() != expected {
        let kind = if matches!(control_type, ControlType::Envelope(_)) {
            DiagnosticKind::EnvelopeArity
        } else {
            DiagnosticKind::MissingValues
        };
        return Err(reject(
            kind,
            format!(
                "'{}' needs {expected} value(s), found {}",
                file.control_type,
                file.values.len()
            ),
        ));
    }

    if first.min > first.max {
        return Err(reject(
            DiagnosticKind::InvalidValue,
            format!("range {}-{} is inverted", first.min, first.max),
        ));
    }
    let mut range = ValueRange::new(first.min, first.max);
    if let Some(default) = first.default_value {
        if range.contains(default) {
            range = range.with_default(default);
        }
    }
    for value in &file.values[1..] {
        if (value.min, value.max, value.default_value)
            != (first.min, first.max, first.default_value)
        {
            notes.push(note(format!(
                "envelope value '{}' range {}-{} is replaced by the first value's {range}",
                value.id, value.min, value.max
            )));
        }
    }

    let mut messages = Vec::with_capacity(file.values.len());
    let mut device = None;
    for value in &file.values {
        let message = &value.message;
        let Some(kind) = MessageKind::from_wire(&message.message_type, message.bits) else {
            return Err(reject(
                DiagnosticKind::UnsupportedMessage,
                format!(
                    "message type '{}' with {} bits is not supported",
                    message.message_type, message.bits
                ),
            ));
        };
        let Some(readback) = readback_kind(kind, range.hi) else {
            return Err(reject(
                DiagnosticKind::InvalidValue,
                format!("range reaches {}, more than 14 bits can carry", range.hi),
            ));
        };
        // One note per control, envelope components share the range
        if readback != kind && messages.is_empty() {
            notes.push(note(format!(
                "{} {}-bit message becomes {}-bit to match range {range}",
                kind.wire_type(),
                kind.bits(),
                readback.bits()
            )));
        }
        let parsed = if readback == MessageKind::ProgramChange {
            Message::program_change()
        } else {
            match message.parameter_number {
                Some(number) if number <= readback.max_parameter() => Message::new(readback, number),
                Some(number) => {
                    return Err(reject(
                        DiagnosticKind::InvalidValue,
                        format!("parameter number {number} is out of range"),
                    ))
                }
                None => {
                    return Err(reject(
                        DiagnosticKind::UnsupportedMessage,
                        "message has no parameter number".to_string(),
                    ))
                }
            }
        };
        let Some(index) = devices.get(&message.device_id).copied() else {
            return Err(reject(
                DiagnosticKind::InvalidValue,
                format!("device {} is not declared", message.device_id),
            ));
        };
        match device {
            Some(existing) if existing != index => {
                return Err(reject(
                    DiagnosticKind::InvalidValue,
                    "values target different devices".to_string(),
                ))
            }
            _ => device = Some(index),
        }
        messages.push(parsed);
    }

    let address = match control_type {
        ControlType::Envelope(_) => {
            let first_kind = messages[0].kind;
            if first_kind == MessageKind::ProgramChange
                || messages.iter().any(|m| m.kind != first_kind)
            {
                return Err(reject(
                    DiagnosticKind::UnsupportedMessage,
                    "envelope values must share one cc or nrpn message type".to_string(),
                ));
            }
            Address::EnvelopeGroup(messages)
        }
        ControlType::Fader | ControlType::List | ControlType::Pad => {
            Address::from_message(messages[0])
        }
    };

    let choices = if matches!(control_type, ControlType::Envelope(_)) {
        Vec::new()
    } else {
        let mut seen = HashSet::new();
        let mut choices = Vec::with_capacity(first.choices.len());
        for choice in &first.choices {
            if !range.contains(choice.value) || !seen.insert(choice.value) {
                return Err(reject(
                    DiagnosticKind::InvalidValue,
                    format!("choice '{}' has an unusable value {}", choice.label, choice.value),
                ));
            }
            let label = cell_text(
                &choice.label,
                || choice.value.to_string(),
                choice_cell_text,
                context,
                notes,
            );
            choices.push(Choice::new(label, choice.value));
        }
        choices
    };

    let label = cell_text(
        &file.name,
        || format!("Control {}", file.id),
        table_cell_text,
        context,
        notes,
    );

    let control = Control::new(address, label, device.unwrap_or(1), range, choices)
        .with_color(file.color);
    if control.control_type != control_type {
        notes.push(note(format!(
            "'{}' reads back as '{}'",
            control_type.wire_name(),
            control.control_type.wire_name()
        )));
    }
    if let Some(mode) = file.mode.as_deref() {
        if control.control_type == control_type && mode != control.mode.wire_name() {
            notes.push(note(format!(
                "mode '{mode}' reads back as '{}'",
                control.mode.wire_name()
            )));
        }
    }
    Ok(control)
}

/// Builds the entries for one page, reinserting group markers before their
/// first member.
fn page_entries(
    page: &PageInput,
    kept: Vec<KeptControl>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Entry> {
    let max_span = u8::try_from(GridConfig::default().columns()).unwrap_or(u8::MAX);
    let mut groups: Vec<GroupFile> = Vec::with_capacity(page.groups.len());
    let mut markers: HashMap<u32, GroupMarker> = HashMap::new();
    for raw in &page.groups {
        let context = format!("page '{}', {}", page.name, describe("group", raw));
        let Some(group) = decode::<GroupFile>(raw, &context, diagnostics) else {
            continue;
        };
        for key in group.extra.keys() {
            let kind = if key == "groups" {
                DiagnosticKind::NestedGroup
            } else {
                DiagnosticKind::UnknownField
            };
            diagnostics.push(Diagnostic::new(
                kind,
                context.clone(),
                format!("field '{key}' is not supported and was dropped"),
            ));
        }
        let label = cell_text(
            &group.name,
            || format!("Group {}", group.id),
            table_cell_text,
            &context,
            diagnostics,
        );
        let span = group.span.clamp(1, max_span);
        if span != group.span {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Approximated,
                context.clone(),
                format!(
                    "span {} becomes {span}, a row holds {max_span} cells",
                    group.span
                ),
            ));
        }
        markers.insert(group.id, GroupMarker::new(label, span).with_color(group.color));
        groups.push(group);
    }

    let mut entries = Vec::with_capacity(kept.len() + markers.len());
    let mut placed = HashSet::new();
    for KeptControl { control, group_id } in kept {
        if let Some(id) = group_id {
            if placed.insert(id) {
                match markers.get(&id) {
                    Some(marker) => entries.push(Entry::Group(marker.clone())),
                    None => diagnostics.push(Diagnostic::new(
                        DiagnosticKind::InvalidValue,
                        format!("page '{}', control '{}'", page.name, control.label),
                        format!("group {id} does not exist"),
                    )),
                }
            }
        }
        entries.push(Entry::Control(control));
    }

    for group in &groups {
        if !placed.contains(&group.id) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidValue,
                format!("page '{}', group {} '{}'", page.name, group.id, group.name),
                "group has no controls and was dropped",
            ));
        }
    }

    entries
}

/// Strips a `Name (i/n)` suffix, returning the base section name.
#[must_use]
pub fn section_name(page_name: &str) -> &str {
    SPLIT_PAGE_NAME
        .captures(page_name)
        .and_then(|caps| caps.get(1))
        .map_or(page_name, |m| m.as_str())
}

/// Imports preset JSON.
///
/// # Errors
///
/// Returns [`ConvertError::Json`] when the input is not JSON or lacks the
/// `name` and `pages` fields. Everything else, down to a single malformed
/// page, device, group or control, becomes a diagnostic.
pub fn import_preset(json: &str) -> Result<ImportedPreset> {
    let file: PresetInput =
        serde_json::from_str(json).map_err(|e| ConvertError::Json(e.to_string()))?;

    let mut diagnostics = Vec::new();
    unknown_fields(&file.extra, "preset", &mut diagnostics);

    let devices = DeviceTable::new(&file.devices, &mut diagnostics);
    let pages: Vec<PageInput> = file
        .pages
        .iter()
        .filter_map(|raw| decode(raw, &describe("page", raw), &mut diagnostics))
        .collect();
    let group_style = if pages
        .iter()
        .flat_map(|page| &page.groups)
        .any(|group| group.get("variant").and_then(Value::as_str) == Some("highlighted"))
    {
        GroupStyle::Highlighted
    } else {
        GroupStyle::Default
    };

    let mut sections: Vec<Section> = Vec::new();
    for page in &pages {
        let context = format!("page '{}'", page.name);
        for key in page.extra.keys() {
            let kind = if key == "scroll" || key == "containers" {
                DiagnosticKind::PageContainer
            } else {
                DiagnosticKind::UnknownField
            };
            diagnostics.push(Diagnostic::new(
                kind,
                context.clone(),
                format!("field '{key}' is not supported and was dropped"),
            ));
        }

        let (kept, dropped) = filter_controls(page, &devices.by_id);
        diagnostics.extend(dropped);
        let entries = page_entries(page, kept, &mut diagnostics);
        if devices.resolve(page.device_id).is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidValue,
                context.clone(),
                format!("page device {} is not declared", page.device_id),
            ));
        }

        let name = section_name(&page.name);
        let name = if name.trim().is_empty() {
            format!("Page {}", page.id)
        } else {
            name.to_string()
        };

        // Continuation pages of a split section rejoin its single table
        let continues = page.name != name && sections.last().is_some_and(|s| s.name == name);
        if continues {
            if let Some(table) = sections.last_mut().and_then(|s| s.tables.last_mut()) {
                table.entries.extend(entries);
            }
        } else {
            let mut section = Section::new(name);
            section.tables.push(Table::new(entries));
            sections.push(section);
        }
    }

    for diagnostic in &diagnostics {
        debug!("Import: {diagnostic}");
    }

    Ok(ImportedPreset {
        document: Document {
            title: file.name,
            version: file.version,
            devices: devices.devices,
            group_style,
            grid: GridConfig::default(),
            sections,
        },
        diagnostics,
    })
}
