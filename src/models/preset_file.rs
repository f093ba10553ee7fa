//! Preset JSON schema.
//!
//! These structs are written by the preset emitter and read back by the
//! importer. Reading is permissive: every field the emitter does not produce
//! lands in an `extra` map so the importer can report it instead of failing.
//! The importer first reads a preset as [`PresetInput`], whose entries stay
//! raw JSON, and then checks each entry on its own so one malformed control
//! cannot sink the whole file.

use crate::models::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields a struct did not declare, captured during deserialization.
pub type ExtraFields = BTreeMap<String, Value>;

/// Top-level preset document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetFile {
    /// Preset name
    pub name: String,
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Device declarations
    #[serde(default)]
    pub devices: Vec<DeviceFile>,
    /// Pages in order
    pub pages: Vec<PageFile>,
    /// Unrecognised fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Top-level preset as read back, entries still unchecked
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PresetInput {
    /// Preset name
    pub name: String,
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Raw device entries
    #[serde(default)]
    pub devices: Vec<Value>,
    /// Raw page entries
    pub pages: Vec<Value>,
    /// Unrecognised fields
    #[serde(flatten, default)]
    pub extra: ExtraFields,
}

/// Page as read back, groups and controls still unchecked
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    /// 1-based page id
    pub id: u32,
    /// Page title
    #[serde(default)]
    pub name: String,
    /// Device the page talks to
    #[serde(default = "default_one")]
    pub device_id: u8,
    /// Raw group entries
    #[serde(default)]
    pub groups: Vec<Value>,
    /// Raw control entries
    #[serde(default)]
    pub controls: Vec<Value>,
    /// Unrecognised fields (`scroll`, `containers`, ...)
    #[serde(flatten, default)]
    pub extra: ExtraFields,
}

/// Device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFile {
    /// 1-based device id
    pub id: u8,
    /// Device name
    #[serde(default)]
    pub name: String,
    /// Manufacturer (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// MIDI port
    #[serde(default = "default_one")]
    pub port: u8,
    /// MIDI channel
    #[serde(default = "default_one")]
    pub channel: u8,
    /// Unrecognised fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Page entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFile {
    /// 1-based page id
    pub id: u32,
    /// Page title
    #[serde(default)]
    pub name: String,
    /// Device the page talks to
    #[serde(default = "default_one")]
    pub device_id: u8,
    /// Group strips
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupFile>,
    /// Controls
    #[serde(default)]
    pub controls: Vec<ControlFile>,
    /// Unrecognised fields (`scroll`, `containers`, ...)
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Group strip entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFile {
    /// Preset-wide group id
    pub id: u32,
    /// Header text
    #[serde(default)]
    pub name: String,
    /// Cells covered
    #[serde(default = "default_span")]
    pub span: u8,
    /// Strip color as bare `RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Header style (`highlighted`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// `[x, y, width, height]`
    #[serde(default)]
    pub bounds: [u32; 4],
    /// Unrecognised fields (nested `groups`, ...)
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Control entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFile {
    /// Preset-wide control id
    pub id: u32,
    /// Label
    #[serde(default)]
    pub name: String,
    /// `fader`, `list`, `pad`, `adsr` or `adr`
    #[serde(rename = "type")]
    pub control_type: String,
    /// Interaction mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Color as bare `RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Enclosing group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u32>,
    /// Grid cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionFile>,
    /// `[x, y, width, height]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[u32; 4]>,
    /// One value per message the control sends
    #[serde(default)]
    pub values: Vec<ValueFile>,
    /// Unrecognised fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Grid cell of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionFile {
    /// Grid row
    pub row: u32,
    /// Grid column
    pub col: u32,
}

/// Value entry of a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFile {
    /// `value`, or an envelope component name
    #[serde(default = "default_value_id")]
    pub id: String,
    /// Lowest value
    #[serde(default)]
    pub min: i32,
    /// Highest value
    #[serde(default = "default_max")]
    pub max: i32,
    /// Startup value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<i32>,
    /// MIDI message
    pub message: MessageFile,
    /// Labelled values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceFile>,
    /// Unrecognised fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// MIDI message of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFile {
    /// `cc`, `nrpn` or `program`
    #[serde(rename = "type")]
    pub message_type: String,
    /// 7 or 14
    #[serde(default = "default_bits")]
    pub bits: u8,
    /// CC or NRPN number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_number: Option<u16>,
    /// Target device
    #[serde(default = "default_one")]
    pub device_id: u8,
    /// Unrecognised fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

/// Labelled value of a list or pad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceFile {
    /// Value sent
    pub value: i32,
    /// Text shown
    pub label: String,
}

const fn default_version() -> u32 {
    crate::constants::DEFAULT_PRESET_VERSION
}

const fn default_one() -> u8 {
    1
}

const fn default_span() -> u8 {
    1
}

const fn default_bits() -> u8 {
    7
}

const fn default_max() -> i32 {
    127
}

fn default_value_id() -> String {
    "value".to_string()
}
