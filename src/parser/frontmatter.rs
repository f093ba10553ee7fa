//! YAML frontmatter: device declarations, preset version, group style and
//! layout knobs.

use crate::constants::{DEFAULT_CHANNEL, DEFAULT_DEVICE_NAME, DEFAULT_PORT, DEFAULT_PRESET_VERSION};
use crate::error::{ConvertError, Result};
use crate::layout::GridConfig;
use crate::models::{Device, Document, GroupStyle};
use crate::parser::preprocess::{expand_device_entries, take_device_count};
use serde::{Deserialize, Serialize};

/// Frontmatter as written in the document.
///
/// Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Single-device name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Single-device name (legacy key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Single-device manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Single-device MIDI port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u8>,
    /// Single-device MIDI channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// Preset schema version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Nested MIDI settings, overridden by the top-level keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi: Option<MidiSettings>,
    /// Multi-device declarations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceEntry>,
    /// Group header style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupsSetting>,
    /// Layout knobs
    #[serde(alias = "electra", skip_serializing_if = "Option::is_none")]
    pub layout: Option<GridConfig>,
}

/// `midi:` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// MIDI port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u8>,
    /// MIDI channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

/// One item of the `devices:` list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEntry {
    /// Device name
    pub name: String,
    /// Manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// MIDI port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u8>,
    /// MIDI channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

/// `groups:` accepts a boolean or a style name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupsSetting {
    /// `true` highlights, `false` does not
    Flag(bool),
    /// `highlighted` or `default`
    Style(String),
}

impl Metadata {
    /// Resolves the declared devices, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Metadata`] for a channel outside 1-16, a port
    /// of 0, or more than 255 devices.
    pub fn resolve_devices(&self) -> Result<Vec<Device>> {
        if self.devices.is_empty() {
            let midi = self.midi.clone().unwrap_or_default();
            let name = self
                .name
                .clone()
                .or_else(|| self.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());
            let mut device = Device::new(1, name)
                .with_port(self.port.or(midi.port).unwrap_or(DEFAULT_PORT))
                .with_channel(self.channel.or(midi.channel).unwrap_or(DEFAULT_CHANNEL));
            if let Some(manufacturer) = &self.manufacturer {
                device = device.with_manufacturer(manufacturer.clone());
            }
            validate_device(&device)?;
            return Ok(vec![device]);
        }

        self.devices
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let index = u8::try_from(position + 1).map_err(|_| {
                    ConvertError::Metadata("at most 255 devices can be declared".to_string())
                })?;
                let name = if entry.name.trim().is_empty() {
                    DEFAULT_DEVICE_NAME.to_string()
                } else {
                    entry.name.trim().to_string()
                };
                let mut device = Device::new(index, name)
                    .with_port(entry.port.unwrap_or(DEFAULT_PORT))
                    .with_channel(entry.channel.unwrap_or(DEFAULT_CHANNEL));
                if let Some(manufacturer) = &entry.manufacturer {
                    device = device.with_manufacturer(manufacturer.clone());
                }
                validate_device(&device)?;
                Ok(device)
            })
            .collect()
    }

    /// Resolves the group header style.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Metadata`] for an unknown style name.
    pub fn group_style(&self) -> Result<GroupStyle> {
        match &self.groups {
            None | Some(GroupsSetting::Flag(false)) => Ok(GroupStyle::Default),
            Some(GroupsSetting::Flag(true)) => Ok(GroupStyle::Highlighted),
            Some(GroupsSetting::Style(style)) => match style.trim().to_ascii_lowercase().as_str() {
                "highlighted" | "highlight" => Ok(GroupStyle::Highlighted),
                "default" | "" => Ok(GroupStyle::Default),
                other => Err(ConvertError::Metadata(format!(
                    "unknown groups style '{other}', expected 'highlighted' or 'default'"
                ))),
            },
        }
    }

    /// Preset version, defaulting to 2.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version.unwrap_or(DEFAULT_PRESET_VERSION)
    }

    /// Layout knobs, defaulting to the built-in grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Metadata`] for knobs too large to lay out.
    pub fn grid(&self) -> Result<GridConfig> {
        let grid = self.layout.unwrap_or_default();
        grid.validate()?;
        Ok(grid)
    }

    /// Builds the frontmatter that reproduces a document's settings.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let mut metadata = Self {
            version: Some(document.version),
            groups: document
                .group_style
                .variant()
                .map(|variant| GroupsSetting::Style(variant.to_string())),
            layout: (document.grid != GridConfig::default()).then_some(document.grid),
            ..Self::default()
        };

        match document.devices.as_slice() {
            [single] => {
                metadata.name = Some(single.name.clone());
                metadata.manufacturer.clone_from(&single.manufacturer);
                metadata.port = Some(single.port);
                metadata.channel = Some(single.channel);
            }
            devices => {
                metadata.devices = devices
                    .iter()
                    .map(|device| DeviceEntry {
                        name: device.name.clone(),
                        manufacturer: device.manufacturer.clone(),
                        port: Some(device.port),
                        channel: Some(device.channel),
                    })
                    .collect();
            }
        }

        metadata
    }
}

fn validate_device(device: &Device) -> Result<()> {
    if !(1..=16).contains(&device.channel) {
        return Err(ConvertError::Metadata(format!(
            "device '{}' has MIDI channel {}, expected 1-16",
            device.name, device.channel
        )));
    }
    if device.port == 0 {
        return Err(ConvertError::Metadata(format!(
            "device '{}' has MIDI port 0, ports start at 1",
            device.name
        )));
    }
    Ok(())
}

/// Parses an optional leading `---` block.
///
/// Returns the metadata and the index of the first content line. A document
/// without frontmatter, or whose block is never closed, gets the defaults
/// and starts at line 0.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`] when the block is not valid YAML for
/// the expected keys, or a `device count` has nothing to expand.
pub fn parse_frontmatter(lines: &[&str]) -> Result<(Metadata, usize)> {
    let Some(first) = lines.first() else {
        return Ok((Metadata::default(), 0));
    };
    if first.trim() != "---" {
        return Ok((Metadata::default(), 0));
    }

    let Some(end) = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == "---")
        .map(|offset| offset + 1)
    else {
        return Ok((Metadata::default(), 0));
    };

    let (device_count, yaml_content) = take_device_count(&lines[1..end])?;
    let mut value = if yaml_content.trim().is_empty() {
        serde_yml::Value::Null
    } else {
        serde_yml::from_str(&yaml_content)
            .map_err(|e| ConvertError::Metadata(format!("invalid YAML frontmatter: {e}")))?
    };
    if value.is_null() {
        value = serde_yml::Value::Mapping(serde_yml::Mapping::new());
    }
    expand_device_entries(&mut value, device_count)?;

    let metadata: Metadata = serde_yml::from_value(value)
        .map_err(|e| ConvertError::Metadata(format!("invalid YAML frontmatter: {e}")))?;

    Ok((metadata, end + 1))
}

/// Serializes metadata as a `---` delimited YAML block.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`] if serialization fails.
pub fn generate_frontmatter(metadata: &Metadata) -> Result<String> {
    let yaml = serde_yml::to_string(metadata)
        .map_err(|e| ConvertError::Metadata(format!("failed to serialize frontmatter: {e}")))?;

    Ok(format!("---\n{yaml}---\n"))
}
