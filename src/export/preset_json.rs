//! Preset JSON emitter.

use crate::error::{ConvertError, Result};
use crate::models::preset_file::{
    ChoiceFile, ControlFile, DeviceFile, ExtraFields, GroupFile, MessageFile, PageFile,
    PositionFile, PresetFile, ValueFile,
};
use crate::models::{ControlType, Device, Page, PlacedControl, PlacedGroup, Preset};

fn device_file(device: &Device) -> DeviceFile {
    DeviceFile {
        id: device.index,
        name: device.name.clone(),
        manufacturer: device.manufacturer.clone(),
        port: device.port,
        channel: device.channel,
        extra: ExtraFields::new(),
    }
}

fn group_file(group: &PlacedGroup) -> GroupFile {
    GroupFile {
        id: group.id,
        name: group.label.clone(),
        span: group.span,
        color: group.color,
        variant: group.style.variant().map(str::to_string),
        bounds: group.bounds.to_array(),
        extra: ExtraFields::new(),
    }
}

fn value_files(placed: &PlacedControl) -> Vec<ValueFile> {
    let control = &placed.control;
    let ids: Vec<&str> = match control.control_type {
        ControlType::Envelope(kind) => kind.component_ids().to_vec(),
        ControlType::Fader | ControlType::List | ControlType::Pad => vec!["value"],
    };
    let choices: Vec<ChoiceFile> = control
        .choices
        .iter()
        .map(|choice| ChoiceFile {
            value: choice.value,
            label: choice.label.clone(),
        })
        .collect();

    control
        .address
        .messages()
        .into_iter()
        .zip(ids)
        .map(|(message, id)| ValueFile {
            id: id.to_string(),
            min: control.range.lo,
            max: control.range.hi,
            default_value: control.range.default,
            message: MessageFile {
                message_type: message.kind.wire_type().to_string(),
                bits: message.kind.bits(),
                parameter_number: message.parameter,
                device_id: control.device,
                extra: ExtraFields::new(),
            },
            choices: choices.clone(),
            extra: ExtraFields::new(),
        })
        .collect()
}

fn control_file(placed: &PlacedControl) -> ControlFile {
    let control = &placed.control;
    ControlFile {
        id: placed.id,
        name: control.label.clone(),
        control_type: control.control_type.wire_name().to_string(),
        mode: Some(control.mode.wire_name().to_string()),
        color: control.color,
        group_id: placed.group_id,
        position: Some(PositionFile {
            row: placed.position.row,
            col: placed.position.col,
        }),
        bounds: Some(placed.bounds.to_array()),
        values: value_files(placed),
        extra: ExtraFields::new(),
    }
}

fn page_file(page: &Page) -> PageFile {
    PageFile {
        id: page.id,
        name: page.name.clone(),
        device_id: page.device,
        groups: page.groups.iter().map(group_file).collect(),
        controls: page.controls.iter().map(control_file).collect(),
        extra: ExtraFields::new(),
    }
}

/// Converts a laid-out preset into its JSON schema form.
#[must_use]
pub fn preset_file(preset: &Preset) -> PresetFile {
    PresetFile {
        name: preset.name.clone(),
        version: preset.version,
        devices: preset.devices.iter().map(device_file).collect(),
        pages: preset.pages.iter().map(page_file).collect(),
        extra: ExtraFields::new(),
    }
}

/// Serializes a preset, compact by default or indented when `pretty`.
///
/// # Errors
///
/// Returns [`ConvertError::Json`] if serialization fails.
pub fn emit_preset(preset: &Preset, pretty: bool) -> Result<String> {
    let file = preset_file(preset);
    let json = if pretty {
        serde_json::to_string_pretty(&file)
    } else {
        serde_json::to_string(&file)
    };
    json.map_err(|e| ConvertError::Json(format!("failed to serialize preset: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_document;
    use crate::parser::parse_document;
    use serde_json::Value;

    fn emit(markdown: &str) -> Value {
        let document = parse_document(markdown).unwrap();
        let json = emit_preset(&layout_document(&document), false).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_fader_message_and_bounds() {
        let json = emit("# Synth\n## OSC\n| CC | Label | Color |\n|---|---|---|\n| 74 | Cutoff | #F45C51 |\n");

        assert_eq!(json["name"], "Synth");
        assert_eq!(json["version"], 2);
        assert_eq!(json["devices"][0]["name"], "Generic MIDI");

        let control = &json["pages"][0]["controls"][0];
        assert_eq!(control["type"], "fader");
        assert_eq!(control["mode"], "unipolar");
        assert_eq!(control["color"], "F45C51");
        assert_eq!(control["bounds"], serde_json::json!([10, 25, 146, 83]));

        let value = &control["values"][0];
        assert_eq!(value["id"], "value");
        assert_eq!(value["min"], 0);
        assert_eq!(value["max"], 127);
        assert_eq!(value["message"]["type"], "cc");
        assert_eq!(value["message"]["bits"], 7);
        assert_eq!(value["message"]["parameterNumber"], 74);
        assert_eq!(value["message"]["deviceId"], 1);
    }

    #[test]
    fn test_envelope_components() {
        let json = emit("## Env\n| CC | Label | Choices |\n|---|---|---|\n| 1,2,3 | Amp | ADR |\n");
        let control = &json["pages"][0]["controls"][0];
        assert_eq!(control["type"], "adr");

        let ids: Vec<&str> = control["values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["attack", "decay", "release"]);
        assert_eq!(control["values"][2]["message"]["parameterNumber"], 3);
    }

    #[test]
    fn test_choices_and_default() {
        let json = emit("## S\n| CC | Label | Range | Choices |\n|---|---|---|---|\n| 5 | Wave | 0-2 (1) | Saw, Square, Tri |\n");
        let value = &json["pages"][0]["controls"][0]["values"][0];
        assert_eq!(value["defaultValue"], 1);
        assert_eq!(value["choices"][2]["label"], "Tri");
        assert_eq!(value["choices"][2]["value"], 2);
    }

    #[test]
    fn test_no_color_is_omitted() {
        let json = emit("## S\n| CC | Label |\n|---|---|\n| 5 | Plain |\n");
        assert!(json["pages"][0]["controls"][0].get("color").is_none());
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let document = parse_document("## S\n| CC | Label |\n|---|---|\n| 5 | A |\n").unwrap();
        let preset = layout_document(&document);
        let compact = emit_preset(&preset, false).unwrap();
        let pretty = emit_preset(&preset, true).unwrap();

        assert!(!compact.contains('\n'));
        assert!(pretty.contains("\n  \"name\""));
    }

    #[test]
    fn test_pretty_and_compact_carry_the_same_preset() {
        let document = parse_document(
            "## S\n| CC | Label | Range | Choices | Color |\n|---|---|---|---|---|\n| | Mix | 2 | | #112233 |\n| 5 | A | 0-2 (1) | X, Y, Z | |\n| 1,2,3,4 | Env | | ADSR | #00FF00 |\n",
        )
        .unwrap();
        let preset = layout_document(&document);

        let compact: Value = serde_json::from_str(&emit_preset(&preset, false).unwrap()).unwrap();
        let pretty: Value = serde_json::from_str(&emit_preset(&preset, true).unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }

    #[test]
    fn test_emission_is_byte_identical() {
        let markdown = "---\ndevices:\n  - name: A\n  - name: B\n---\n## Part <device>\n| CC | Label | Color |\n|---|---|---|\n| <device>:7 | Vol | #FF0000 |\n| <device>:N:9 | Fine | |\n";
        let first = emit_preset(&layout_document(&parse_document(markdown).unwrap()), true).unwrap();
        let second = emit_preset(&layout_document(&parse_document(markdown).unwrap()), true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_color_carries_across_page_break() {
        let mut markdown = String::from("## Big\n| CC | Label | Color |\n|---|---|---|\n| 0 | P0 | #FF0000 |\n");
        for n in 1..40 {
            markdown.push_str(&format!("| {n} | P{n} | |\n"));
        }
        let json = emit(&markdown);

        assert_eq!(json["pages"][0]["name"], "Big (1/2)");
        assert_eq!(json["pages"][1]["name"], "Big (2/2)");
        assert_eq!(json["pages"][1]["controls"][0]["name"], "P36");
        assert_eq!(json["pages"][1]["controls"][0]["color"], "FF0000");
        assert_eq!(json["pages"][1]["controls"][3]["color"], "FF0000");
    }
}
