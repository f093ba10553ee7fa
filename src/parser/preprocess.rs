//! `<device>` templates.
//!
//! Frontmatter may declare `device count: N`; every `devices` entry that
//! mentions `<device>` is then repeated N times with the token replaced by
//! 1..=N. In the body, a run of consecutive sections whose headings contain
//! `<device>` is repeated once per declared device, with the token replaced
//! in the headings and in every line underneath. Repeated lines keep the line
//! number of their template so errors still point at the source.

use crate::constants::DEVICE_TOKEN;
use crate::error::{ConvertError, Result};
use regex::Regex;
use serde_yml::Value;
use std::sync::LazyLock;

static DEVICE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*device[ _]count\s*:\s*(\S+)\s*$").expect("device count regex is valid")
});

/// A body line with its 1-based source line number.
pub type NumberedLine = (usize, String);

fn is_section_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    hashes >= 2 && trimmed[hashes..].starts_with(char::is_whitespace)
}

fn is_templated_heading(line: &str) -> bool {
    is_section_heading(line) && line.contains(DEVICE_TOKEN)
}

fn substitute(line: &str, device: usize) -> String {
    line.replace(DEVICE_TOKEN, &device.to_string())
}

/// Pulls `device count: N` out of the frontmatter lines.
///
/// The line may sit at any indentation, including inside the `devices`
/// block. Returns the count (1 when absent) and the remaining YAML.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`] when the count is not a positive
/// number.
pub fn take_device_count(lines: &[&str]) -> Result<(usize, String)> {
    let mut count = 1;
    let mut yaml = Vec::with_capacity(lines.len());

    for line in lines {
        match DEVICE_COUNT.captures(line) {
            Some(caps) => {
                count = caps[1]
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| (1..=usize::from(u8::MAX)).contains(&n))
                    .ok_or_else(|| {
                        ConvertError::Metadata(format!(
                            "device count '{}' must be a number from 1 to 255",
                            &caps[1]
                        ))
                    })?;
            }
            None => yaml.push(*line),
        }
    }

    Ok((count, yaml.join("\n")))
}

fn mentions_token(value: &Value) -> bool {
    match value {
        Value::String(text) => text.contains(DEVICE_TOKEN),
        Value::Sequence(items) => items.iter().any(mentions_token),
        Value::Mapping(mapping) => mapping.values().any(mentions_token),
        Value::Tagged(tagged) => mentions_token(&tagged.value),
        _ => false,
    }
}

fn substitute_value(value: &Value, device: usize) -> Value {
    match value {
        Value::String(text) if text.trim() == DEVICE_TOKEN => Value::Number(device.into()),
        Value::String(text) => Value::String(substitute(text, device)),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| substitute_value(item, device)).collect())
        }
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(key, item)| (key.clone(), substitute_value(item, device)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Repeats every templated `devices` entry `device_count` times.
///
/// A field that is exactly `<device>` becomes the device number, so
/// `channel: <device>` works.
///
/// # Errors
///
/// Returns [`ConvertError::Metadata`] when `device_count` is above 1 but no
/// entry mentions `<device>`.
pub fn expand_device_entries(metadata: &mut Value, device_count: usize) -> Result<()> {
    let entries = metadata.get_mut("devices").and_then(Value::as_sequence_mut);
    let Some(entries) = entries else {
        if device_count > 1 {
            return Err(ConvertError::Metadata(format!(
                "device count is {device_count} but there is no devices list to expand"
            )));
        }
        return Ok(());
    };

    if device_count > 1 && !entries.iter().any(mentions_token) {
        return Err(ConvertError::Metadata(format!(
            "device count is {device_count} but no devices entry mentions {DEVICE_TOKEN}"
        )));
    }

    let expanded = entries
        .iter()
        .flat_map(|entry| {
            let copies = if mentions_token(entry) { device_count } else { 0 };
            let original = (copies == 0).then(|| entry.clone());
            (1..=copies)
                .map(move |device| substitute_value(entry, device))
                .chain(original)
        })
        .collect();
    *entries = expanded;
    Ok(())
}

/// Expands templated sections for `device_count` devices.
///
/// With a single device the token is simply replaced by `1`.
#[must_use]
pub fn expand_device_sections(lines: &[(usize, &str)], device_count: usize) -> Vec<NumberedLine> {
    if device_count <= 1 {
        return lines
            .iter()
            .map(|&(number, line)| (number, substitute(line, 1)))
            .collect();
    }

    let mut output = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        let (number, line) = lines[index];
        if !is_templated_heading(line) {
            output.push((number, line.to_string()));
            index += 1;
            continue;
        }

        // Collect consecutive templated sections
        let start = index;
        while index < lines.len() {
            let (_, heading) = lines[index];
            if !is_templated_heading(heading) {
                break;
            }
            index += 1;
            while index < lines.len() && !is_section_heading(lines[index].1) {
                index += 1;
            }
        }

        let template = &lines[start..index];
        for device in 1..=device_count {
            output.extend(
                template
                    .iter()
                    .map(|&(number, line)| (number, substitute(line, device))),
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(text: &str) -> Vec<(usize, &str)> {
        text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect()
    }

    #[test]
    fn test_single_device_replaces_token() {
        let lines = numbered("## Part <device>\n| <device>:1 | A |");
        let expanded = expand_device_sections(&lines, 1);
        assert_eq!(expanded[0].1, "## Part 1");
        assert_eq!(expanded[1].1, "| 1:1 | A |");
    }

    #[test]
    fn test_consecutive_templates_repeat_as_a_block() {
        let text = "# Title\n## Osc <device>\n| <device>:1 | A |\n## Env <device>\n| <device>:2 | B |\n## Global\n| 3 | C |";
        let expanded = expand_device_sections(&numbered(text), 2);
        let texts: Vec<&str> = expanded.iter().map(|(_, l)| l.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "# Title",
                "## Osc 1",
                "| 1:1 | A |",
                "## Env 1",
                "| 1:2 | B |",
                "## Osc 2",
                "| 2:1 | A |",
                "## Env 2",
                "| 2:2 | B |",
                "## Global",
                "| 3 | C |",
            ]
        );
        // Repeated lines keep their template's line number
        assert_eq!(expanded[6].0, 3);
    }

    #[test]
    fn test_device_count_line_is_removed() {
        let lines = ["name: Rack", "devices:", "  device count: 3", "  - name: A"];
        let (count, yaml) = take_device_count(&lines).unwrap();
        assert_eq!(count, 3);
        assert_eq!(yaml, "name: Rack\ndevices:\n  - name: A");

        assert!(take_device_count(&["device count: 0"]).is_err());
        assert!(take_device_count(&["device count: many"]).is_err());
        assert_eq!(take_device_count(&["name: X"]).unwrap().0, 1);
    }

    #[test]
    fn test_templated_device_entries_repeat() {
        let mut value: Value = serde_yml::from_str(
            "devices:\n  - name: Synth <device>\n    channel: <device>\n  - name: Drums\n    channel: 10\n",
        )
        .unwrap();
        expand_device_entries(&mut value, 2).unwrap();

        let devices = value["devices"].as_sequence().unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0]["name"].as_str(), Some("Synth 1"));
        assert_eq!(devices[1]["name"].as_str(), Some("Synth 2"));
        assert_eq!(devices[1]["channel"].as_u64(), Some(2));
        assert_eq!(devices[2]["name"].as_str(), Some("Drums"));
    }

    #[test]
    fn test_device_count_without_template_is_error() {
        let mut value: Value = serde_yml::from_str("devices:\n  - name: A\n").unwrap();
        assert!(matches!(
            expand_device_entries(&mut value, 2),
            Err(ConvertError::Metadata(_))
        ));

        let mut empty: Value = serde_yml::from_str("name: A\n").unwrap();
        assert!(expand_device_entries(&mut empty, 2).is_err());
        assert!(expand_device_entries(&mut empty, 1).is_ok());
    }

    #[test]
    fn test_untemplated_document_is_unchanged() {
        let text = "## Osc\n| 1 | A |";
        let expanded = expand_device_sections(&numbered(text), 3);
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[1], (2, "| 1 | A |".to_string()));
    }
}
