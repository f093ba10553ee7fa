//! Range, choice and color cell parsing.

use crate::error::{ConvertError, Result, RowLocation};
use crate::models::{Choice, Color, EnvelopeKind, ValueRange};
use crate::parser::table::clean_cell;
use regex::Regex;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

static RANGE_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*\(\s*(-?\d+)\s*\)$").expect("range default regex is valid")
});

static RANGE_BOUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+)\s*-\s*(-?\d+)$").expect("range regex is valid"));

static RANGE_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("single value regex is valid"));

static CHOICE_SUFFIX_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*\(\s*(-?\d+)\s*\)$").expect("choice suffix regex is valid")
});

static CHOICE_SUFFIX_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*\(\s*(\d+)\s*-\s*(\d+)\s*\)$")
        .expect("choice suffix range regex is valid")
});

static CHOICE_PREFIX_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*-\s*(\d+)\s*[:=]\s*(.+)$")
        .expect("choice prefix range regex is valid")
});

static CHOICE_PREFIX_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)\s*[:=]\s*(.+)$").expect("choice prefix regex is valid")
});

/// `USB1-USB4`: a numbered label run.
static NUMBERED_LABELS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\D*?)(\d+)\s*-\s*(\D*?)(\d+)(\D*)$")
        .expect("numbered label regex is valid")
});

static DESCRIPTION_MAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\s*[:=]\s*\w+|\d+\s*-\s*\d+")
        .expect("description mapping regex is valid")
});

static DESCRIPTION_AND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\band\b").expect("description and regex is valid"));

static TRAILING_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*?\)\s*$").expect("trailing note regex is valid"));

/// Widest range whose values are inferred from a Description cell.
const MAX_INFERRED_CHOICES: i64 = 32;

/// Parsed Choices cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoicesCell {
    /// Labelled values (possibly none)
    Choices(Vec<Choice>),
    /// `ADSR` / `ADR` keyword
    Envelope(EnvelopeKind),
}

fn parse_int(text: &str, location: &RowLocation) -> Result<i32> {
    text.parse()
        .map_err(|_| ConvertError::range(location, format!("'{text}' is not a valid value")))
}

/// Parses a Range cell; an empty cell yields `None`.
///
/// Accepts `lo-hi` (negative `lo` allowed), a single number, an en-dash
/// separator and a trailing default in parentheses: `0-127 (64)`.
///
/// # Errors
///
/// Returns [`ConvertError::Range`] for unparseable text, `lo > hi`, or a
/// default outside the bounds.
pub fn parse_range(cell: &str, location: &RowLocation) -> Result<Option<ValueRange>> {
    let text = cell.trim().replace(['–', '—'], "-");
    if text.is_empty() {
        return Ok(None);
    }

    let (bounds, default) = match RANGE_DEFAULT.captures(&text) {
        Some(caps) => (
            caps[1].trim().to_string(),
            Some(parse_int(&caps[2], location)?),
        ),
        None => (text.clone(), None),
    };

    let mut range = if let Some(caps) = RANGE_BOUNDS.captures(&bounds) {
        ValueRange::new(parse_int(&caps[1], location)?, parse_int(&caps[2], location)?)
    } else if RANGE_SINGLE.is_match(&bounds) {
        let value = parse_int(&bounds, location)?;
        ValueRange::new(value, value)
    } else {
        return Err(ConvertError::range(
            location,
            format!("'{}' is not a range (expected lo-hi or a single number)", cell.trim()),
        ));
    };

    if range.lo > range.hi {
        return Err(ConvertError::range(
            location,
            format!("range {}-{} has its lower bound above its upper bound", range.lo, range.hi),
        ));
    }

    if let Some(default) = default {
        if !range.contains(default) {
            return Err(ConvertError::range(
                location,
                format!("default {default} lies outside {}-{}", range.lo, range.hi),
            ));
        }
        range = range.with_default(default);
    }

    Ok(Some(range))
}

/// Recognises an envelope keyword without parsing choices.
#[must_use]
pub fn envelope_keyword(cell: &str) -> Option<EnvelopeKind> {
    EnvelopeKind::from_keyword(cell)
}

/// True for the cell texts that mean "no choices".
#[must_use]
pub fn is_empty_marker(text: &str) -> bool {
    let text = text.trim();
    text.is_empty()
        || matches!(
            text.to_ascii_lowercase().as_str(),
            "n/a" | "na" | "none" | "no" | "-"
        )
}

/// True when `label`, written alone as a choice token, reads back as that
/// same bare label rather than as a value mapping.
#[must_use]
pub fn is_bare_label(label: &str) -> bool {
    let label = label.trim();
    !label.is_empty()
        && ![
            &*CHOICE_SUFFIX_VALUE,
            &*CHOICE_SUFFIX_RANGE,
            &*CHOICE_PREFIX_RANGE,
            &*CHOICE_PREFIX_VALUE,
        ]
        .iter()
        .any(|pattern| pattern.is_match(label))
}

/// Checks a `first-last` choice run against the control's range.
fn choice_run(
    first: &str,
    last: &str,
    range: &ValueRange,
    location: &RowLocation,
) -> Result<RangeInclusive<i32>> {
    let (first, last) = (parse_int(first, location)?, parse_int(last, location)?);
    if first > last {
        return Err(ConvertError::range(
            location,
            format!("choice run {first}-{last} is reversed"),
        ));
    }
    if !range.contains(first) || !range.contains(last) {
        return Err(ConvertError::range(
            location,
            format!(
                "choice run {first}-{last} lies outside {}-{}",
                range.lo, range.hi
            ),
        ));
    }
    Ok(first..=last)
}

/// Labels for a `2-5=...` run: `USB1-USB4` numbers them when the run lengths
/// agree, anything else repeats the text.
fn run_labels(text: &str, count: usize) -> Vec<String> {
    if let Some(caps) = NUMBERED_LABELS.captures(text) {
        let same_prefix = caps[3].is_empty() || caps[3] == caps[1];
        let bounds = (caps[2].parse::<u64>(), caps[4].parse::<u64>());
        if let (true, (Ok(first), Ok(last))) = (same_prefix, bounds) {
            if first <= last && usize::try_from(last - first + 1).ok() == Some(count) {
                return (first..=last)
                    .map(|n| format!("{}{n}{}", &caps[1], &caps[5]))
                    .collect();
            }
        }
    }
    vec![text.to_string(); count]
}

/// Parses a Choices cell against the control's range.
///
/// Tokens are separated by commas or semicolons:
///
/// | Token            | Choices                         |
/// |------------------|---------------------------------|
/// | `Saw`            | next sequential value from `lo` |
/// | `Off(0)`         | value 0                         |
/// | `Bank(3-5)`      | values 3, 4 and 5, same label   |
/// | `0=Off`, `1:All` | value 0, value 1                |
/// | `2-5=USB1-USB4`  | `USB1` on 2 through `USB4` on 5 |
///
/// Bare labels take `lo, lo+1, ...` in document order.
///
/// # Errors
///
/// Returns [`ConvertError::Range`] when a value falls outside the range, a
/// run is reversed, or two choices share a value.
pub fn parse_choices(cell: &str, range: &ValueRange, location: &RowLocation) -> Result<ChoicesCell> {
    let text = cell.trim();
    if let Some(kind) = envelope_keyword(text) {
        return Ok(ChoicesCell::Envelope(kind));
    }
    if is_empty_marker(text) {
        return Ok(ChoicesCell::Choices(Vec::new()));
    }

    let mut next_sequential = i64::from(range.lo);
    let mut choices = Vec::new();

    for token in text.split([',', ';']).map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(caps) = CHOICE_SUFFIX_VALUE.captures(token) {
            choices.push(Choice::new(caps[1].trim(), parse_int(&caps[2], location)?));
        } else if let Some(caps) = CHOICE_SUFFIX_RANGE.captures(token) {
            let label = caps[1].trim();
            let run = choice_run(&caps[2], &caps[3], range, location)?;
            choices.extend(run.map(|value| Choice::new(label, value)));
        } else if let Some(caps) = CHOICE_PREFIX_RANGE.captures(token) {
            let run = choice_run(&caps[1], &caps[2], range, location)?;
            let labels = run_labels(caps[3].trim(), run.clone().count());
            choices.extend(run.zip(labels).map(|(value, label)| Choice::new(label, value)));
        } else if let Some(caps) = CHOICE_PREFIX_VALUE.captures(token) {
            choices.push(Choice::new(caps[2].trim(), parse_int(&caps[1], location)?));
        } else {
            let value = i32::try_from(next_sequential).map_err(|_| {
                ConvertError::range(location, format!("choice '{token}' overflows the range"))
            })?;
            next_sequential += 1;
            choices.push(Choice::new(token, value));
        }
    }

    let mut seen = HashSet::new();
    for choice in &choices {
        if !range.contains(choice.value) {
            return Err(ConvertError::range(
                location,
                format!(
                    "choice '{}' has value {} outside {}-{}",
                    choice.label, choice.value, range.lo, range.hi
                ),
            ));
        }
        if !seen.insert(choice.value) {
            return Err(ConvertError::range(
                location,
                format!("choice value {} is used more than once", choice.value),
            ));
        }
    }

    Ok(ChoicesCell::Choices(choices))
}

/// Reads choices out of a Description cell that names exactly one label per
/// value of a small range, such as `Saw, Square & Triangle` for `0-2`.
///
/// Returns nothing when the description already maps numbers, the range
/// holds fewer than 2 or more than 32 values, or the label count differs.
#[must_use]
pub fn infer_choices(description: &str, range: &ValueRange) -> Vec<Choice> {
    let text = description.trim();
    let count = i64::from(range.hi) - i64::from(range.lo) + 1;
    if text.is_empty()
        || !(2..=MAX_INFERRED_CHOICES).contains(&count)
        || DESCRIPTION_MAPPING.is_match(text)
    {
        return Vec::new();
    }

    let text = text.replace('&', ",");
    let text = DESCRIPTION_AND.replace_all(&text, ",");
    let labels: Vec<String> = text
        .split(',')
        .map(|part| TRAILING_NOTE.replace(part.trim(), "").trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();

    if i64::try_from(labels.len()).ok() != Some(count) {
        return Vec::new();
    }
    (range.lo..=range.hi)
        .zip(labels)
        .map(|(value, label)| Choice::new(label, value))
        .collect()
}

/// What `text` reads back as after being written into a table cell.
#[must_use]
pub fn table_cell_text(text: &str) -> String {
    clean_cell(&text.replace('|', "/").replace(['\n', '\r'], " "))
}

/// What a choice label reads back as after being written into a Choices cell.
#[must_use]
pub fn choice_cell_text(label: &str) -> String {
    table_cell_text(&label.replace([',', ';'], "/"))
}

/// Parses a Color cell; an empty cell yields `None`.
///
/// # Errors
///
/// Returns [`ConvertError::Color`] for anything but six hex digits with an
/// optional `#`.
pub fn parse_color(cell: &str, location: &RowLocation) -> Result<Option<Color>> {
    let text = cell.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Color::from_hex(text)
        .map(Some)
        .map_err(|_| ConvertError::Color {
            location: location.clone(),
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> RowLocation {
        RowLocation::new("TEST", 3)
    }

    fn range(cell: &str) -> Result<Option<ValueRange>> {
        parse_range(cell, &loc())
    }

    fn choices(cell: &str, lo: i32, hi: i32) -> Result<Vec<Choice>> {
        match parse_choices(cell, &ValueRange::new(lo, hi), &loc())? {
            ChoicesCell::Choices(choices) => Ok(choices),
            ChoicesCell::Envelope(_) => panic!("unexpected envelope keyword"),
        }
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(range("0-127").unwrap(), Some(ValueRange::new(0, 127)));
        assert_eq!(range("-25-12").unwrap(), Some(ValueRange::new(-25, 12)));
        assert_eq!(range("-64 – 63").unwrap(), Some(ValueRange::new(-64, 63)));
        assert_eq!(range("64").unwrap(), Some(ValueRange::new(64, 64)));
        assert_eq!(
            range("0-127 (64)").unwrap(),
            Some(ValueRange::new(0, 127).with_default(64))
        );
        assert_eq!(range("").unwrap(), None);
    }

    #[test]
    fn test_range_errors() {
        assert!(matches!(range("abc"), Err(ConvertError::Range { .. })));
        assert!(matches!(range("10-5"), Err(ConvertError::Range { .. })));
        assert!(matches!(range("0-127 (200)"), Err(ConvertError::Range { .. })));
        assert!(matches!(range("0-99999999999"), Err(ConvertError::Range { .. })));
    }

    #[test]
    fn test_sequential_choices() {
        let parsed = choices("Off, On", 0, 127).unwrap();
        assert_eq!(parsed, vec![Choice::new("Off", 0), Choice::new("On", 1)]);

        let from_lo = choices("A; B; C", 1, 3).unwrap();
        assert_eq!(from_lo[2], Choice::new("C", 3));
    }

    #[test]
    fn test_explicit_choices() {
        let parsed = choices("Off(0), On(63)", 0, 127).unwrap();
        assert_eq!(parsed, vec![Choice::new("Off", 0), Choice::new("On", 63)]);

        let prefixed = choices("0=Saw, 64=Square", 0, 127).unwrap();
        assert_eq!(prefixed[1], Choice::new("Square", 64));
    }

    #[test]
    fn test_choice_errors() {
        assert!(matches!(
            choices("A, B, C", 0, 1),
            Err(ConvertError::Range { .. })
        ));
        assert!(matches!(
            choices("A(1), B(1)", 0, 127),
            Err(ConvertError::Range { .. })
        ));
        assert!(matches!(
            choices("Low(-1)", 0, 127),
            Err(ConvertError::Range { .. })
        ));
    }

    #[test]
    fn test_empty_choice_markers() {
        assert!(choices("n/a", 0, 127).unwrap().is_empty());
        assert!(choices("None", 0, 127).unwrap().is_empty());
        assert!(choices("", 0, 127).unwrap().is_empty());
    }

    #[test]
    fn test_choice_runs() {
        let usb = choices("0=Off, 1:All, 2-5=USB1-USB4", 0, 127).unwrap();
        assert_eq!(usb.len(), 6);
        assert_eq!(usb[1], Choice::new("All", 1));
        assert_eq!(usb[2], Choice::new("USB1", 2));
        assert_eq!(usb[5], Choice::new("USB4", 5));

        let repeated = choices("Low(0-1), High(2)", 0, 2).unwrap();
        assert_eq!(
            repeated,
            vec![
                Choice::new("Low", 0),
                Choice::new("Low", 1),
                Choice::new("High", 2)
            ]
        );

        let same_label = choices("4-6=Bank", 0, 127).unwrap();
        assert!(same_label.iter().all(|c| c.label == "Bank"));
    }

    #[test]
    fn test_choice_run_errors() {
        assert!(matches!(
            choices("5-2=X", 0, 127),
            Err(ConvertError::Range { .. })
        ));
        assert!(matches!(
            choices("0-2000000000=X", 0, 127),
            Err(ConvertError::Range { .. })
        ));
        assert!(matches!(
            choices("A(0-3), B(3)", 0, 127),
            Err(ConvertError::Range { .. })
        ));
    }

    #[test]
    fn test_bare_label_detection() {
        assert!(is_bare_label("Saw"));
        assert!(is_bare_label("USB1-USB4"));
        assert!(!is_bare_label("Mode (9)"));
        assert!(!is_bare_label("1:All"));
        assert!(!is_bare_label("2-5=X"));
        assert!(!is_bare_label("Bank(1-3)"));
        assert!(!is_bare_label(" "));
    }

    #[test]
    fn test_choices_inferred_from_description() {
        let range = ValueRange::new(0, 2);
        let inferred = infer_choices("Saw, Square and Triangle (default)", &range);
        assert_eq!(
            inferred,
            vec![
                Choice::new("Saw", 0),
                Choice::new("Square", 1),
                Choice::new("Triangle", 2)
            ]
        );

        assert!(infer_choices("Saw, Square", &range).is_empty());
        assert!(infer_choices("0=Saw, 1=Square, 2=Tri", &range).is_empty());
        assert!(infer_choices("A, B", &ValueRange::new(0, 127)).is_empty());
        assert!(infer_choices("Just one thing", &ValueRange::new(5, 5)).is_empty());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(table_cell_text("A | B\nC"), "A / B C");
        assert_eq!(table_cell_text("**Bold**"), "Bold");
        assert_eq!(choice_cell_text("Left, Right"), "Left/ Right");
    }

    #[test]
    fn test_envelope_keyword() {
        let parsed = parse_choices("adsr", &ValueRange::default(), &loc()).unwrap();
        assert_eq!(parsed, ChoicesCell::Envelope(EnvelopeKind::Adsr));
    }

    #[test]
    fn test_color_cell() {
        assert_eq!(
            parse_color("#f45c51", &loc()).unwrap(),
            Some(Color::new(0xF4, 0x5C, 0x51))
        );
        assert_eq!(parse_color("", &loc()).unwrap(), None);
        assert!(matches!(
            parse_color("reddish", &loc()),
            Err(ConvertError::Color { .. })
        ));
    }
}
