//! Address cell grammar.
//!
//! A cell is first classified by shape (empty, keyword, list, single number)
//! and then handed to the decoder for that shape. The grammar is closed:
//! anything that does not classify is an address error.
//!
//! | Cell        | Meaning                                   |
//! |-------------|-------------------------------------------|
//! | `74`        | CC 74, width from the range               |
//! | `C:74`      | CC 74, always 7-bit                       |
//! | `N:1024`    | NRPN 1024, width from the range           |
//! | `2:N:1024`  | the same, on device 2                     |
//! | `1,2,3,4`   | envelope (needs `ADSR`/`ADR` in Choices)  |
//! | `P`         | program change                            |
//! | (empty)     | blank, or a group header when labelled    |

use crate::error::{ConvertError, Result, RowLocation};
use crate::models::{Address, EnvelopeKind, Message, MessageKind, ValueRange};
use regex::Regex;
use std::sync::LazyLock;

static DEVICE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*:\s*(.+)$").expect("device prefix regex is valid"));

static KIND_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([CcNn])\s*:?\s*(.+)$").expect("kind prefix regex is valid"));

/// Largest value a 7-bit message can carry.
pub const SEVEN_BIT_MAX: i32 = 127;

/// Largest value a 14-bit message can carry.
pub const FOURTEEN_BIT_MAX: i32 = 16383;

/// Everything the decoder needs to know about a row.
#[derive(Debug, Clone, Copy)]
pub struct AddressCell<'a> {
    /// Raw address cell
    pub text: &'a str,
    /// Column is hexadecimal
    pub hex: bool,
    /// Label cell
    pub label: &'a str,
    /// Parsed range, `None` when the Range cell is empty
    pub range: Option<ValueRange>,
    /// Envelope keyword from the Choices cell
    pub envelope: Option<EnvelopeKind>,
}

/// Decoded address plus the device it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Explicit `k:` device prefix
    pub device: Option<u8>,
    /// The address
    pub address: Address,
}

impl ParsedAddress {
    const fn new(device: Option<u8>, address: Address) -> Self {
        Self { device, address }
    }
}

/// Message family requested by a `C`/`N` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    /// No prefix: CC with inferred width
    Cc,
    /// `C`: CC, always 7-bit
    ForcedCc7,
    /// `N`: NRPN with inferred width
    Nrpn,
}

/// Token shapes, before any number is decoded.
#[derive(Debug, PartialEq, Eq)]
enum Shape<'a> {
    Empty,
    GroupKeyword,
    ProgramChange,
    List(Family, Vec<&'a str>),
    Single(Family, &'a str),
}

fn classify(text: &str) -> Shape<'_> {
    let text = text.trim();
    if text.is_empty() {
        return Shape::Empty;
    }
    if text.eq_ignore_ascii_case("group") {
        return Shape::GroupKeyword;
    }
    if text.eq_ignore_ascii_case("p") {
        return Shape::ProgramChange;
    }

    let (family, rest) = match KIND_PREFIX.captures(text) {
        Some(caps) => {
            let family = if caps[1].eq_ignore_ascii_case("n") {
                Family::Nrpn
            } else {
                Family::ForcedCc7
            };
            let rest = caps.get(2).map_or("", |m| m.as_str());
            (family, rest)
        }
        None => (Family::Cc, text),
    };

    if rest.contains(',') {
        Shape::List(family, rest.split(',').map(str::trim).collect())
    } else {
        Shape::Single(family, rest.trim())
    }
}

/// Decodes one parameter number.
fn decode_number(token: &str, hex: bool, location: &RowLocation) -> Result<u16> {
    let token = token.trim();
    let (digits, radix) = if let Some(digits) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        (digits, 16)
    } else if hex {
        (token, 16)
    } else {
        if token.chars().any(|c| c.is_ascii_hexdigit() && !c.is_ascii_digit())
            && token.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ConvertError::address(
                location,
                format!("'{token}' looks hexadecimal but the column is decimal; write 0x{token}"),
            ));
        }
        (token, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ConvertError::address(
            location,
            format!("unrecognised address token '{token}'"),
        ));
    }

    u16::from_str_radix(digits, radix).map_err(|_| {
        ConvertError::address(location, format!("parameter number '{token}' is too large"))
    })
}

/// Picks the message kind for a family and range.
///
/// The upper bound decides the width: up to 127 is 7-bit, up to 16383 is
/// 14-bit. A `C` prefix always means 7-bit CC.
fn message_kind(
    family: Family,
    range: Option<ValueRange>,
    location: &RowLocation,
) -> Result<MessageKind> {
    if family == Family::ForcedCc7 {
        return Ok(MessageKind::Cc7);
    }

    let hi = range.map_or(SEVEN_BIT_MAX, |range| range.hi);
    let wide = match hi {
        hi if hi <= SEVEN_BIT_MAX => false,
        hi if hi <= FOURTEEN_BIT_MAX => true,
        hi => {
            return Err(ConvertError::range(
                location,
                format!("range reaches {hi}, more than 14 bits can carry"),
            ))
        }
    };

    Ok(match (family, wide) {
        (Family::Nrpn, true) => MessageKind::Nrpn14,
        (Family::Nrpn, false) => MessageKind::Nrpn7,
        (_, true) => MessageKind::Cc14,
        (_, false) => MessageKind::Cc7,
    })
}

fn checked_message(kind: MessageKind, number: u16, location: &RowLocation) -> Result<Message> {
    if number > kind.max_parameter() {
        let family = if kind.is_nrpn() { "NRPN" } else { "CC" };
        return Err(ConvertError::address(
            location,
            format!(
                "{family} number {number} is out of range (0-{})",
                kind.max_parameter()
            ),
        ));
    }
    Ok(Message::new(kind, number))
}

fn group_marker(cell: &AddressCell<'_>, location: &RowLocation) -> Result<Address> {
    let Some(range) = cell.range else {
        return Err(ConvertError::address(
            location,
            format!("'{}' has no address and no group span", cell.label),
        ));
    };
    if range.lo != range.hi {
        return Err(ConvertError::range(
            location,
            format!("group span must be a single number, got {range}"),
        ));
    }
    match u8::try_from(range.hi) {
        Ok(span) if span > 0 => Ok(Address::GroupMarker { span }),
        _ => Err(ConvertError::range(
            location,
            format!("group span {} must be between 1 and 255", range.hi),
        )),
    }
}

/// Decodes an address cell.
///
/// `device_count` is the number of declared devices; a `k:` prefix beyond it
/// is rejected.
///
/// # Errors
///
/// Returns [`ConvertError::Address`] for unrecognised tokens, out-of-range
/// parameter numbers, envelope arity mismatches and unknown devices, and
/// [`ConvertError::Range`] when the range is too wide for 14 bits or a group
/// span is malformed.
pub fn parse_address(
    cell: &AddressCell<'_>,
    device_count: usize,
    location: &RowLocation,
) -> Result<ParsedAddress> {
    let text = cell.text.trim();
    let label = cell.label.trim();

    let (device, rest) = match DEVICE_PREFIX.captures(text) {
        Some(caps) => {
            let index: usize = caps[1].parse().map_err(|_| {
                ConvertError::address(location, format!("invalid device prefix in '{text}'"))
            })?;
            if index == 0 || index > device_count {
                return Err(ConvertError::address(
                    location,
                    format!("device {index} is not declared ({device_count} device(s) available)"),
                ));
            }
            let index = u8::try_from(index).map_err(|_| {
                ConvertError::address(location, format!("device {index} is not declared"))
            })?;
            (Some(index), caps.get(2).map_or("", |m| m.as_str()))
        }
        None => (None, text),
    };

    let shape = classify(rest);

    if let Some(kind) = cell.envelope {
        if !matches!(shape, Shape::List(..)) {
            return Err(ConvertError::address(
                location,
                format!(
                    "{} needs a list of {} parameter numbers, got '{text}'",
                    kind.keyword(),
                    kind.arity()
                ),
            ));
        }
    }

    match shape {
        Shape::Empty => {
            if label.is_empty() && cell.range.is_none() {
                Ok(ParsedAddress::new(device, Address::Blank))
            } else if label.is_empty() {
                Err(ConvertError::address(
                    location,
                    "row has a range but no address or label",
                ))
            } else {
                Ok(ParsedAddress::new(device, group_marker(cell, location)?))
            }
        }
        Shape::GroupKeyword => {
            if label.is_empty() {
                return Err(ConvertError::address(location, "group row needs a label"));
            }
            Ok(ParsedAddress::new(device, group_marker(cell, location)?))
        }
        Shape::ProgramChange => Ok(ParsedAddress::new(device, Address::ProgramChange)),
        Shape::Single(family, token) => {
            let number = decode_number(token, cell.hex, location)?;
            let kind = message_kind(family, cell.range, location)?;
            let message = checked_message(kind, number, location)?;
            Ok(ParsedAddress::new(device, Address::from_message(message)))
        }
        Shape::List(family, tokens) => {
            let Some(envelope) = cell.envelope else {
                return Err(ConvertError::address(
                    location,
                    format!(
                        "'{text}' lists {} numbers but Choices has no ADSR/ADR keyword",
                        tokens.len()
                    ),
                ));
            };
            if tokens.len() != envelope.arity() {
                return Err(ConvertError::address(
                    location,
                    format!(
                        "{} needs exactly {} parameter numbers, got {}",
                        envelope.keyword(),
                        envelope.arity(),
                        tokens.len()
                    ),
                ));
            }
            let kind = message_kind(family, cell.range, location)?;
            let messages = tokens
                .iter()
                .map(|token| {
                    let number = decode_number(token, cell.hex, location)?;
                    checked_message(kind, number, location)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ParsedAddress::new(device, Address::EnvelopeGroup(messages)))
        }
    }
}
