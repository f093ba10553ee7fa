//! Control addresses, value ranges, choices and derived control types.

use crate::models::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// MIDI message family and bit width a control sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// 7-bit Continuous Controller
    Cc7,
    /// 14-bit Continuous Controller (MSB/LSB pair)
    Cc14,
    /// NRPN carrying a 7-bit value
    Nrpn7,
    /// NRPN carrying a 14-bit value
    Nrpn14,
    /// Program Change
    ProgramChange,
}

impl MessageKind {
    /// Message type name used in preset JSON.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::Cc7 | Self::Cc14 => "cc",
            Self::Nrpn7 | Self::Nrpn14 => "nrpn",
            Self::ProgramChange => "program",
        }
    }

    /// Value width in bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Cc14 | Self::Nrpn14 => 14,
            Self::Cc7 | Self::Nrpn7 | Self::ProgramChange => 7,
        }
    }

    /// Resolves a JSON `type`/`bits` pair back into a kind.
    #[must_use]
    pub fn from_wire(wire_type: &str, bits: u8) -> Option<Self> {
        match (wire_type, bits) {
            ("cc", 7) => Some(Self::Cc7),
            ("cc", 14) => Some(Self::Cc14),
            ("nrpn", 7) => Some(Self::Nrpn7),
            ("nrpn", 14) => Some(Self::Nrpn14),
            ("program", 7) => Some(Self::ProgramChange),
            _ => None,
        }
    }

    /// Largest parameter number the message family can address.
    #[must_use]
    pub const fn max_parameter(self) -> u16 {
        match self {
            Self::Cc7 | Self::Cc14 => 127,
            Self::Nrpn7 | Self::Nrpn14 => 16383,
            Self::ProgramChange => 0,
        }
    }

    /// True for the NRPN family.
    #[must_use]
    pub const fn is_nrpn(self) -> bool {
        matches!(self, Self::Nrpn7 | Self::Nrpn14)
    }
}

/// One MIDI message target: kind plus parameter number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Message family and width
    pub kind: MessageKind,
    /// CC or NRPN number; `None` for program change
    pub parameter: Option<u16>,
}

impl Message {
    /// Creates a message with a parameter number.
    #[must_use]
    pub const fn new(kind: MessageKind, parameter: u16) -> Self {
        Self {
            kind,
            parameter: Some(parameter),
        }
    }

    /// Creates a program change message.
    #[must_use]
    pub const fn program_change() -> Self {
        Self {
            kind: MessageKind::ProgramChange,
            parameter: None,
        }
    }
}

/// Decoded address cell.
///
/// The grammar is closed: every row of a control table decodes to exactly one
/// of these variants or fails with an address error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Address {
    /// 7-bit CC number
    Cc7(u16),
    /// 14-bit CC number
    Cc14(u16),
    /// NRPN number with 7-bit value
    Nrpn7(u16),
    /// NRPN number with 14-bit value
    Nrpn14(u16),
    /// Program change
    ProgramChange,
    /// Three (ADR) or four (ADSR) parameters driven by one envelope widget
    EnvelopeGroup(Vec<Message>),
    /// Group header reserving `span` following cells
    GroupMarker {
        /// Number of cells the group covers
        span: u8,
    },
    /// Spacer taking one grid cell
    Blank,
}

impl Address {
    /// Builds a single-parameter address from a message.
    #[must_use]
    pub const fn from_message(message: Message) -> Self {
        match (message.kind, message.parameter) {
            (MessageKind::Cc7, Some(n)) => Self::Cc7(n),
            (MessageKind::Cc14, Some(n)) => Self::Cc14(n),
            (MessageKind::Nrpn7, Some(n)) => Self::Nrpn7(n),
            (MessageKind::Nrpn14, Some(n)) => Self::Nrpn14(n),
            _ => Self::ProgramChange,
        }
    }

    /// Messages a control with this address sends, in component order.
    ///
    /// Group markers and blanks send nothing.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        match self {
            Self::Cc7(n) => vec![Message::new(MessageKind::Cc7, *n)],
            Self::Cc14(n) => vec![Message::new(MessageKind::Cc14, *n)],
            Self::Nrpn7(n) => vec![Message::new(MessageKind::Nrpn7, *n)],
            Self::Nrpn14(n) => vec![Message::new(MessageKind::Nrpn14, *n)],
            Self::ProgramChange => vec![Message::program_change()],
            Self::EnvelopeGroup(messages) => messages.clone(),
            Self::GroupMarker { .. } | Self::Blank => Vec::new(),
        }
    }
}

/// Envelope shape, named by its keyword in the Choices column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvelopeKind {
    /// Attack, Decay, Sustain, Release
    Adsr,
    /// Attack, Decay, Release
    Adr,
}

impl EnvelopeKind {
    /// Parses the Choices keyword (`ADSR` / `ADR`, any case).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_uppercase().as_str() {
            "ADSR" => Some(Self::Adsr),
            "ADR" => Some(Self::Adr),
            _ => None,
        }
    }

    /// The Choices keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Adsr => "ADSR",
            Self::Adr => "ADR",
        }
    }

    /// Number of parameters the envelope drives.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Adsr => 4,
            Self::Adr => 3,
        }
    }

    /// Value ids of the envelope components, in address order.
    #[must_use]
    pub const fn component_ids(self) -> &'static [&'static str] {
        match self {
            Self::Adsr => &["attack", "decay", "sustain", "release"],
            Self::Adr => &["attack", "decay", "release"],
        }
    }
}

/// Numeric range of a control with an optional explicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lowest value
    pub lo: i32,
    /// Highest value
    pub hi: i32,
    /// Value sent at startup when given as `0-127 (64)`
    pub default: Option<i32>,
}

impl ValueRange {
    /// Creates a range without a default.
    #[must_use]
    pub const fn new(lo: i32, hi: i32) -> Self {
        Self {
            lo,
            hi,
            default: None,
        }
    }

    /// Sets the explicit default.
    #[must_use]
    pub const fn with_default(mut self, default: i32) -> Self {
        self.default = Some(default);
        self
    }

    /// True when `value` lies within the bounds.
    #[must_use]
    pub const fn contains(&self, value: i32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::new(0, 127)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)?;
        } else {
            write!(f, "{}-{}", self.lo, self.hi)?;
        }
        if let Some(default) = self.default {
            write!(f, " ({default})")?;
        }
        Ok(())
    }
}

/// One labelled value of a list or pad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice {
    /// Text shown on the device
    pub label: String,
    /// Value sent when selected
    pub value: i32,
}

impl Choice {
    /// Creates a choice.
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Label pairs that make a two-choice control a toggle pad.
const TOGGLE_PAIRS: &[(&str, &str)] = &[
    ("off", "on"),
    ("pause", "play"),
    ("stop", "play"),
    ("no", "yes"),
    ("false", "true"),
    ("disabled", "enabled"),
    ("unmute", "mute"),
];

/// Label pairs that make a two-choice control a momentary pad.
const MOMENTARY_PAIRS: &[(&str, &str)] = &[
    ("released", "pressed"),
    ("release", "press"),
    ("released", "momentary"),
];

fn matches_pair(choices: &[Choice], pairs: &[(&str, &str)]) -> bool {
    let [first, second] = choices else {
        return false;
    };
    let a = first.label.trim().to_lowercase();
    let b = second.label.trim().to_lowercase();
    pairs
        .iter()
        .any(|(x, y)| (a == *x && b == *y) || (a == *y && b == *x))
}

/// Widget the device renders for a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlType {
    /// Continuous slider
    Fader,
    /// Selector over a choice list
    List,
    /// Two-state button
    Pad,
    /// Composite envelope editor
    Envelope(EnvelopeKind),
}

impl ControlType {
    /// Derives the type by precedence: Envelope > Pad > List > Fader.
    #[must_use]
    pub fn derive(address: &Address, choices: &[Choice]) -> Self {
        if let Address::EnvelopeGroup(messages) = address {
            return if messages.len() == EnvelopeKind::Adsr.arity() {
                Self::Envelope(EnvelopeKind::Adsr)
            } else {
                Self::Envelope(EnvelopeKind::Adr)
            };
        }
        if matches_pair(choices, TOGGLE_PAIRS) || matches_pair(choices, MOMENTARY_PAIRS) {
            Self::Pad
        } else if !choices.is_empty() {
            Self::List
        } else {
            Self::Fader
        }
    }

    /// Type name used in preset JSON.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Fader => "fader",
            Self::List => "list",
            Self::Pad => "pad",
            Self::Envelope(EnvelopeKind::Adsr) => "adsr",
            Self::Envelope(EnvelopeKind::Adr) => "adr",
        }
    }

    /// Resolves a JSON type name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "fader" => Some(Self::Fader),
            "list" => Some(Self::List),
            "pad" => Some(Self::Pad),
            "adsr" => Some(Self::Envelope(EnvelopeKind::Adsr)),
            "adr" => Some(Self::Envelope(EnvelopeKind::Adr)),
            _ => None,
        }
    }

    /// Number of grid cells the widget occupies.
    #[must_use]
    pub const fn cell_width(self) -> u32 {
        match self {
            Self::Envelope(_) => 2,
            Self::Fader | Self::List | Self::Pad => 1,
        }
    }
}

/// Interaction mode sent alongside the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// Fader from a non-negative minimum
    Unipolar,
    /// Fader centred around zero
    Bipolar,
    /// Latching pad
    Toggle,
    /// Pad active only while held
    Momentary,
    /// Lists and envelopes
    Default,
}

impl ControlMode {
    /// Derives the mode from type, range and choice labels.
    #[must_use]
    pub fn derive(control_type: ControlType, range: &ValueRange, choices: &[Choice]) -> Self {
        match control_type {
            ControlType::Fader if range.lo < 0 => Self::Bipolar,
            ControlType::Fader => Self::Unipolar,
            ControlType::Pad if matches_pair(choices, MOMENTARY_PAIRS) => Self::Momentary,
            ControlType::Pad => Self::Toggle,
            ControlType::List | ControlType::Envelope(_) => Self::Default,
        }
    }

    /// Mode name used in preset JSON.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Unipolar => "unipolar",
            Self::Bipolar => "bipolar",
            Self::Toggle => "toggle",
            Self::Momentary => "momentary",
            Self::Default => "default",
        }
    }
}

/// A fully resolved control row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Decoded address (always a control variant)
    pub address: Address,
    /// Display label
    pub label: String,
    /// 1-based device index
    pub device: u8,
    /// Value range
    pub range: ValueRange,
    /// Labelled values, in document order
    pub choices: Vec<Choice>,
    /// Resolved color after carry-forward
    pub color: Option<Color>,
    /// Derived widget type
    pub control_type: ControlType,
    /// Derived interaction mode
    pub mode: ControlMode,
    /// Free-form notes from the Description column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Control {
    /// Creates a control and derives its type and mode.
    pub fn new(
        address: Address,
        label: impl Into<String>,
        device: u8,
        range: ValueRange,
        choices: Vec<Choice>,
    ) -> Self {
        let control_type = ControlType::derive(&address, &choices);
        let mode = ControlMode::derive(control_type, &range, &choices);
        Self {
            address,
            label: label.into(),
            device,
            range,
            choices,
            color: None,
            control_type,
            mode,
            description: None,
        }
    }

    /// Sets the resolved color.
    #[must_use]
    pub const fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when choice values run `lo, lo+1, ...` in order.
    #[must_use]
    pub fn has_sequential_choices(&self) -> bool {
        self.choices
            .iter()
            .enumerate()
            .all(|(i, choice)| i64::from(choice.value) == i64::from(self.range.lo) + i as i64)
    }
}
