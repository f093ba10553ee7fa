//! MIDI device declarations.

use serde::{Deserialize, Serialize};

/// A MIDI device that controls are bound to.
///
/// Devices are numbered from 1 in declaration order; that number is what an
/// address prefix such as `2:N:1024` refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// 1-based index in the document's device list
    pub index: u8,
    /// Display name (e.g., "Moog Subsequent 37")
    pub name: String,
    /// Informational manufacturer name
    pub manufacturer: Option<String>,
    /// MIDI port (1-based)
    pub port: u8,
    /// MIDI channel (1-16)
    pub channel: u8,
}

impl Device {
    /// Creates a device on port 1, channel 1.
    pub fn new(index: u8, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            manufacturer: None,
            port: crate::constants::DEFAULT_PORT,
            channel: crate::constants::DEFAULT_CHANNEL,
        }
    }

    /// Sets the MIDI port.
    #[must_use]
    pub const fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Sets the MIDI channel.
    #[must_use]
    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }
}
