//! Structures and values defined by the dstack guest runtime
//!
//! This library provides the definitions of the runtime events that dstack
//! measures into RTMR3 of a TDX guest when booting an application: the event
//! tag, the event names and the byte layout of one event. It does not compute
//! any hash.
#![warn(missing_docs)]
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Size of one TDX measurement register, in bytes
pub const RTMR_WIDTH: usize = 48;
/// One TDX measurement register value (MRTD or RTMR)
pub type RtmrValue = [u8; RTMR_WIDTH];

/// Event type of the runtime events emitted by dstack
pub const DSTACK_EVENT_TAG: u32 = 0x0800_0001;

/// Separator between the fields of a runtime event
const EVENT_SEPARATOR: u8 = b':';

/// Error from the event library
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Unknown event name
    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    /// Error while encoding into binary
    #[error("encoding error")]
    Encode(#[from] std::io::Error),
}
type Result<T> = core::result::Result<T, EventError>;

/// Runtime events extended into RTMR3 when an application boots
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    /// Hash of the root filesystem
    RootfsHash,
    /// Application identifier
    AppId,
    /// Hash of the application compose manifest
    ComposeHash,
    /// Hash of the CA certificate of the KMS
    CaCertHash,
    /// Identifier of the CVM instance
    InstanceId,
}

impl EventName {
    /// All events, in the order dstack extends them into RTMR3
    pub const BOOT_ORDER: [EventName; 5] = [
        EventName::RootfsHash,
        EventName::AppId,
        EventName::ComposeHash,
        EventName::CaCertHash,
        EventName::InstanceId,
    ];

    /// Name of the event as it appears in the event log
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::RootfsHash => "rootfs-hash",
            EventName::AppId => "app-id",
            EventName::ComposeHash => "compose-hash",
            EventName::CaCertHash => "ca-cert-hash",
            EventName::InstanceId => "instance-id",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = EventError;
    fn from_str(s: &str) -> Result<Self> {
        EventName::BOOT_ORDER
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent(String::from(s)))
    }
}

/// One runtime event: its name and payload. The measured bytes are
///
/// ```text
/// tag (u32, little-endian) | ':' | name | ':' | payload
/// ```
///
/// The payload is not padded.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeEvent<'a> {
    name: &'a str,
    payload: &'a [u8],
}

impl<'a> RuntimeEvent<'a> {
    /// Create a new RuntimeEvent for one of the known events
    pub fn new(name: EventName, payload: &'a [u8]) -> Self {
        Self {
            name: name.as_str(),
            payload,
        }
    }

    /// Create a new RuntimeEvent with an arbitrary name
    pub fn with_name(name: &'a str, payload: &'a [u8]) -> Self {
        Self { name, payload }
    }

    /// Event name
    pub fn name(&self) -> &str {
        self.name
    }

    /// Event payload
    pub fn payload(&self) -> &[u8] {
        self.payload
    }

    /// Return the bytes to be measured
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(4 + 2 + self.name.len() + self.payload.len());
        bytes.write_u32::<LittleEndian>(DSTACK_EVENT_TAG)?;
        bytes.push(EVENT_SEPARATOR);
        bytes.extend_from_slice(self.name.as_bytes());
        bytes.push(EVENT_SEPARATOR);
        bytes.extend_from_slice(self.payload);
        Ok(bytes)
    }
}
