//!
//! Replay of a TDX runtime measurement register.
//!
//! An RTMR starts at zero and can only be extended: the new value is
//! `SHA-384(rtmr || event)`, where `event` is a 48-byte digest. Events shorter
//! than 48 bytes are padded with zeroes on the right.
//!
use base64::{engine::general_purpose::STANDARD as base64_standard, Engine as _};
use dstack_event::{EventError, RtmrValue, RTMR_WIDTH};
use openssl::hash::{Hasher, MessageDigest};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::utils::{decode_hex, decode_hex_strict, encode_hex, HexError};

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ReplayError {
    #[error("event {index} is {len} bytes, larger than {RTMR_WIDTH}")]
    EventTooLarge { index: usize, len: usize },

    #[error("hash: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),

    #[error("event: {0}")]
    Event(#[from] EventError),

    #[error("invalid hex: {0}")]
    Hex(#[from] HexError),
}
type Result<T> = core::result::Result<T, ReplayError>;

/// Compute the SHA-384 of the concatenation of `parts`
pub fn measure_bytes(parts: &[&[u8]]) -> Result<RtmrValue> {
    let mut hasher = Hasher::new(MessageDigest::sha384())?;
    for p in parts {
        hasher.update(p)?;
    }
    let digest = hasher.finish()?;

    let mut m = [0; RTMR_WIDTH];
    m.copy_from_slice(&digest);
    Ok(m)
}

/// A runtime measurement register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rtmr(RtmrValue);

impl Default for Rtmr {
    fn default() -> Self {
        Self([0; RTMR_WIDTH])
    }
}

impl Rtmr {
    /// A register in its reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the register with one event digest. `event` is zero-padded to
    /// 48 bytes and must not be larger.
    pub fn extend(&mut self, event: &[u8]) -> Result<()> {
        if event.len() > RTMR_WIDTH {
            return Err(ReplayError::EventTooLarge {
                index: 0,
                len: event.len(),
            });
        }
        let mut padded = [0; RTMR_WIDTH];
        padded[..event.len()].copy_from_slice(event);

        self.0 = measure_bytes(&[&self.0[..], &padded[..]])?;
        Ok(())
    }

    /// Replay all events in order, starting from a reset register
    pub fn replay<T: AsRef<[u8]>>(events: &[T]) -> Result<Self> {
        let mut rtmr = Self::new();
        for (index, event) in events.iter().enumerate() {
            rtmr.extend(event.as_ref()).map_err(|e| match e {
                ReplayError::EventTooLarge { len, .. } => {
                    ReplayError::EventTooLarge { index, len }
                }
                e => e,
            })?;
            log::trace!("RTMR after event {index}: {}", rtmr.to_hex());
        }
        Ok(rtmr)
    }

    /// Raw register value
    pub fn value(&self) -> &RtmrValue {
        &self.0
    }

    /// The register value in lowercase hex
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// The register value in base64
    pub fn to_base64(&self) -> String {
        base64_standard.encode(self.0)
    }

    /// Display the register, either in hex or base64
    pub fn dump(&self, print_b64: bool) -> String {
        if print_b64 {
            self.to_base64()
        } else {
            self.to_hex()
        }
    }
}

// Serialized as hex, like in the TDX quote dumps
impl Serialize for Rtmr {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl From<RtmrValue> for Rtmr {
    fn from(value: RtmrValue) -> Self {
        Self(value)
    }
}

/// Replay hex-encoded event digests, decoded leniently
pub fn rtmr_replay<S: AsRef<str>>(history: &[S]) -> Result<Rtmr> {
    let events: Vec<Vec<u8>> = history.iter().map(|h| decode_hex(h.as_ref())).collect();
    Rtmr::replay(&events)
}

/// Replay hex-encoded event digests, failing on malformed hex
pub fn rtmr_replay_strict<S: AsRef<str>>(history: &[S]) -> Result<Rtmr> {
    let events = history
        .iter()
        .map(|h| decode_hex_strict(h.as_ref()))
        .collect::<core::result::Result<Vec<_>, _>>()?;
    Rtmr::replay(&events)
}

/// Replay hex-encoded event digests and return the hex register value, or an
/// empty string if the replay failed.
pub fn replay(history: &[String]) -> String {
    match rtmr_replay(history) {
        Ok(rtmr) => rtmr.to_hex(),
        Err(e) => {
            log::warn!("cannot replay RTMR: {e}");
            String::new()
        }
    }
}
