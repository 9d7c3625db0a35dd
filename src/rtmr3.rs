//!
//! Compute the RTMR3 of a dstack application.
//!
//! When an application boots, the dstack guest extends RTMR3 with five runtime
//! events, always in the same order: the rootfs hash, the app ID, the compose
//! hash, the KMS CA certificate hash and the instance ID. Given the same
//! values, we compute the digest of each event and replay them to obtain the
//! RTMR3 that should be reported in the TDX quote.
//!
use dstack_event::{EventName, RtmrValue};
use serde::Serialize;
use thiserror::Error;

use crate::compose::{compose_hash, ComposeError, ComposeManifest};
use crate::digest::{event_digest, event_digest_bytes};
use crate::replay::{replay, ReplayError, Rtmr};
use crate::utils::{decode_hex, decode_hex_strict, encode_hex, HexError};

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Rtmr3Error {
    #[error("{0} is not known")]
    Missing(EventName),

    #[error("invalid {name}: {e}")]
    Hex { name: EventName, e: HexError },

    #[error("compose manifest: {0}")]
    Compose(#[from] ComposeError),

    #[error("replay: {0}")]
    Replay(#[from] ReplayError),
}
type Result<T> = core::result::Result<T, Rtmr3Error>;

/// Where the compose hash comes from
#[derive(Clone, Debug, PartialEq)]
pub enum ComposeInput {
    /// Text of the compose manifest, hashed canonically
    Manifest(String),
    /// Precomputed compose hash, in hex
    Hash(String),
}

impl Default for ComposeInput {
    fn default() -> Self {
        ComposeInput::Manifest(String::new())
    }
}

/// Values measured into RTMR3. Hashes and identifiers are hex strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rtmr3Inputs {
    /// Hash of the root filesystem
    pub rootfs_hash: String,
    /// Application identifier
    pub app_id: String,
    /// The compose manifest or its hash
    pub compose: ComposeInput,
    /// Hash of the KMS CA certificate
    pub ca_cert_hash: String,
    /// Instance identifier
    pub instance_id: String,
}

impl Rtmr3Inputs {
    fn value(&self, name: EventName) -> &str {
        match name {
            EventName::RootfsHash => &self.rootfs_hash,
            EventName::AppId => &self.app_id,
            EventName::CaCertHash => &self.ca_cert_hash,
            EventName::InstanceId => &self.instance_id,
            EventName::ComposeHash => match &self.compose {
                ComposeInput::Hash(h) => h,
                // Needs hashing first
                ComposeInput::Manifest(_) => "",
            },
        }
    }
}

/// One event measured into RTMR3
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventDigest {
    /// Event name
    pub event: EventName,
    /// Event payload, in hex
    pub payload: String,
    /// SHA-384 of the event, in hex
    pub digest: String,
}

/// Result of an RTMR3 computation, with the intermediate values
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rtmr3Computation {
    /// The compose hash, in hex
    pub compose_hash: String,
    /// The events in the order they were extended
    pub events: Vec<EventDigest>,
    /// Final register value
    pub rtmr3: Rtmr,
}

/// Computes RTMR3 and reports why a computation didn't succeed
#[derive(Clone, Copy, Debug, Default)]
pub struct Rtmr3Calculator {
    strict: bool,
}

impl Rtmr3Calculator {
    /// Create a new calculator. By default hex input is decoded leniently.
    pub fn new() -> Self {
        Self::default()
    }

    /// When true, reject malformed hex input instead of ignoring the invalid
    /// characters.
    pub fn strict(&mut self, v: bool) -> &mut Self {
        self.strict = v;
        self
    }

    fn decode(&self, name: EventName, value: &str) -> Result<Vec<u8>> {
        if value.trim().is_empty() {
            return Err(Rtmr3Error::Missing(name));
        }
        if self.strict {
            decode_hex_strict(value).map_err(|e| Rtmr3Error::Hex { name, e })
        } else {
            Ok(decode_hex(value))
        }
    }

    fn compose_hash(&self, inputs: &Rtmr3Inputs) -> Result<Vec<u8>> {
        match &inputs.compose {
            ComposeInput::Manifest(text) => {
                if text.trim().is_empty() {
                    return Err(Rtmr3Error::Missing(EventName::ComposeHash));
                }
                Ok(ComposeManifest::parse(text).hash()?.to_vec())
            }
            ComposeInput::Hash(h) => self.decode(EventName::ComposeHash, h),
        }
    }

    /// Compute RTMR3 from all inputs, hashing the compose manifest if needed
    pub fn calc_rtmr3(&self, inputs: &Rtmr3Inputs) -> Result<Rtmr3Computation> {
        let compose_hash = self.compose_hash(inputs)?;

        let mut events = vec![];
        let mut digests = vec![];
        for name in EventName::BOOT_ORDER {
            let payload = match name {
                EventName::ComposeHash => compose_hash.clone(),
                _ => self.decode(name, inputs.value(name))?,
            };
            let digest = event_digest_bytes(name, &payload)?;
            log::debug!("{name}: {} digest: {}", encode_hex(&payload), encode_hex(&digest));
            events.push(EventDigest {
                event: name,
                payload: encode_hex(&payload),
                digest: encode_hex(&digest),
            });
            digests.push(digest);
        }

        let rtmr3 = Rtmr::replay(&digests)?;
        log::debug!("RTMR3: {}", rtmr3.to_hex());

        Ok(Rtmr3Computation {
            compose_hash: encode_hex(&compose_hash),
            events,
            rtmr3,
        })
    }
}

/// Compute RTMR3 from the five event digests, given in extension order
pub fn calc_rtmr3_from_digests(digests: &[RtmrValue; 5]) -> Result<Rtmr> {
    Ok(Rtmr::replay(digests)?)
}

/// Compute RTMR3, in hex. Returns an empty string if any input is missing or
/// if one of the steps failed.
pub fn compute(inputs: &Rtmr3Inputs) -> String {
    let compose = match &inputs.compose {
        ComposeInput::Manifest(text) => compose_hash(text),
        ComposeInput::Hash(h) => h.clone(),
    };

    let mut digests = vec![];
    for name in EventName::BOOT_ORDER {
        let value = match name {
            EventName::ComposeHash => compose.as_str(),
            _ => inputs.value(name),
        };
        let digest = event_digest(name, value);
        if digest.is_empty() {
            log::debug!("{name} is not available");
            return String::new();
        }
        digests.push(digest);
    }

    replay(&digests)
}
