//!
//! Digest of one dstack runtime event, as recorded in the event log and
//! extended into RTMR3.
//!
use dstack_event::{EventName, RtmrValue, RuntimeEvent};

use crate::replay::{measure_bytes, ReplayError};
use crate::utils::{decode_hex, encode_hex};

type Result<T> = core::result::Result<T, ReplayError>;

/// SHA-384 of a runtime event. The payload is measured as is, without
/// padding.
pub fn measure_event(event: &RuntimeEvent) -> Result<RtmrValue> {
    log::trace!("event {}: {}", event.name(), encode_hex(event.payload()));
    let bytes = event.as_bytes()?;
    measure_bytes(&[bytes.as_slice()])
}

/// Digest of a known event, with a raw payload
pub fn event_digest_bytes(name: EventName, payload: &[u8]) -> Result<RtmrValue> {
    measure_event(&RuntimeEvent::new(name, payload))
}

/// Digest of a known event whose payload is given in hex. An empty value
/// means the payload isn't known yet, and yields an empty string. Failures
/// are logged and also yield an empty string.
pub fn event_digest(name: EventName, value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match event_digest_bytes(name, &decode_hex(value)) {
        Ok(d) => encode_hex(&d),
        Err(e) => {
            log::warn!("cannot compute {name} digest: {e}");
            String::new()
        }
    }
}
