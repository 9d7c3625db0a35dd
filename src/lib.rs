//! Compute the expected RTMR3 of a dstack application on Intel TDX.
//!
//! A dstack Confidential VM measures the application it boots into the
//! runtime measurement register RTMR3. A relying party that knows the
//! application parameters can replay those measurements outside of the TEE,
//! and compare the result with the RTMR3 reported in an attestation quote.
//! Equality shows that the TEE runs the expected deployment.
//!
//! Example
//! ```bash
//! rtmr3-replay compute
//!     --rootfs-hash <hex>         # Provided by the OS image
//!     --app-id <hex>              # Public
//!     --manifest app-compose.json # Downloaded from the deployment
//!     --ca-cert-hash <hex>        # Provided by the KMS
//!     --instance-id <hex>         # Public
//! ```
//!
//! # About RTMR3
//!
//! TDX provides four Runtime Measurement Registers (RTMR) that the guest can
//! extend but never overwrite. The dstack guest extends RTMR3 with the digest
//! of five runtime events, in a fixed order: `rootfs-hash`, `app-id`,
//! `compose-hash`, `ca-cert-hash` and `instance-id`. Each digest is the
//! SHA-384 of the event tag, name and payload. Each extension computes
//! `RTMR3 = SHA-384(RTMR3 || digest)`.
//!
//! The library computes the same thing:
//!
//! ```
//! use rtmr3_replay::rtmr3::{compute, ComposeInput, Rtmr3Inputs};
//!
//! let zero = "00".repeat(48);
//! let inputs = Rtmr3Inputs {
//!     rootfs_hash: zero.clone(),
//!     app_id: zero.clone(),
//!     compose: ComposeInput::Manifest(r#"{"a":1}"#.to_string()),
//!     ca_cert_hash: zero.clone(),
//!     instance_id: zero,
//! };
//! let rtmr3 = compute(&inputs);
//! assert_eq!(rtmr3.len(), 96);
//! ```

#![warn(missing_docs)]
/// Canonical hash of the compose manifest
pub mod compose;
/// Digest of runtime events
pub mod digest;
/// RTMR replay
pub mod replay;
/// RTMR3 of a dstack application
pub mod rtmr3;
/// Staleness guard for repeated computations
pub mod session;

/// Command-line definition
#[allow(missing_docs)]
pub mod command_line;
/// Configuration files
pub mod rtmr3_config;
/// Application parameters
pub mod rtmr3_params;
/// Hex codec
pub mod utils;
