/// Parse the main command-line
///
use clap::{Parser, Subcommand};
use dstack_event::EventName;

use crate::rtmr3_params::Rtmr3Params;

// This is the help blurb:
/// Compute the RTMR3 value that a dstack TDX guest reports after booting an
/// application, in order to compare it with the one found in an attestation
/// quote.
#[derive(Debug, Parser)]
#[command(version, long_about, verbatim_doc_comment)]
pub struct Args {
    /// Display more information (use multiple times to increase verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file. Can be specified multiple times to provide overlays.
    /// For example: -c os-image.conf -c app.conf
    #[arg(short, long, verbatim_doc_comment, value_name = "file")]
    pub config: Vec<String>,

    /// Display measurement encoded in base64, instead of raw hex
    #[arg(long)]
    pub print_b64: bool,

    /// Display the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Reject hex input containing invalid characters
    #[arg(long)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute RTMR3 from the application parameters
    Compute(Rtmr3Params),

    /// Compute the hash of a compose manifest
    ComposeHash {
        /// Compose manifest file
        #[arg(value_name = "file")]
        manifest: String,
    },

    /// Compute the digest of one runtime event
    Digest {
        /// Event name (rootfs-hash, app-id, compose-hash, ca-cert-hash,
        /// instance-id)
        event: EventName,
        /// Event payload (hex)
        #[arg(value_name = "HEX")]
        value: String,
    },

    /// Replay a list of event digests, in order
    Replay {
        /// Event digests (hex)
        #[arg(value_name = "HEX")]
        digests: Vec<String>,
    },
}
