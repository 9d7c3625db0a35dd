use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use rtmr3_replay::command_line::{Args, Command};
use rtmr3_replay::compose::ComposeManifest;
use rtmr3_replay::digest::event_digest_bytes;
use rtmr3_replay::replay::{rtmr_replay, rtmr_replay_strict};
use rtmr3_replay::rtmr3::Rtmr3Error;
use rtmr3_replay::rtmr3_config::Rtmr3Config;
use rtmr3_replay::utils::{decode_hex, decode_hex_strict, encode_hex};

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("cannot encode JSON")?;
    println!("{json}");
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Compute(params) => {
            let mut config = Rtmr3Config::from_args(&args.config, params)?;
            config.strict = args.strict;

            let c = config.compute().context("Failed to compute RTMR3")?;
            if args.json {
                return print_json(&c);
            }
            log::info!("compose-hash: {}", c.compose_hash);
            for e in &c.events {
                log::info!("{} digest: {}", e.event, e.digest);
            }
            println!("RTMR3: {}", c.rtmr3.dump(args.print_b64));
        }
        Command::ComposeHash { manifest } => {
            let manifest = ComposeManifest::from_file(manifest)?;
            log::debug!("canonical manifest: {}", manifest.canonical_string()?);
            let h = encode_hex(&manifest.hash()?);
            if args.json {
                return print_json(&serde_json::json!({ "compose_hash": h }));
            }
            println!("{h}");
        }
        Command::Digest { event, value } => {
            if value.trim().is_empty() {
                return Err(Rtmr3Error::Missing(*event).into());
            }
            let payload = if args.strict {
                decode_hex_strict(value).with_context(|| format!("invalid {event}"))?
            } else {
                decode_hex(value)
            };
            let d = encode_hex(&event_digest_bytes(*event, &payload)?);
            if args.json {
                return print_json(&serde_json::json!({ "event": event, "digest": d }));
            }
            println!("{d}");
        }
        Command::Replay { digests } => {
            let rtmr = if args.strict {
                rtmr_replay_strict(digests)?
            } else {
                rtmr_replay(digests)?
            };
            if args.json {
                return print_json(&serde_json::json!({ "rtmr": rtmr }));
            }
            println!("RTMR: {}", rtmr.dump(args.print_b64));
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = stderrlog::new()
        .verbosity(args.verbose as usize + 1)
        .init()
    {
        eprintln!("Cannot initialize logger: {e}");
    }

    if let Err(e) = run(&args) {
        log::error!("{e:#}");
        process::exit(1);
    }
}
