use clap::Parser;
use serde::Deserialize;

/// Values measured by dstack into RTMR3. They can be provided on the command
/// line or in config files.
#[derive(Clone, Debug, Parser, Default, Deserialize, PartialEq)]
#[command(next_help_heading = "Application parameters")]
#[serde(deny_unknown_fields)]
pub struct Rtmr3Params {
    /// Hash of the root filesystem (hex)
    #[arg(long, value_name = "HEX")]
    pub rootfs_hash: Option<String>,

    /// Application ID (hex)
    #[arg(long, value_name = "HEX")]
    pub app_id: Option<String>,

    /// Compose manifest file (app-compose.json)
    #[arg(long, value_name = "file")]
    pub manifest: Option<String>,

    /// Compose hash (hex), instead of hashing a manifest
    #[arg(long, value_name = "HEX")]
    pub compose_hash: Option<String>,

    /// Hash of the KMS CA certificate (hex)
    #[arg(long, value_name = "HEX")]
    pub ca_cert_hash: Option<String>,

    /// Instance ID (hex)
    #[arg(long, value_name = "HEX")]
    pub instance_id: Option<String>,
}

// Update @old in place if @new is set
fn update_val(old: &mut Option<String>, new: &Option<String>) {
    if new.is_some() {
        old.clone_from(new);
    }
}

impl Rtmr3Params {
    /// Update our parameters with the ones set in `other`
    pub fn update(&mut self, other: &Rtmr3Params) {
        update_val(&mut self.rootfs_hash, &other.rootfs_hash);
        update_val(&mut self.app_id, &other.app_id);
        update_val(&mut self.manifest, &other.manifest);
        update_val(&mut self.compose_hash, &other.compose_hash);
        update_val(&mut self.ca_cert_hash, &other.ca_cert_hash);
        update_val(&mut self.instance_id, &other.instance_id);
    }
}
