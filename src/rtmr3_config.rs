///
/// Gather the RTMR3 inputs from config files and the command-line.
///
use std::fs;

use thiserror::Error;

use crate::rtmr3::{ComposeInput, Rtmr3Calculator, Rtmr3Computation, Rtmr3Error, Rtmr3Inputs};
use crate::rtmr3_params::Rtmr3Params;
use crate::utils::{parent_dir, path_relative_to};

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("file {filename} error: {e}")]
    File { e: std::io::Error, filename: String },

    #[error("cannot parse {filename}: {e}")]
    Parse {
        e: toml::de::Error,
        filename: String,
    },

    #[error("invalid filename encoding")]
    FilenameEncoding,

    #[error(transparent)]
    Rtmr3(#[from] Rtmr3Error),
}
type Result<T> = core::result::Result<T, ConfigError>;

/// Configuration of one RTMR3 computation
#[derive(Debug, Default)]
pub struct Rtmr3Config {
    /// Application parameters
    pub params: Rtmr3Params,
    /// Reject malformed hex input
    pub strict: bool,
}

impl Rtmr3Config {
    /// Create a configuration from config files, applied in order, then
    /// command-line parameters, which take precedence.
    pub fn from_args(configs: &[String], params: &Rtmr3Params) -> Result<Self> {
        let mut config = Rtmr3Config::default();

        for filename in configs {
            config.load_config(filename)?;
        }

        config.params.update(params);
        log::debug!("Parameters: {:?}", config.params);

        Ok(config)
    }

    fn load_config(&mut self, filename: &str) -> Result<()> {
        let content = fs::read_to_string(filename).map_err(|e| ConfigError::File {
            filename: filename.to_string(),
            e,
        })?;
        let mut params: Rtmr3Params =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                filename: filename.to_string(),
                e,
            })?;

        // The manifest path is relative to the config file
        if let Some(manifest) = &params.manifest {
            let dirname = parent_dir(filename).map_err(|e| ConfigError::File {
                filename: filename.to_string(),
                e,
            })?;
            let path = path_relative_to(manifest, &dirname)
                .into_os_string()
                .into_string()
                .map_err(|_| ConfigError::FilenameEncoding)?;
            params.manifest = Some(path);
        }

        self.params.update(&params);
        Ok(())
    }

    /// Read the manifest if needed, and return the inputs of the computation
    pub fn inputs(&self) -> Result<Rtmr3Inputs> {
        let p = &self.params;

        let compose = match (&p.compose_hash, &p.manifest) {
            (Some(h), Some(m)) => {
                log::warn!("Ignoring manifest {m}, using the given compose hash");
                ComposeInput::Hash(h.clone())
            }
            (Some(h), None) => ComposeInput::Hash(h.clone()),
            (None, Some(m)) => {
                let text = fs::read_to_string(m).map_err(|e| ConfigError::File {
                    filename: m.to_string(),
                    e,
                })?;
                ComposeInput::Manifest(text)
            }
            (None, None) => ComposeInput::default(),
        };

        Ok(Rtmr3Inputs {
            rootfs_hash: p.rootfs_hash.clone().unwrap_or_default(),
            app_id: p.app_id.clone().unwrap_or_default(),
            compose,
            ca_cert_hash: p.ca_cert_hash.clone().unwrap_or_default(),
            instance_id: p.instance_id.clone().unwrap_or_default(),
        })
    }

    /// Compute RTMR3 with this configuration
    pub fn compute(&self) -> Result<Rtmr3Computation> {
        let inputs = self.inputs()?;
        Ok(Rtmr3Calculator::new()
            .strict(self.strict)
            .calc_rtmr3(&inputs)?)
    }
}
