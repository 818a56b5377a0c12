//! Object store connection settings, read from TOML or assembled from
//! command line flags.
use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;

use crate::err::{Error, Result};

/// S3-compatible provider the bucket lives on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Aws,
    Ibm,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(StoreKind::Aws),
            "ibm" => Ok(StoreKind::Ibm),
            other => Err(Error::InvalidArgument(format!(
                "unknown store kind: {} (expected aws or ibm)",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// AWS region name, `us-east-1` when absent
    pub region: Option<String>,
    /// Custom endpoint, required for IBM Cloud Object Storage
    pub endpoint_url: Option<String>,
    /// Static credentials; the default provider chain is used when absent
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub use_accelerate_endpoint: bool,
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> Result<StoreConfig> {
        toml::from_str(text).map_err(|e| Error::InvalidArgument(format!("invalid config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<StoreConfig> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| Error::from_io(e, &display))?;
        StoreConfig::from_toml_str(&text)
    }

    /// Static credentials, only when both halves are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }
}
