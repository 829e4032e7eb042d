mod raw;

use std::path::Path;
use std::time::Duration;

use self::raw::RawConfig;
use serde::Deserialize;
use thiserror::Error;

pub use self::raw::ConfigParseError;

pub(crate) const DEFAULT_NAMESPACE: &str = "default";
pub(crate) const DEFAULT_FIELD_MANAGER: &str = "owl-jobs";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Service account token and CA mounted into the pod
    #[default]
    InCluster,

    /// Local kubeconfig first, in-cluster environment second
    Infer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub namespace: String,
    pub credentials: Credentials,
    pub field_manager: String,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            namespace: DEFAULT_NAMESPACE.to_string(),
            credentials: Credentials::InCluster,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            connect_timeout: None,
            read_timeout: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigParseError),
}

impl Config {
    pub async fn new_from_file(path: &Path) -> Result<Config, ConfigLoadError> {
        let display = path.display().to_string();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigLoadError::Io {
                    path: display.clone(),
                    source,
                })?;
        let raw: RawConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigLoadError::Parse {
                path: display,
                source,
            })?;
        Ok(Config::try_from(raw)?)
    }
}
