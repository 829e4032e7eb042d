use std::time::Duration;

use super::{Config, Credentials};
use duration_string::DurationString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    /// Namespace used when a request or command does not name one
    pub(super) namespace: Option<String>,

    /// Where to read cluster credentials from
    ///
    /// Example: "in-cluster" or "infer"
    pub(super) credentials: Option<Credentials>,

    /// Field manager recorded on created jobs
    pub(super) field_manager: Option<String>,

    pub(super) connect_timeout: Option<DurationString>,

    pub(super) read_timeout: Option<DurationString>,
}

#[derive(Error, Debug)]
pub enum ConfigParseError {
    #[error("'{key}' must not be empty")]
    EmptyValue { key: &'static str },

    #[error("Namespace '{name}' must not contain '/' characters")]
    NamespaceIncludesSlash { name: String },
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigParseError;
    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let defaults = Config::default();

        let namespace = raw.namespace.unwrap_or(defaults.namespace);
        if namespace.is_empty() {
            return Err(ConfigParseError::EmptyValue { key: "namespace" });
        }
        if namespace.contains('/') {
            return Err(ConfigParseError::NamespaceIncludesSlash { name: namespace });
        }

        let field_manager = raw.field_manager.unwrap_or(defaults.field_manager);
        if field_manager.is_empty() {
            return Err(ConfigParseError::EmptyValue {
                key: "field_manager",
            });
        }

        Ok(Config {
            namespace,
            credentials: raw.credentials.unwrap_or(defaults.credentials),
            field_manager,
            connect_timeout: raw.connect_timeout.map(Duration::from),
            read_timeout: raw.read_timeout.map(Duration::from),
        })
    }
}
