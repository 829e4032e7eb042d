use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::field_mapper::RawFields;
use super::job::BuildError;
use super::{GENERATED_SUFFIX_LEN, MAX_JOB_NAME_LEN};

const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Logical description of a single run-to-completion job.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobRequest {
    /// Job name, unique among live jobs of the namespace
    pub name: Option<String>,

    /// Falls back to the configured namespace
    pub namespace: Option<String>,

    pub container_image: Option<String>,

    /// Defaults to "jobcontainer"
    pub container_name: Option<String>,

    /// Defaults to "sleep 60"
    pub command: Option<Command>,

    #[serde(default)]
    pub environment: BTreeMap<String, EnvValue>,

    pub resources: Option<Resources>,

    #[serde(default)]
    pub volumes: Vec<RawFields>,

    #[serde(default)]
    pub volume_mounts: Vec<RawFields>,

    pub security_context: Option<RawFields>,

    pub pod_security_context: Option<RawFields>,

    pub node_selector: Option<BTreeMap<String, String>>,

    pub service_account_name: Option<String>,
}

/// Container arguments, either as one whitespace separated line or as
/// explicit tokens.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Command {
    Line(String),
    Tokens(Vec<String>),
}

impl Command {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Command::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Command::Tokens(tokens) => tokens.clone(),
        }
    }
}

/// Environment variable value. Numbers and booleans are kept in their
/// textual form.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "Value")]
pub struct EnvValue(pub String);

impl From<Value> for EnvValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => EnvValue(s),
            Value::Null => EnvValue(String::new()),
            other => EnvValue(other.to_string()),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue(value.to_string())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Resources {
    pub requests: ResourceAmounts,
    pub limits: ResourceAmounts,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceAmounts {
    pub cpu: EnvValue,
    pub memory: EnvValue,
}

impl JobRequest {
    pub fn new(name: impl Into<String>, container_image: impl Into<String>) -> Self {
        JobRequest {
            name: Some(name.into()),
            container_image: Some(container_image.into()),
            ..Default::default()
        }
    }
}

/// Returns `<prefix>-<12 lowercase alphanumerics>`, failing when the
/// result would not fit in a job name.
pub fn generate_job_name(prefix: &str) -> Result<String, BuildError> {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    // bytes 6 and 8 carry the uuid version and variant bits
    let suffix: String = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 6 && *i != 8)
        .take(GENERATED_SUFFIX_LEN)
        .map(|(_, b)| NAME_ALPHABET[usize::from(*b) % NAME_ALPHABET.len()] as char)
        .collect();
    let name = format!("{prefix}-{suffix}");
    if name.len() > MAX_JOB_NAME_LEN {
        return Err(BuildError::NameTooLong {
            name,
            max: MAX_JOB_NAME_LEN,
        });
    }
    Ok(name)
}
