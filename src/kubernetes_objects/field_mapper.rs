//! Conversion of loosely typed key/value structures into typed Kubernetes
//! objects.
//!
//! Each target type declares the top-level field names it accepts. Those
//! keys are matched ignoring ASCII case and underscores, so `mountPath`,
//! `mount_path` and `MOUNT_PATH` all resolve to `mountPath`.
//!
//! Nested objects are checked by round-tripping: the typed value is
//! serialized again and every input key must reappear at the same path.
//! A missing `snake_case` key is retried in its camelCase spelling, anything
//! else that the typed object dropped is reported by its dotted path
//! (`configMap.items[0].mode`). `null` values count as absent.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{PodSecurityContext, SecurityContext, Volume, VolumeMount};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub type RawFields = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub kind: &'static str,
    pub fields: &'static [&'static str],
}

pub trait Schema: DeserializeOwned + Serialize {
    const SCHEMA: FieldSchema;
}

#[derive(Error, Debug)]
pub enum SchemaMappingError {
    #[error("{kind} has unknown field(s): {}", .fields.join(", "))]
    UnknownFields {
        kind: &'static str,
        fields: Vec<String>,
    },

    #[error("{kind} sets the same field more than once: {}", .fields.join(", "))]
    DuplicateFields {
        kind: &'static str,
        fields: Vec<String>,
    },

    #[error("{kind} has an invalid value: {source}")]
    InvalidValue {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl FieldSchema {
    fn canonical(&self, key: &str) -> Option<&'static str> {
        let wanted = normalize(key);
        self.fields
            .iter()
            .copied()
            .find(|field| normalize(field) == wanted)
    }
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[derive(Default)]
struct Drift {
    renamed: bool,
    unknown: Vec<String>,
    duplicates: Vec<String>,
}

/// Compares the keys of `input` with those that survived deserialization
/// in `output`, renaming `snake_case` keys in `input` where needed.
fn reconcile(input: &mut Value, output: &Value, path: &str, drift: &mut Drift) {
    match (input, output) {
        (Value::Object(map), Value::Object(kept)) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let key_path = child_path(path, &key);
                if let Some(kept_value) = kept.get(&key) {
                    if let Some(child) = map.get_mut(&key) {
                        reconcile(child, kept_value, &key_path, drift);
                    }
                    continue;
                }

                let camel = camel_case(&key);
                if camel == key {
                    drift.unknown.push(key_path);
                } else if map.contains_key(&camel) {
                    drift.duplicates.push(key_path);
                } else if let Some(value) = map.remove(&key) {
                    map.insert(camel, value);
                    drift.renamed = true;
                }
            }
        }
        (Value::Array(items), Value::Array(kept)) if items.len() == kept.len() => {
            for (index, (item, kept_item)) in items.iter_mut().zip(kept).enumerate() {
                reconcile(item, kept_item, &format!("{path}[{index}]"), drift);
            }
        }
        _ => {}
    }
}

pub fn map_fields<T: Schema>(raw: &RawFields) -> Result<T, SchemaMappingError> {
    let schema = T::SCHEMA;
    let mut object = Map::new();
    let mut unknown = Vec::new();
    let mut duplicates = Vec::new();

    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        match schema.canonical(key) {
            Some(field) if object.contains_key(field) => duplicates.push(key.clone()),
            Some(field) => {
                object.insert(field.to_string(), value.clone());
            }
            None => unknown.push(key.clone()),
        }
    }

    if !unknown.is_empty() {
        return Err(SchemaMappingError::UnknownFields {
            kind: schema.kind,
            fields: unknown,
        });
    }
    if !duplicates.is_empty() {
        return Err(SchemaMappingError::DuplicateFields {
            kind: schema.kind,
            fields: duplicates,
        });
    }

    let invalid = |source: serde_json::Error| SchemaMappingError::InvalidValue {
        kind: schema.kind,
        source,
    };

    let mut input = Value::Object(object);
    strip_nulls(&mut input);

    // Every rename removes at least one underscore, so this terminates.
    loop {
        let typed: T = serde_json::from_value(input.clone()).map_err(invalid)?;
        let output = serde_json::to_value(&typed).map_err(invalid)?;

        let mut drift = Drift::default();
        reconcile(&mut input, &output, "", &mut drift);

        if !drift.unknown.is_empty() {
            return Err(SchemaMappingError::UnknownFields {
                kind: schema.kind,
                fields: drift.unknown,
            });
        }
        if !drift.duplicates.is_empty() {
            return Err(SchemaMappingError::DuplicateFields {
                kind: schema.kind,
                fields: drift.duplicates,
            });
        }
        if !drift.renamed {
            return Ok(typed);
        }
    }
}

pub fn map_all<T: Schema>(raws: &[RawFields]) -> Result<Vec<T>, SchemaMappingError> {
    raws.iter().map(map_fields::<T>).collect()
}

impl Schema for VolumeMount {
    const SCHEMA: FieldSchema = FieldSchema {
        kind: "VolumeMount",
        fields: &[
            "mountPath",
            "mountPropagation",
            "name",
            "readOnly",
            "recursiveReadOnly",
            "subPath",
            "subPathExpr",
        ],
    };
}

impl Schema for Volume {
    const SCHEMA: FieldSchema = FieldSchema {
        kind: "Volume",
        fields: &[
            "name",
            "awsElasticBlockStore",
            "azureDisk",
            "azureFile",
            "cephfs",
            "cinder",
            "configMap",
            "csi",
            "downwardAPI",
            "emptyDir",
            "ephemeral",
            "fc",
            "flexVolume",
            "flocker",
            "gcePersistentDisk",
            "gitRepo",
            "glusterfs",
            "hostPath",
            "image",
            "iscsi",
            "nfs",
            "persistentVolumeClaim",
            "photonPersistentDisk",
            "portworxVolume",
            "projected",
            "quobyte",
            "rbd",
            "scaleIO",
            "secret",
            "storageos",
            "vsphereVolume",
        ],
    };
}

impl Schema for SecurityContext {
    const SCHEMA: FieldSchema = FieldSchema {
        kind: "SecurityContext",
        fields: &[
            "allowPrivilegeEscalation",
            "appArmorProfile",
            "capabilities",
            "privileged",
            "procMount",
            "readOnlyRootFilesystem",
            "runAsGroup",
            "runAsNonRoot",
            "runAsUser",
            "seLinuxOptions",
            "seccompProfile",
            "windowsOptions",
        ],
    };
}

impl Schema for PodSecurityContext {
    const SCHEMA: FieldSchema = FieldSchema {
        kind: "PodSecurityContext",
        fields: &[
            "appArmorProfile",
            "fsGroup",
            "fsGroupChangePolicy",
            "runAsGroup",
            "runAsNonRoot",
            "runAsUser",
            "seLinuxChangePolicy",
            "seLinuxOptions",
            "seccompProfile",
            "supplementalGroups",
            "supplementalGroupsPolicy",
            "sysctls",
            "windowsOptions",
        ],
    };
}
