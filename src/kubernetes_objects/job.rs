use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSecurityContext, PodSpec, PodTemplateSpec, ResourceRequirements,
    SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use thiserror::Error;

use super::field_mapper::{SchemaMappingError, map_all, map_fields};
use super::job_request::{JobRequest, ResourceAmounts, Resources};
use super::{
    BACKOFF_LIMIT, DEFAULT_COMMAND, DEFAULT_CONTAINER_NAME, IMAGE_PULL_POLICY, MAX_JOB_NAME_LEN,
    RESTART_POLICY, TERMINATION_GRACE_PERIOD_SECONDS, TTL_SECONDS_AFTER_FINISHED,
};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Required field '{field}' is missing")]
    MissingRequiredField { field: &'static str },

    #[error("Job name '{name}' is longer than {max} characters")]
    NameTooLong { name: String, max: usize },

    #[error("Schema mapping failed: {0}")]
    SchemaMapping(#[from] SchemaMappingError),
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, BuildError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BuildError::MissingRequiredField { field }),
    }
}

/// Builds the Job manifest for `request`. Performs no I/O.
pub fn build_job(request: &JobRequest, default_namespace: &str) -> Result<Job, BuildError> {
    let name = required(&request.name, "name")?;
    if name.len() > MAX_JOB_NAME_LEN {
        return Err(BuildError::NameTooLong {
            name: name.to_string(),
            max: MAX_JOB_NAME_LEN,
        });
    }
    let image = required(&request.container_image, "containerImage")?;

    let namespace = request
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(default_namespace);
    let container_name = request
        .container_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CONTAINER_NAME);
    let args = match request.command.as_ref().map(|c| c.tokens()) {
        Some(tokens) if !tokens.is_empty() => tokens,
        _ => DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect(),
    };

    let mut env: Vec<EnvVar> = request
        .environment
        .iter()
        .map(|(name, value)| env_var(name, &value.0))
        .collect();
    if let Some(resources) = &request.resources {
        env.extend(resource_env(resources));
    }

    let volume_mounts: Vec<VolumeMount> = map_all(&request.volume_mounts)?;
    let volumes: Vec<Volume> = map_all(&request.volumes)?;
    let security_context: Option<SecurityContext> = request
        .security_context
        .as_ref()
        .map(map_fields)
        .transpose()?;
    let pod_security_context: Option<PodSecurityContext> = request
        .pod_security_context
        .as_ref()
        .map(map_fields)
        .transpose()?;

    let container = Container {
        name: container_name.to_string(),
        image: Some(image.to_string()),
        env: Some(env),
        image_pull_policy: Some(IMAGE_PULL_POLICY.to_string()),
        args: Some(args),
        resources: request.resources.as_ref().map(resource_requirements),
        volume_mounts: non_empty(volume_mounts),
        security_context,
        ..Default::default()
    };

    let pod_spec = PodSpec {
        containers: vec![container],
        restart_policy: Some(RESTART_POLICY.to_string()),
        termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECONDS),
        volumes: non_empty(volumes),
        service_account_name: request.service_account_name.clone(),
        security_context: pod_security_context,
        node_selector: request.node_selector.clone(),
        ..Default::default()
    };

    Ok(Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(JobSpec {
            ttl_seconds_after_finished: Some(TTL_SECONDS_AFTER_FINISHED),
            backoff_limit: Some(BACKOFF_LIMIT),
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        status: None,
    })
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

/// Exposes the container's own allocation to the workload.
fn resource_env(resources: &Resources) -> [EnvVar; 4] {
    [
        env_var("CPU_REQUESTS", &resources.requests.cpu.0),
        env_var("MEM_REQUESTS", &resources.requests.memory.0),
        env_var("CPU_LIMITS", &resources.limits.cpu.0),
        env_var("MEM_LIMITS", &resources.limits.memory.0),
    ]
}

fn quantities(amounts: &ResourceAmounts) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(amounts.cpu.0.clone())),
        ("memory".to_string(), Quantity(amounts.memory.0.clone())),
    ])
}

fn resource_requirements(resources: &Resources) -> ResourceRequirements {
    ResourceRequirements {
        requests: Some(quantities(&resources.requests)),
        limits: Some(quantities(&resources.limits)),
        ..Default::default()
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}
