use std::collections::BTreeSet;
use std::sync::Mutex;

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, ListParams, PostParams, PropagationPolicy};

use super::DeletionResult;
use super::connection::ClusterApi;
use crate::config::Config;
use crate::error::ApiCallError;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct RecordedDelete {
    pub(super) namespace: String,
    pub(super) name: String,
    pub(super) grace_period_seconds: Option<u32>,
    pub(super) background: bool,
}

/// In-memory stand-in for the API server.
#[derive(Default)]
pub(super) struct FakeCluster {
    pub(super) jobs: Mutex<Vec<Job>>,
    pub(super) field_managers: Mutex<Vec<Option<String>>>,
    pub(super) pods: Vec<Pod>,
    pub(super) list_timeouts: Mutex<Vec<Option<u32>>>,
    pub(super) deleted_jobs: Mutex<Vec<RecordedDelete>>,
    pub(super) deleted_pods: Mutex<Vec<RecordedDelete>>,
    pub(super) failing_pods: BTreeSet<String>,
    pub(super) fail_list: bool,
    pub(super) fail_discovery: bool,
    pub(super) reject_create: bool,
}

pub(super) fn rejected(message: &str) -> ApiCallError {
    ApiCallError::Failed(Box::new(std::io::Error::other(message.to_string())))
}

pub(super) fn not_found(message: &str) -> ApiCallError {
    ApiCallError::NotFound(Box::new(std::io::Error::other(message.to_string())))
}

pub(super) fn pod(name: &str, phase: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(super) fn config() -> Config {
    Config {
        namespace: "owl".to_string(),
        ..Default::default()
    }
}

fn record(namespace: &str, name: &str, params: &DeleteParams) -> RecordedDelete {
    RecordedDelete {
        namespace: namespace.to_string(),
        name: name.to_string(),
        grace_period_seconds: params.grace_period_seconds,
        background: matches!(
            params.propagation_policy,
            Some(PropagationPolicy::Background)
        ),
    }
}

impl ClusterApi for FakeCluster {
    async fn create_job(
        &self,
        namespace: &str,
        job: &Job,
        params: &PostParams,
    ) -> Result<Job, ApiCallError> {
        if self.reject_create {
            return Err(rejected("jobs.batch already exists"));
        }
        self.field_managers
            .lock()
            .unwrap()
            .push(params.field_manager.clone());
        self.jobs.lock().unwrap().push(job.clone());

        let mut created = job.clone();
        created.metadata.namespace = Some(namespace.to_string());
        created.metadata.uid = Some("5f0c-uid".to_string());
        created.metadata.resource_version = Some("42".to_string());
        Ok(created)
    }

    async fn delete_job(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<DeletionResult, ApiCallError> {
        let position = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .position(|job| {
                job.metadata.name.as_deref() == Some(name)
                    && job.metadata.namespace.as_deref() == Some(namespace)
            });
        match position {
            Some(index) => {
                self.jobs.lock().unwrap().remove(index);
                self.deleted_jobs
                    .lock()
                    .unwrap()
                    .push(record(namespace, name, params));
                Ok(DeletionResult::InProgress)
            }
            None => Err(not_found(&format!("jobs.batch \"{name}\" not found"))),
        }
    }

    async fn list_pods(
        &self,
        _namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<Pod>, ApiCallError> {
        self.list_timeouts.lock().unwrap().push(params.timeout);
        if self.fail_list {
            return Err(rejected("pods is forbidden"));
        }
        Ok(self.pods.clone())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<(), ApiCallError> {
        if self.failing_pods.contains(name) {
            return Err(rejected("etcdserver: request timed out"));
        }
        self.deleted_pods
            .lock()
            .unwrap()
            .push(record(namespace, name, params));
        Ok(())
    }

    async fn discover_api_resources(&self) -> Result<Vec<String>, ApiCallError> {
        if self.fail_discovery {
            return Err(rejected("Unauthorized"));
        }
        Ok(vec!["jobs".to_string(), "jobs/status".to_string()])
    }
}
