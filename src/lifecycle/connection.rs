use derive_debug::Dbg;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client};
use thiserror::Error;
use tracing::{Level, debug, info, instrument};

use super::DeletionResult;
use crate::config::{Config, Credentials};
use crate::error::ApiCallError;

/// The namespaced calls the lifecycle client issues against the control
/// plane.
#[allow(async_fn_in_trait)]
pub trait ClusterApi {
    async fn create_job(
        &self,
        namespace: &str,
        job: &Job,
        params: &PostParams,
    ) -> Result<Job, ApiCallError>;

    async fn delete_job(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<DeletionResult, ApiCallError>;

    async fn list_pods(&self, namespace: &str, params: &ListParams)
    -> Result<Vec<Pod>, ApiCallError>;

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<(), ApiCallError>;

    /// Names of the resources served by the `batch/v1` API group.
    async fn discover_api_resources(&self) -> Result<Vec<String>, ApiCallError>;
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to load in-cluster credentials: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("Failed to infer cluster credentials: {0}")]
    Infer(#[from] kube::config::InferConfigError),

    #[error("Failed to initialize kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Authenticated handle on the cluster, created once at start-up.
#[derive(Dbg, Clone)]
pub struct ClusterConnection {
    #[dbg(skip)]
    client: Client,
}

impl ClusterConnection {
    #[instrument("cluster_connection/connect", level = Level::TRACE, skip(config))]
    pub async fn connect(config: &Config) -> Result<ClusterConnection, ConnectionError> {
        let mut kube_config = match config.credentials {
            Credentials::InCluster => kube::Config::incluster()?,
            Credentials::Infer => kube::Config::infer().await?,
        };
        kube_config.default_namespace = config.namespace.clone();
        if config.connect_timeout.is_some() {
            kube_config.connect_timeout = config.connect_timeout;
        }
        if config.read_timeout.is_some() {
            kube_config.read_timeout = config.read_timeout;
        }

        debug!("Connecting to cluster at {}", kube_config.cluster_url);
        let client = Client::try_from(kube_config)?;
        info!("Kubernetes Client Initialized.");

        Ok(ClusterConnection { client })
    }
}

impl ClusterApi for ClusterConnection {
    async fn create_job(
        &self,
        namespace: &str,
        job: &Job,
        params: &PostParams,
    ) -> Result<Job, ApiCallError> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.create(params, job).await?)
    }

    async fn delete_job(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<DeletionResult, ApiCallError> {
        let api: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let response = api.delete(name, params).await?;
        if response.is_left() {
            Ok(DeletionResult::InProgress)
        } else {
            Ok(DeletionResult::Deleted)
        }
    }

    async fn list_pods(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<Pod>, ApiCallError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(params).await?.items)
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<(), ApiCallError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        api.delete(name, params).await?;
        Ok(())
    }

    async fn discover_api_resources(&self) -> Result<Vec<String>, ApiCallError> {
        let list = self.client.list_api_group_resources("batch/v1").await?;
        Ok(list.resources.into_iter().map(|r| r.name).collect())
    }
}
