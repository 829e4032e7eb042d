use kube::api::{DeleteParams, PropagationPolicy};
use tracing::{info, instrument, warn};

use super::connection::ClusterApi;
use super::error::JobClientError;
use super::{DeletionResult, JobLifecycleClient};
use crate::error::SpannedExt;

pub(super) fn job_delete_params() -> DeleteParams {
    DeleteParams {
        grace_period_seconds: Some(0),
        propagation_policy: Some(PropagationPolicy::Background),
        ..Default::default()
    }
}

impl<C: ClusterApi> JobLifecycleClient<C> {
    /// Deletes the job immediately and leaves its pods to the garbage
    /// collector. A missing job is reported as `NotFound`.
    #[instrument(
        "lifecycle/delete_job",
        skip(self),
        fields(job_name = %name, kubernetes_namespace = %namespace)
    )]
    pub async fn delete_job(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<DeletionResult, JobClientError> {
        match self
            .api
            .delete_job(namespace, name, &job_delete_params())
            .await
            .with_span_trace()
        {
            Ok(result) => {
                info!("Job '{}' deleted from namespace '{}'.", name, namespace);
                Ok(result)
            }
            Err(source) if source.err.is_not_found() => {
                warn!("Job '{}' not found in namespace '{}'.", name, namespace);
                Err(JobClientError::NotFound {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                    source,
                })
            }
            Err(source) => Err(JobClientError::Deletion {
                name: name.to_string(),
                namespace: namespace.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::{FakeCluster, RecordedDelete, config};
    use super::*;
    use crate::kubernetes_objects::job_request::JobRequest;

    #[tokio::test]
    async fn test_delete_job_background_zero_grace() {
        let client = JobLifecycleClient::new(FakeCluster::default(), &config());
        client
            .create_job(&JobRequest::new("owl-del", "busybox"))
            .await
            .unwrap();

        let result = client.delete_job("owl-del", "owl").await.unwrap();

        assert_eq!(result, DeletionResult::InProgress);
        assert_eq!(
            client.api.deleted_jobs.lock().unwrap()[0],
            RecordedDelete {
                namespace: "owl".to_string(),
                name: "owl-del".to_string(),
                grace_period_seconds: Some(0),
                background: true,
            }
        );
    }

    #[tokio::test]
    async fn test_delete_job_twice_is_not_found() {
        let client = JobLifecycleClient::new(FakeCluster::default(), &config());
        client
            .create_job(&JobRequest::new("owl-once", "busybox"))
            .await
            .unwrap();

        client.delete_job("owl-once", "owl").await.unwrap();
        let err = client.delete_job("owl-once", "owl").await.unwrap_err();

        assert!(matches!(
            err,
            JobClientError::NotFound { ref name, ref namespace, .. }
                if name == "owl-once" && namespace == "owl"
        ));
    }

    #[tokio::test]
    async fn test_delete_job_wrong_namespace_is_not_found() {
        let client = JobLifecycleClient::new(FakeCluster::default(), &config());
        client
            .create_job(&JobRequest::new("owl-scoped", "busybox"))
            .await
            .unwrap();

        let err = client.delete_job("owl-scoped", "default").await.unwrap_err();

        assert!(matches!(
            err,
            JobClientError::NotFound { ref namespace, .. } if namespace == "default"
        ));
        assert!(client.api.deleted_jobs.lock().unwrap().is_empty());
        assert!(client.delete_job("owl-scoped", "owl").await.is_ok());
    }
}
