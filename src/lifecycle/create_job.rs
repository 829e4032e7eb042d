use kube::api::PostParams;
use tracing::field::Empty;
use tracing::{Instrument, Span, info, instrument, trace_span};

use super::connection::ClusterApi;
use super::error::JobClientError;
use super::{JobHandle, JobLifecycleClient};
use crate::error::SpannedExt;
use crate::kubernetes_objects::job::build_job;
use crate::kubernetes_objects::job_request::JobRequest;

impl<C: ClusterApi> JobLifecycleClient<C> {
    /// Builds the Job for `request` and submits it once. Nothing is sent when
    /// the request is invalid, and a rejected submission is not retried.
    #[instrument(
        "lifecycle/create_job",
        skip(self, request),
        fields(job_name = Empty, kubernetes_namespace = Empty)
    )]
    pub async fn create_job(&self, request: &JobRequest) -> Result<JobHandle, JobClientError> {
        let job = build_job(request, &self.namespace)
            .with_span_trace()
            .map_err(|e| {
                JobClientError::Build(
                    request.name.clone().unwrap_or_else(|| "<unnamed>".to_string()),
                    e,
                )
            })?;

        let name = job.metadata.name.clone().unwrap_or_default();
        let namespace = job.metadata.namespace.clone().unwrap_or_default();
        Span::current()
            .record("job_name", name.as_str())
            .record("kubernetes_namespace", namespace.as_str());

        let post_params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        let created = async {
            self.api
                .create_job(&namespace, &job, &post_params)
                .await
                .with_span_trace()
        }
        .instrument(trace_span!("create_job"))
        .await
        .map_err(|source| JobClientError::Submission {
            name: name.clone(),
            namespace: namespace.clone(),
            source,
        })?;

        info!("Job '{}' created in namespace '{}'.", name, namespace);

        Ok(JobHandle {
            name: created.metadata.name.unwrap_or(name),
            namespace: created.metadata.namespace.unwrap_or(namespace),
            uid: created.metadata.uid,
            resource_version: created.metadata.resource_version,
        })
    }
}
