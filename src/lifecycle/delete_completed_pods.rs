use kube::api::{DeleteParams, ListParams};
use tracing::{Instrument, error, info, instrument, trace_span, warn};

use super::JobLifecycleClient;
use super::connection::ClusterApi;
use super::error::JobClientError;
use crate::error::{ApiCallError, SpannedExt};
use crate::kubernetes_objects::POD_LIST_TIMEOUT_SECONDS;

#[derive(Debug)]
pub enum PodOutcome {
    Deleted,

    /// Pod is not in the requested phase
    Skipped { phase: Option<String> },

    Failed(ApiCallError),
}

#[derive(Debug)]
pub struct PodCleanup {
    pub pod_name: String,
    pub outcome: PodOutcome,
}

/// Per-pod results of a bulk cleanup, in listing order.
#[derive(Debug, Default)]
pub struct PodCleanupReport {
    pub pods: Vec<PodCleanup>,
}

impl PodCleanupReport {
    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, PodOutcome::Deleted))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PodOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PodOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&PodOutcome) -> bool) -> usize {
        self.pods.iter().filter(|p| pred(&p.outcome)).count()
    }
}

impl<C: ClusterApi> JobLifecycleClient<C> {
    /// Deletes every pod of `namespace` whose phase equals `phase`.
    ///
    /// Only the listing can fail the call. A pod that cannot be deleted is
    /// logged, recorded in the report and the remaining pods are still
    /// processed.
    #[instrument(
        "lifecycle/delete_completed_pods",
        skip(self),
        fields(kubernetes_namespace = %namespace, pod_phase = %phase)
    )]
    pub async fn delete_completed_pods(
        &self,
        namespace: &str,
        phase: &str,
    ) -> Result<PodCleanupReport, JobClientError> {
        let list_params = ListParams::default().timeout(POD_LIST_TIMEOUT_SECONDS);
        let pods = async {
            self.api
                .list_pods(namespace, &list_params)
                .await
                .with_span_trace()
        }
        .instrument(trace_span!("list_pods"))
        .await
        .map_err(|source| JobClientError::List {
            namespace: namespace.to_string(),
            source,
        })?;

        let mut report = PodCleanupReport::default();
        for pod in pods {
            let Some(pod_name) = pod.metadata.name else {
                warn!("Skipping pod without a name.");
                continue;
            };
            let pod_phase = pod.status.and_then(|s| s.phase);

            let outcome = if pod_phase.as_deref() == Some(phase) {
                match self
                    .api
                    .delete_pod(namespace, &pod_name, &DeleteParams::default())
                    .instrument(trace_span!("delete_pod", pod_name = %pod_name))
                    .await
                {
                    Ok(()) => {
                        info!("Pod '{}' deleted.", pod_name);
                        PodOutcome::Deleted
                    }
                    Err(e) => {
                        error!("Failed to delete pod '{}': {}", pod_name, e);
                        PodOutcome::Failed(e)
                    }
                }
            } else {
                info!(
                    "Pod '{}' still not done (phase: {}).",
                    pod_name,
                    pod_phase.as_deref().unwrap_or("<unknown>")
                );
                PodOutcome::Skipped { phase: pod_phase }
            };

            report.pods.push(PodCleanup { pod_name, outcome });
        }

        info!(
            "Deleted {} pod(s) in phase '{}' from namespace '{}' ({} skipped, {} failed).",
            report.deleted(),
            phase,
            namespace,
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::super::fake::{FakeCluster, config, pod};
    use super::*;

    fn three_pods() -> Vec<k8s_openapi::api::core::v1::Pod> {
        vec![
            pod("owl-a", "Succeeded"),
            pod("owl-b", "Succeeded"),
            pod("owl-c", "Running"),
        ]
    }

    fn deleted_names(fake: &FakeCluster) -> Vec<String> {
        fake.deleted_pods
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_deletes_only_matching_phase() {
        let fake = FakeCluster {
            pods: three_pods(),
            ..Default::default()
        };
        let client = JobLifecycleClient::new(fake, &config());

        let report = client
            .delete_completed_pods("owl", "Succeeded")
            .await
            .unwrap();

        assert_eq!(report.deleted(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(deleted_names(&client.api), vec!["owl-a", "owl-b"]);
        assert!(matches!(
            report.pods[2].outcome,
            PodOutcome::Skipped { ref phase } if phase.as_deref() == Some("Running")
        ));
        assert_eq!(
            client.api.list_timeouts.lock().unwrap()[0],
            Some(POD_LIST_TIMEOUT_SECONDS)
        );
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_abort() {
        let fake = FakeCluster {
            pods: three_pods(),
            failing_pods: BTreeSet::from(["owl-a".to_string()]),
            ..Default::default()
        };
        let client = JobLifecycleClient::new(fake, &config());

        let report = client
            .delete_completed_pods("owl", "Succeeded")
            .await
            .unwrap();

        assert_eq!(report.deleted(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(deleted_names(&client.api), vec!["owl-b"]);
        assert_eq!(report.pods[0].pod_name, "owl-a");
        assert!(matches!(report.pods[0].outcome, PodOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_other_phase_filter() {
        let fake = FakeCluster {
            pods: vec![pod("owl-a", "Failed"), pod("owl-b", "Succeeded")],
            ..Default::default()
        };
        let client = JobLifecycleClient::new(fake, &config());

        let report = client.delete_completed_pods("owl", "Failed").await.unwrap();

        assert_eq!(report.deleted(), 1);
        assert_eq!(deleted_names(&client.api), vec!["owl-a"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_an_error() {
        let fake = FakeCluster {
            pods: three_pods(),
            fail_list: true,
            ..Default::default()
        };
        let client = JobLifecycleClient::new(fake, &config());

        let err = client
            .delete_completed_pods("owl", "Succeeded")
            .await
            .unwrap_err();

        assert!(matches!(err, JobClientError::List { ref namespace, .. } if namespace == "owl"));
        assert!(deleted_names(&client.api).is_empty());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let fake = FakeCluster::default();
        let client = JobLifecycleClient::new(fake, &config());

        let report = client
            .delete_completed_pods("owl", "Succeeded")
            .await
            .unwrap();

        assert_eq!(report.deleted(), 0);
        assert!(report.pods.is_empty());
    }
}
