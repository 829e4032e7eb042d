use tracing::{error, info, instrument};

use super::JobLifecycleClient;
use super::connection::ClusterApi;
use super::error::JobClientError;
use crate::error::SpannedExt;

impl<C: ClusterApi> JobLifecycleClient<C> {
    /// Read-only discovery call used to verify credentials and reachability.
    #[instrument("lifecycle/check_connectivity", skip(self))]
    pub async fn check_connectivity(&self) -> Result<(), JobClientError> {
        match self.api.discover_api_resources().await.with_span_trace() {
            Ok(resources) => {
                info!(
                    "Cluster reachable, batch/v1 serves {} resource(s).",
                    resources.len()
                );
                Ok(())
            }
            Err(e) => {
                error!("Connectivity check failed: {}", e);
                Err(JobClientError::Connectivity(e))
            }
        }
    }
}
