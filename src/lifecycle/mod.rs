mod check_connectivity;
pub mod connection;
mod create_job;
mod delete_completed_pods;
mod delete_job;
pub mod error;
#[cfg(test)]
mod fake;

use crate::config::Config;

use self::connection::ClusterConnection;

pub use self::delete_completed_pods::{PodCleanup, PodCleanupReport, PodOutcome};

/// Create/delete/list facade over a cluster connection. Holds no state
/// about the resources it manages.
#[derive(Debug, Clone)]
pub struct JobLifecycleClient<C = ClusterConnection> {
    api: C,
    namespace: String,
    field_manager: String,
}

impl<C> JobLifecycleClient<C> {
    pub fn new(api: C, config: &Config) -> JobLifecycleClient<C> {
        JobLifecycleClient {
            api,
            namespace: config.namespace.clone(),
            field_manager: config.field_manager.clone(),
        }
    }
}

/// Acknowledgment of an accepted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
    pub namespace: String,
    pub uid: Option<String>,
    pub resource_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionResult {
    /// Accepted; dependents are still being removed in the background
    InProgress,

    Deleted,
}
