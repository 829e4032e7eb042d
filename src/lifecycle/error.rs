use thiserror::Error;
use tracing_error::{ExtractSpanTrace, SpanTrace};

use crate::error::{ApiCallError, SpannedErr};
use crate::kubernetes_objects::job::BuildError;

#[derive(Error, Debug)]
pub enum JobClientError {
    #[error("Job request '{0}' is invalid: {1}")]
    Build(String, SpannedErr<BuildError>),

    #[error("Job '{name}' cannot be submitted to namespace '{namespace}': {source}")]
    Submission {
        name: String,
        namespace: String,
        source: SpannedErr<ApiCallError>,
    },

    #[error("Job '{name}' does not exist in namespace '{namespace}'")]
    NotFound {
        name: String,
        namespace: String,
        source: SpannedErr<ApiCallError>,
    },

    #[error("Job '{name}' cannot be deleted from namespace '{namespace}': {source}")]
    Deletion {
        name: String,
        namespace: String,
        source: SpannedErr<ApiCallError>,
    },

    #[error("Pods in namespace '{namespace}' cannot be listed: {source}")]
    List {
        namespace: String,
        source: SpannedErr<ApiCallError>,
    },

    #[error("Cluster is not reachable: {0}")]
    Connectivity(SpannedErr<ApiCallError>),
}

impl ExtractSpanTrace for JobClientError {
    fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            JobClientError::Build(_, e) => e.span_trace(),
            JobClientError::Submission { source, .. } => source.span_trace(),
            JobClientError::NotFound { source, .. } => source.span_trace(),
            JobClientError::Deletion { source, .. } => source.span_trace(),
            JobClientError::List { source, .. } => source.span_trace(),
            JobClientError::Connectivity(e) => e.span_trace(),
        }
    }
}
