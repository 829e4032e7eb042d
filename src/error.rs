use std::fmt::Display;

use thiserror::Error;
use tracing_error::{ExtractSpanTrace, SpanTrace};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug)]
pub struct SpannedErr<T> {
    pub err: T,
    pub span_trace: SpanTrace,
}

impl<T> SpannedErr<T> {
    pub fn new(err: T) -> Self {
        SpannedErr {
            err,
            span_trace: SpanTrace::capture(),
        }
    }
}

pub trait SpannedExt<T, E> {
    fn with_span_trace(self) -> Result<T, SpannedErr<E>>;
}

impl<T, E> SpannedExt<T, E> for Result<T, E> {
    fn with_span_trace(self) -> Result<T, SpannedErr<E>> {
        self.map_err(SpannedErr::new)
    }
}

impl<E> ExtractSpanTrace for SpannedErr<E> {
    fn span_trace(&self) -> Option<&SpanTrace> {
        Some(&self.span_trace)
    }
}

impl<T: Display> Display for SpannedErr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.err, f)
    }
}

impl<U: std::error::Error> std::error::Error for SpannedErr<U> {}

/// Failure of a single call against the Kubernetes API server.
#[derive(Error, Debug)]
pub enum ApiCallError {
    #[error("resource not found: {0}")]
    NotFound(#[source] BoxError),

    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl ApiCallError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiCallError::NotFound(_))
    }
}

impl From<kube::Error> for ApiCallError {
    fn from(err: kube::Error) -> Self {
        let not_found = matches!(&err, kube::Error::Api(response) if response.code == 404);
        if not_found {
            ApiCallError::NotFound(Box::new(err))
        } else {
            ApiCallError::Failed(Box::new(err))
        }
    }
}
