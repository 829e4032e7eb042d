pub mod field_mapper;
pub mod job;
pub mod job_request;

pub(crate) const DEFAULT_CONTAINER_NAME: &str = "jobcontainer";
pub(crate) const DEFAULT_COMMAND: &[&str] = &["sleep", "60"];
pub(crate) const IMAGE_PULL_POLICY: &str = "IfNotPresent";
pub(crate) const RESTART_POLICY: &str = "Never";
pub(crate) const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 30;
pub(crate) const TTL_SECONDS_AFTER_FINISHED: i32 = 300;
pub(crate) const BACKOFF_LIMIT: i32 = 2;

/// Job names end up in pod labels, which are capped at 63 characters
pub(crate) const MAX_JOB_NAME_LEN: usize = 63;
pub(crate) const GENERATED_SUFFIX_LEN: usize = 12;

/// Upper bound for listing pods during cleanup
pub(crate) const POD_LIST_TIMEOUT_SECONDS: u32 = 60;
pub(crate) const DEFAULT_CLEANUP_PHASE: &str = "Succeeded";
