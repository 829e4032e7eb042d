use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

use crate::kubernetes_objects::DEFAULT_CLEANUP_PHASE;

#[derive(Debug, Parser)]
#[clap(name = "owl-jobs", about = "Submit and clean up Kubernetes jobs")]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub(crate) command: Command,

    /// YAML config file; built-in defaults are used when omitted
    #[clap(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Build a job from a YAML request and submit it
    Create {
        request: PathBuf,

        /// Override the request's job name
        #[clap(long, conflicts_with = "generate_name")]
        name: Option<String>,

        /// Name the job '<PREFIX>-<random suffix>'
        #[clap(long, value_name = "PREFIX")]
        generate_name: Option<String>,

        /// Print the job manifest instead of submitting it
        #[clap(long)]
        dry_run: bool,
    },

    /// Delete a job and its pods
    Delete {
        name: String,

        #[clap(short, long)]
        namespace: Option<String>,

        /// Treat a missing job as already deleted
        #[clap(long)]
        ignore_not_found: bool,
    },

    /// Delete pods that reached the given phase
    CleanupPods {
        #[clap(short, long)]
        namespace: Option<String>,

        #[clap(long, default_value = DEFAULT_CLEANUP_PHASE)]
        phase: String,
    },

    /// Verify credentials and API reachability
    Check {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cleanup_defaults() {
        let cli = Cli::parse_from(["owl-jobs", "cleanup-pods"]);
        match cli.command {
            Command::CleanupPods { namespace, phase } => {
                assert_eq!(namespace, None);
                assert_eq!(phase, "Succeeded");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_with_global_config() {
        let cli = Cli::parse_from([
            "owl-jobs",
            "create",
            "job.yaml",
            "--generate-name",
            "owl",
            "-c",
            "/etc/owl/jobs.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/owl/jobs.yaml")));
        assert!(matches!(
            cli.command,
            Command::Create { ref generate_name, dry_run: false, .. }
                if generate_name.as_deref() == Some("owl")
        ));
    }

    #[test]
    fn test_name_conflicts_with_generate_name() {
        let result = Cli::try_parse_from([
            "owl-jobs",
            "create",
            "job.yaml",
            "--name",
            "a",
            "--generate-name",
            "b",
        ]);
        assert!(result.is_err());
    }
}
