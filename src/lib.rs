use self::cli::{Cli, Command};
use self::config::Config;
use self::kubernetes_objects::job::build_job;
use self::kubernetes_objects::job_request::{JobRequest, generate_job_name};
use self::lifecycle::JobLifecycleClient;
use self::lifecycle::connection::{ClusterConnection, ConnectionError};
use self::lifecycle::error::JobClientError;
use clap::Parser;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use tracing_error::ExtractSpanTrace;
use tracing_error::SpanTrace;

pub(crate) mod cli;
pub mod config;
pub mod error;
pub mod kubernetes_objects;
pub mod lifecycle;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load config.\n{0}")]
    ConfigError(#[from] config::ConfigLoadError),

    #[error("Failed to read job request '{path}': {source}")]
    RequestRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse job request '{path}': {source}")]
    RequestParse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Job request is invalid: {0}")]
    Build(#[from] kubernetes_objects::job::BuildError),

    #[error("Failed to render job manifest: {0}")]
    Render(serde_yaml::Error),

    #[error("Failed to connect to the cluster.\n{0}")]
    ConnectionError(#[from] ConnectionError),

    #[error("Job operation failed:\n{0}")]
    JobClientError(#[from] JobClientError),
}

impl ExtractSpanTrace for AppError {
    fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            AppError::JobClientError(e) => e.span_trace(),
            _ => None,
        }
    }
}

async fn load_request(path: &Path) -> Result<JobRequest, AppError> {
    let display = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::RequestRead {
            path: display.clone(),
            source,
        })?;
    serde_yaml::from_str(&content).map_err(|source| AppError::RequestParse {
        path: display,
        source,
    })
}

pub async fn app() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::new_from_file(path).await?,
        None => Config::default(),
    };

    info!("Config Loaded.");

    match cli.command {
        Command::Create {
            request,
            name,
            generate_name,
            dry_run,
        } => {
            let mut request = load_request(&request).await?;
            if let Some(name) = name {
                request.name = Some(name);
            } else if let Some(prefix) = generate_name {
                request.name = Some(generate_job_name(&prefix)?);
            }

            if dry_run {
                let job = build_job(&request, &config.namespace)?;
                let manifest = serde_yaml::to_string(&job).map_err(AppError::Render)?;
                println!("{manifest}");
                return Ok(());
            }

            let client = connect(&config).await?;
            let handle = client.create_job(&request).await?;
            info!(
                "Submitted job '{}' in namespace '{}' (uid: {}).",
                handle.name,
                handle.namespace,
                handle.uid.as_deref().unwrap_or("<unknown>")
            );
        }
        Command::Delete {
            name,
            namespace,
            ignore_not_found,
        } => {
            let client = connect(&config).await?;
            let namespace = namespace.unwrap_or_else(|| config.namespace.clone());
            match client.delete_job(&name, &namespace).await {
                Ok(_) => {}
                Err(JobClientError::NotFound { .. }) if ignore_not_found => {
                    warn!("Job '{}' was already gone.", name);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::CleanupPods { namespace, phase } => {
            let client = connect(&config).await?;
            let namespace = namespace.unwrap_or_else(|| config.namespace.clone());
            let report = client.delete_completed_pods(&namespace, &phase).await?;
            info!("{} pod(s) deleted.", report.deleted());
        }
        Command::Check {} => {
            let client = connect(&config).await?;
            client.check_connectivity().await?;
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<JobLifecycleClient, AppError> {
    let connection = ClusterConnection::connect(config).await?;
    Ok(JobLifecycleClient::new(connection, config))
}
