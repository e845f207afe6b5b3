use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cutover",
    about = "Progressive deployment orchestration for cluster workloads",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll out a new image using a release strategy.
    ///
    /// Strategies: rolling (in-place replacement), blue-green (stage the
    /// opposite color, then flip the service selector), canary (staged
    /// traffic ramp with soak pauses, health gates, and auto-rollback).
    Deploy {
        /// Namespace holding the workload.
        #[arg(short, long, default_value = "default")]
        namespace: String,
        /// Target deployment name.
        #[arg(short, long, required_unless_present = "file", conflicts_with = "file")]
        deployment: Option<String>,
        /// Container image reference to roll out.
        #[arg(short, long, required_unless_present = "file", conflicts_with = "file")]
        image: Option<String>,
        /// Release strategy: rolling, blue-green, or canary.
        #[arg(short, long, default_value = "rolling")]
        strategy: String,
        /// Target total replica count.
        #[arg(short, long, default_value = "3")]
        replicas: u32,
        /// Bound in seconds on any single rollout wait.
        #[arg(short, long, default_value = "300")]
        timeout: u64,
        /// Canary ramp as comma-separated percentages ending at 100.
        #[arg(long, value_delimiter = ',')]
        canary_steps: Option<Vec<u32>>,
        /// Load the whole deployment config from a TOML file instead of flags.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Print the planned run without touching the cluster.
        #[arg(long)]
        dry_run: bool,
    },
    /// Revert a deployment to its previous revision and wait for the
    /// reversion to stabilize.
    Rollback {
        /// Namespace holding the workload.
        #[arg(short, long, default_value = "default")]
        namespace: String,
        /// Deployment to revert.
        #[arg(short, long)]
        deployment: String,
        /// Bound in seconds on the post-revert rollout wait.
        #[arg(short, long, default_value = "300")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cutover=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            namespace,
            deployment,
            image,
            strategy,
            replicas,
            timeout,
            canary_steps,
            file,
            dry_run,
        } => {
            commands::deploy::run(commands::deploy::DeployOptions {
                namespace,
                deployment,
                image,
                strategy,
                replicas,
                timeout,
                canary_steps,
                file,
                dry_run,
            })
            .await
        }
        Commands::Rollback {
            namespace,
            deployment,
            timeout,
        } => commands::rollback::run(&namespace, &deployment, timeout).await,
    }
}
