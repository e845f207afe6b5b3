//! `cutover deploy` implementation.

use std::path::PathBuf;

use anyhow::{Context, bail};
use cutover_cluster::Kubectl;
use cutover_core::{DeploymentConfig, Strategy};
use cutover_engine::Orchestrator;
use tracing::debug;

/// Parsed `cutover deploy` arguments.
pub struct DeployOptions {
    pub namespace: String,
    pub deployment: Option<String>,
    pub image: Option<String>,
    pub strategy: String,
    pub replicas: u32,
    pub timeout: u64,
    pub canary_steps: Option<Vec<u32>>,
    pub file: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn run(options: DeployOptions) -> anyhow::Result<()> {
    let config = build_config(&options)?;

    if options.dry_run {
        print_plan(&config);
        return Ok(());
    }

    let orchestrator = Orchestrator::new(Kubectl::new());
    let outcome = orchestrator.deploy(&config).await;
    if !outcome.succeeded() {
        bail!("deployment {} {}", config.deployment, outcome);
    }
    println!("deployment {} succeeded", config.deployment);
    Ok(())
}

/// Assemble the run config from a TOML file or from individual flags.
/// Either way the config is fully validated before anything runs.
fn build_config(options: &DeployOptions) -> anyhow::Result<DeploymentConfig> {
    if let Some(path) = &options.file {
        debug!(path = %path.display(), "loading deployment config");
        return Ok(DeploymentConfig::from_file(path)?);
    }

    // clap enforces these when --file is absent.
    let deployment = options
        .deployment
        .as_deref()
        .context("--deployment is required without --file")?;
    let image = options
        .image
        .as_deref()
        .context("--image is required without --file")?;
    let strategy: Strategy = options.strategy.parse()?;

    let mut config = DeploymentConfig::new(&options.namespace, deployment, image, strategy);
    config.replicas = options.replicas;
    config.timeout_seconds = options.timeout;
    if let Some(steps) = &options.canary_steps {
        config.canary_steps = steps.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_plan(config: &DeploymentConfig) {
    println!("Dry run, nothing will be applied.");
    println!("  namespace:  {}", config.namespace);
    println!("  deployment: {}", config.deployment);
    println!("  image:      {}", config.image);
    println!("  strategy:   {}", config.strategy);
    println!("  replicas:   {}", config.replicas);
    println!("  timeout:    {}s", config.timeout_seconds);
    if config.strategy == Strategy::Canary {
        let ramp: Vec<String> = config.canary_steps.iter().map(|w| format!("{w}%")).collect();
        println!("  ramp:       {}", ramp.join(" -> "));
    }
}
