//! `cutover rollback` implementation.

use anyhow::bail;
use cutover_cluster::Kubectl;
use cutover_core::{DeploymentConfig, Strategy};
use cutover_engine::Orchestrator;

pub async fn run(namespace: &str, deployment: &str, timeout: u64) -> anyhow::Result<()> {
    // A revision undo needs no image or strategy; only the target and
    // the wait bound matter here.
    let mut config = DeploymentConfig::new(namespace, deployment, "", Strategy::Rolling);
    config.timeout_seconds = timeout;

    let orchestrator = Orchestrator::new(Kubectl::new());
    if !orchestrator.rollback(&config).await {
        bail!("rollback of {deployment} failed");
    }
    println!("deployment {deployment} rolled back");
    Ok(())
}
