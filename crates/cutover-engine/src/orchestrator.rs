//! Deployment orchestrator: drives one release run to a terminal outcome.
//!
//! The orchestrator owns the strategy state machine. Each run validates
//! its config, dispatches to exactly one strategy algorithm, and issues
//! a strictly sequential series of cluster calls. Every call result is
//! branched on explicitly; a single failure aborts the current step and
//! the run terminates in exactly one of `Succeeded`, `Failed`, or
//! `RolledBack`.

use std::time::Duration;

use cutover_core::{ClusterController, Color, DeploymentConfig, RolloutOutcome, Strategy};
use tracing::{debug, error, info, warn};

use crate::sleep::{Sleeper, TokioSleeper};

/// Fixed pause between canary ramp steps, letting the canary absorb
/// traffic before its health is judged.
pub const SOAK_INTERVAL: Duration = Duration::from_secs(60);

/// Drives release strategies against a cluster control surface.
///
/// One orchestrator instance serves one logical run at a time; nothing
/// is cached between runs and concurrent runs against the same target
/// are not guarded.
pub struct Orchestrator<C, S = TokioSleeper> {
    cluster: C,
    sleeper: S,
}

impl<C: ClusterController> Orchestrator<C> {
    /// Orchestrator with the production timer.
    pub fn new(cluster: C) -> Self {
        Self {
            cluster,
            sleeper: TokioSleeper,
        }
    }
}

impl<C: ClusterController, S: Sleeper> Orchestrator<C, S> {
    /// Orchestrator with an injected sleep dependency.
    pub fn with_sleeper(cluster: C, sleeper: S) -> Self {
        Self { cluster, sleeper }
    }

    /// Run one deployment to a terminal outcome.
    ///
    /// The config is validated before anything else; an invalid config
    /// yields `Failed` with zero cluster calls issued.
    pub async fn deploy(&self, config: &DeploymentConfig) -> RolloutOutcome {
        if let Err(e) = config.validate() {
            warn!(deployment = %config.deployment, error = %e, "rejecting invalid config");
            return RolloutOutcome::Failed;
        }

        info!(
            deployment = %config.deployment,
            namespace = %config.namespace,
            image = %config.image,
            strategy = %config.strategy,
            "starting deployment"
        );

        let outcome = match config.strategy {
            Strategy::Rolling => self.deploy_rolling(config).await,
            Strategy::BlueGreen => self.deploy_blue_green(config).await,
            Strategy::Canary => self.deploy_canary(config).await,
        };

        info!(
            deployment = %config.deployment,
            outcome = %outcome,
            "deployment finished"
        );
        outcome
    }

    /// Revert the primary deployment to its previous revision and wait
    /// for the reversion to stabilize.
    ///
    /// True only if both the undo and the subsequent rollout wait
    /// succeed. A failed undo means the cluster was not reverted, which
    /// callers must surface as `Failed`, never `RolledBack`.
    pub async fn rollback(&self, config: &DeploymentConfig) -> bool {
        info!(deployment = %config.deployment, "reverting to previous revision");
        if let Err(e) = self
            .cluster
            .undo_rollout(&config.namespace, &config.deployment)
            .await
        {
            error!(deployment = %config.deployment, error = %e, "revision undo failed");
            return false;
        }
        self.await_rollout(&config.namespace, &config.deployment, config.timeout_seconds)
            .await
    }

    /// In-place replacement: one image update, one rollout wait.
    async fn deploy_rolling(&self, config: &DeploymentConfig) -> RolloutOutcome {
        if let Err(e) = self
            .cluster
            .set_image(&config.namespace, &config.deployment, &config.image)
            .await
        {
            warn!(deployment = %config.deployment, error = %e, "image update failed");
            return RolloutOutcome::Failed;
        }

        if self
            .await_rollout(&config.namespace, &config.deployment, config.timeout_seconds)
            .await
        {
            RolloutOutcome::Succeeded
        } else {
            RolloutOutcome::Failed
        }
    }

    /// Full-capacity cutover: stage the opposite color, then flip the
    /// service selector.
    ///
    /// The selector flip is the final step. Any earlier failure leaves
    /// live traffic on the previous color untouched, and the previous
    /// color workload is never scaled down here.
    async fn deploy_blue_green(&self, config: &DeploymentConfig) -> RolloutOutcome {
        let selector = self
            .cluster
            .service_selector_version(&config.namespace, &config.deployment)
            .await;
        let current = Color::from_selector(selector.as_deref());
        let new_color = current.flip();
        let target = config.color_deployment(new_color);

        info!(
            deployment = %config.deployment,
            current = %current,
            target = %new_color,
            "staging cutover"
        );

        if let Err(e) = self
            .cluster
            .set_image(&config.namespace, &target, &config.image)
            .await
        {
            warn!(deployment = %target, error = %e, "image update failed");
            return RolloutOutcome::Failed;
        }

        if !self
            .await_rollout(&config.namespace, &target, config.timeout_seconds)
            .await
        {
            warn!(deployment = %target, "new color never stabilized, selector left untouched");
            return RolloutOutcome::Failed;
        }

        if let Err(e) = self
            .cluster
            .patch_service_selector_version(
                &config.namespace,
                &config.deployment,
                &new_color.to_string(),
            )
            .await
        {
            warn!(deployment = %config.deployment, error = %e, "selector patch failed");
            return RolloutOutcome::Failed;
        }

        info!(deployment = %config.deployment, serving = %new_color, "traffic switched");
        RolloutOutcome::Succeeded
    }

    /// Staged ramp: shift replicas onto the canary weight by weight,
    /// soaking and health-checking between steps, then promote the
    /// primary once the ramp reaches 100%.
    async fn deploy_canary(&self, config: &DeploymentConfig) -> RolloutOutcome {
        let canary = config.canary_deployment();
        let total = config.canary_steps.len();

        for (i, &weight) in config.canary_steps.iter().enumerate() {
            info!(
                deployment = %config.deployment,
                step = i + 1,
                total,
                weight,
                "ramping canary"
            );

            if let Err(e) = self
                .cluster
                .set_image(&config.namespace, &canary, &config.image)
                .await
            {
                warn!(deployment = %canary, error = %e, "canary image update failed");
                return RolloutOutcome::Failed;
            }

            let (canary_replicas, stable_replicas) = canary_split(config.replicas, weight);
            debug!(
                canary = canary_replicas,
                stable = stable_replicas,
                "applying replica split"
            );

            if let Err(e) = self
                .cluster
                .scale(&config.namespace, &canary, canary_replicas)
                .await
            {
                warn!(deployment = %canary, error = %e, "canary scale failed");
                return RolloutOutcome::Failed;
            }
            if let Err(e) = self
                .cluster
                .scale(&config.namespace, &config.deployment, stable_replicas)
                .await
            {
                warn!(deployment = %config.deployment, error = %e, "stable scale failed");
                return RolloutOutcome::Failed;
            }

            if weight < 100 {
                debug!(seconds = SOAK_INTERVAL.as_secs(), "soaking canary");
                self.sleeper.sleep(SOAK_INTERVAL).await;

                if !self.is_healthy(config, &config.deployment).await {
                    warn!(
                        deployment = %config.deployment,
                        weight,
                        "health check failed, rolling back"
                    );
                    return if self.rollback(config).await {
                        RolloutOutcome::RolledBack
                    } else {
                        RolloutOutcome::Failed
                    };
                }
            }
        }

        // The ramp always terminates at 100, so the canary now carries
        // everything; move the primary to the new image.
        info!(deployment = %config.deployment, "promoting canary image to stable");
        if let Err(e) = self
            .cluster
            .set_image(&config.namespace, &config.deployment, &config.image)
            .await
        {
            warn!(deployment = %config.deployment, error = %e, "promotion image update failed");
            return RolloutOutcome::Failed;
        }

        if self
            .await_rollout(&config.namespace, &config.deployment, config.timeout_seconds)
            .await
        {
            RolloutOutcome::Succeeded
        } else {
            RolloutOutcome::Failed
        }
    }

    /// True iff the rollout completed before its bound. Errors,
    /// timeouts included, are logged and folded into `false`.
    async fn await_rollout(&self, namespace: &str, deployment: &str, timeout_seconds: u64) -> bool {
        debug!(deployment, timeout_seconds, "waiting for rollout");
        match self
            .cluster
            .wait_for_rollout(namespace, deployment, timeout_seconds)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(deployment, error = %e, "rollout did not complete");
                false
            }
        }
    }

    /// Coarse liveness verdict: the target reports at least the
    /// configured replica count available. A query error is unhealthy.
    async fn is_healthy(&self, config: &DeploymentConfig, target: &str) -> bool {
        match self
            .cluster
            .available_replicas(&config.namespace, target)
            .await
        {
            Ok(available) => {
                let healthy = available >= config.replicas;
                debug!(
                    deployment = target,
                    available,
                    required = config.replicas,
                    healthy,
                    "health verdict"
                );
                healthy
            }
            Err(e) => {
                warn!(deployment = target, error = %e, "health query failed, treating as unhealthy");
                false
            }
        }
    }
}

/// Split a total replica count between canary and stable for a traffic
/// weight in percent. Rounds half up; the canary always keeps at least
/// one replica and the counts always sum to the total.
fn canary_split(replicas: u32, weight: u32) -> (u32, u32) {
    let rounded = ((u64::from(replicas) * u64::from(weight) + 50) / 100) as u32;
    let canary = rounded.clamp(1, replicas);
    (canary, replicas - canary)
}
