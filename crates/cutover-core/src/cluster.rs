//! The cluster control surface consumed by the orchestration engine.
//!
//! [`ClusterController`] is the entire contract the engine needs from a
//! cluster-management layer: seven operations covering image updates,
//! scaling, rollout waits, selector reads and patches, and revision undo.
//! Any implementation satisfying the contract is interchangeable, from a
//! kubectl wrapper to a recording test double.
//!
//! Methods return boxed futures so the trait stays object-safe and an
//! implementation can be injected behind `dyn`.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed future alias for controller operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed future alias for fallible controller operations.
pub type ClusterFuture<'a, T> = BoxFuture<'a, ClusterResult<T>>;

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors from the cluster control surface.
///
/// The engine does not distinguish transient from permanent failures and
/// never retries: any error aborts the current step.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The controller process could not be started at all.
    #[error("failed to run {0}: {1}")]
    Exec(String, #[source] std::io::Error),

    /// The controller ran and reported failure.
    #[error("{0}")]
    Command(String),

    /// A rollout wait exceeded its bound.
    #[error("rollout did not complete within {0}s")]
    Timeout(u64),

    /// Controller output could not be interpreted.
    #[error("unexpected controller output: {0}")]
    Parse(String),
}

/// Read and mutate operations against the cluster.
///
/// All operations are sequential from the engine's point of view: each
/// call is awaited to completion before the next is issued, and the
/// engine never retries on its own. Implementations should be safe to
/// retry at an outer caller's discretion.
pub trait ClusterController: Send + Sync {
    /// Read the `version` selector of a service.
    ///
    /// `None` means no prior color is recorded. A failed read is
    /// indistinguishable from an absent selector; this operation has no
    /// error channel.
    fn service_selector_version<'a>(
        &'a self,
        namespace: &'a str,
        service: &'a str,
    ) -> BoxFuture<'a, Option<String>>;

    /// Point a deployment's container at a new image.
    fn set_image<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        image: &'a str,
    ) -> ClusterFuture<'a, ()>;

    /// Scale a deployment to an absolute replica count.
    fn scale<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        replicas: u32,
    ) -> ClusterFuture<'a, ()>;

    /// Resolve once every replica of a deployment is updated and
    /// available, or fail when the timeout elapses. A timeout is an
    /// error value, not a panic.
    fn wait_for_rollout<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        timeout_seconds: u64,
    ) -> ClusterFuture<'a, ()>;

    /// Number of currently available replicas of a deployment.
    fn available_replicas<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
    ) -> ClusterFuture<'a, u32>;

    /// Rewrite a service's `version` selector, atomically shifting
    /// traffic to the workloads labeled with that version.
    fn patch_service_selector_version<'a>(
        &'a self,
        namespace: &'a str,
        service: &'a str,
        version: &'a str,
    ) -> ClusterFuture<'a, ()>;

    /// Revert a deployment to its previous revision.
    fn undo_rollout<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
    ) -> ClusterFuture<'a, ()>;
}
