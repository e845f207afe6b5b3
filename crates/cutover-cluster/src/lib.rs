//! cutover-cluster: kubectl-backed cluster control.
//!
//! Implements the [`ClusterController`](cutover_core::ClusterController)
//! contract by shelling out to kubectl, one subprocess per operation.
//! The adapter holds no cluster state of its own; every read goes to the
//! API server and every mutation is a single kubectl invocation.

pub mod kubectl;

pub use kubectl::Kubectl;
