//! cutover-core: shared vocabulary for the cutover release orchestrator.
//!
//! Holds the deployment configuration model, the terminal outcome type,
//! and the [`ClusterController`] contract the orchestration engine
//! consumes. Every other crate in the workspace depends on this one; it
//! depends on nothing else in the workspace.

pub mod cluster;
pub mod error;
pub mod types;

pub use cluster::{BoxFuture, ClusterController, ClusterError, ClusterFuture, ClusterResult};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
