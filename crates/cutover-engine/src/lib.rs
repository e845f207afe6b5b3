//! Cutover deployment engine: rolling, blue/green, and canary rollouts.
//!
//! This crate drives one release run from a `DeploymentConfig` to a
//! terminal `RolloutOutcome` over an injected cluster control surface.
//! It supports in-place rolling updates, blue/green selector cutovers
//! (stage the opposite color, flip traffic atomically), and canary
//! ramps (staged replica shifts with soak pauses and health-gated
//! automatic rollback).
//!
//! The engine holds no state between runs and never retries a cluster
//! operation: a failed or rolled-back run is re-invoked from scratch.
//!
//! # Components
//!
//! - **`orchestrator`** - The strategy state machine (dispatch, ramp, rollback)
//! - **`sleep`** - Injectable delay used for canary soak pauses

pub mod orchestrator;
pub mod sleep;

pub use orchestrator::{Orchestrator, SOAK_INTERVAL};
pub use sleep::{Sleeper, TokioSleeper};
