//! Domain types for cutover deployments.
//!
//! These types describe one orchestration run and its terminal outcome.
//! Everything is serializable so configs can come from TOML files as
//! well as flags.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default replica count when a config does not specify one.
pub const DEFAULT_REPLICAS: u32 = 3;

/// Default bound, in seconds, on any single rollout wait.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Default canary traffic ramp, in percent of total replicas.
pub const DEFAULT_CANARY_STEPS: [u32; 5] = [10, 25, 50, 75, 100];

/// How to roll out a new version of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Replace replicas in place and wait for the rollout to settle.
    Rolling,
    /// Stand up the opposite color at full capacity, then flip traffic.
    BlueGreen,
    /// Shift traffic onto a canary workload in staged percentage steps.
    Canary,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rolling" => Ok(Strategy::Rolling),
            "blue-green" => Ok(Strategy::BlueGreen),
            "canary" => Ok(Strategy::Canary),
            other => Err(ConfigError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Rolling => write!(f, "rolling"),
            Strategy::BlueGreen => write!(f, "blue-green"),
            Strategy::Canary => write!(f, "canary"),
        }
    }
}

/// Immutable input to one orchestration run.
///
/// A config names the target workload, the image to roll out, and the
/// strategy used to get there. Constructors fill the conventional
/// defaults; [`DeploymentConfig::validate`] enforces the invariants the
/// engine relies on and runs before any cluster call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Namespace holding the workload.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Name of the primary (stable) deployment. The service carrying the
    /// traffic selector shares this name.
    pub deployment: String,
    /// Container image reference to roll out.
    pub image: String,
    /// Release strategy to run.
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
    /// Target total replica count across stable and canary.
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    /// Canary traffic ramp in percent: strictly increasing, ends at 100.
    #[serde(default = "default_canary_steps")]
    pub canary_steps: Vec<u32>,
    /// HTTP path probed by external health tooling. Informational here:
    /// the engine measures health via replica availability.
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    /// Bound, in seconds, on any single rollout wait.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_strategy() -> Strategy {
    Strategy::Rolling
}

fn default_replicas() -> u32 {
    DEFAULT_REPLICAS
}

fn default_canary_steps() -> Vec<u32> {
    DEFAULT_CANARY_STEPS.to_vec()
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl DeploymentConfig {
    /// Create a config with the conventional defaults for everything
    /// beyond the target and image.
    pub fn new(namespace: &str, deployment: &str, image: &str, strategy: Strategy) -> Self {
        Self {
            namespace: namespace.to_string(),
            deployment: deployment.to_string(),
            image: image.to_string(),
            strategy,
            replicas: DEFAULT_REPLICAS,
            canary_steps: DEFAULT_CANARY_STEPS.to_vec(),
            health_check_path: default_health_check_path(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        let config: DeploymentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on.
    ///
    /// The canary ramp must be non-empty, strictly increasing within
    /// 1..=100, and terminate at exactly 100: reaching 100 is the only
    /// promotion trigger the canary loop has.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.replicas == 0 {
            return Err(ConfigError::InvalidReplicas);
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.canary_steps.is_empty() {
            return Err(ConfigError::InvalidCanarySteps("ramp is empty".to_string()));
        }
        let mut previous = 0u32;
        for &weight in &self.canary_steps {
            if weight == 0 || weight > 100 {
                return Err(ConfigError::InvalidCanarySteps(format!(
                    "weight {weight} is outside 1..=100"
                )));
            }
            if weight <= previous {
                return Err(ConfigError::InvalidCanarySteps(format!(
                    "weights must be strictly increasing, got {weight} after {previous}"
                )));
            }
            previous = weight;
        }
        if previous != 100 {
            return Err(ConfigError::InvalidCanarySteps(format!(
                "ramp must end at 100, ends at {previous}"
            )));
        }
        Ok(())
    }

    /// Name of the canary workload paired with this deployment.
    pub fn canary_deployment(&self) -> String {
        format!("{}-canary", self.deployment)
    }

    /// Name of the color workload used by a blue/green cutover.
    pub fn color_deployment(&self, color: Color) -> String {
        format!("{}-{}", self.deployment, color)
    }
}

/// Terminal outcome of one orchestration run.
///
/// No partial state survives a run: a failed or rolled-back deployment
/// is re-invoked from scratch with no memory of which step it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutOutcome {
    /// The new image is serving at full capacity.
    Succeeded,
    /// The run aborted; the cluster may hold partial changes.
    Failed,
    /// A health failure was reverted to the previous revision.
    RolledBack,
}

impl RolloutOutcome {
    /// True only for a fully successful run.
    pub fn succeeded(&self) -> bool {
        matches!(self, RolloutOutcome::Succeeded)
    }
}

impl fmt::Display for RolloutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloutOutcome::Succeeded => write!(f, "succeeded"),
            RolloutOutcome::Failed => write!(f, "failed"),
            RolloutOutcome::RolledBack => write!(f, "rolled-back"),
        }
    }
}

/// Live traffic color for blue/green cutovers.
///
/// The cluster is the sole source of truth: the color is read from the
/// service selector at invocation time and never cached between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Blue,
    Green,
}

impl Color {
    /// The opposite color.
    pub fn flip(self) -> Self {
        match self {
            Color::Blue => Color::Green,
            Color::Green => Color::Blue,
        }
    }

    /// Interpret a service selector value.
    ///
    /// An absent or unrecognized selector reads as blue, the default
    /// origin, so the first cutover on a fresh service targets green.
    pub fn from_selector(value: Option<&str>) -> Self {
        match value {
            Some("green") => Color::Green,
            _ => Color::Blue,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Blue => write!(f, "blue"),
            Color::Green => write!(f, "green"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(strategy: Strategy) -> DeploymentConfig {
        DeploymentConfig::new("default", "api", "registry.local/api:v2", strategy)
    }

    #[test]
    fn strategy_parses_kebab_case() {
        assert_eq!("rolling".parse::<Strategy>().unwrap(), Strategy::Rolling);
        assert_eq!(
            "blue-green".parse::<Strategy>().unwrap(),
            Strategy::BlueGreen
        );
        assert_eq!("canary".parse::<Strategy>().unwrap(), Strategy::Canary);
    }

    #[test]
    fn strategy_rejects_unknown_names() {
        let err = "warp-speed".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedStrategy(s) if s == "warp-speed"));
    }

    #[test]
    fn strategy_display_roundtrips() {
        for strategy in [Strategy::Rolling, Strategy::BlueGreen, Strategy::Canary] {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn new_fills_defaults() {
        let config = test_config(Strategy::Rolling);
        assert_eq!(config.replicas, 3);
        assert_eq!(config.timeout_seconds, 300);
        assert_eq!(config.canary_steps, vec![10, 25, 50, 75, 100]);
        assert_eq!(config.health_check_path, "/health");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_replicas() {
        let mut config = test_config(Strategy::Rolling);
        config.replicas = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidReplicas)
        ));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = test_config(Strategy::Rolling);
        config.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn validate_rejects_empty_ramp() {
        let mut config = test_config(Strategy::Canary);
        config.canary_steps = vec![];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCanarySteps(_))
        ));
    }

    #[test]
    fn validate_rejects_ramp_not_ending_at_100() {
        let mut config = test_config(Strategy::Canary);
        config.canary_steps = vec![10, 50, 90];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCanarySteps(_))
        ));
    }

    #[test]
    fn validate_rejects_non_increasing_ramp() {
        let mut config = test_config(Strategy::Canary);
        config.canary_steps = vec![10, 10, 100];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCanarySteps(_))
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_weights() {
        let mut config = test_config(Strategy::Canary);
        config.canary_steps = vec![0, 50, 100];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCanarySteps(_))
        ));

        config.canary_steps = vec![10, 101];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCanarySteps(_))
        ));
    }

    #[test]
    fn validate_accepts_single_step_ramp() {
        let mut config = test_config(Strategy::Canary);
        config.canary_steps = vec![100];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_workload_names() {
        let config = test_config(Strategy::Canary);
        assert_eq!(config.canary_deployment(), "api-canary");
        assert_eq!(config.color_deployment(Color::Green), "api-green");
        assert_eq!(config.color_deployment(Color::Blue), "api-blue");
    }

    #[test]
    fn color_flip_is_an_involution() {
        assert_eq!(Color::Blue.flip(), Color::Green);
        assert_eq!(Color::Green.flip(), Color::Blue);
        assert_eq!(Color::Blue.flip().flip(), Color::Blue);
        assert_eq!(Color::Green.flip().flip(), Color::Green);
    }

    #[test]
    fn color_defaults_to_blue() {
        assert_eq!(Color::from_selector(None), Color::Blue);
        assert_eq!(Color::from_selector(Some("blue")), Color::Blue);
        assert_eq!(Color::from_selector(Some("green")), Color::Green);
        // Out-of-model selector values fold into the default origin.
        assert_eq!(Color::from_selector(Some("purple")), Color::Blue);
        assert_eq!(Color::from_selector(Some("")), Color::Blue);
    }

    #[test]
    fn outcome_display_and_success() {
        assert_eq!(RolloutOutcome::Succeeded.to_string(), "succeeded");
        assert_eq!(RolloutOutcome::Failed.to_string(), "failed");
        assert_eq!(RolloutOutcome::RolledBack.to_string(), "rolled-back");
        assert!(RolloutOutcome::Succeeded.succeeded());
        assert!(!RolloutOutcome::Failed.succeeded());
        assert!(!RolloutOutcome::RolledBack.succeeded());
    }

    #[test]
    fn from_file_parses_minimal_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cutover.toml");
        std::fs::write(
            &path,
            r#"
deployment = "api"
image = "registry.local/api:v2"
"#,
        )
        .unwrap();

        let config = DeploymentConfig::from_file(&path).unwrap();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.strategy, Strategy::Rolling);
        assert_eq!(config.replicas, 3);
        assert_eq!(config.canary_steps, vec![10, 25, 50, 75, 100]);
    }

    #[test]
    fn from_file_parses_full_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cutover.toml");
        std::fs::write(
            &path,
            r#"
namespace = "prod"
deployment = "api"
image = "registry.local/api:v2"
strategy = "canary"
replicas = 10
canary_steps = [10, 50, 100]
timeout_seconds = 120
"#,
        )
        .unwrap();

        let config = DeploymentConfig::from_file(&path).unwrap();
        assert_eq!(config.namespace, "prod");
        assert_eq!(config.strategy, Strategy::Canary);
        assert_eq!(config.replicas, 10);
        assert_eq!(config.canary_steps, vec![10, 50, 100]);
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn from_file_rejects_invalid_ramp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cutover.toml");
        std::fs::write(
            &path,
            r#"
deployment = "api"
image = "registry.local/api:v2"
canary_steps = [50, 10, 100]
"#,
        )
        .unwrap();

        assert!(matches!(
            DeploymentConfig::from_file(&path),
            Err(ConfigError::InvalidCanarySteps(_))
        ));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = DeploymentConfig::from_file(Path::new("/nonexistent/cutover.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_, _)));
    }

    #[test]
    fn strategy_serde_uses_kebab_case() {
        let config = test_config(Strategy::BlueGreen);
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("strategy = \"blue-green\""));

        let back: DeploymentConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }
}
