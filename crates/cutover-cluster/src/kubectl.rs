//! kubectl subprocess adapter.
//!
//! Each contract operation maps to exactly one kubectl invocation:
//!
//! | operation                        | kubectl                                            |
//! |----------------------------------|----------------------------------------------------|
//! | `service_selector_version`       | `get service -o jsonpath={.spec.selector.version}` |
//! | `set_image`                      | `set image deployment/<name> app=<image>`          |
//! | `scale`                          | `scale deployment/<name> --replicas=<n>`           |
//! | `wait_for_rollout`               | `rollout status deployment/<name> --timeout=<t>s`  |
//! | `available_replicas`             | `get deployment -o jsonpath={.status.availableReplicas}` |
//! | `patch_service_selector_version` | `patch service <name> -p <merge patch>`            |
//! | `undo_rollout`                   | `rollout undo deployment/<name>`                   |
//!
//! The container inside each deployment is assumed to be named `app`.

use std::path::PathBuf;

use cutover_core::{BoxFuture, ClusterController, ClusterError, ClusterFuture, ClusterResult};
use tokio::process::Command;
use tracing::{debug, warn};

/// A [`ClusterController`] that shells out to kubectl.
///
/// Cluster selection and credentials are whatever the ambient
/// kubeconfig resolves to, exactly as for an operator at a shell.
pub struct Kubectl {
    binary: PathBuf,
}

impl Kubectl {
    /// Use the `kubectl` found on `$PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
        }
    }

    /// Use a specific kubectl binary instead of the one on `$PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run one kubectl invocation and return its trimmed stdout.
    async fn run(&self, args: &[&str]) -> ClusterResult<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.kill_on_drop(true);
        debug!(binary = %self.binary.display(), ?args, "invoking kubectl");

        let output = cmd
            .output()
            .await
            .map_err(|e| ClusterError::Exec(self.binary.display().to_string(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!(
                    "kubectl {} exited with {}",
                    args.first().copied().unwrap_or(""),
                    output.status
                )
            } else {
                stderr
            };
            return Err(ClusterError::Command(detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterController for Kubectl {
    fn service_selector_version<'a>(
        &'a self,
        namespace: &'a str,
        service: &'a str,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let args = [
                "get",
                "service",
                service,
                "-n",
                namespace,
                "-o",
                "jsonpath={.spec.selector.version}",
            ];
            match self.run(&args).await {
                Ok(out) if out.is_empty() => None,
                Ok(out) => Some(out),
                Err(e) => {
                    // The contract has no error channel here; a missing
                    // service and an unreadable one both read as absent.
                    warn!(service, namespace, error = %e, "selector read failed, treating as absent");
                    None
                }
            }
        })
    }

    fn set_image<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        image: &'a str,
    ) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            let target = format!("deployment/{deployment}");
            let assignment = format!("app={image}");
            self.run(&["set", "image", &target, &assignment, "-n", namespace])
                .await?;
            Ok(())
        })
    }

    fn scale<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        replicas: u32,
    ) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            let target = format!("deployment/{deployment}");
            let count = format!("--replicas={replicas}");
            self.run(&["scale", &target, &count, "-n", namespace])
                .await?;
            Ok(())
        })
    }

    fn wait_for_rollout<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        timeout_seconds: u64,
    ) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            let target = format!("deployment/{deployment}");
            let timeout = format!("--timeout={timeout_seconds}s");
            match self
                .run(&["rollout", "status", &target, "-n", namespace, &timeout])
                .await
            {
                Ok(_) => Ok(()),
                Err(ClusterError::Command(msg)) if msg.contains("timed out") => {
                    Err(ClusterError::Timeout(timeout_seconds))
                }
                Err(e) => Err(e),
            }
        })
    }

    fn available_replicas<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
    ) -> ClusterFuture<'a, u32> {
        Box::pin(async move {
            let out = self
                .run(&[
                    "get",
                    "deployment",
                    deployment,
                    "-n",
                    namespace,
                    "-o",
                    "jsonpath={.status.availableReplicas}",
                ])
                .await?;
            parse_replica_count(&out)
        })
    }

    fn patch_service_selector_version<'a>(
        &'a self,
        namespace: &'a str,
        service: &'a str,
        version: &'a str,
    ) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            let patch = selector_patch_json(version);
            self.run(&["patch", "service", service, "-n", namespace, "-p", &patch])
                .await?;
            Ok(())
        })
    }

    fn undo_rollout<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
    ) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            let target = format!("deployment/{deployment}");
            self.run(&["rollout", "undo", &target, "-n", namespace])
                .await?;
            Ok(())
        })
    }
}

/// Strategic merge patch that rewrites a service's `version` selector.
fn selector_patch_json(version: &str) -> String {
    serde_json::json!({ "spec": { "selector": { "version": version } } }).to_string()
}

/// Interpret kubectl's `availableReplicas` jsonpath output.
///
/// The API server omits the field entirely while zero replicas are
/// available, so empty output is a count of zero, not an error.
fn parse_replica_count(s: &str) -> ClusterResult<u32> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>()
        .map_err(|_| ClusterError::Parse(format!("availableReplicas: {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_patch_shape() {
        assert_eq!(
            selector_patch_json("green"),
            r#"{"spec":{"selector":{"version":"green"}}}"#
        );
        assert_eq!(
            selector_patch_json("blue"),
            r#"{"spec":{"selector":{"version":"blue"}}}"#
        );
    }

    #[test]
    fn replica_count_parsing() {
        assert_eq!(parse_replica_count("").unwrap(), 0);
        assert_eq!(parse_replica_count("0").unwrap(), 0);
        assert_eq!(parse_replica_count("7").unwrap(), 7);
        assert!(matches!(
            parse_replica_count("not-a-number"),
            Err(ClusterError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn run_reports_missing_binary() {
        let kubectl = Kubectl::with_binary("/nonexistent/kubectl-for-tests");
        let err = kubectl.run(&["version"]).await.unwrap_err();
        assert!(matches!(err, ClusterError::Exec(_, _)));
        assert!(err.to_string().contains("/nonexistent/kubectl-for-tests"));
    }

    #[tokio::test]
    async fn run_reports_nonzero_exit() {
        let kubectl = Kubectl::with_binary("/bin/false");
        let err = kubectl.run(&["get", "pods"]).await.unwrap_err();
        assert!(matches!(err, ClusterError::Command(_)));
    }

    #[tokio::test]
    async fn run_trims_stdout() {
        let kubectl = Kubectl::with_binary("/bin/echo");
        let out = kubectl.run(&["hello"]).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn selector_read_failure_reads_as_absent() {
        let kubectl = Kubectl::with_binary("/bin/false");
        assert_eq!(kubectl.service_selector_version("default", "api").await, None);
    }

    #[tokio::test]
    async fn empty_selector_output_reads_as_absent() {
        let kubectl = Kubectl::with_binary("/bin/true");
        assert_eq!(kubectl.service_selector_version("default", "api").await, None);
    }

    // Stub kubectl that records its argv, for asserting the exact
    // command surface each operation produces.
    #[cfg(unix)]
    mod argv {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn recording_stub() -> (tempfile::TempDir, Kubectl) {
            let dir = tempfile::TempDir::new().unwrap();
            let script = dir.path().join("kubectl-stub");
            let args_file = dir.path().join("args.txt");
            std::fs::write(
                &script,
                format!("#!/bin/sh\nprintf '%s ' \"$@\" > {}\n", args_file.display()),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            let kubectl = Kubectl::with_binary(&script);
            (dir, kubectl)
        }

        fn recorded(dir: &tempfile::TempDir) -> String {
            std::fs::read_to_string(dir.path().join("args.txt"))
                .unwrap()
                .trim()
                .to_string()
        }

        #[tokio::test]
        async fn set_image_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl
                .set_image("prod", "api", "registry.local/api:v2")
                .await
                .unwrap();
            assert_eq!(
                recorded(&dir),
                "set image deployment/api app=registry.local/api:v2 -n prod"
            );
        }

        #[tokio::test]
        async fn scale_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl.scale("prod", "api-canary", 4).await.unwrap();
            assert_eq!(recorded(&dir), "scale deployment/api-canary --replicas=4 -n prod");
        }

        #[tokio::test]
        async fn wait_for_rollout_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl.wait_for_rollout("prod", "api", 120).await.unwrap();
            assert_eq!(
                recorded(&dir),
                "rollout status deployment/api -n prod --timeout=120s"
            );
        }

        #[tokio::test]
        async fn selector_read_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl.service_selector_version("prod", "api").await;
            assert_eq!(
                recorded(&dir),
                "get service api -n prod -o jsonpath={.spec.selector.version}"
            );
        }

        #[tokio::test]
        async fn available_replicas_argv() {
            let (dir, kubectl) = recording_stub();
            // Stub prints nothing, which parses as zero available.
            assert_eq!(kubectl.available_replicas("prod", "api-canary").await.unwrap(), 0);
            assert_eq!(
                recorded(&dir),
                "get deployment api-canary -n prod -o jsonpath={.status.availableReplicas}"
            );
        }

        #[tokio::test]
        async fn patch_selector_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl
                .patch_service_selector_version("prod", "api", "green")
                .await
                .unwrap();
            assert_eq!(
                recorded(&dir),
                r#"patch service api -n prod -p {"spec":{"selector":{"version":"green"}}}"#
            );
        }

        #[tokio::test]
        async fn undo_rollout_argv() {
            let (dir, kubectl) = recording_stub();
            kubectl.undo_rollout("prod", "api").await.unwrap();
            assert_eq!(recorded(&dir), "rollout undo deployment/api -n prod");
        }

        #[tokio::test]
        async fn timeout_stderr_maps_to_timeout_error() {
            let dir = tempfile::TempDir::new().unwrap();
            let script = dir.path().join("kubectl-stub");
            std::fs::write(
                &script,
                "#!/bin/sh\necho 'error: timed out waiting for the condition' >&2\nexit 1\n",
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

            let kubectl = Kubectl::with_binary(&script);
            let err = kubectl.wait_for_rollout("prod", "api", 5).await.unwrap_err();
            assert!(matches!(err, ClusterError::Timeout(5)));
        }
    }
}
