//! External configuration syntax validation.
//!
//! The engine never judges configuration syntax itself; it defers to the
//! server's own checker (`httpd -t`) through the [`SyntaxValidator`]
//! collaborator. Only the pass/fail outcome is interpreted; diagnostic text
//! is passed through to callers unparsed.
//!
//! Two failure modes are kept strictly apart: a *reported* syntax failure
//! (the checker ran and rejected the tree, [`ValidationOutcome::ok`] false)
//! and the checker being unavailable
//! ([`EngineError::ValidatorUnavailable`]). Transactions roll back on the
//! former and leave the mutation in place on the latter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{EngineError, Result};

/// Default bound on one syntax-check run.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one syntax check.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Whether the checker accepted the configuration.
    pub ok: bool,
    /// The checker's diagnostic output, unparsed.
    pub diagnostic: String,
}

/// Collaborator that checks overall configuration syntax validity.
#[async_trait]
pub trait SyntaxValidator: Send + Sync {
    /// Checks the global configuration rooted at `root_conf`.
    ///
    /// Returns `Ok` with the reported outcome when the checker ran, and
    /// [`EngineError::ValidatorUnavailable`] when it could not run at all.
    async fn check(&self, root_conf: &Utf8Path) -> Result<ValidationOutcome>;
}

/// Runs the server binary's own syntax check (`httpd -t -f <root>`) as a
/// subprocess with a bounded execution timeout.
pub struct HttpdValidator {
    binary: Utf8PathBuf,
    extra_args: Vec<String>,
    check_timeout: Duration,
}

impl HttpdValidator {
    pub fn new(binary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Extra arguments passed before `-t`, e.g. `-d <server_root>`.
    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, check_timeout: Duration) -> Self {
        self.check_timeout = check_timeout;
        self
    }
}

#[async_trait]
impl SyntaxValidator for HttpdValidator {
    async fn check(&self, root_conf: &Utf8Path) -> Result<ValidationOutcome> {
        let mut cmd = Command::new(self.binary.as_str());
        cmd.args(&self.extra_args)
            .arg("-t")
            .arg("-f")
            .arg(root_conf.as_str())
            .kill_on_drop(true);

        tracing::debug!("Running syntax check: {} -t -f {}", self.binary, root_conf);
        let start = Instant::now();

        let output = match timeout(self.check_timeout, cmd.output()).await {
            // Exceeding the bound is a fatal reported failure, not an
            // availability problem: the tree cannot be confirmed valid.
            Err(_) => {
                tracing::warn!(
                    "Syntax check timed out after {:?}",
                    self.check_timeout
                );
                return Ok(ValidationOutcome {
                    ok: false,
                    diagnostic: format!(
                        "syntax check timed out after {:?}",
                        self.check_timeout
                    ),
                });
            }
            Ok(Err(err)) => {
                return Err(EngineError::ValidatorUnavailable(format!(
                    "failed to run {}: {}",
                    self.binary, err
                )));
            }
            Ok(Ok(output)) => output,
        };

        // httpd writes "Syntax OK" and errors to stderr.
        let mut diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if diagnostic.is_empty() {
            diagnostic = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        let ok = output.status.success();

        tracing::info!(
            "Syntax check finished in {:.2}s: {}",
            start.elapsed().as_secs_f32(),
            if ok { "ok" } else { "failed" }
        );
        Ok(ValidationOutcome { ok, diagnostic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_unavailable_not_failed() {
        let validator = HttpdValidator::new("/nonexistent/httpd-binary");
        let err = validator
            .check(Utf8Path::new("/etc/httpd/httpd.conf"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ValidatorUnavailable(_)));
    }

    #[tokio::test]
    async fn failing_check_reports_diagnostic() {
        // `false` runs everywhere in CI and exits non-zero.
        let validator = HttpdValidator::new("false");
        let outcome = validator
            .check(Utf8Path::new("/etc/httpd/httpd.conf"))
            .await
            .unwrap();
        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn passing_check_is_ok() {
        let validator = HttpdValidator::new("true");
        let outcome = validator
            .check(Utf8Path::new("/etc/httpd/httpd.conf"))
            .await
            .unwrap();
        assert!(outcome.ok);
    }

    #[tokio::test]
    async fn timeout_is_a_reported_failure() {
        // `sh -c 'sleep 2' --` swallows the `-t -f <root>` arguments.
        let validator = HttpdValidator::new("sh")
            .with_args(["-c", "sleep 2", "--"])
            .with_timeout(Duration::from_millis(50));
        let outcome = validator
            .check(Utf8Path::new("/etc/httpd/httpd.conf"))
            .await
            .unwrap();
        assert!(!outcome.ok);
        assert!(outcome.diagnostic.contains("timed out"));
    }
}
