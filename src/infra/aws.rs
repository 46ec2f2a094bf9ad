//! Environment-backed session loading and CLI-backed identity lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::application::ports::{
    CommandRunner, CommandSpec, IdentitySource, SessionLoader,
};
use crate::domain::identity::AwsIdentity;
use crate::domain::session::AwsSession;

/// `SessionLoader` that builds sessions from the context's environment
/// snapshot: `AWS_REGION` / `AWS_DEFAULT_REGION` for the region,
/// `AWS_PROFILE` for the credential profile.
pub struct EnvSessionLoader {
    environ: HashMap<String, String>,
    fallback_region: Option<String>,
}

impl EnvSessionLoader {
    #[must_use]
    pub fn new(environ: HashMap<String, String>, fallback_region: Option<String>) -> Self {
        Self {
            environ,
            fallback_region,
        }
    }

    fn env(&self, name: &str) -> Option<String> {
        self.environ.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

#[async_trait]
impl SessionLoader for EnvSessionLoader {
    async fn load_session(
        &self,
        _account: Option<&str>,
        region: Option<&str>,
    ) -> Result<AwsSession> {
        // TODO: select a credential profile matching the requested account;
        // the default profile is used for every account today.
        let region = region
            .map(str::to_string)
            .or_else(|| self.env("AWS_REGION"))
            .or_else(|| self.env("AWS_DEFAULT_REGION"))
            .or_else(|| self.fallback_region.clone())
            .context("no AWS region configured: set AWS_REGION or AWS_DEFAULT_REGION")?;
        Ok(AwsSession::new(region, self.env("AWS_PROFILE")))
    }
}

/// `IdentitySource` that shells out to `aws sts get-caller-identity`.
pub struct CliIdentitySource {
    runner: Arc<dyn CommandRunner>,
    environ: HashMap<String, String>,
    program: String,
}

impl CliIdentitySource {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, environ: HashMap<String, String>) -> Self {
        Self {
            runner,
            environ,
            program: "aws".to_string(),
        }
    }

    /// Override the `aws` executable, e.g. with an absolute path.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl IdentitySource for CliIdentitySource {
    async fn caller_identity(&self, session: &AwsSession) -> Result<AwsIdentity> {
        let mut args = vec![
            "sts",
            "get-caller-identity",
            "--output",
            "json",
            "--region",
            session.region(),
        ];
        if let Some(profile) = session.profile() {
            args.push("--profile");
            args.push(profile);
        }
        let output = self
            .runner
            .run(CommandSpec {
                program: Path::new(&self.program),
                args: &args,
                cwd: None,
                envs: &self.environ,
                timeout: None,
            })
            .await?;
        if !output.status.success() {
            bail!(
                "sts get-caller-identity failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        serde_json::from_slice(&output.stdout).context("cannot parse sts get-caller-identity output")
    }
}
