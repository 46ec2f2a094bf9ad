//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`
//! or `crate::context`. All async ports use `async_trait` so they stay
//! object-safe: the context owns them as `Arc<dyn ...>` and tests swap in
//! counting fakes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::config::ContextConfig;
use crate::domain::identity::AwsIdentity;
use crate::domain::outputs::OutputMap;
use crate::domain::scope::PassphraseScope;
use crate::domain::session::AwsSession;

// ── Session ports ─────────────────────────────────────────────────────────────

/// Produces a candidate AWS session for a requested account/region pair.
///
/// The registry only validates and caches the result; the loader decides
/// how credentials are actually acquired (profile, SSO, instance role, ...).
/// `None` arguments mean "whatever the environment provides".
#[async_trait]
pub trait SessionLoader: Send + Sync {
    async fn load_session(
        &self,
        account: Option<&str>,
        region: Option<&str>,
    ) -> Result<AwsSession>;
}

/// Answers the provider's "who am I" query for a session.
///
/// Called at most once per session — the result is memoized on the session
/// by the registry.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn caller_identity(&self, session: &AwsSession) -> Result<AwsIdentity>;
}

// ── Passphrase port ───────────────────────────────────────────────────────────

/// Produces a secrets passphrase when every cache level misses.
///
/// Implementations may prompt, read a secret manager, or consult the
/// environment. A loader that cannot produce a value fails with
/// [`PassphraseError::NotFound`](crate::domain::error::PassphraseError).
#[async_trait]
pub trait PassphraseLoader: Send + Sync {
    async fn load_passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Result<String>;
}

// ── Stack output ports ────────────────────────────────────────────────────────

/// Resolves project names to deployed projects.
pub trait ProjectSource: Send + Sync {
    /// Look up a project by name; `None` selects the current project.
    fn project(&self, name: Option<&str>) -> Result<Arc<dyn StackProject>>;

    /// The stack name to use when a caller did not name one.
    fn current_stack_name(&self) -> Result<String>;
}

/// One deployed project, able to report the outputs of its stacks.
#[async_trait]
pub trait StackProject: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the full output mapping of one stack.
    async fn stack_outputs(&self, stack_name: &str, decrypt_secrets: bool) -> Result<OutputMap>;
}

// ── Command Runner port ───────────────────────────────────────────────────────

/// Everything needed to run one external program.
pub struct CommandSpec<'a> {
    /// Program to execute, as an absolute path or a bare name.
    pub program: &'a Path,
    pub args: &'a [&'a str],
    /// Working directory; inherits the process cwd when `None`.
    pub cwd: Option<&'a Path>,
    /// Full child environment. The child sees exactly these variables.
    pub envs: &'a HashMap<String, String>,
    /// Overrides the runner's default timeout when set.
    pub timeout: Option<Duration>,
}

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// timeout. On timeout the child must be killed, not left orphaned.
    async fn run(&self, spec: CommandSpec<'_>) -> Result<Output>;
}

// ── Config store port ─────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load configuration, returning defaults when none has been saved.
    fn load(&self) -> Result<ContextConfig>;
    /// Persist the given configuration.
    fn save(&self, config: &ContextConfig) -> Result<()>;
    /// Location of the backing file.
    fn path(&self) -> Result<PathBuf>;
}
