//! The deployment context — one per process/run.
//!
//! `DeployContext` owns every mutable cache in this crate (the environment
//! snapshot, the session map, the passphrase maps) and wires the pluggable
//! loaders together. It is passed by reference to anything that needs it;
//! there are no ambient singletons. Embedding several contexts in one
//! process is fine — they share nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context as _, Result};

use crate::application::ports::{
    IdentitySource, PassphraseLoader, ProjectSource, SessionLoader,
};
use crate::application::promise::Promise;
use crate::application::services::outputs::{StackOutputs, fetch_stack_outputs};
use crate::application::services::passphrase::PassphraseResolver;
use crate::application::services::sessions::SessionRegistry;
use crate::domain::config::ContextConfig;
use crate::domain::error::ToolError;
use crate::domain::identity::AwsIdentity;
use crate::domain::outputs::SyncStackOutputs;
use crate::domain::paths::{expand_home, normalize};
use crate::domain::scope::PassphraseScope;
use crate::domain::session::AwsSession;
use crate::infra::aws::{CliIdentitySource, EnvSessionLoader};
use crate::infra::backend::CliStackBackend;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::find_executable;
use crate::infra::passphrase::EnvPassphraseLoader;

/// Name of the provisioning CLI searched for in `PATH`.
pub const PULUMI_PROGRAM: &str = "pulumi";

/// Default install location when `PULUMI_HOME` is unset.
const DEFAULT_PULUMI_HOME: &str = "~/.pulumi";

// ── Mutable state ─────────────────────────────────────────────────────────────

/// The mutable, process-lifetime part of the context: environment snapshot,
/// working directory, and discovered paths.
struct ContextState {
    environ: HashMap<String, String>,
    cwd: PathBuf,
    home: Option<PathBuf>,
    cli_path: Option<PathBuf>,
    project_root: PathBuf,
}

impl ContextState {
    /// Resolve a path against the context: `~` expansion, then the context
    /// cwd for relative paths, then lexical normalization. Idempotent on
    /// absolute normalized input.
    fn abspath(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path, self.home.as_deref());
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            self.cwd.join(expanded)
        };
        normalize(&joined)
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Process-wide deployment context: environment, working directory, AWS
/// session registry, passphrase resolver, and stack-output access.
pub struct DeployContext {
    state: Mutex<ContextState>,
    sessions: SessionRegistry,
    passphrases: PassphraseResolver,
    projects: Option<Arc<dyn ProjectSource>>,
    default_scope: PassphraseScope,
}

impl DeployContext {
    /// A context with default wiring: environment-backed session loading,
    /// CLI-backed identity lookup, environment-backed passphrases.
    ///
    /// # Errors
    ///
    /// Fails when the current working directory cannot be determined.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    // ── Environment ──────────────────────────────────────────────────────────

    /// A copy of the context's environment snapshot.
    #[must_use]
    pub fn environ(&self) -> HashMap<String, String> {
        self.state().environ.clone()
    }

    #[must_use]
    pub fn env_var(&self, name: &str) -> Option<String> {
        self.state().environ.get(name).cloned()
    }

    /// Override one variable in the snapshot. The real process environment
    /// is never touched.
    pub fn set_env_var(&self, name: &str, value: &str) {
        self.state()
            .environ
            .insert(name.to_string(), value.to_string());
    }

    // ── Paths ────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn cwd(&self) -> PathBuf {
        self.state().cwd.clone()
    }

    /// Change the context working directory; relative paths resolve against
    /// the previous cwd.
    pub fn set_cwd(&self, path: &str) {
        let mut state = self.state();
        state.cwd = state.abspath(path);
    }

    /// Resolve a path against the context cwd, expanding `~`.
    #[must_use]
    pub fn abspath(&self, path: &str) -> PathBuf {
        self.state().abspath(path)
    }

    /// `PULUMI_HOME` from the snapshot, defaulting to `~/.pulumi`, always
    /// absolute.
    #[must_use]
    pub fn pulumi_home(&self) -> PathBuf {
        let state = self.state();
        let raw = state
            .environ
            .get("PULUMI_HOME")
            .filter(|v| !v.is_empty())
            .map_or(DEFAULT_PULUMI_HOME, String::as_str);
        state.abspath(raw)
    }

    pub fn set_pulumi_home(&self, path: &str) {
        let mut state = self.state();
        let absolute = state.abspath(path);
        state.environ.insert(
            "PULUMI_HOME".to_string(),
            absolute.to_string_lossy().into_owned(),
        );
    }

    /// Where the provisioning CLI is (or would be) installed. Alias for
    /// [`Self::pulumi_home`].
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.pulumi_home()
    }

    /// Path of the pulumi executable: the explicitly set path, or the first
    /// `PATH` hit, cached after discovery.
    ///
    /// # Errors
    ///
    /// Fails with [`ToolError::NotFound`] when no executable can be found
    /// and none was set.
    pub fn cli_path(&self) -> Result<PathBuf> {
        let mut state = self.state();
        if let Some(path) = &state.cli_path {
            return Ok(path.clone());
        }
        let found = find_executable(
            state.environ.get("PATH").map(String::as_str),
            PULUMI_PROGRAM,
        )
        .ok_or(ToolError::NotFound)?;
        state.cli_path = Some(found.clone());
        Ok(found)
    }

    pub fn set_cli_path(&self, path: &str) {
        let mut state = self.state();
        state.cli_path = Some(state.abspath(path));
    }

    /// The backend access token from the snapshot, if any.
    #[must_use]
    pub fn access_token(&self, _backend_url: Option<&str>) -> Option<String> {
        // TODO: per-backend tokens (PULUMI_ACCESS_TOKEN is global today).
        self.state()
            .environ
            .get("PULUMI_ACCESS_TOKEN")
            .filter(|v| !v.is_empty())
            .cloned()
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// See [`SessionRegistry::session`].
    ///
    /// # Errors
    ///
    /// Fails on loader failure or an account/region mismatch.
    pub async fn session(
        &self,
        account: Option<&str>,
        region: Option<&str>,
    ) -> Result<Arc<AwsSession>> {
        self.sessions.session(account, region).await
    }

    /// See [`SessionRegistry::identity`].
    ///
    /// # Errors
    ///
    /// Fails when the identity source fails.
    pub async fn identity(&self, session: &AwsSession) -> Result<AwsIdentity> {
        self.sessions.identity(session).await
    }

    /// # Errors
    ///
    /// Same failure modes as [`Self::identity`].
    pub async fn account_id(&self, session: &AwsSession) -> Result<String> {
        self.sessions.account_id(session).await
    }

    // ── Passphrases ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn passphrases(&self) -> &PassphraseResolver {
        &self.passphrases
    }

    /// Resolve a passphrase, filling unpinned backend/organization fields
    /// from the configured defaults first.
    ///
    /// # Errors
    ///
    /// See [`PassphraseResolver::passphrase`].
    pub async fn passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Result<String> {
        let scope = self.scoped(scope);
        self.passphrases.passphrase(&scope, passphrase_id).await
    }

    pub fn set_passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase: &str,
        passphrase_id: Option<&str>,
    ) {
        let scope = self.scoped(scope);
        self.passphrases
            .set_passphrase(&scope, passphrase, passphrase_id);
    }

    pub fn set_passphrase_by_id(&self, passphrase_id: &str, passphrase: &str) {
        self.passphrases.set_passphrase_by_id(passphrase_id, passphrase);
    }

    fn scoped(&self, scope: &PassphraseScope) -> PassphraseScope {
        let mut scope = scope.clone();
        if scope.backend_url.is_none() {
            scope.backend_url.clone_from(&self.default_scope.backend_url);
        }
        if scope.organization.is_none() {
            scope
                .organization
                .clone_from(&self.default_scope.organization);
        }
        scope
    }

    // ── Stack outputs ────────────────────────────────────────────────────────

    /// A deferred fetch of an external stack's outputs.
    ///
    /// # Errors
    ///
    /// Fails when no project source is configured and the pulumi CLI cannot
    /// be discovered. The fetch itself is deferred; its failures surface
    /// through the returned promises.
    pub fn stack_outputs(
        &self,
        project_name: Option<&str>,
        stack_name: Option<&str>,
        decrypt_secrets: bool,
    ) -> Result<StackOutputs> {
        Ok(StackOutputs::from_values(
            self.project_source()?,
            project_name.map(str::to_string),
            stack_name.map(str::to_string),
            decrypt_secrets,
        ))
    }

    /// Like [`Self::stack_outputs`], with individually deferred inputs.
    ///
    /// # Errors
    ///
    /// Same as [`Self::stack_outputs`].
    pub fn stack_outputs_deferred(
        &self,
        project_name: Promise<Option<String>>,
        stack_name: Promise<Option<String>>,
        decrypt_secrets: Promise<bool>,
    ) -> Result<StackOutputs> {
        Ok(StackOutputs::new(
            self.project_source()?,
            project_name,
            stack_name,
            decrypt_secrets,
        ))
    }

    /// Fetch a stack-output snapshot directly, bypassing the promise layer.
    ///
    /// # Errors
    ///
    /// Fails when the project source is unavailable or the fetch fails.
    pub async fn sync_stack_outputs(
        &self,
        project_name: Option<&str>,
        stack_name: Option<&str>,
        decrypt_secrets: bool,
    ) -> Result<SyncStackOutputs> {
        let source = self.project_source()?;
        fetch_stack_outputs(source.as_ref(), project_name, stack_name, decrypt_secrets).await
    }

    /// The configured project source, or a CLI-backed one built from the
    /// current state.
    fn project_source(&self) -> Result<Arc<dyn ProjectSource>> {
        if let Some(source) = &self.projects {
            return Ok(Arc::clone(source));
        }
        let cli = self.cli_path()?;
        let state = self.state();
        Ok(Arc::new(CliStackBackend::new(
            cli,
            state.project_root.clone(),
            state.environ.clone(),
            Arc::new(TokioCommandRunner::default()),
        )))
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Wires a [`DeployContext`] from configuration and optional loader
/// overrides. Every override has a production default.
#[derive(Default)]
pub struct ContextBuilder {
    config: ContextConfig,
    environ: Option<HashMap<String, String>>,
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
    session_loader: Option<Arc<dyn SessionLoader>>,
    identity_source: Option<Arc<dyn IdentitySource>>,
    passphrase_loader: Option<Arc<dyn PassphraseLoader>>,
    project_source: Option<Arc<dyn ProjectSource>>,
}

impl ContextBuilder {
    #[must_use]
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the environment snapshot (tests; embedding hosts).
    #[must_use]
    pub fn environ(mut self, environ: HashMap<String, String>) -> Self {
        self.environ = Some(environ);
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// Override the home directory used for `~` expansion.
    #[must_use]
    pub fn home(mut self, home: PathBuf) -> Self {
        self.home = Some(home);
        self
    }

    #[must_use]
    pub fn session_loader(mut self, loader: Arc<dyn SessionLoader>) -> Self {
        self.session_loader = Some(loader);
        self
    }

    #[must_use]
    pub fn identity_source(mut self, source: Arc<dyn IdentitySource>) -> Self {
        self.identity_source = Some(source);
        self
    }

    #[must_use]
    pub fn passphrase_loader(mut self, loader: Arc<dyn PassphraseLoader>) -> Self {
        self.passphrase_loader = Some(loader);
        self
    }

    #[must_use]
    pub fn project_source(mut self, source: Arc<dyn ProjectSource>) -> Self {
        self.project_source = Some(source);
        self
    }

    /// # Errors
    ///
    /// Fails when no working directory was given and the process cwd cannot
    /// be determined.
    pub fn build(self) -> Result<DeployContext> {
        let mut environ = match self.environ {
            Some(environ) => environ,
            None => std::env::vars().collect(),
        };
        let cwd = match self.cwd {
            Some(cwd) => cwd,
            None => std::env::current_dir().context("cannot determine working directory")?,
        };
        let home = self.home.or_else(dirs::home_dir);

        let mut state = ContextState {
            environ: HashMap::new(),
            cwd,
            home,
            cli_path: None,
            project_root: PathBuf::new(),
        };
        if let Some(pulumi_home) = &self.config.pulumi_home {
            environ.insert("PULUMI_HOME".to_string(), pulumi_home.clone());
        }
        state.environ = environ;
        state.project_root = match &self.config.project_root {
            Some(root) => state.abspath(root),
            None => state.cwd.clone(),
        };

        let session_loader = self.session_loader.unwrap_or_else(|| {
            Arc::new(EnvSessionLoader::new(
                state.environ.clone(),
                self.config.default_region.clone(),
            ))
        });
        let identity_source = self.identity_source.unwrap_or_else(|| {
            Arc::new(CliIdentitySource::new(
                Arc::new(TokioCommandRunner::default()),
                state.environ.clone(),
            ))
        });
        let passphrase_loader = self
            .passphrase_loader
            .unwrap_or_else(|| Arc::new(EnvPassphraseLoader::new(state.environ.clone())));

        Ok(DeployContext {
            state: Mutex::new(state),
            sessions: SessionRegistry::new(session_loader, identity_source),
            passphrases: PassphraseResolver::new(passphrase_loader),
            projects: self.project_source,
            default_scope: PassphraseScope {
                backend_url: self.config.backend_url.clone(),
                organization: self.config.organization.clone(),
                ..PassphraseScope::default()
            },
        })
    }
}
