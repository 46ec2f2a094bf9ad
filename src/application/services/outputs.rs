//! Promise-based fetching of external stack outputs.
//!
//! Two layers: [`fetch_stack_outputs`] resolves scalar arguments into a
//! [`SyncStackOutputs`] snapshot with exactly one fetch, and
//! [`StackOutputs`] wraps that step in a memoized promise so every derived
//! projection shares the same single resolution.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::application::ports::ProjectSource;
use crate::application::promise::Promise;
use crate::domain::error::OutputError;
use crate::domain::outputs::{OutputMap, SyncStackOutputs};

/// Resolve (project?, stack?, decrypt) into a snapshot of the stack's
/// outputs. Exactly one fetch is performed.
///
/// An unset project selects the source's current project; an unset stack
/// name falls back to the source's current stack.
///
/// # Errors
///
/// Fails when the project cannot be resolved, no stack name can be
/// determined, or the fetch itself fails. Nothing is cached on failure.
pub async fn fetch_stack_outputs(
    source: &dyn ProjectSource,
    project_name: Option<&str>,
    stack_name: Option<&str>,
    decrypt_secrets: bool,
) -> Result<SyncStackOutputs> {
    let project = source.project(project_name)?;
    let stack_name = match stack_name {
        Some(name) => name.to_string(),
        None => source.current_stack_name()?,
    };
    let outputs = project.stack_outputs(&stack_name, decrypt_secrets).await?;
    info!(
        project = project.name(),
        stack = %stack_name,
        outputs = outputs.len(),
        "fetched stack outputs"
    );
    Ok(SyncStackOutputs::new(
        project.name().to_string(),
        stack_name,
        outputs,
    ))
}

/// A promise to fetch the outputs of an external deployed stack.
///
/// The three inputs are individually deferred; once all resolve, the
/// underlying fetch runs exactly once regardless of how many projections
/// are requested. Projections are derived promises over the shared
/// snapshot.
#[derive(Clone)]
pub struct StackOutputs {
    resolved: Promise<Arc<SyncStackOutputs>>,
}

impl StackOutputs {
    /// Build from deferred inputs.
    pub fn new(
        source: Arc<dyn ProjectSource>,
        project_name: Promise<Option<String>>,
        stack_name: Promise<Option<String>>,
        decrypt_secrets: Promise<bool>,
    ) -> Self {
        let resolved = Promise::new(async move {
            let project_name = project_name.get().await?;
            let stack_name = stack_name.get().await?;
            let decrypt_secrets = decrypt_secrets.get().await?;
            fetch_stack_outputs(
                source.as_ref(),
                project_name.as_deref(),
                stack_name.as_deref(),
                decrypt_secrets,
            )
            .await
            .map(Arc::new)
            .map_err(|e| OutputError::Fetch {
                stack: stack_name.unwrap_or_else(|| "(current)".to_string()),
                reason: format!("{e:#}"),
            })
        });
        Self { resolved }
    }

    /// Build from already-resolved inputs.
    #[must_use]
    pub fn from_values(
        source: Arc<dyn ProjectSource>,
        project_name: Option<String>,
        stack_name: Option<String>,
        decrypt_secrets: bool,
    ) -> Self {
        Self::new(
            source,
            Promise::resolved(project_name),
            Promise::resolved(stack_name),
            Promise::resolved(decrypt_secrets),
        )
    }

    /// The resolved snapshot itself.
    #[must_use]
    pub fn resolved(&self) -> Promise<Arc<SyncStackOutputs>> {
        self.resolved.clone()
    }

    /// All outputs of the stack.
    #[must_use]
    pub fn outputs(&self) -> Promise<OutputMap> {
        self.resolved.map(|s| s.outputs().clone())
    }

    /// One output, `None` when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Promise<Option<Value>> {
        let name = name.to_string();
        self.resolved.map(move |s| s.get(&name).cloned())
    }

    /// One output, falling back to `default` when absent.
    #[must_use]
    pub fn get_or(&self, name: &str, default: Value) -> Promise<Value> {
        let name = name.to_string();
        self.resolved.map(move |s| s.get_or(&name, default))
    }

    /// One output that must exist; the projection fails with
    /// [`OutputError::MissingOutput`] otherwise.
    #[must_use]
    pub fn require(&self, name: &str) -> Promise<Value> {
        let name = name.to_string();
        self.resolved
            .try_map(move |s| s.require(&name).cloned())
    }

    #[must_use]
    pub fn len(&self) -> Promise<usize> {
        self.resolved.map(|s| s.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> Promise<bool> {
        self.resolved.map(|s| s.is_empty())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> Promise<bool> {
        let name = name.to_string();
        self.resolved.map(move |s| s.contains(&name))
    }

    #[must_use]
    pub fn keys(&self) -> Promise<Vec<String>> {
        self.resolved
            .map(|s| s.keys().map(str::to_string).collect())
    }

    #[must_use]
    pub fn values(&self) -> Promise<Vec<Value>> {
        self.resolved.map(|s| s.values().cloned().collect())
    }

    #[must_use]
    pub fn items(&self) -> Promise<Vec<(String, Value)>> {
        self.resolved
            .map(|s| s.items().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }
}
