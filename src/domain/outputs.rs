//! Immutable snapshot of a deployed stack's outputs.

use serde_json::Value;

use crate::domain::error::OutputError;

/// Ordered mapping from output name to JSON value, as fetched from a stack.
pub type OutputMap = serde_json::Map<String, Value>;

/// One fetch of an external stack's outputs, with dictionary-like accessors.
///
/// The snapshot is taken exactly once and never refreshed; construct a new
/// one to observe later deployments. This is the synchronous core the
/// deferred [`StackOutputs`](crate::application::services::outputs::StackOutputs)
/// adapter wraps — direct and test callers can use it without any promise
/// machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStackOutputs {
    project_name: String,
    stack_name: String,
    outputs: OutputMap,
}

impl SyncStackOutputs {
    #[must_use]
    pub fn new(project_name: String, stack_name: String, outputs: OutputMap) -> Self {
        Self {
            project_name,
            stack_name,
            outputs,
        }
    }

    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// The full output mapping.
    #[must_use]
    pub fn outputs(&self) -> &OutputMap {
        &self.outputs
    }

    /// Look up one output, `None` when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Look up one output, falling back to `default` when absent.
    #[must_use]
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.outputs.get(name).cloned().unwrap_or(default)
    }

    /// Look up one output that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::MissingOutput`] when the stack has no output
    /// with this name.
    pub fn require(&self, name: &str) -> Result<&Value, OutputError> {
        self.outputs.get(name).ok_or_else(|| OutputError::MissingOutput {
            stack: self.stack_name.clone(),
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.outputs.values()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a SyncStackOutputs {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}
