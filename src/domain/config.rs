//! Domain types for stratus configuration.
//!
//! Pure data only — loading and saving live in `crate::infra::config`.

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `~/.stratus/config.yaml`.
///
/// Every field is optional; unset fields fall back to environment variables
/// or built-in defaults when the context is constructed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    /// Default backend URL used to scope cached passphrases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Default organization used to scope cached passphrases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Region used when neither the caller nor the environment names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
    /// Overrides `PULUMI_HOME` for CLI installs managed by this context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulumi_home: Option<String>,
    /// Directory containing the per-project subdirectories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
}

// ── Unit tests ───────────────────────────────────────────────────────────────
