//! Passphrase scope — the cache key for layered secret resolution.
//!
//! A scope names a specificity level, from "this exact stack" down to a
//! global default. Resolution walks an explicit broadening sequence rather
//! than hashing partial tuples, so the fallback order is a testable list of
//! steps.

use std::fmt;

/// Specificity level for a cached secrets passphrase.
///
/// Every field is optional; `None` means "not pinned at this level". The
/// fully-`None` scope is the global default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PassphraseScope {
    /// Backend URL the passphrase belongs to (e.g. an S3 or https backend).
    pub backend_url: Option<String>,
    /// Organization within the backend.
    pub organization: Option<String>,
    /// Project within the organization.
    pub project: Option<String>,
    /// Stack within the project.
    pub stack: Option<String>,
}

impl PassphraseScope {
    /// The global default scope — all fields `None`.
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: Some(backend_url.into()),
            ..Self::default()
        }
    }

    /// True when no field is pinned.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.backend_url.is_none()
            && self.organization.is_none()
            && self.project.is_none()
            && self.stack.is_none()
    }

    /// The broadening sequence consulted after an exact-scope miss.
    ///
    /// Each step clears the next-most-specific field, and a step is emitted
    /// only when the field it clears was actually set — asking for a
    /// project-level default makes no sense if the query never named a
    /// stack. The sequence for a fully-pinned scope is:
    ///
    /// 1. stack cleared (project-level default)
    /// 2. project cleared (organization-level default)
    /// 3. organization cleared (backend-level default)
    /// 4. backend cleared (global default)
    #[must_use]
    pub fn fallbacks(&self) -> Vec<PassphraseScope> {
        let mut chain = Vec::with_capacity(4);
        let mut cur = self.clone();
        if cur.stack.take().is_some() {
            chain.push(cur.clone());
        }
        if cur.project.take().is_some() {
            chain.push(cur.clone());
        }
        if cur.organization.take().is_some() {
            chain.push(cur.clone());
        }
        if cur.backend_url.take().is_some() {
            chain.push(cur.clone());
        }
        chain
    }
}

impl fmt::Display for PassphraseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(v: Option<&String>) -> &str {
            v.map_or("<any>", String::as_str)
        }
        write!(
            f,
            "backend={}, organization={}, project={}, stack={}",
            field(self.backend_url.as_ref()),
            field(self.organization.as_ref()),
            field(self.project.as_ref()),
            field(self.stack.as_ref()),
        )
    }
}
