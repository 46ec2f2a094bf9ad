//! AWS session handle and the cache key it is stored under.

use std::sync::OnceLock;

use crate::domain::identity::AwsIdentity;

/// Lookup key for the session cache.
///
/// `None` means "caller did not care" — several keys may alias one session
/// once its actual account and region are known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl SessionKey {
    #[must_use]
    pub fn new(account: Option<&str>, region: Option<&str>) -> Self {
        Self {
            account: account.map(str::to_string),
            region: region.map(str::to_string),
        }
    }
}

/// Opaque handle to an AWS credential set, bound to one region at creation.
///
/// The caller identity is not known until the first "who am I" round-trip;
/// once fetched it is memoized on the session itself and never re-fetched.
/// Sessions are immutable after validation and shared behind `Arc`.
#[derive(Debug)]
pub struct AwsSession {
    region: String,
    profile: Option<String>,
    identity: OnceLock<AwsIdentity>,
}

impl AwsSession {
    #[must_use]
    pub fn new(region: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            region: region.into(),
            profile,
            identity: OnceLock::new(),
        }
    }

    /// The region this session is bound to. Always known.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The named credential profile backing this session, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// The memoized caller identity, if it has been fetched.
    #[must_use]
    pub fn cached_identity(&self) -> Option<&AwsIdentity> {
        self.identity.get()
    }

    /// Memoize a freshly fetched identity. The first write wins; the stored
    /// value is returned either way.
    pub fn memoize_identity(&self, identity: AwsIdentity) -> &AwsIdentity {
        self.identity.get_or_init(|| identity)
    }
}
