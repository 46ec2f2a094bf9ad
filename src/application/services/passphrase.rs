//! Layered secrets-passphrase resolution with write-back caching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::debug;

use crate::application::ports::PassphraseLoader;
use crate::domain::scope::PassphraseScope;

/// Both passphrase mappings, populated together on every resolution.
#[derive(Default)]
struct PassphraseCache {
    by_scope: HashMap<PassphraseScope, String>,
    by_id: HashMap<String, String>,
}

/// Resolves secrets passphrases through a cache, a cascading list of
/// broader default scopes, and finally a pluggable loader.
///
/// Cache entries are write-once: the first value stored under a key wins,
/// whether it arrived through seeding or resolution.
pub struct PassphraseResolver {
    loader: Arc<dyn PassphraseLoader>,
    cache: Mutex<PassphraseCache>,
}

impl PassphraseResolver {
    #[must_use]
    pub fn new(loader: Arc<dyn PassphraseLoader>) -> Self {
        Self {
            loader,
            cache: Mutex::new(PassphraseCache::default()),
        }
    }

    /// Resolve the passphrase for a scope.
    ///
    /// Resolution order, first hit wins: the exact scope, the passphrase id
    /// (when given), each broader default scope in
    /// [`PassphraseScope::fallbacks`] order, then the loader. Whatever path
    /// produced the value, it is written back under the original exact
    /// scope and the id, so future exact lookups short-circuit.
    ///
    /// # Errors
    ///
    /// Fails with the loader's error (typically
    /// [`PassphraseError::NotFound`](crate::domain::error::PassphraseError))
    /// when every cache level misses and the loader cannot produce a value.
    /// A failed resolution caches nothing.
    pub async fn passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Result<String> {
        let resolved = match self.lookup_cached(scope, passphrase_id) {
            Some(cached) => cached,
            None => self.loader.load_passphrase(scope, passphrase_id).await?,
        };

        let mut cache = self.lock();
        cache
            .by_scope
            .entry(scope.clone())
            .or_insert_with(|| resolved.clone());
        if let Some(id) = passphrase_id {
            cache
                .by_id
                .entry(id.to_string())
                .or_insert_with(|| resolved.clone());
        }
        Ok(resolved)
    }

    /// Seed the cache for a scope (and optionally an id) ahead of any
    /// resolution, e.g. from a config file or an interactive prompt.
    /// Existing entries are kept.
    pub fn set_passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase: &str,
        passphrase_id: Option<&str>,
    ) {
        let mut cache = self.lock();
        cache
            .by_scope
            .entry(scope.clone())
            .or_insert_with(|| passphrase.to_string());
        if let Some(id) = passphrase_id {
            cache
                .by_id
                .entry(id.to_string())
                .or_insert_with(|| passphrase.to_string());
        }
    }

    /// Seed the id mapping alone. Existing entries are kept.
    pub fn set_passphrase_by_id(&self, passphrase_id: &str, passphrase: &str) {
        self.lock()
            .by_id
            .entry(passphrase_id.to_string())
            .or_insert_with(|| passphrase.to_string());
    }

    fn lookup_cached(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Option<String> {
        let cache = self.lock();
        if let Some(found) = cache.by_scope.get(scope) {
            debug!(%scope, "passphrase cache hit (exact scope)");
            return Some(found.clone());
        }
        if let Some(id) = passphrase_id
            && let Some(found) = cache.by_id.get(id)
        {
            debug!(id, "passphrase cache hit (id)");
            return Some(found.clone());
        }
        for fallback in scope.fallbacks() {
            if let Some(found) = cache.by_scope.get(&fallback) {
                debug!(%scope, default = %fallback, "passphrase cache hit (default scope)");
                return Some(found.clone());
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, PassphraseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
