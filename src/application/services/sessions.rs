//! Session registry — AWS session acquisition, validation, and caching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tracing::{debug, info};

use crate::application::ports::{IdentitySource, SessionLoader};
use crate::domain::error::SessionError;
use crate::domain::identity::AwsIdentity;
use crate::domain::session::{AwsSession, SessionKey};

/// Maps requested (account, region) pairs to validated AWS sessions.
///
/// Lookup keys alias: after a session is validated, it is also registered
/// under the keys formed from its *actual* account and region, so a later
/// caller asking by either requested or actual identity gets a single-hit
/// answer. Two distinct sessions are never cached for the same resolved
/// (account, region) pair.
pub struct SessionRegistry {
    loader: Arc<dyn SessionLoader>,
    identity_source: Arc<dyn IdentitySource>,
    cache: Mutex<HashMap<SessionKey, Arc<AwsSession>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(loader: Arc<dyn SessionLoader>, identity_source: Arc<dyn IdentitySource>) -> Self {
        Self {
            loader,
            identity_source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get a session for the requested account and/or region, loading and
    /// validating one on a cache miss.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::RegionMismatch`] /
    /// [`SessionError::AccountMismatch`] when a freshly loaded session does
    /// not satisfy an explicitly requested constraint, and with whatever the
    /// loader or identity source fail with. Nothing is cached on failure, so
    /// the next call retries from scratch.
    pub async fn session(
        &self,
        account: Option<&str>,
        region: Option<&str>,
    ) -> Result<Arc<AwsSession>> {
        let requested = SessionKey::new(account, region);
        if let Some(session) = self.lock().get(&requested) {
            debug!(?requested, "session cache hit");
            return Ok(Arc::clone(session));
        }

        let candidate = Arc::new(self.loader.load_session(account, region).await?);
        let actual_region = candidate.region().to_string();
        if let Some(requested_region) = region
            && requested_region != actual_region
        {
            return Err(SessionError::RegionMismatch {
                requested: requested_region.to_string(),
                actual: actual_region,
            }
            .into());
        }

        // One identity round-trip; memoized on the candidate session.
        let actual_account = self.identity(&candidate).await?.account_id;
        if let Some(requested_account) = account
            && requested_account != actual_account
        {
            return Err(SessionError::AccountMismatch {
                requested: requested_account.to_string(),
                actual: actual_account,
            }
            .into());
        }

        info!(region = %actual_region, account = %actual_account, "loaded AWS session");

        let resolved = SessionKey::new(Some(actual_account.as_str()), Some(actual_region.as_str()));
        let mut cache = self.lock();
        // A racing caller may have populated either key while we were
        // loading; the already-cached session wins and ours is dropped.
        if let Some(existing) = cache.get(&requested) {
            return Ok(Arc::clone(existing));
        }
        let session = cache.get(&resolved).map_or(candidate, Arc::clone);

        let derived = [
            requested,
            SessionKey::new(account, Some(actual_region.as_str())),
            SessionKey::new(Some(actual_account.as_str()), region),
            resolved,
        ];
        for key in derived {
            cache.entry(key).or_insert_with(|| Arc::clone(&session));
        }
        Ok(session)
    }

    /// The caller identity of a session; fetched over the network once and
    /// memoized on the session itself, so repeated calls are free.
    ///
    /// # Errors
    ///
    /// Propagates the identity source's failure; nothing is memoized then.
    pub async fn identity(&self, session: &AwsSession) -> Result<AwsIdentity> {
        if let Some(identity) = session.cached_identity() {
            return Ok(identity.clone());
        }
        let fetched = self.identity_source.caller_identity(session).await?;
        Ok(session.memoize_identity(fetched).clone())
    }

    /// The account id a session resolves to.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::identity`].
    pub async fn account_id(&self, session: &AwsSession) -> Result<String> {
        Ok(self.identity(session).await?.account_id)
    }

    /// Number of cache entries, aliases included.
    #[must_use]
    pub fn cached_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionKey, Arc<AwsSession>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
