//! Deferred values resolved by an external scheduler.
//!
//! A [`Promise`] wraps a memoized computation: the underlying future runs at
//! most once, and every derived promise is an attached continuation over the
//! shared result rather than a re-invocation. Failures are `Clone`-able
//! [`OutputError`]s so one failed resolution is observed identically by all
//! continuations.

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;

use crate::domain::error::OutputError;

/// A value not yet computed, resolved at most once.
pub struct Promise<T: Clone> {
    inner: Shared<BoxFuture<'static, Result<T, OutputError>>>,
}

impl<T: Clone> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a computation. It is not polled until the first `get` (or a
    /// derived promise) awaits it, and it runs at most once no matter how
    /// many clones and continuations exist.
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, OutputError>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// A promise that is already resolved.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self::new(std::future::ready(Ok(value)))
    }

    /// A promise that is already failed.
    #[must_use]
    pub fn failed(error: OutputError) -> Self {
        Self::new(std::future::ready(Err(error)))
    }

    /// Await the resolved value.
    ///
    /// # Errors
    ///
    /// Returns the error the underlying computation failed with; repeated
    /// calls observe the same memoized outcome.
    pub async fn get(&self) -> Result<T, OutputError> {
        self.inner.clone().await
    }

    /// Derive a promise by transforming the resolved value.
    pub fn map<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let inner = self.inner.clone();
        Promise::new(async move { inner.await.map(f) })
    }

    /// Derive a promise by a fallible transformation.
    pub fn try_map<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U, OutputError> + Send + 'static,
    {
        let inner = self.inner.clone();
        Promise::new(async move { f(inner.await?) })
    }

    /// Collapse a list of promises into a promise of the list.
    #[must_use]
    pub fn join(promises: Vec<Promise<T>>) -> Promise<Vec<T>> {
        Promise::new(async move {
            let mut values = Vec::with_capacity(promises.len());
            for promise in promises {
                values.push(promise.get().await?);
            }
            Ok(values)
        })
    }
}

impl Promise<Value> {
    /// Render a deferred JSON value to a deferred compact JSON string.
    #[must_use]
    pub fn to_json(&self) -> Promise<String> {
        self.try_map(|value| {
            serde_json::to_string(&value).map_err(|e| OutputError::Render {
                reason: e.to_string(),
            })
        })
    }

    /// Render a deferred JSON value to a deferred YAML document.
    #[must_use]
    pub fn to_yaml(&self) -> Promise<String> {
        self.try_map(|value| {
            serde_yaml::to_string(&value).map_err(|e| OutputError::Render {
                reason: e.to_string(),
            })
        })
    }
}

impl<T> From<T> for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Self::resolved(value)
    }
}
