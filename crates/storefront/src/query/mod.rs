//! Cached, retried backend queries.
//!
//! Pages read backend data through [`QueryClient::fetch`], which serves
//! cached values and otherwise runs the loader under a [`RetryPolicy`].
//! Mutations call [`QueryClient::invalidate`] with the roots of every key
//! they make stale.

mod key;
mod retry;

pub use key::QueryKey;
pub use retry::{RetryDelay, RetryOn, RetryPolicy};

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cardshop_core::Principal;
use moka::future::Cache;
use thiserror::Error;
use tracing::debug;

use crate::backend::{BackendError, BackendResult};

/// Errors returned by [`QueryClient::fetch`].
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query is disabled (backend not ready or no identity).
    #[error("Query is disabled")]
    Disabled,

    /// The loader failed after retries.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Per-query behaviour.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Run the loader at all.
    pub enabled: bool,
    /// Store the result for later reads.
    pub cache: bool,
    pub retry: RetryPolicy,
}

impl QueryOptions {
    /// Cached query with the default retry policy, enabled when `enabled`.
    #[must_use]
    pub fn enabled_if(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Always hit the backend.
    #[must_use]
    pub const fn uncached(mut self) -> Self {
        self.cache = false;
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            cache: true,
            retry: RetryPolicy::default(),
        }
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;

/// Query cache shared by every request.
#[derive(Clone)]
pub struct QueryClient {
    cache: Cache<QueryKey, CachedValue>,
    /// Bumped by every invalidation. A load that spans a bump is not stored.
    generation: Arc<AtomicU64>,
}

impl QueryClient {
    /// Create a client whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cached value for `key`, or the loader's result.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Disabled`] when the query is disabled, or the
    /// loader's last error once retries are exhausted.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        loader: F,
    ) -> Result<T, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        if !options.enabled {
            return Err(QueryError::Disabled);
        }

        if options.cache
            && let Some(cached) = self.cache.get(key).await
            && let Some(value) = cached.downcast_ref::<T>()
        {
            debug!(key = %key, "Query cache hit");
            return Ok(value.clone());
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = options.retry.run(loader).await?;
        if options.cache && self.generation.load(Ordering::Acquire) == generation {
            self.cache
                .insert(key.clone(), Arc::new(value.clone()))
                .await;
            // An invalidation may have scanned the cache just before the insert.
            if self.generation.load(Ordering::Acquire) != generation {
                self.cache.invalidate(key).await;
            }
        }
        Ok(value)
    }

    /// Drop every entry whose key starts with one of `roots`.
    pub async fn invalidate(&self, roots: &[&str]) {
        let prefixes: Vec<QueryKey> = roots.iter().map(|root| QueryKey::new(*root)).collect();
        self.invalidate_where(|key| prefixes.iter().any(|p| key.starts_with(p)))
            .await;
    }

    /// Drop every entry scoped to `principal`.
    pub async fn invalidate_principal(&self, principal: &Principal) {
        let text = principal.to_text();
        self.invalidate_where(|key| key.mentions(&text)).await;
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }

    /// Whether `key` currently has a cached value.
    #[must_use]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.cache.contains_key(key)
    }

    async fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let stale: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(key, _)| predicate(key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in &stale {
            debug!(key = %key, "Invalidating query");
            self.cache.invalidate(key).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use cardshop_core::OrderId;
    use tokio::sync::Notify;

    use super::*;

    fn client() -> QueryClient {
        QueryClient::new(Duration::from_secs(60))
    }

    fn caller() -> Principal {
        Principal::self_authenticating(&[7; 32])
    }

    #[tokio::test]
    async fn test_fetch_caches_value() {
        let client = client();
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let key = QueryKey::my_orders(&caller());

        for _ in 0..3 {
            let value: u32 = client
                .fetch(&key, QueryOptions::default(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(5)
                })
                .await
                .unwrap();
            assert_eq!(value, 5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncached_always_loads() {
        let client = client();
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let key = QueryKey::is_admin(&caller());

        for _ in 0..2 {
            let _: bool = client
                .fetch(&key, QueryOptions::default().uncached(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!client.contains(&key));
    }

    #[tokio::test]
    async fn test_disabled_query_skips_loader() {
        let client = client();
        let result: Result<u32, _> = client
            .fetch(
                &QueryKey::my_orders(&caller()),
                QueryOptions::enabled_if(false),
                || async { Ok(1) },
            )
            .await;
        assert!(matches!(result, Err(QueryError::Disabled)));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let client = client();
        let key = QueryKey::orders(&caller());
        let options = QueryOptions::default().with_retry(RetryPolicy::none());

        let first: Result<u32, _> = client
            .fetch(&key, options, || async {
                Err(BackendError::Rejected("boom".to_string()))
            })
            .await;
        assert!(matches!(first, Err(QueryError::Backend(_))));
        assert!(!client.contains(&key));
    }

    #[tokio::test]
    async fn test_invalidate_by_root() {
        let client = client();
        let me = caller();
        let keys = [
            QueryKey::orders(&me),
            QueryKey::my_orders(&me),
            QueryKey::order(OrderId::new(1), &me),
            QueryKey::current_user_profile(&me),
        ];
        for key in &keys {
            let _: u32 = client
                .fetch(key, QueryOptions::default(), || async { Ok(1) })
                .await
                .unwrap();
        }

        client
            .invalidate(&[QueryKey::ORDERS, QueryKey::MY_ORDERS])
            .await;

        assert!(!client.contains(&keys[0]));
        assert!(!client.contains(&keys[1]));
        assert!(client.contains(&keys[2]));
        assert!(client.contains(&keys[3]));
    }

    #[tokio::test]
    async fn test_invalidate_principal() {
        let client = client();
        let me = caller();
        let other = Principal::self_authenticating(&[8; 32]);
        for key in [QueryKey::my_orders(&me), QueryKey::my_orders(&other)] {
            let _: u32 = client
                .fetch(&key, QueryOptions::default(), || async { Ok(1) })
                .await
                .unwrap();
        }

        client.invalidate_principal(&me).await;

        assert!(!client.contains(&QueryKey::my_orders(&me)));
        assert!(client.contains(&QueryKey::my_orders(&other)));
    }

    #[tokio::test]
    async fn test_invalidate_during_load_wins() {
        let client = client();
        let key = QueryKey::my_orders(&caller());
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let in_flight = tokio::spawn({
            let client = client.clone();
            let key = key.clone();
            let started = started.clone();
            let release = release.clone();
            async move {
                client
                    .fetch(&key, QueryOptions::default(), || {
                        let started = started.clone();
                        let release = release.clone();
                        async move {
                            started.notify_one();
                            release.notified().await;
                            Ok(1_u32)
                        }
                    })
                    .await
            }
        });

        started.notified().await;
        client.invalidate(&[QueryKey::MY_ORDERS]).await;
        release.notify_one();

        assert_eq!(in_flight.await.unwrap().unwrap(), 1);
        assert!(!client.contains(&key));

        let fresh: u32 = client
            .fetch(&key, QueryOptions::default(), || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(fresh, 2);
        assert!(client.contains(&key));
    }
}
