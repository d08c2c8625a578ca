//! The cache module holds the process-wide [TraceCache] and the [CachingTraceAccessor].

use anyhow::Result;
use async_trait::async_trait;
use ethers::types::Address;
use fault_challenger_solvers::fault::{Claim, StepData, TraceAccessor};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OnceCell};

/// The [TraceCache] memoizes trace values by game and position. It may be shared by every game
/// in the process.
#[derive(Debug, Default)]
pub struct TraceCache {
    entries: Mutex<HashMap<(Address, u128), Arc<OnceCell<Claim>>>>,
}

impl TraceCache {
    /// Creates a new, empty [TraceCache].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of positions with a cached value.
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Drops every entry cached for `game`. Computations already in flight complete for their
    /// callers but are not retained.
    pub async fn evict(&self, game: Address) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|(owner, _), _| *owner != game);
        tracing::debug!(target: "trace-cache", game = ?game, evicted = before - entries.len(), "Evicted cached trace values");
    }

    /// Returns the cell for the given game and position, creating it if needed.
    async fn cell(&self, game: Address, position: u128) -> Arc<OnceCell<Claim>> {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry((game, position)).or_default())
    }
}

/// A [TraceAccessor] that serves values for one game out of a shared [TraceCache]. Concurrent
/// requests for an uncached position wait on a single computation; failed computations are not
/// cached. Step data is always computed by the inner accessor.
pub struct CachingTraceAccessor {
    /// The game the cached values belong to.
    game: Address,
    /// The accessor that computes uncached values.
    inner: Arc<dyn TraceAccessor>,
    /// The shared cache.
    cache: Arc<TraceCache>,
}

impl CachingTraceAccessor {
    /// Creates a new [CachingTraceAccessor].
    pub fn new(game: Address, inner: Arc<dyn TraceAccessor>, cache: Arc<TraceCache>) -> Self {
        Self { game, inner, cache }
    }
}

#[async_trait]
impl TraceAccessor for CachingTraceAccessor {
    async fn get(&self, position: u128) -> Result<Claim> {
        let cell = self.cache.cell(self.game, position).await;
        cell.get_or_try_init(|| self.inner.get(position))
            .await
            .copied()
    }

    async fn get_step_data(&self, position: u128) -> Result<StepData> {
        self.inner.get_step_data(position).await
    }
}

#[cfg(test)]
mod test {
    use super::{CachingTraceAccessor, TraceCache};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use ethers::types::{Address, H256};
    use fault_challenger_solvers::fault::{Claim, StepData, TraceAccessor};
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    /// Counts computations and fails the first `failures` of them.
    #[derive(Default)]
    struct CountingTrace {
        calls: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl TraceAccessor for CountingTrace {
        async fn get(&self, position: u128) -> Result<Claim> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if call < self.failures {
                return Err(anyhow!("trace unavailable"));
            }
            Ok(H256::from_low_u64_be(position as u64))
        }

        async fn get_step_data(&self, _: u128) -> Result<StepData> {
            Ok(StepData::default())
        }
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_computation() {
        let inner = Arc::new(CountingTrace::default());
        let cache = Arc::new(TraceCache::new());
        let accessor = CachingTraceAccessor::new(Address::zero(), inner.clone(), cache.clone());

        let (a, b, c) = tokio::join!(accessor.get(5), accessor.get(5), accessor.get(5));
        assert_eq!(a.unwrap(), H256::from_low_u64_be(5));
        assert_eq!(b.unwrap(), H256::from_low_u64_be(5));
        assert_eq!(c.unwrap(), H256::from_low_u64_be(5));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn entries_are_keyed_by_game() {
        let inner = Arc::new(CountingTrace::default());
        let cache = Arc::new(TraceCache::new());
        let first = CachingTraceAccessor::new(Address::repeat_byte(1), inner.clone(), cache.clone());
        let second = CachingTraceAccessor::new(Address::repeat_byte(2), inner.clone(), cache.clone());

        first.get(2).await.unwrap();
        first.get(2).await.unwrap();
        second.get(2).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn eviction_drops_only_that_game() {
        let inner = Arc::new(CountingTrace::default());
        let cache = Arc::new(TraceCache::new());
        let first = CachingTraceAccessor::new(Address::repeat_byte(1), inner.clone(), cache.clone());
        let second = CachingTraceAccessor::new(Address::repeat_byte(2), inner.clone(), cache.clone());

        first.get(2).await.unwrap();
        first.get(3).await.unwrap();
        second.get(2).await.unwrap();
        assert_eq!(cache.len().await, 3);

        cache.evict(Address::repeat_byte(1)).await;
        assert_eq!(cache.len().await, 1);
        second.get(2).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);

        // An evicted game is recomputed on demand.
        first.get(2).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = Arc::new(CountingTrace {
            calls: AtomicUsize::new(0),
            failures: 1,
        });
        let cache = Arc::new(TraceCache::new());
        let accessor = CachingTraceAccessor::new(Address::zero(), inner.clone(), cache.clone());

        assert!(accessor.get(3).await.is_err());
        assert_eq!(cache.len().await, 0);
        assert_eq!(accessor.get(3).await.unwrap(), H256::from_low_u64_be(3));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
