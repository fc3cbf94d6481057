//! Typed query controller bound to one consumer.
//!
//! Inspired by TanStack Query: a `QueryObserver<T>` pairs a key with a fetch
//! function and decides, on mount, whether cached data can be served as is.
//!
//! # Example
//!
//! ```ignore
//! let api = api.clone();
//! let mut summary = QueryObserver::new(
//!     query_key!["summary"],
//!     QueryOptions::polling(Duration::from_secs(10)),
//!     move || {
//!         let api = api.clone();
//!         async move { api.summary().await.map_err(|e| e.to_string()) }
//!     },
//! );
//!
//! summary.mount(&mut cache);
//!
//! // In event loop tick
//! cache.poll();
//!
//! // In render
//! let result = summary.result(&cache);
//! ```

use futures::FutureExt;
use std::any::Any;
use std::cell::Cell;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use tokio::time::Instant;

use super::cache::{Fetcher, QueryCache, QueryOptions, SubscriptionId};
use super::key::QueryKey;
use super::state::{Payload, QueryStatus};

/// Snapshot of a query as seen by its consumer.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<String>,
}

impl<T> QueryResult<T> {
  /// First load in progress: fetching with nothing to show yet.
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading && self.data.is_none()
  }

  /// Any fetch in progress, including background refetches.
  pub fn is_fetching(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }
}

/// Query controller for one consumer of a keyed resource.
pub struct QueryObserver<T> {
  key: QueryKey,
  options: QueryOptions,
  fetcher: Fetcher,
  subscription: Option<SubscriptionId>,
  changed: Rc<Cell<bool>>,
  _data: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> QueryObserver<T> {
  /// Create an unmounted observer.
  ///
  /// The fetch function is called once per fetch; it should clone whatever
  /// it needs into the returned future.
  pub fn new<F, Fut>(key: QueryKey, options: QueryOptions, fetch: F) -> Self
  where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      key,
      options,
      fetcher: erase(fetch),
      subscription: None,
      changed: Rc::new(Cell::new(false)),
      _data: PhantomData,
    }
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn is_mounted(&self) -> bool {
    self.subscription.is_some()
  }

  /// Subscribe to the key, fetching unless fresh data is already cached.
  pub fn mount(&mut self, cache: &mut QueryCache) {
    if self.subscription.is_some() {
      return;
    }
    cache.register(&self.key, self.fetcher.clone(), self.options);

    let changed = self.changed.clone();
    self.subscription = Some(cache.subscribe(&self.key, move |_, _| changed.set(true)));
    self.changed.set(true);

    let needs_fetch = match cache.get(&self.key) {
      None => true,
      Some(entry) => {
        entry.status() != QueryStatus::Loading
          && (!entry.has_data() || entry.is_stale(self.options.stale_time, Instant::now()))
      }
    };
    if needs_fetch {
      cache.fetch(&self.key);
    }
  }

  /// Release the subscription. The entry stays cached.
  pub fn unmount(&mut self, cache: &mut QueryCache) {
    if let Some(id) = self.subscription.take() {
      cache.unsubscribe(id);
    }
  }

  /// Switch to another key and fetch function.
  ///
  /// Equal keys are a no-op. A mounted observer is remounted on the new key,
  /// so previously cached keys are served without a fetch.
  pub fn set_key<F, Fut>(&mut self, cache: &mut QueryCache, key: QueryKey, fetch: F)
  where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if key == self.key {
      return;
    }
    let was_mounted = self.is_mounted();
    self.unmount(cache);
    self.key = key;
    self.fetcher = erase(fetch);
    self.changed.set(true);
    if was_mounted {
      self.mount(cache);
    }
  }

  /// Force a refetch, keeping current data visible meanwhile.
  pub fn refetch(&self, cache: &mut QueryCache) -> bool {
    cache.invalidate(&self.key)
  }

  /// Current state of this observer's key.
  pub fn result(&self, cache: &QueryCache) -> QueryResult<T> {
    match cache.get(&self.key) {
      Some(entry) => QueryResult {
        status: entry.status(),
        data: entry.data::<T>(),
        error: entry.error().map(String::from),
      },
      None => QueryResult {
        status: QueryStatus::Idle,
        data: None,
        error: None,
      },
    }
  }

  /// Returns `true` once after the entry changed since the last call.
  pub fn take_changed(&self) -> bool {
    self.changed.replace(false)
  }
}

fn erase<T, F, Fut>(fetch: F) -> Fetcher
where
  T: Any + Send + Sync,
  F: Fn() -> Fut + 'static,
  Fut: Future<Output = Result<T, String>> + Send + 'static,
{
  Rc::new(move || {
    let future = fetch();
    async move { future.await.map(|data| Arc::new(data) as Payload) }.boxed()
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query_key;
  use std::time::Duration;

  fn counting_observer(key: QueryKey, calls: Rc<Cell<usize>>) -> QueryObserver<Vec<u32>> {
    QueryObserver::new(key, QueryOptions::default(), move || {
      calls.set(calls.get() + 1);
      async { Ok::<_, String>(vec![1, 2, 3]) }
    })
  }

  async fn settle() {
    for _ in 0..10 {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test]
  async fn test_mount_fetches_then_succeeds() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let mut observer = counting_observer(query_key!["payments", 1u32], calls.clone());

    assert_eq!(observer.result(&cache).status, QueryStatus::Idle);
    observer.mount(&mut cache);
    assert!(observer.result(&cache).is_loading());

    settle().await;
    cache.poll();

    let result = observer.result(&cache);
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(result.data(), Some(&vec![1, 2, 3]));
    assert_eq!(calls.get(), 1);
  }

  #[tokio::test]
  async fn test_remount_serves_cache_without_fetch() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let mut observer = counting_observer(query_key!["payments", 1u32], calls.clone());

    observer.mount(&mut cache);
    settle().await;
    cache.poll();
    observer.unmount(&mut cache);

    observer.mount(&mut cache);
    assert_eq!(observer.result(&cache).status, QueryStatus::Success);

    // A second consumer of the same key shares the entry
    let mut other = counting_observer(query_key!["payments", 1u32], calls.clone());
    other.mount(&mut cache);
    assert_eq!(other.result(&cache).data(), Some(&vec![1, 2, 3]));

    assert_eq!(calls.get(), 1);
  }

  #[tokio::test]
  async fn test_concurrent_mounts_share_one_fetch() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let mut first = counting_observer(query_key!["summary"], calls.clone());
    let mut second = counting_observer(query_key!["summary"], calls.clone());

    first.mount(&mut cache);
    second.mount(&mut cache);
    assert_eq!(calls.get(), 1);
    assert_eq!(cache.subscriber_count(first.key()), 2);
  }

  #[tokio::test]
  async fn test_key_change_does_not_blend_data() {
    let mut cache = QueryCache::new();
    let mut observer: QueryObserver<u32> =
      QueryObserver::new(query_key!["payments", 1u32], QueryOptions::default(), || async {
        Ok::<_, String>(1)
      });
    observer.mount(&mut cache);
    settle().await;
    cache.poll();

    observer.set_key(&mut cache, query_key!["payments", 2u32], || async { Ok::<_, String>(2) });
    let result = observer.result(&cache);
    assert!(result.is_loading());
    assert!(result.data.is_none());

    settle().await;
    cache.poll();
    assert_eq!(observer.result(&cache).data(), Some(&2));

    // Back-navigation is served from cache
    observer.set_key(&mut cache, query_key!["payments", 1u32], || async { Ok::<_, String>(99) });
    let result = observer.result(&cache);
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(result.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_error_without_data_refetches_on_remount() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut observer: QueryObserver<u32> =
      QueryObserver::new(query_key!["summary"], QueryOptions::default(), move || {
        counter.set(counter.get() + 1);
        async { Err::<u32, _>("503 Service Unavailable".to_string()) }
      });

    observer.mount(&mut cache);
    settle().await;
    cache.poll();
    let result = observer.result(&cache);
    assert!(result.is_error());
    assert_eq!(result.error.as_deref(), Some("503 Service Unavailable"));

    // No automatic retry
    settle().await;
    cache.poll();
    assert_eq!(calls.get(), 1);

    observer.unmount(&mut cache);
    observer.mount(&mut cache);
    assert_eq!(calls.get(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_time_triggers_refetch_on_mount() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let options = QueryOptions {
      stale_time: Some(Duration::from_secs(30)),
      ..QueryOptions::default()
    };
    let mut observer: QueryObserver<u32> =
      QueryObserver::new(query_key!["summary"], options, move || {
        counter.set(counter.get() + 1);
        async { Ok::<_, String>(1) }
      });

    observer.mount(&mut cache);
    settle().await;
    cache.poll();
    observer.unmount(&mut cache);

    tokio::time::advance(Duration::from_secs(10)).await;
    observer.mount(&mut cache);
    assert_eq!(calls.get(), 1);
    observer.unmount(&mut cache);

    tokio::time::advance(Duration::from_secs(30)).await;
    observer.mount(&mut cache);
    assert_eq!(calls.get(), 2);
    assert_eq!(observer.result(&cache).data(), Some(&1));
  }

  #[tokio::test]
  async fn test_take_changed() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let mut observer = counting_observer(query_key!["logs"], calls);

    observer.mount(&mut cache);
    assert!(observer.take_changed());
    assert!(!observer.take_changed());

    settle().await;
    cache.poll();
    assert!(observer.take_changed());
  }

  #[tokio::test]
  async fn test_refetch_keeps_data_visible() {
    let mut cache = QueryCache::new();
    let calls = Rc::new(Cell::new(0));
    let mut observer = counting_observer(query_key!["logs"], calls.clone());
    observer.mount(&mut cache);
    settle().await;
    cache.poll();

    assert!(observer.refetch(&mut cache));
    let result = observer.result(&cache);
    assert_eq!(result.status, QueryStatus::Loading);
    assert!(!result.is_loading());
    assert!(result.data.is_some());
    assert_eq!(calls.get(), 2);
  }
}
