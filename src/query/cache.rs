//! Query cache shared by every controller in the application.
//!
//! The cache owns one [`QueryEntry`] per structural key, the fetch function
//! registered for it, its subscribers and its poll schedule. Fetches run on
//! the tokio runtime and report back through a channel; nothing touches an
//! entry until [`QueryCache::poll`] drains that channel on the event loop,
//! so every transition and listener notification is one uninterrupted step.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::key::QueryKey;
use super::state::{Payload, QueryAction, QueryEntry};

/// A boxed fetch future resolving to type-erased data
pub type FetchFuture = BoxFuture<'static, Result<Payload, String>>;

/// A factory producing one fetch future per call
pub type Fetcher = Rc<dyn Fn() -> FetchFuture>;

/// Callback invoked synchronously after an entry changes
pub type Listener = Box<dyn FnMut(&QueryKey, &QueryEntry)>;

/// Freshness and polling policy for a query key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
  /// Age after which data is refetched on mount. `None` keeps data fresh forever.
  pub stale_time: Option<Duration>,
  /// Refetch every interval while at least one subscriber is mounted.
  pub refetch_interval: Option<Duration>,
}

impl QueryOptions {
  /// Options for a query that polls every `every`.
  pub fn polling(every: Duration) -> Self {
    Self {
      refetch_interval: Some(every),
      ..Self::default()
    }
  }
}

/// Handle returned by [`QueryCache::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct PollSchedule {
  every: Duration,
  next_due: Instant,
}

struct Slot {
  key: QueryKey,
  entry: QueryEntry,
  fetcher: Option<Fetcher>,
  options: QueryOptions,
  subscribers: usize,
  in_flight: bool,
  schedule: Option<PollSchedule>,
}

impl Slot {
  fn new(key: QueryKey) -> Self {
    Self {
      key,
      entry: QueryEntry::new(),
      fetcher: None,
      options: QueryOptions::default(),
      subscribers: 0,
      in_flight: false,
      schedule: None,
    }
  }

  /// Keep the poll schedule in line with options and subscriber count.
  fn arm_schedule(&mut self, now: Instant) {
    match self.options.refetch_interval {
      Some(every) if self.subscribers > 0 => {
        let unchanged = matches!(&self.schedule, Some(s) if s.every == every);
        if !unchanged {
          debug!(key = %self.key, ?every, "poll schedule armed");
          self.schedule = Some(PollSchedule {
            every,
            next_due: now + every,
          });
        }
      }
      _ => {
        if self.schedule.take().is_some() {
          debug!(key = %self.key, "poll schedule canceled");
        }
      }
    }
  }
}

struct Settlement {
  hash: String,
  outcome: Result<Payload, String>,
}

struct Subscriber {
  hash: String,
  listener: Listener,
}

/// Keyed store of query entries.
///
/// Constructed once by the application and passed by `&mut` to every
/// controller. [`QueryCache::shutdown`] cancels all poll schedules.
pub struct QueryCache {
  slots: HashMap<String, Slot>,
  subscribers: BTreeMap<SubscriptionId, Subscriber>,
  next_subscription: u64,
  tx: mpsc::UnboundedSender<Settlement>,
  rx: mpsc::UnboundedReceiver<Settlement>,
  closed: bool,
}

impl QueryCache {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      slots: HashMap::new(),
      subscribers: BTreeMap::new(),
      next_subscription: 0,
      tx,
      rx,
      closed: false,
    }
  }

  /// Current entry for a key, if one was ever created.
  pub fn get(&self, key: &QueryKey) -> Option<&QueryEntry> {
    self.slots.get(&key.cache_hash()).map(|slot| &slot.entry)
  }

  /// Number of entries held.
  pub fn entry_count(&self) -> usize {
    self.slots.len()
  }

  /// Whether a fetch for the key is in flight.
  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    self
      .slots
      .get(&key.cache_hash())
      .map(|slot| slot.in_flight)
      .unwrap_or(false)
  }

  /// Number of mounted subscribers for a key.
  #[cfg(test)]
  pub fn subscriber_count(&self, key: &QueryKey) -> usize {
    self
      .slots
      .get(&key.cache_hash())
      .map(|slot| slot.subscribers)
      .unwrap_or(0)
  }

  /// Register the fetch function and options used for a key.
  ///
  /// The most recent registration wins; re-registering with a different
  /// polling interval re-arms the schedule.
  pub fn register(&mut self, key: &QueryKey, fetcher: Fetcher, options: QueryOptions) {
    let slot = self
      .slots
      .entry(key.cache_hash())
      .or_insert_with(|| Slot::new(key.clone()));
    slot.fetcher = Some(fetcher);
    slot.options = options;
    slot.arm_schedule(Instant::now());
  }

  /// Attach a listener to a key, creating its entry if needed.
  pub fn subscribe<L>(&mut self, key: &QueryKey, listener: L) -> SubscriptionId
  where
    L: FnMut(&QueryKey, &QueryEntry) + 'static,
  {
    let hash = key.cache_hash();
    let slot = self
      .slots
      .entry(hash.clone())
      .or_insert_with(|| Slot::new(key.clone()));
    slot.subscribers += 1;
    slot.arm_schedule(Instant::now());

    let id = SubscriptionId(self.next_subscription);
    self.next_subscription += 1;
    self.subscribers.insert(
      id,
      Subscriber {
        hash,
        listener: Box::new(listener),
      },
    );
    id
  }

  /// Detach a listener. The last subscriber leaving cancels the poll schedule.
  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let Some(subscriber) = self.subscribers.remove(&id) else {
      return false;
    };
    if let Some(slot) = self.slots.get_mut(&subscriber.hash) {
      slot.subscribers = slot.subscribers.saturating_sub(1);
      slot.arm_schedule(Instant::now());
    }
    true
  }

  /// Apply a transition to a key's entry and notify its listeners.
  pub fn set(&mut self, key: &QueryKey, action: QueryAction) {
    let hash = key.cache_hash();
    self
      .slots
      .entry(hash.clone())
      .or_insert_with(|| Slot::new(key.clone()));
    self.apply(&hash, action);
  }

  /// Start a fetch with the registered fetch function.
  ///
  /// Returns `false` without fetching if one is already in flight, no fetch
  /// function is registered, or the cache was shut down.
  pub fn fetch(&mut self, key: &QueryKey) -> bool {
    self.start_fetch(&key.cache_hash())
  }

  /// Mark a key's data stale and refetch it if anyone is subscribed.
  pub fn invalidate(&mut self, key: &QueryKey) -> bool {
    let hash = key.cache_hash();
    let Some(subscribers) = self.slots.get(&hash).map(|slot| slot.subscribers) else {
      return false;
    };
    self.set(key, QueryAction::Invalidated);
    subscribers > 0 && self.start_fetch(&hash)
  }

  /// Drain settled fetches, then fire poll schedules that are due.
  ///
  /// Returns `true` if any entry changed. Call this on every event loop tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok(Settlement { hash, outcome }) = self.rx.try_recv() {
      if self.closed {
        continue;
      }
      let Some(slot) = self.slots.get_mut(&hash) else {
        debug!(%hash, "dropping settlement for evicted entry");
        continue;
      };
      slot.in_flight = false;
      let action = match outcome {
        Ok(data) => {
          debug!(key = %slot.key, "fetch resolved");
          QueryAction::Resolved {
            data,
            at: Instant::now(),
          }
        }
        Err(error) => {
          warn!(key = %slot.key, %error, "fetch failed");
          QueryAction::Rejected { error }
        }
      };
      self.apply(&hash, action);
      changed = true;
    }

    if self.closed {
      return false;
    }

    let now = Instant::now();
    let due: Vec<String> = self
      .slots
      .iter_mut()
      .filter_map(|(hash, slot)| {
        let schedule = slot.schedule.as_mut()?;
        if schedule.next_due > now {
          return None;
        }
        schedule.next_due = now + schedule.every;
        Some(hash.clone())
      })
      .collect();

    for hash in due {
      changed |= self.start_fetch(&hash);
    }

    changed
  }

  /// Tear down: cancel every poll schedule and drop every subscription.
  ///
  /// Fetches still in flight are left to finish; their results are discarded.
  pub fn shutdown(&mut self) {
    for slot in self.slots.values_mut() {
      slot.subscribers = 0;
      slot.schedule = None;
    }
    self.subscribers.clear();
    self.closed = true;
    info!(entries = self.slots.len(), "query cache shut down");
  }

  /// Drop entries nobody subscribes to and nothing is fetching.
  pub fn evict_unused(&mut self) -> usize {
    let before = self.slots.len();
    self
      .slots
      .retain(|_, slot| slot.subscribers > 0 || slot.in_flight);
    let evicted = before - self.slots.len();
    if evicted > 0 {
      debug!(evicted, "evicted unused query entries");
    }
    evicted
  }

  fn start_fetch(&mut self, hash: &str) -> bool {
    if self.closed {
      return false;
    }
    let Some(slot) = self.slots.get_mut(hash) else {
      return false;
    };
    if slot.in_flight {
      debug!(key = %slot.key, "fetch already in flight");
      return false;
    }
    let Some(fetcher) = slot.fetcher.clone() else {
      debug!(key = %slot.key, "no fetch function registered");
      return false;
    };
    slot.in_flight = true;
    debug!(key = %slot.key, "fetch started");

    let future = fetcher();
    let tx = self.tx.clone();
    let owned_hash = hash.to_string();
    tokio::spawn(async move {
      let outcome = AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err("fetch task panicked".to_string()));
      // Receiver is gone once the cache is dropped
      let _ = tx.send(Settlement {
        hash: owned_hash,
        outcome,
      });
    });

    self.apply(hash, QueryAction::FetchStarted);
    true
  }

  fn apply(&mut self, hash: &str, action: QueryAction) {
    let Some(slot) = self.slots.get_mut(hash) else {
      return;
    };
    let previous = std::mem::take(&mut slot.entry);
    slot.entry = previous.reduce(action);

    let slot = &self.slots[hash];
    for subscriber in self.subscribers.values_mut() {
      if subscriber.hash == hash {
        (subscriber.listener)(&slot.key, &slot.entry);
      }
    }
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}
