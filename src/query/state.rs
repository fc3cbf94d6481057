//! Query entry state and its transition table.
//!
//! Every change to an entry goes through [`QueryEntry::reduce`], a pure step
//! from the previous entry and a [`QueryAction`] to the next entry. The cache
//! drives it from channel settlements, but nothing here depends on how the
//! action was produced.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Type-erased query data shared between the cache and its consumers.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// The status of a query entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Entry exists but has not been fetched
  #[default]
  Idle,
  /// A fetch is in flight
  Loading,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed
  Error,
}

/// A transition applied to a query entry.
#[derive(Clone)]
pub enum QueryAction {
  /// A fetch was started
  FetchStarted,
  /// The fetch resolved with data
  Resolved { data: Payload, at: Instant },
  /// The fetch failed
  Rejected { error: String },
  /// Data should be considered stale regardless of age
  Invalidated,
}

impl fmt::Debug for QueryAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      QueryAction::FetchStarted => f.write_str("FetchStarted"),
      QueryAction::Resolved { at, .. } => f
        .debug_struct("Resolved")
        .field("at", at)
        .finish_non_exhaustive(),
      QueryAction::Rejected { error } => f
        .debug_struct("Rejected")
        .field("error", error)
        .finish(),
      QueryAction::Invalidated => f.write_str("Invalidated"),
    }
  }
}

/// Cached state for a single query key.
///
/// Invariants: `Success` implies data is present and error is absent;
/// `Error` implies error is present. Data from the last success survives
/// both `Loading` and `Error`.
#[derive(Clone, Default)]
pub struct QueryEntry {
  status: QueryStatus,
  data: Option<Payload>,
  error: Option<String>,
  last_fetched_at: Option<Instant>,
  invalidated: bool,
}

impl QueryEntry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Apply one transition, producing the next entry.
  pub fn reduce(self, action: QueryAction) -> Self {
    match action {
      QueryAction::FetchStarted => Self {
        status: QueryStatus::Loading,
        ..self
      },
      QueryAction::Resolved { data, at } => Self {
        status: QueryStatus::Success,
        data: Some(data),
        error: None,
        last_fetched_at: Some(at),
        invalidated: false,
      },
      QueryAction::Rejected { error } => Self {
        status: QueryStatus::Error,
        error: Some(error),
        ..self
      },
      QueryAction::Invalidated => Self {
        invalidated: true,
        ..self
      },
    }
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn has_data(&self) -> bool {
    self.data.is_some()
  }

  /// Typed access to the cached data.
  ///
  /// Returns `None` when there is no data or it was stored as a different type.
  pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.data.clone()?.downcast::<T>().ok()
  }

  /// Whether cached data needs a refetch before it can be served.
  ///
  /// `stale_time = None` means data never goes stale by age.
  pub fn is_stale(&self, stale_time: Option<Duration>, now: Instant) -> bool {
    if self.invalidated {
      return true;
    }
    match (self.last_fetched_at, stale_time) {
      (None, _) => true,
      (Some(_), None) => false,
      (Some(at), Some(stale_time)) => now.duration_since(at) >= stale_time,
    }
  }
}

impl fmt::Debug for QueryEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QueryEntry")
      .field("status", &self.status)
      .field("has_data", &self.data.is_some())
      .field("error", &self.error)
      .field("last_fetched_at", &self.last_fetched_at)
      .field("invalidated", &self.invalidated)
      .finish()
  }
}
