//! One-shot side-effecting calls with a pending/success/error lifecycle.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Identifies one `mutate` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationId(u64);

/// A settled invocation, as returned by [`Mutation::poll`].
#[derive(Debug, Clone)]
pub struct MutationSettled<O> {
  pub id: MutationId,
  pub outcome: Result<O, String>,
}

type MutateFn<I, O> = Box<dyn Fn(I) -> BoxFuture<'static, Result<O, String>>>;

struct Callbacks<O> {
  on_success: Box<dyn FnOnce(&O)>,
  on_error: Box<dyn FnOnce(&str)>,
}

/// Mutation controller.
///
/// Overlapping invocations run independently. The shared `is_pending`,
/// `last_result` and `last_error` reflect the most recently settled call;
/// callers that need per-call correlation use the [`MutationId`] or the
/// callbacks passed to [`Mutation::mutate_with`].
pub struct Mutation<I, O> {
  mutate_fn: MutateFn<I, O>,
  callbacks: HashMap<MutationId, Callbacks<O>>,
  tx: mpsc::UnboundedSender<(MutationId, Result<O, String>)>,
  rx: mpsc::UnboundedReceiver<(MutationId, Result<O, String>)>,
  next_id: u64,
  pending: bool,
  last_result: Option<O>,
  last_error: Option<String>,
}

impl<I, O: Clone + Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(mutate_fn: F) -> Self
  where
    F: Fn(I) -> Fut + 'static,
    Fut: Future<Output = Result<O, String>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      mutate_fn: Box::new(move |input| mutate_fn(input).boxed()),
      callbacks: HashMap::new(),
      tx,
      rx,
      next_id: 0,
      pending: false,
      last_result: None,
      last_error: None,
    }
  }

  /// Start an invocation.
  pub fn mutate(&mut self, input: I) -> MutationId {
    let id = MutationId(self.next_id);
    self.next_id += 1;
    self.pending = true;
    debug!(?id, "mutation started");

    let future = (self.mutate_fn)(input);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let outcome = AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err("mutation task panicked".to_string()));
      let _ = tx.send((id, outcome));
    });
    id
  }

  /// Start an invocation with callbacks; exactly one of them runs when it settles.
  pub fn mutate_with<S, E>(&mut self, input: I, on_success: S, on_error: E) -> MutationId
  where
    S: FnOnce(&O) + 'static,
    E: FnOnce(&str) + 'static,
  {
    let id = self.mutate(input);
    self.callbacks.insert(
      id,
      Callbacks {
        on_success: Box::new(on_success),
        on_error: Box::new(on_error),
      },
    );
    id
  }

  /// Drain settled invocations, run their callbacks and return them in
  /// settlement order.
  pub fn poll(&mut self) -> Vec<MutationSettled<O>> {
    let mut settled = Vec::new();
    while let Ok((id, outcome)) = self.rx.try_recv() {
      self.pending = false;
      let callbacks = self.callbacks.remove(&id);
      match &outcome {
        Ok(result) => {
          debug!(?id, "mutation succeeded");
          self.last_result = Some(result.clone());
          self.last_error = None;
          if let Some(callbacks) = callbacks {
            (callbacks.on_success)(result);
          }
        }
        Err(error) => {
          warn!(?id, %error, "mutation failed");
          self.last_error = Some(error.clone());
          if let Some(callbacks) = callbacks {
            (callbacks.on_error)(error);
          }
        }
      }
      settled.push(MutationSettled { id, outcome });
    }
    settled
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }

  pub fn last_result(&self) -> Option<&O> {
    self.last_result.as_ref()
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }
}
