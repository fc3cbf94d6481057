//! Client-side data synchronization: keyed query cache, query controllers
//! and mutations.
//!
//! - [`QueryCache`] holds one entry per structural [`QueryKey`], de-duplicates
//!   in-flight fetches and owns poll schedules
//! - [`QueryObserver`] binds a key and fetch function to one consumer
//! - [`Mutation`] runs one-shot side effects with settle callbacks
//!
//! All state changes happen inside `poll()` calls on the event loop.

mod cache;
mod key;
mod mutation;
mod observer;
mod state;

pub use cache::{QueryCache, QueryOptions};
pub use key::{KeyPart, QueryKey};
pub use mutation::{Mutation, MutationId};
pub use observer::{QueryObserver, QueryResult};
pub use state::QueryStatus;
