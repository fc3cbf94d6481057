pub mod client;
pub mod datetime;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{AgentLog, AssistantReply, Invoice, ListParams, ListResource, Payment, Summary};
