//! Serde-deserializable types matching the dashboard API responses.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::datetime;

// ============================================================================
// List resources
// ============================================================================

/// A paginated list endpoint and the record type it returns.
pub trait ListResource: DeserializeOwned + Send + Sync + 'static {
  /// Path segment under the API base, also used as the query key resource name.
  const RESOURCE: &'static str;
  /// Status values the server filters on.
  const STATUSES: &'static [&'static str];
}

/// Query parameters accepted by the list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
  pub skip: u32,
  pub limit: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
  pub id: i64,
  pub amount: f64,
  #[serde(deserialize_with = "datetime::deserialize")]
  pub date: DateTime<Utc>,
  pub status: String,
  #[serde(default)]
  pub description: String,
}

impl ListResource for Payment {
  const RESOURCE: &'static str = "payments";
  const STATUSES: &'static [&'static str] = &["paid", "pending", "failed"];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Invoice {
  pub id: i64,
  pub amount: f64,
  #[serde(deserialize_with = "datetime::deserialize")]
  pub date: DateTime<Utc>,
  #[serde(deserialize_with = "datetime::deserialize")]
  pub due_date: DateTime<Utc>,
  pub status: String,
  #[serde(default)]
  pub customer_name: String,
}

impl ListResource for Invoice {
  const RESOURCE: &'static str = "invoices";
  const STATUSES: &'static [&'static str] = &["paid", "unpaid", "overdue"];
}

// ============================================================================
// Summary
// ============================================================================

/// Payment and invoice totals for one month
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MonthlyTotals {
  #[serde(default)]
  pub payments: f64,
  #[serde(default)]
  pub invoices: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Summary {
  pub total_payments: f64,
  pub total_invoices: f64,
  pub unpaid_invoices_count: u64,
  pub unpaid_invoices_amount: f64,
  /// Keyed by `YYYY-MM`
  #[serde(default)]
  pub monthly_breakdown: HashMap<String, MonthlyTotals>,
}

// ============================================================================
// Activity log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentLog {
  pub id: i64,
  #[serde(deserialize_with = "datetime::deserialize")]
  pub timestamp: DateTime<Utc>,
  pub event_type: String,
  #[serde(default)]
  pub details: String,
  pub error: Option<String>,
}

// ============================================================================
// Assistant
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AssistantRequest<'a> {
  pub query: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantReply {
  pub response: String,
  #[serde(deserialize_with = "datetime::deserialize")]
  pub timestamp: DateTime<Utc>,
}
