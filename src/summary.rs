//! Chart and card figures derived from the latest [`Summary`].
//!
//! Everything here is recomputed on each render and never cached.

use crate::api::types::{MonthlyTotals, Summary};
use std::collections::HashMap;

/// One bar group of the monthly chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
  pub name: String,
  pub payments: i64,
  pub invoices: i64,
}

/// Monthly breakdown as a chart series, in ascending month order with values
/// rounded to whole units.
pub fn chart_series(breakdown: &HashMap<String, MonthlyTotals>) -> Vec<SeriesPoint> {
  let mut series: Vec<SeriesPoint> = breakdown
    .iter()
    .map(|(month, totals)| SeriesPoint {
      name: month.clone(),
      payments: totals.payments.round() as i64,
      invoices: totals.invoices.round() as i64,
    })
    .collect();
  series.sort_by(|a, b| a.name.cmp(&b.name));
  series
}

/// Average payments per month covered by the breakdown
pub fn monthly_average(summary: &Summary) -> f64 {
  match summary.monthly_breakdown.len() {
    0 => 0.0,
    months => summary.total_payments / months as f64,
  }
}
