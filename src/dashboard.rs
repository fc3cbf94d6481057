//! Screen-level data state: one query cache shared by the summary, the
//! activity log, both list tables and the assistant chat.
//!
//! The dashboard owns the cache and hands `&mut` access to each controller
//! in turn, so there is no shared interior mutability. `tick()` is the only
//! place settled fetches become visible.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::api::{AgentLog, ApiClient, Invoice, ListParams, ListResource, Payment, Summary};
use crate::chat::{ChatSession, GREETING};
use crate::config::DashboardConfig;
use crate::pagination::Pager;
use crate::query::{QueryCache, QueryKey, QueryObserver, QueryOptions, QueryResult};
use crate::query_key;
use crate::summary::{self, SeriesPoint};

/// Which list table is in front
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListTab {
  #[default]
  Payments,
  Invoices,
}

impl ListTab {
  pub fn toggle(self) -> Self {
    match self {
      ListTab::Payments => ListTab::Invoices,
      ListTab::Invoices => ListTab::Payments,
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      ListTab::Payments => "Payments",
      ListTab::Invoices => "Invoices",
    }
  }
}

/// A paginated, filterable table of one list resource.
pub struct ListView<T: ListResource> {
  pager: Pager,
  /// Index into `T::STATUSES`; `None` shows every status
  filter: Option<usize>,
  observer: QueryObserver<Vec<T>>,
}

impl<T: ListResource> ListView<T> {
  fn new(api: &ApiClient, page_size: u32) -> Self {
    let pager = Pager::new(page_size);
    let key = Self::key_for(&pager, None);
    let fetch = fetch_page::<T>(api.clone(), Self::params_for(&pager, None));
    Self {
      pager,
      filter: None,
      observer: QueryObserver::new(key, QueryOptions::default(), fetch),
    }
  }

  fn status(&self) -> Option<&'static str> {
    self.filter.and_then(|i| T::STATUSES.get(i).copied())
  }

  fn key_for(pager: &Pager, status: Option<&'static str>) -> QueryKey {
    QueryKey::new(T::RESOURCE).with(pager.page()).with(status)
  }

  fn params_for(pager: &Pager, status: Option<&'static str>) -> ListParams {
    let (skip, limit) = pager.window();
    ListParams {
      skip,
      limit,
      status: status.map(String::from),
    }
  }

  /// Point the observer at the current page and filter.
  fn sync(&mut self, cache: &mut QueryCache, api: &ApiClient) {
    let status = self.status();
    let key = Self::key_for(&self.pager, status);
    let fetch = fetch_page::<T>(api.clone(), Self::params_for(&self.pager, status));
    self.observer.set_key(cache, key, fetch);
  }

  pub fn page(&self) -> u32 {
    self.pager.page()
  }

  /// Active status filter, `None` for all
  pub fn filter(&self) -> Option<&'static str> {
    self.status()
  }

  pub fn result(&self, cache: &QueryCache) -> QueryResult<Vec<T>> {
    self.observer.result(cache)
  }

  /// Whether the current page is full, so another may follow.
  pub fn has_more(&self, cache: &QueryCache) -> bool {
    self
      .observer
      .result(cache)
      .data()
      .is_some_and(|rows| self.pager.has_more(rows.len()))
  }

  pub fn has_prev(&self) -> bool {
    !self.pager.is_first()
  }

  fn next(&mut self, cache: &mut QueryCache, api: &ApiClient) -> bool {
    if !self.has_more(cache) {
      return false;
    }
    self.pager.next();
    self.sync(cache, api);
    true
  }

  fn prev(&mut self, cache: &mut QueryCache, api: &ApiClient) -> bool {
    if !self.has_prev() {
      return false;
    }
    self.pager.prev();
    self.sync(cache, api);
    true
  }

  /// Advance all → first status → ... → last status → all. Resets to page 1.
  fn cycle_filter(&mut self, cache: &mut QueryCache, api: &ApiClient) {
    self.filter = match self.filter {
      None if !T::STATUSES.is_empty() => Some(0),
      Some(i) if i + 1 < T::STATUSES.len() => Some(i + 1),
      _ => None,
    };
    self.pager.reset();
    self.sync(cache, api);
  }
}

fn fetch_page<T: ListResource>(
  api: ApiClient,
  params: ListParams,
) -> impl Fn() -> BoxFuture<'static, Result<Vec<T>, String>> {
  move || {
    let api = api.clone();
    let params = params.clone();
    async move { api.list::<T>(&params).await.map_err(|e| e.to_string()) }.boxed()
  }
}

pub struct Dashboard {
  api: ApiClient,
  cache: QueryCache,
  summary: QueryObserver<Summary>,
  logs: QueryObserver<Vec<AgentLog>>,
  payments: ListView<Payment>,
  invoices: ListView<Invoice>,
  chat: ChatSession,
}

impl Dashboard {
  pub fn new(api: ApiClient, config: &DashboardConfig) -> Self {
    let summary = {
      let api = api.clone();
      QueryObserver::new(
        QueryKey::new("summary"),
        QueryOptions::polling(config.summary_refresh()),
        move || {
          let api = api.clone();
          async move { api.summary().await.map_err(|e| e.to_string()) }
        },
      )
    };

    let logs = {
      let api = api.clone();
      let limit = config.logs_limit;
      QueryObserver::new(
        query_key!["agent-logs", limit],
        QueryOptions::polling(config.logs_refresh()),
        move || {
          let api = api.clone();
          async move { api.agent_logs(limit).await.map_err(|e| e.to_string()) }
        },
      )
    };

    let chat = {
      let api = api.clone();
      ChatSession::new(move |query: String| {
        let api = api.clone();
        async move { api.ask_assistant(&query).await.map_err(|e| e.to_string()) }
      })
      .with_greeting(GREETING)
    };

    Self {
      payments: ListView::new(&api, config.page_size),
      invoices: ListView::new(&api, config.page_size),
      api,
      cache: QueryCache::new(),
      summary,
      logs,
      chat,
    }
  }

  /// Subscribe every panel, starting the initial fetches and poll schedules.
  pub fn mount(&mut self) {
    info!(base_url = self.api.base_url(), "mounting dashboard");
    self.summary.mount(&mut self.cache);
    self.logs.mount(&mut self.cache);
    self.payments.observer.mount(&mut self.cache);
    self.invoices.observer.mount(&mut self.cache);
  }

  /// Apply settled fetches and replies and fire due polls. Returns whether
  /// anything visible changed.
  pub fn tick(&mut self) -> bool {
    let mut changed = self.cache.poll();
    changed |= self.chat.poll();
    changed |= self.summary.take_changed();
    changed |= self.logs.take_changed();
    changed |= self.payments.observer.take_changed();
    changed |= self.invoices.observer.take_changed();
    changed
  }

  /// Refetch everything on screen, keeping current data visible.
  /// Cached pages that are not on screen are dropped, so they are fetched
  /// again when revisited.
  pub fn refresh(&mut self, tab: ListTab) {
    let evicted = self.cache.evict_unused();
    debug!(?tab, evicted, remaining = self.cache.entry_count(), "manual refresh");
    self.summary.refetch(&mut self.cache);
    self.logs.refetch(&mut self.cache);
    match tab {
      ListTab::Payments => self.payments.observer.refetch(&mut self.cache),
      ListTab::Invoices => self.invoices.observer.refetch(&mut self.cache),
    };
  }

  pub fn next_page(&mut self, tab: ListTab) -> bool {
    match tab {
      ListTab::Payments => self.payments.next(&mut self.cache, &self.api),
      ListTab::Invoices => self.invoices.next(&mut self.cache, &self.api),
    }
  }

  pub fn prev_page(&mut self, tab: ListTab) -> bool {
    match tab {
      ListTab::Payments => self.payments.prev(&mut self.cache, &self.api),
      ListTab::Invoices => self.invoices.prev(&mut self.cache, &self.api),
    }
  }

  pub fn cycle_filter(&mut self, tab: ListTab) {
    match tab {
      ListTab::Payments => self.payments.cycle_filter(&mut self.cache, &self.api),
      ListTab::Invoices => self.invoices.cycle_filter(&mut self.cache, &self.api),
    }
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  pub fn summary(&self) -> QueryResult<Summary> {
    self.summary.result(&self.cache)
  }

  pub fn logs(&self) -> QueryResult<Vec<AgentLog>> {
    self.logs.result(&self.cache)
  }

  pub fn payments(&self) -> &ListView<Payment> {
    &self.payments
  }

  pub fn invoices(&self) -> &ListView<Invoice> {
    &self.invoices
  }

  /// Monthly chart series from the latest summary
  pub fn chart(&self) -> Vec<SeriesPoint> {
    self
      .summary()
      .data()
      .map(|s| summary::chart_series(&s.monthly_breakdown))
      .unwrap_or_default()
  }

  pub fn chat(&self) -> &ChatSession {
    &self.chat
  }

  pub fn chat_mut(&mut self) -> &mut ChatSession {
    &mut self.chat
  }

  /// Stop polling and drop every subscription.
  pub fn shutdown(&mut self) {
    self.summary.unmount(&mut self.cache);
    self.logs.unmount(&mut self.cache);
    self.payments.observer.unmount(&mut self.cache);
    self.invoices.observer.unmount(&mut self.cache);
    self.cache.shutdown();
    info!("dashboard shut down");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;
  use axum::extract::{RawQuery, State};
  use axum::routing::get;
  use axum::{Json, Router};
  use serde_json::{json, Value};
  use std::sync::{Arc, Mutex};
  use std::time::Duration;

  #[derive(Default)]
  struct Requests {
    log: Mutex<Vec<String>>,
  }

  impl Requests {
    fn record(&self, entry: String) {
      self.log.lock().unwrap().push(entry);
    }

    fn matching(&self, prefix: &str) -> Vec<String> {
      let log = self.log.lock().unwrap();
      log.iter().filter(|e| e.starts_with(prefix)).cloned().collect()
    }
  }

  async fn payments(
    State(requests): State<Arc<Requests>>,
    RawQuery(query): RawQuery,
  ) -> Json<Value> {
    let query = query.unwrap_or_default();
    requests.record(format!("payments?{}", query));
    // Unfiltered pages are full, filtered ones are short
    let rows = if query.contains("status=") { 3 } else { 10 };
    Json(Value::Array(
      (0..rows)
        .map(|i| {
          json!({
            "id": i,
            "amount": 10.0,
            "date": "2024-01-01T00:00:00",
            "status": "paid",
            "description": query,
          })
        })
        .collect(),
    ))
  }

  async fn invoices(State(requests): State<Arc<Requests>>) -> Json<Value> {
    requests.record("invoices".to_string());
    Json(json!([]))
  }

  async fn summary(State(requests): State<Arc<Requests>>) -> Json<Value> {
    requests.record("summary".to_string());
    Json(json!({
      "total_payments": 6.0,
      "total_invoices": 5.0,
      "unpaid_invoices_count": 1,
      "unpaid_invoices_amount": 2.0,
      "monthly_breakdown": {
        "2024-02": {"payments": 5.0, "invoices": 3.0},
        "2024-01": {"payments": 1.0, "invoices": 2.0}
      }
    }))
  }

  async fn agent_logs(
    State(requests): State<Arc<Requests>>,
    RawQuery(query): RawQuery,
  ) -> Json<Value> {
    requests.record(format!("agent-logs?{}", query.unwrap_or_default()));
    Json(json!([]))
  }

  async fn dashboard() -> (Dashboard, Arc<Requests>) {
    let requests = Arc::new(Requests::default());
    let router = Router::new()
      .route("/api/payments", get(payments))
      .route("/api/invoices", get(invoices))
      .route("/api/summary", get(summary))
      .route("/api/agent-logs", get(agent_logs))
      .with_state(requests.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });

    let api = ApiClient::new(&ApiConfig {
      base_url: format!("http://{}/api", addr),
      timeout_secs: 5,
    })
    .unwrap();
    (Dashboard::new(api, &DashboardConfig::default()), requests)
  }

  /// Tick until nothing is in flight
  async fn settle(dashboard: &mut Dashboard) {
    for _ in 0..200 {
      dashboard.tick();
      let cache = dashboard.cache();
      let busy = [
        query_key!["summary"],
        query_key!["agent-logs", 20u32],
        dashboard.payments.observer.key().clone(),
        dashboard.invoices.observer.key().clone(),
      ]
      .iter()
      .any(|key| cache.is_fetching(key));
      if !busy {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("dashboard did not settle");
  }

  #[tokio::test]
  async fn test_mount_loads_every_panel() {
    let (mut dashboard, requests) = dashboard().await;
    dashboard.mount();
    assert!(dashboard.summary().is_loading());
    settle(&mut dashboard).await;

    assert_eq!(dashboard.summary().data().map(|s| s.unpaid_invoices_count), Some(1));
    assert_eq!(dashboard.payments().result(dashboard.cache()).data().map(Vec::len), Some(10));
    assert_eq!(dashboard.logs().data().map(Vec::len), Some(0));
    assert_eq!(requests.matching("payments"), vec!["payments?skip=0&limit=10"]);
    assert_eq!(requests.matching("agent-logs"), vec!["agent-logs?limit=20"]);
    assert_eq!(requests.matching("invoices").len(), 1);
  }

  #[tokio::test]
  async fn test_back_navigation_is_served_from_cache() {
    let (mut dashboard, requests) = dashboard().await;
    dashboard.mount();
    settle(&mut dashboard).await;

    assert!(dashboard.next_page(ListTab::Payments));
    assert_eq!(dashboard.payments().page(), 2);
    settle(&mut dashboard).await;

    assert!(dashboard.prev_page(ListTab::Payments));
    assert_eq!(dashboard.payments().page(), 1);
    // Cached page 1 is visible immediately, without a new request
    assert!(!dashboard.payments().result(dashboard.cache()).is_loading());
    settle(&mut dashboard).await;

    assert_eq!(
      requests.matching("payments"),
      vec!["payments?skip=0&limit=10", "payments?skip=10&limit=10"]
    );
    assert!(!dashboard.prev_page(ListTab::Payments));
  }

  #[tokio::test]
  async fn test_next_is_gated_on_a_full_page() {
    let (mut dashboard, _requests) = dashboard().await;
    dashboard.mount();
    settle(&mut dashboard).await;

    assert!(!dashboard.invoices().has_more(dashboard.cache()));
    assert!(!dashboard.next_page(ListTab::Invoices));
    assert_eq!(dashboard.invoices().page(), 1);
  }

  #[tokio::test]
  async fn test_filter_resets_page_and_is_sent() {
    let (mut dashboard, requests) = dashboard().await;
    dashboard.mount();
    settle(&mut dashboard).await;
    dashboard.next_page(ListTab::Payments);
    settle(&mut dashboard).await;

    dashboard.cycle_filter(ListTab::Payments);
    assert_eq!(dashboard.payments().filter(), Some("paid"));
    assert_eq!(dashboard.payments().page(), 1);
    settle(&mut dashboard).await;

    let sent = requests.matching("payments");
    assert_eq!(sent.last().unwrap(), "payments?skip=0&limit=10&status=paid");
    assert!(!dashboard.payments().has_more(dashboard.cache()));

    dashboard.cycle_filter(ListTab::Payments);
    dashboard.cycle_filter(ListTab::Payments);
    assert_eq!(dashboard.payments().filter(), Some("failed"));
    dashboard.cycle_filter(ListTab::Payments);
    assert_eq!(dashboard.payments().filter(), None);
  }

  #[tokio::test]
  async fn test_chart_and_refresh() {
    let (mut dashboard, requests) = dashboard().await;
    assert!(dashboard.chart().is_empty());
    dashboard.mount();
    settle(&mut dashboard).await;

    let names: Vec<_> = dashboard.chart().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["2024-01", "2024-02"]);

    dashboard.refresh(ListTab::Payments);
    // Stale-while-revalidate: the old summary stays visible
    assert!(dashboard.summary().is_fetching());
    assert!(dashboard.summary().data().is_some());
    settle(&mut dashboard).await;

    assert_eq!(requests.matching("summary").len(), 2);
    assert_eq!(requests.matching("payments").len(), 2);
    assert_eq!(requests.matching("invoices").len(), 1);
  }

  #[tokio::test]
  async fn test_refresh_drops_pages_off_screen() {
    let (mut dashboard, requests) = dashboard().await;
    dashboard.mount();
    settle(&mut dashboard).await;
    dashboard.next_page(ListTab::Payments);
    settle(&mut dashboard).await;

    dashboard.refresh(ListTab::Payments);
    settle(&mut dashboard).await;
    dashboard.prev_page(ListTab::Payments);
    // Page 1 was evicted, so going back loads it again
    assert!(dashboard.payments().result(dashboard.cache()).is_loading());
    settle(&mut dashboard).await;

    assert_eq!(
      requests.matching("payments"),
      vec![
        "payments?skip=0&limit=10",
        "payments?skip=10&limit=10",
        "payments?skip=10&limit=10",
        "payments?skip=0&limit=10",
      ]
    );
  }

  #[tokio::test]
  async fn test_shutdown_stops_polling() {
    let (mut dashboard, _requests) = dashboard().await;
    dashboard.mount();
    settle(&mut dashboard).await;
    assert_eq!(dashboard.cache().subscriber_count(&query_key!["summary"]), 1);

    dashboard.shutdown();
    assert_eq!(dashboard.cache().subscriber_count(&query_key!["summary"]), 0);
    assert!(!dashboard.cache().is_fetching(&query_key!["summary"]));
  }
}
