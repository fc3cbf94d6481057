use crate::api::ApiError;
use crate::api::types::{
  AgentLog, AssistantReply, AssistantRequest, ListParams, ListResource, Summary,
};
use crate::config::ApiConfig;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Dashboard API client
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let parsed = url::Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API URL '{}': {}", config.base_url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(eyre!("API URL must use http or https: {}", config.base_url));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }

  /// GET a resource with optional query parameters
  async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
  {
    let url = self.url(path);
    debug!(%url, "GET");
    let mut request = self.http.get(&url);
    if let Some(query) = query {
      request = request.query(query);
    }
    let response = request.send().await.map_err(|source| ApiError::Transport {
      url: url.clone(),
      source,
    })?;
    Self::read_json(url, response).await
  }

  /// POST a JSON body
  async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let url = self.url(path);
    debug!(%url, "POST");
    let response = self
      .http
      .post(&url)
      .json(body)
      .send()
      .await
      .map_err(|source| ApiError::Transport {
        url: url.clone(),
        source,
      })?;
    Self::read_json(url, response).await
  }

  async fn read_json<T: DeserializeOwned>(
    url: String,
    response: reqwest::Response,
  ) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| ApiError::Transport {
      url: url.clone(),
      source,
    })?;

    if !status.is_success() {
      return Err(ApiError::Status {
        url,
        status: status.as_u16(),
        body,
      });
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
  }

  /// Fetch one page of a list resource
  pub async fn list<T: ListResource>(&self, params: &ListParams) -> Result<Vec<T>, ApiError> {
    self.get_json(T::RESOURCE, Some(params)).await
  }

  pub async fn summary(&self) -> Result<Summary, ApiError> {
    self.get_json::<_, ()>("summary", None).await
  }

  /// Most recent activity log entries, newest first
  pub async fn agent_logs(&self, limit: u32) -> Result<Vec<AgentLog>, ApiError> {
    self.get_json("agent-logs", Some(&[("limit", limit)])).await
  }

  pub async fn ask_assistant(&self, query: &str) -> Result<AssistantReply, ApiError> {
    self
      .post_json("ai-assistant", &AssistantRequest { query })
      .await
  }
}
