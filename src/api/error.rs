use thiserror::Error;

/// Failure of a single API request.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Connection, timeout or body read failure
  #[error("request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status
  #[error("server returned {status} for {url}: {body}")]
  Status { url: String, status: u16, body: String },

  /// The body did not match the expected shape
  #[error("unexpected response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },
}
