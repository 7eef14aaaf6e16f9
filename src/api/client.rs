use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::ApiErrors;
use super::error::FetchError;
use crate::config::ApiConfig;

/// Query string parameters for a GET request
pub type QueryParams = BTreeMap<&'static str, String>;

/// The transport boundary: a parameterized GET returning a decoded body.
///
/// Retries and timeouts belong to implementors; callers see every failure
/// as a [`FetchError`].
pub trait HttpGet: Clone + Send + Sync + 'static {
  fn get<T>(
    &self,
    path: &str,
    query: &QueryParams,
  ) -> impl Future<Output = Result<T, FetchError>> + Send
  where
    T: DeserializeOwned + Send + 'static;
}

/// Finance API client wrapper
#[derive(Clone)]
pub struct ApiClient {
  client: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
    // Url::join drops the last path segment unless the base ends with '/'
    let base = if config.url.ends_with('/') {
      config.url.clone()
    } else {
      format!("{}/", config.url)
    };
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API url {}: {}", config.url, e))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      token,
    })
  }

  fn url(&self, path: &str, query: &QueryParams) -> Result<Url, FetchError> {
    let mut url = self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| FetchError::network(format!("invalid request path {}: {}", path, e)))?;
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query.iter());
    }
    Ok(url)
  }
}

impl HttpGet for ApiClient {
  async fn get<T>(&self, path: &str, query: &QueryParams) -> Result<T, FetchError>
  where
    T: DeserializeOwned + Send + 'static,
  {
    let url = self.url(path, query)?;
    debug!(%url, "GET");

    let mut request = self.client.get(url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| FetchError::network(e.to_string()))?;
    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::network(e.to_string()))?;

    decode(status, &body)
  }
}

/// Map a response status and body onto the decoded value or a [`FetchError`].
///
/// Non-2xx bodies are read as `{errors: {field: [message]}}`; anything else
/// there yields an empty error map.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, FetchError> {
  if !status.is_success() {
    let errors = serde_json::from_slice::<ApiErrors>(body)
      .map(|b| b.errors)
      .unwrap_or_default();
    return Err(FetchError::Server {
      status: status.as_u16(),
      errors,
    });
  }

  serde_json::from_slice(body).map_err(|e| FetchError::Decode {
    message: e.to_string(),
  })
}
