//! Shared HTTP client plumbing.
//!
//! Wraps reqwest with timeouts, default headers, status checking and error
//! classification. No retry here: the only retry in the system lives in the
//! translation flow.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use st_core::constants;
use st_core::error::{StError, StResult};

/// Thin reqwest wrapper shared by the model and push adapters.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
}

impl HttpClient {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout_ms: u64) -> StResult<Self> {
        let inner = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(format!("securetalk-flows/{}", constants::APP_VERSION))
            .build()
            .map_err(|e| StError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            timeout: Duration::from_millis(timeout_ms),
            default_headers: Vec::new(),
        })
    }

    /// Add a header sent on every request.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.default_headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a request with default headers applied.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.inner.request(method, url).timeout(self.timeout);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Send a prepared request. Transport failures become `StError`;
    /// HTTP error statuses are returned untouched.
    pub async fn send(&self, builder: RequestBuilder) -> StResult<Response> {
        builder.send().await.map_err(classify_error)
    }

    /// POST a JSON body and return the raw response.
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> StResult<Response> {
        debug!("POST {}", redact_url(url));
        self.send(self.request(Method::POST, url).json(body)).await
    }

    /// Deserialize a successful response body.
    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> StResult<T> {
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StError::Serialization(format!("failed to parse response: {e}")))
    }
}

/// Check the HTTP status code and convert to StError if needed.
pub async fn check_status(response: Response) -> StResult<Response> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(StError::AuthFailed(format!("server returned {status}: {body}")));
    }

    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(StError::ServerError {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(response)
}

/// Classify a reqwest error into an StError variant.
pub fn classify_error(e: reqwest::Error) -> StError {
    if e.is_timeout() {
        StError::Timeout(e.to_string())
    } else if e.is_connect() {
        StError::Http(format!("connection failed: {e}"))
    } else {
        StError::Http(e.to_string())
    }
}

/// Strip the query string so keys never reach the logs.
pub fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        let client = HttpClient::new(5_000).unwrap().with_header("x-test", "1");
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.default_headers.len(), 1);
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(redact_url("https://h/p?key=secret"), "https://h/p");
        assert_eq!(redact_url("https://h/p"), "https://h/p");
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let client = HttpClient::new(2_000).unwrap();
        let err = client
            .post_json("http://127.0.0.1:9/nothing", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StError::Http(_) | StError::Timeout(_)));
    }
}
