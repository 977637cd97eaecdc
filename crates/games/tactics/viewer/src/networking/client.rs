//! Credentialed HTTP client.
//!
//! Every request carries the session cookie jar and a fixed timeout. Transport
//! failures and timeouts never surface as errors: they come back as a synthetic
//! status-500 response, so callers only ever inspect `is_ok()`.

use crate::config::ViewerConfig;
use crate::errors::ApiError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Status reported for requests that never produced a response.
pub const NETWORK_ERROR_STATUS: u16 = 500;

/// A response reduced to what callers look at.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The stand-in for a request that failed or timed out.
    pub fn network_error() -> Self {
        Self {
            status: NETWORK_ERROR_STATUS,
            body: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a JSON body, treating any non-ok status as an error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if !self.is_ok() {
            return Err(ApiError::Status(self.status));
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            let body = String::from_utf8_lossy(&self.body);
            ApiError::Malformed(format!("{} - body: {}", e, body))
        })
    }

    /// Accept any ok status, ignoring the body.
    pub fn ok(&self) -> Result<(), ApiError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ApiError::Status(self.status))
        }
    }
}

/// HTTP client bound to one backend origin, sharing a cookie jar.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base: Url,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ViewerConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.server_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.server_url, e)))?;
        let jar = Arc::new(Jar::default());
        let inner = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            inner,
            base,
            jar,
            timeout: config.request_timeout,
        })
    }

    /// Resolve a server-relative path against the backend origin.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// WebSocket URL for a server-relative path (`ws` for `http`, `wss` for `https`).
    pub fn ws_url(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ApiError::InvalidUrl(format!("cannot use {} for {}", scheme, path)))?;
        Ok(url)
    }

    /// Cookie header the backend set for this origin, if any.
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        self.jar.cookies(&self.base)
    }

    pub async fn get(&self, path: &str) -> RawResponse {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: Option<&B>) -> RawResponse {
        self.send(Method::POST, path, body).await
    }

    pub async fn delete(&self, path: &str) -> RawResponse {
        self.send::<()>(Method::DELETE, path, None).await
    }

    /// Send a request. Never fails; see the module docs.
    pub async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> RawResponse {
        let url = match self.url(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("request error: {}", e);
                return RawResponse::network_error();
            }
        };

        let mut request = self.inner.request(method.clone(), url).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("{} {} failed: {}", method, path, e);
                return RawResponse::network_error();
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(bytes) => RawResponse {
                status,
                body: bytes.to_vec(),
            },
            Err(e) => {
                tracing::error!("{} {} body read failed: {}", method, path, e);
                RawResponse::network_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_follows_http_scheme() {
        let client = HttpClient::new(&ViewerConfig {
            server_url: "http://example.test:8000".to_string(),
            ..ViewerConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.ws_url("/api/ws/game/abc123").unwrap().as_str(),
            "ws://example.test:8000/api/ws/game/abc123"
        );

        let client = HttpClient::new(&ViewerConfig {
            server_url: "https://example.test".to_string(),
            ..ViewerConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.ws_url("/api/ws/global").unwrap().as_str(),
            "wss://example.test/api/ws/global"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        let result = HttpClient::new(&ViewerConfig {
            server_url: "not a url".to_string(),
            ..ViewerConfig::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_network_error_is_not_ok() {
        let response = RawResponse::network_error();
        assert!(!response.is_ok());
        assert_eq!(response.json::<serde_json::Value>(), Err(ApiError::Status(500)));
    }

    #[test]
    fn test_malformed_body() {
        let response = RawResponse {
            status: 200,
            body: b"{\"link\": 5}".to_vec(),
        };
        let result = response.json::<tactics_types::LinkRef>();
        assert!(matches!(result, Err(ApiError::Malformed(_))));
    }
}
