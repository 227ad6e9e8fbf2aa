//! HTTP transport trait and `reqwest` implementation.
//!
//! The trait is the seam between the synchronization logic and the network:
//! production code uses [`ReqwestTransport`], tests script responses.

use crate::config::SyncConfig;
use crate::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP method subset used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// An outgoing request. Authentication is the transport's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }

    /// Creates a `DELETE` request with a JSON body.
    #[must_use]
    pub fn delete(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Delete,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| Error::OperationFailed {
            operation: "decode_response".to_string(),
            cause: e.to_string(),
        })
    }
}

/// Trait for HTTP transports.
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).send(request)
    }
}

/// Blocking `reqwest` transport carrying the bearer token on every request.
pub struct ReqwestTransport {
    /// HTTP client with connection pooling and default headers.
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds the transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the token is missing or not a
    /// valid header value, or [`Error::OperationFailed`] if the client
    /// cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let token = config.token.resolve()?;

        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(|_| {
                Error::Configuration("bearer token contains invalid characters".to_string())
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(format!("randomness/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if config.http_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.http_timeout_ms));
        }

        let client = builder.build().map_err(|e| Error::OperationFailed {
            operation: "build_http_client".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self { client })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            metrics::counter!(
                "http_requests_total",
                "method" => request.method.as_str(),
                "status" => "network_error"
            )
            .increment(1);
            Error::OperationFailed {
                operation: "http_request".to_string(),
                cause: e.to_string(),
            }
        })?;

        let status = response.status().as_u16();
        metrics::counter!(
            "http_requests_total",
            "method" => request.method.as_str(),
            "status" => status.to_string()
        )
        .increment(1);

        let body = response.text().map_err(|e| Error::OperationFailed {
            operation: "read_response_body".to_string(),
            cause: e.to_string(),
        })?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(201, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(199, "").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = ApiResponse::new(200, "not json");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "decode_response"));
    }

    #[test]
    fn test_transport_requires_token() {
        let config = SyncConfig {
            token: crate::config::TokenSource::Environment(
                "RANDOMNESS_TEST_MISSING_TOKEN".to_string(),
            ),
            ..SyncConfig::default()
        };
        assert!(matches!(ReqwestTransport::new(&config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_transport_builds_with_inline_token() {
        let config = SyncConfig::new().with_token("secret-token");
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_request_constructors() {
        let request = ApiRequest::post("http://x/y", serde_json::json!({"uris": []}));
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.method.as_str(), "POST");
        assert!(request.body.is_some());
        assert!(ApiRequest::get("http://x").body.is_none());
    }
}
