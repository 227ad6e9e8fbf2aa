//! API client: URL building and status checking over a transport.

use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::{Error, Result};
use serde::Serialize;
use tracing::instrument;

/// Path of the current user's playlist collection.
pub const MY_PLAYLISTS_PATH: &str = "/v1/me/playlists";

/// API client bound to a base URL.
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    base_url: String,
}

impl<T: HttpTransport> ApiClient<T> {
    /// Creates a client. A trailing slash on `base_url` is ignored.
    #[must_use]
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Joins `path` (starting with `/`) onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request, failing on any non-2xx status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] with status and body for non-2xx responses,
    /// or the transport's error if no response arrived.
    pub fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Sending request");
        let response = self.transport.send(request)?;
        if response.is_success() {
            Ok(response)
        } else {
            tracing::debug!(status = response.status, "Request rejected");
            Err(Error::Http {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Sends a `GET`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub fn get(&self, url: &str) -> Result<ApiResponse> {
        self.send(&ApiRequest::get(url))
    }

    /// Sends a `POST` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if `body` cannot be serialized.
    pub fn post_json(&self, url: &str, body: &impl Serialize) -> Result<ApiResponse> {
        self.send(&ApiRequest::post(url, to_json(body)?))
    }

    /// Sends a `DELETE` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if `body` cannot be serialized.
    pub fn delete_json(&self, url: &str, body: &impl Serialize) -> Result<ApiResponse> {
        self.send(&ApiRequest::delete(url, to_json(body)?))
    }

    /// Checks that the bearer token is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] (typically 401) if the token is rejected.
    #[instrument(skip(self))]
    pub fn verify_token(&self) -> Result<()> {
        tracing::info!("Checking that the OAuth token is still alive");
        self.get(&self.url(MY_PLAYLISTS_PATH)).map(|_| ())
    }
}

fn to_json(body: &impl Serialize) -> Result<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| Error::OperationFailed {
        operation: "encode_request".to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed {
        status: u16,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl HttpTransport for Fixed {
        fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(ApiResponse::new(self.status, "{\"error\":\"nope\"}"))
        }
    }

    fn fixed(status: u16) -> Fixed {
        Fixed {
            status,
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new(fixed(200), "http://localhost:9/");
        assert_eq!(client.url("/v1/me/tracks"), "http://localhost:9/v1/me/tracks");
    }

    #[test]
    fn test_non_success_is_http_error_with_body() {
        let client = ApiClient::new(fixed(401), "http://localhost");
        let err = client.verify_token().unwrap_err();
        assert!(matches!(
            err,
            Error::Http { status: 401, ref body } if body.contains("nope")
        ));
    }

    #[test]
    fn test_verify_token_hits_playlists() {
        let client = ApiClient::new(fixed(200), "http://localhost");
        client.verify_token().unwrap();
        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://localhost/v1/me/playlists");
    }

    #[test]
    fn test_post_json_serializes_body() {
        let client = ApiClient::new(fixed(201), "http://localhost");
        client
            .post_json("http://localhost/x", &serde_json::json!({"a": 1}))
            .unwrap();
        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].body, Some(serde_json::json!({"a": 1})));
    }
}
