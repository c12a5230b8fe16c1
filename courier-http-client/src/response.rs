//! HTTP response envelope.

use crate::{HttpClientError, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// Response envelope produced by a [`Transport`](crate::Transport).
///
/// Instance-level interceptors see the whole envelope. The global response
/// stage strips it and hands only the decoded body to the caller.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: url::Url,
}

impl Response {
    /// Assemble a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: url::Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
        }
    }

    /// Create a response from a reqwest response, reading the full body.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the final response URL.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body, keeping status and headers.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| HttpClientError::Body(e.to_string()))
    }

    /// Parse the response body as JSON.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` targets
    /// work for bodiless responses.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get the content length if available.
    pub fn content_length(&self) -> Option<u64> {
        self.header(http::header::CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE)
    }

    /// Turn a 4xx/5xx response into an error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_client_error() || self.status.is_server_error() {
            let message = self
                .text()
                .ok()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| {
                    self.status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            Err(HttpClientError::Response {
                status: self.status.as_u16(),
                message,
            })
        } else {
            Ok(self)
        }
    }
}
