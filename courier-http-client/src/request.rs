//! Request descriptor, per-call interceptors and the request builder.

use crate::{HttpClient, HttpClientError, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Request descriptor handed through every request stage.
///
/// Stages take it by value and return a (possibly) transformed copy, so
/// nothing a stage does leaks into a request that has already been sent.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// HTTP method.
    pub method: Method,
    /// Request URL, usually relative to the configured base URL. This is also
    /// the key of the request in the cancellation registry.
    pub url: String,
    /// Query parameters appended to the URL.
    pub params: Vec<(String, String)>,
    /// Request headers. The client merges its default headers in before the
    /// first request stage; values set per request win.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Per-request timeout overriding the configured default.
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a descriptor for `method url`.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

/// Call-level request hook.
pub type OnRequest = Box<dyn FnOnce(RequestConfig) -> Result<RequestConfig> + Send>;

/// Call-level response hook, applied to the unwrapped data.
pub type OnResponse<T> = Box<dyn FnOnce(T) -> Result<T> + Send>;

/// Interceptor pair attached to a single call.
///
/// The request hook runs before any instance or global stage; the response
/// hook runs on the decoded data after all of them. Errors are never routed
/// through call-level hooks.
pub struct RequestInterceptors<T> {
    pub(crate) on_request: Option<OnRequest>,
    pub(crate) on_response: Option<OnResponse<T>>,
}

impl<T> RequestInterceptors<T> {
    /// An empty pair.
    pub fn new() -> Self {
        Self {
            on_request: None,
            on_response: None,
        }
    }

    /// Set the request hook.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RequestConfig) -> Result<RequestConfig> + Send + 'static,
    {
        self.on_request = Some(Box::new(f));
        self
    }

    /// Set the response hook.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: FnOnce(T) -> Result<T> + Send + 'static,
    {
        self.on_response = Some(Box::new(f));
        self
    }
}

impl<T> Default for RequestInterceptors<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RequestInterceptors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInterceptors")
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

/// HTTP request builder.
///
/// `T` is the type the response body is decoded into.
pub struct RequestBuilder<'a, T> {
    client: &'a HttpClient,
    config: RequestConfig,
    interceptors: RequestInterceptors<T>,
    error: Option<HttpClientError>,
}

impl<'a, T> RequestBuilder<'a, T>
where
    T: DeserializeOwned,
{
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            config: RequestConfig::new(method, url),
            interceptors: RequestInterceptors::new(),
            error: None,
        }
    }

    /// Add a header to the request.
    ///
    /// An invalid name or value is reported when the request is sent.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                self.config.headers.insert(name, value);
            }
            _ => self.fail(HttpClientError::InvalidHeader(name)),
        }
        self
    }

    /// Add multiple headers to the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers.extend(headers);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.params.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.config.params.push((k.into(), v.into()));
        }
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.config.body = Some(body.into());
        self
    }

    /// Set the request body as text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.config.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.config.body = Some(Bytes::from(text.into()));
        self
    }

    /// Set the request body as JSON.
    pub fn json<B: Serialize>(mut self, json: &B) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.config.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.config.body = Some(Bytes::from(bytes));
            }
            Err(e) => self.fail(e.into()),
        }
        self
    }

    /// Set the request body as form data.
    pub fn form<B: Serialize>(mut self, form: &B) -> Self {
        match serde_urlencoded::to_string(form) {
            Ok(encoded) => {
                self.config.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                self.config.body = Some(Bytes::from(encoded));
            }
            Err(e) => self.fail(HttpClientError::RequestBuild(e.to_string())),
        }
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.into(), p.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    /// Set the call-level request hook.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RequestConfig) -> Result<RequestConfig> + Send + 'static,
    {
        self.interceptors = self.interceptors.on_request(f);
        self
    }

    /// Set the call-level response hook.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: FnOnce(T) -> Result<T> + Send + 'static,
    {
        self.interceptors = self.interceptors.on_response(f);
        self
    }

    /// Replace the call-level interceptor pair.
    pub fn interceptors(mut self, interceptors: RequestInterceptors<T>) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Borrow the descriptor built so far.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn fail(&mut self, error: HttpClientError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Send the request and decode the response data.
    pub async fn send(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.client.request(self.config, self.interceptors).await
    }
}
