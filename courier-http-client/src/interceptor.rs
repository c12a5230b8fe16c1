//! Instance-level request and response interceptors.

use crate::{HttpClientError, RequestConfig, Response, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Interceptor pair registered on a client instance.
///
/// Every method has a pass-through default, so an implementation only
/// overrides the hooks it cares about. The error hooks receive the failure
/// produced by the preceding stage and may recover by returning `Ok`.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Intercept and optionally modify the request before sending.
    async fn intercept_request(&self, request: RequestConfig) -> Result<RequestConfig> {
        Ok(request)
    }

    /// Handle a failure raised by an earlier request stage.
    async fn request_error(&self, error: HttpClientError) -> Result<RequestConfig> {
        Err(error)
    }

    /// Intercept and optionally modify the response after receiving.
    async fn intercept_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }

    /// Handle a transport failure or a failure raised by an earlier
    /// response stage.
    async fn response_error(&self, error: HttpClientError) -> Result<Response> {
        Err(error)
    }
}

/// Request-only interceptor.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Intercept and optionally modify the request.
    async fn intercept(&self, request: RequestConfig) -> Result<RequestConfig>;
}

/// Response-only interceptor.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Intercept and optionally modify the response.
    async fn intercept(&self, response: Response) -> Result<Response>;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    async fn intercept(&self, request: RequestConfig) -> Result<RequestConfig> {
        self(request)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(Response) -> Result<Response> + Send + Sync,
{
    async fn intercept(&self, response: Response) -> Result<Response> {
        self(response)
    }
}

pub(crate) struct RequestOnly<I>(pub(crate) I);

#[async_trait]
impl<I: RequestInterceptor> Interceptor for RequestOnly<I> {
    async fn intercept_request(&self, request: RequestConfig) -> Result<RequestConfig> {
        self.0.intercept(request).await
    }
}

pub(crate) struct ResponseOnly<I>(pub(crate) I);

#[async_trait]
impl<I: ResponseInterceptor> Interceptor for ResponseOnly<I> {
    async fn intercept_response(&self, response: Response) -> Result<Response> {
        self.0.intercept(response).await
    }
}

/// Ordered instance-level interceptors.
///
/// Both directions walk the list in registration order. A stage receives the
/// previous stage's output, or its error through the matching error hook.
#[derive(Clone, Default)]
pub(crate) struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub(crate) fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub(crate) fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub(crate) async fn run_request(&self, mut state: Result<RequestConfig>) -> Result<RequestConfig> {
        for interceptor in &self.interceptors {
            state = match state {
                Ok(request) => interceptor.intercept_request(request).await,
                Err(error) => interceptor.request_error(error).await,
            };
        }
        state
    }

    pub(crate) async fn run_response(&self, mut state: Result<Response>) -> Result<Response> {
        for interceptor in &self.interceptors {
            state = match state {
                Ok(response) => interceptor.intercept_response(response).await,
                Err(error) => interceptor.response_error(error).await,
            };
        }
        state
    }
}

/// Logging interceptor that logs requests and responses.
#[derive(Debug, Default)]
pub struct LoggingInterceptor {
    log_headers: bool,
}

impl LoggingInterceptor {
    /// Create a new logging interceptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept_request(&self, request: RequestConfig) -> Result<RequestConfig> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in &request.headers {
                tracing::trace!(header = %name, value = ?value, "Request header");
            }
        }

        Ok(request)
    }

    async fn intercept_response(&self, response: Response) -> Result<Response> {
        tracing::debug!(
            status = %response.status(),
            url = %response.url(),
            "Received HTTP response"
        );

        if self.log_headers {
            for (name, value) in response.headers() {
                tracing::trace!(header = %name, value = ?value, "Response header");
            }
        }

        Ok(response)
    }

    async fn response_error(&self, error: HttpClientError) -> Result<Response> {
        tracing::debug!(error = %error, "HTTP request failed");
        Err(error)
    }
}
