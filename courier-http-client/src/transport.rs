//! Transport seam between the request wrapper and the network.

use crate::{HttpClientConfig, HttpClientError, Response, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including query parameters.
    pub url: Url,
    /// Instance defaults merged with per-request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Effective timeout.
    pub timeout: Duration,
    /// Cancellation signal. Once raised the transport must resolve with
    /// [`HttpClientError::Cancelled`].
    pub signal: CancellationToken,
    /// Registry key the request was dispatched under.
    pub key: String,
}

/// Performs the actual network I/O for a prepared request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response envelope.
    async fn send(&self, request: PreparedRequest) -> Result<Response>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the underlying client from the connection settings in `config`.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent);

        if config.gzip {
            builder = builder.gzip(true);
        }
        if config.brotli {
            builder = builder.brotli(true);
        }
        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        let inner = builder
            .build()
            .map_err(|e| HttpClientError::Config(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    async fn execute(&self, request: reqwest::Request, timeout: Duration) -> Result<Response> {
        let map_timeout = |e: reqwest::Error| {
            if e.is_timeout() {
                HttpClientError::Timeout(timeout)
            } else {
                HttpClientError::Http(e)
            }
        };

        let response = self.inner.execute(request).await.map_err(map_timeout)?;
        Response::from_reqwest(response).await.map_err(|e| match e {
            HttpClientError::Http(e) => map_timeout(e),
            other => other,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<Response> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
            timeout,
            signal,
            key,
        } = request;

        let mut builder = self
            .inner
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build()?;

        tokio::select! {
            biased;
            () = signal.cancelled() => Err(HttpClientError::Cancelled { url: key }),
            result = self.execute(request, timeout) => result,
        }
    }
}
