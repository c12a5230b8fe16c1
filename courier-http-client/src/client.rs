//! Request wrapper implementation.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::cancel::{CancellationRegistry, Registration};
use crate::interceptor::{InterceptorChain, RequestOnly, ResponseOnly};
use crate::{
    HttpClientConfig, HttpClientError, Interceptor, PreparedRequest, ReqwestTransport,
    RequestBuilder, RequestConfig, RequestInterceptor, RequestInterceptors, Response,
    ResponseInterceptor, Result, Transport,
};

/// HTTP request wrapper with layered interceptors and per-URL cancellation.
///
/// Stages run in a fixed order:
///
/// - request: call-level, then instance-level (registration order), then the
///   global stage that registers the request for cancellation;
/// - response: instance-level, then the global stage that deregisters the
///   request and decodes the body, then call-level.
///
/// Clones share the transport, default headers, interceptors and the
/// cancellation registry.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: Arc<HttpClientConfig>,
    default_headers: Arc<RwLock<HeaderMap>>,
    interceptors: Arc<InterceptorChain>,
    registry: Arc<CancellationRegistry>,
}

/// Registry slot owned by one in-flight request. Dropping it deregisters the
/// request, including when the caller drops the request future.
struct InFlight<'a> {
    registry: &'a CancellationRegistry,
    registration: Registration,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.registry.complete(&self.registration);
    }
}

impl HttpClient {
    /// Create a client that sends requests through `reqwest`.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(config: HttpClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        if let Some(base) = &config.base_url {
            Url::parse(base).map_err(|e| HttpClientError::InvalidUrl(format!("{base}: {e}")))?;
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            default_headers: Arc::new(RwLock::new(default_headers)),
            interceptors: Arc::new(InterceptorChain::default()),
            registry: Arc::new(CancellationRegistry::new()),
        })
    }

    /// Register an instance-level interceptor pair.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        Arc::make_mut(&mut self.interceptors).push(Arc::new(interceptor));
        self
    }

    /// Register an instance-level request interceptor.
    pub fn with_request_interceptor(self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.with_interceptor(RequestOnly(interceptor))
    }

    /// Register an instance-level response interceptor.
    pub fn with_response_interceptor(self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.with_interceptor(ResponseOnly(interceptor))
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Number of instance-level interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Create a GET request builder.
    pub fn get<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::GET, url.into())
    }

    /// Create a POST request builder.
    pub fn post<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::POST, url.into())
    }

    /// Create a PUT request builder.
    pub fn put<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::PUT, url.into())
    }

    /// Create a PATCH request builder.
    pub fn patch<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::PATCH, url.into())
    }

    /// Create a DELETE request builder.
    pub fn delete<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::DELETE, url.into())
    }

    /// Create a HEAD request builder.
    pub fn head<T: DeserializeOwned>(&self, url: impl Into<String>) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, Method::HEAD, url.into())
    }

    /// Create a request builder with a custom method.
    pub fn request_builder<T: DeserializeOwned>(
        &self,
        method: Method,
        url: impl Into<String>,
    ) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, method, url.into())
    }

    /// Run a request through the full pipeline and decode the response data.
    ///
    /// Failures are returned as produced by the transport or the instance
    /// interceptors; call-level hooks never see them.
    pub async fn request<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
        interceptors: RequestInterceptors<T>,
    ) -> Result<T> {
        let RequestInterceptors {
            on_request,
            on_response,
        } = interceptors;

        let config = self.with_default_headers(config);
        let config = match on_request {
            Some(hook) => hook(config)?,
            None => config,
        };

        let data = self.dispatch(config).await?;

        match on_response {
            Some(hook) => hook(data),
            None => Ok(data),
        }
    }

    /// Merge the instance default headers under the per-request ones, so every
    /// interceptor sees the headers that will actually be sent.
    fn with_default_headers(&self, mut config: RequestConfig) -> RequestConfig {
        let mut headers = self.default_headers.read().clone();
        headers.extend(std::mem::take(&mut config.headers));
        config.headers = headers;
        config
    }

    async fn dispatch<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<T> {
        let requested = config.url.clone();
        let (result, in_flight) = match self.interceptors.run_request(Ok(config)).await {
            Ok(config) => {
                let (prepared, in_flight) = self.begin(config);
                let result = match prepared {
                    Ok(request) => self
                        .transport
                        .send(request)
                        .await
                        .and_then(|response| self.settle(response)),
                    Err(error) => Err(error),
                };
                (result, Some(in_flight))
            }
            Err(error) => (Err(error), None),
        };

        let result = self.interceptors.run_response(result).await;
        self.finish(&requested, in_flight, result)
    }

    /// Global request stage: register for cancellation, attach the signal and
    /// resolve the URL against the base URL.
    fn begin(&self, config: RequestConfig) -> (Result<PreparedRequest>, InFlight<'_>) {
        let registration = self.registry.register(&config.url);
        debug!(method = %config.method, url = %config.url, "Dispatching request");

        let prepared = self.prepare(config, &registration);
        let in_flight = InFlight {
            registry: &self.registry,
            registration,
        };
        (prepared, in_flight)
    }

    fn prepare(&self, config: RequestConfig, registration: &Registration) -> Result<PreparedRequest> {
        let mut url = self.resolve_url(&config.url)?;
        if !config.params.is_empty() {
            url.query_pairs_mut().extend_pairs(config.params.iter());
        }

        Ok(PreparedRequest {
            method: config.method,
            url,
            headers: config.headers,
            body: config.body,
            timeout: config.timeout.unwrap_or(self.config.timeout),
            signal: registration.token().clone(),
            key: registration.url().to_string(),
        })
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        match &self.config.base_url {
            Some(base) => Url::parse(&format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ))
            .map_err(|e| HttpClientError::InvalidUrl(format!("{url}: {e}"))),
            None => Err(HttpClientError::InvalidUrl(format!(
                "{url}: relative URL without a base URL"
            ))),
        }
    }

    fn settle(&self, response: Response) -> Result<Response> {
        if self.config.validate_status {
            response.error_for_status()
        } else {
            Ok(response)
        }
    }

    /// Global response stage: deregister and unwrap the data payload.
    ///
    /// `requested` is the URL the instance stage was given; it is logged when
    /// the request never got as far as registration.
    fn finish<T: DeserializeOwned>(
        &self,
        requested: &str,
        in_flight: Option<InFlight<'_>>,
        result: Result<Response>,
    ) -> Result<T> {
        let url = in_flight
            .as_ref()
            .map_or_else(|| requested.to_string(), |f| f.registration.url().to_string());
        drop(in_flight);

        match result {
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Request completed");
                response.json()
            }
            Err(error) if error.is_cancelled() => {
                debug!(url = %url, "Request cancelled");
                Err(error)
            }
            Err(error) => {
                warn!(url = %url, error = %error, "Request failed");
                Err(error)
            }
        }
    }

    /// Cancel every in-flight request and clear the registry.
    ///
    /// Returns immediately; the cancelled requests resolve with
    /// [`HttpClientError::Cancelled`] on their own.
    pub fn cancel_all_requests(&self) {
        self.registry.cancel_all();
    }

    /// Cancel the in-flight request registered under `url`, if any.
    pub fn cancel_request(&self, url: &str) {
        self.registry.cancel(url);
    }

    /// Cancel the in-flight requests registered under each of `urls`.
    /// Unknown URLs are ignored.
    pub fn cancel_requests<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.registry.cancel(url.as_ref());
        }
    }

    /// URLs with a registered in-flight request, sorted.
    pub fn pending_requests(&self) -> Vec<String> {
        self.registry.urls()
    }

    /// Whether `url` has a registered in-flight request.
    pub fn is_pending(&self, url: &str) -> bool {
        self.registry.contains(url)
    }

    /// Merge headers into the defaults used by every future request.
    ///
    /// All pairs are validated before any is applied.
    pub fn set_header<I, K, V>(&self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parsed = headers
            .into_iter()
            .map(|(name, value)| parse_header(name.as_ref(), value.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut defaults = self.default_headers.write();
        for (name, value) in parsed {
            defaults.insert(name, value);
        }
        Ok(())
    }

    /// Snapshot of the current default headers.
    pub fn default_headers(&self) -> HeaderMap {
        self.default_headers.read().clone()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors.len())
            .field("registry", &self.registry)
            .finish()
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http::StatusCode;
    use parking_lot::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Transport that records what it was given and answers from a fixed body.
    struct StubTransport {
        log: Log,
        status: StatusCode,
        body: &'static str,
        delay: Duration,
        seen: Arc<Mutex<Vec<PreparedRequest>>>,
    }

    impl StubTransport {
        fn new(log: &Log, body: &'static str) -> Self {
            Self {
                log: log.clone(),
                status: StatusCode::OK,
                body,
                delay: Duration::ZERO,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: PreparedRequest) -> Result<Response> {
            self.log.lock().push("transport".to_string());
            self.seen.lock().push(request.clone());
            let signal = request.signal.clone();
            tokio::select! {
                () = signal.cancelled() => Err(HttpClientError::Cancelled { url: request.key }),
                () = tokio::time::sleep(self.delay) => Ok(Response::new(
                    self.status,
                    HeaderMap::new(),
                    self.body,
                    request.url,
                )),
            }
        }
    }

    struct Recording {
        log: Log,
        name: &'static str,
    }

    #[async_trait]
    impl Interceptor for Recording {
        async fn intercept_request(&self, request: RequestConfig) -> Result<RequestConfig> {
            self.log.lock().push(format!("{}-request", self.name));
            Ok(request)
        }

        async fn intercept_response(&self, response: Response) -> Result<Response> {
            self.log.lock().push(format!("{}-response", self.name));
            Ok(response)
        }

        async fn response_error(&self, error: HttpClientError) -> Result<Response> {
            self.log.lock().push(format!("{}-error", self.name));
            Err(error)
        }
    }

    /// Records each instance stage together with whether `key` is registered
    /// at that point.
    struct Watching {
        log: Log,
        observer: HttpClient,
        key: &'static str,
    }

    #[async_trait]
    impl Interceptor for Watching {
        async fn intercept_request(&self, request: RequestConfig) -> Result<RequestConfig> {
            let pending = self.observer.is_pending(self.key);
            self.log.lock().push(format!("instance-request pending={pending}"));
            Ok(request)
        }

        async fn intercept_response(&self, response: Response) -> Result<Response> {
            let pending = self.observer.is_pending(self.key);
            self.log.lock().push(format!("instance-response pending={pending}"));
            Ok(response)
        }
    }

    fn config() -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url("http://api.test/v1/")
            .build()
    }

    #[tokio::test]
    async fn test_stage_order() {
        let log: Log = Arc::default();
        let base = HttpClient::with_transport(config(), StubTransport::new(&log, "[1,2]")).unwrap();
        let client = base.clone().with_interceptor(Watching {
            log: log.clone(),
            observer: base,
            key: "/numbers",
        });

        let call_log = log.clone();
        let response_log = log.clone();
        let observer = client.clone();
        let data = client
            .get::<Vec<u32>>("/numbers")
            .on_request(move |config| {
                call_log.lock().push("call-request".to_string());
                Ok(config)
            })
            .on_response(move |data| {
                let pending = observer.is_pending("/numbers");
                response_log.lock().push(format!("call-response pending={pending}"));
                Ok(data)
            })
            .send()
            .await
            .unwrap();

        assert_eq!(data, vec![1, 2]);
        assert_eq!(
            *log.lock(),
            vec![
                "call-request",
                "instance-request pending=false",
                "transport",
                "instance-response pending=true",
                "call-response pending=false"
            ]
        );
    }

    #[tokio::test]
    async fn test_prepared_request_resolution() {
        let log: Log = Arc::default();
        let transport = StubTransport::new(&log, "null");
        let seen = transport.seen.clone();
        let client = HttpClient::with_transport(
            HttpClientConfig::builder()
                .base_url("http://api.test/v1/")
                .default_header("X-App", "courier")
                .timeout(Duration::from_secs(9))
                .build(),
            transport,
        )
        .unwrap();

        client
            .delete::<()>("/posts/3")
            .query("soft", "true")
            .header("X-App", "override")
            .send()
            .await
            .unwrap();

        let seen = seen.lock();
        let request = &seen[0];
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.url.as_str(), "http://api.test/v1/posts/3?soft=true");
        assert_eq!(request.headers.get("x-app").unwrap(), "override");
        assert_eq!(request.timeout, Duration::from_secs(9));
        assert_eq!(request.key, "/posts/3");
    }

    #[tokio::test]
    async fn test_registry_cleared_on_success_and_failure() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, "oops");
        transport.status = StatusCode::INTERNAL_SERVER_ERROR;
        let client = HttpClient::with_transport(config(), transport)
            .unwrap()
            .with_interceptor(Recording {
                log: log.clone(),
                name: "instance",
            });

        let err = client.get::<()>("/broken").send().await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(client.pending_requests().is_empty());
        assert_eq!(*log.lock(), vec!["instance-request", "transport", "instance-error"]);
    }

    #[tokio::test]
    async fn test_validate_status_disabled() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, r#"{"error":"missing"}"#);
        transport.status = StatusCode::NOT_FOUND;
        let client = HttpClient::with_transport(
            HttpClientConfig::builder()
                .base_url("http://api.test")
                .validate_status(false)
                .build(),
            transport,
        )
        .unwrap();

        let body: serde_json::Value = client.get("/missing").send().await.unwrap();
        assert_eq!(body["error"], "missing");
    }

    #[tokio::test]
    async fn test_call_response_hook_not_applied_on_failure() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, "");
        transport.status = StatusCode::BAD_GATEWAY;
        let client = HttpClient::with_transport(config(), transport).unwrap();

        let err = client
            .get::<u32>("/x")
            .on_response(|_| Err(HttpClientError::interceptor("must not run")))
            .send()
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(502));
    }

    #[tokio::test]
    async fn test_call_request_error_skips_dispatch() {
        let log: Log = Arc::default();
        let client = HttpClient::with_transport(config(), StubTransport::new(&log, "1")).unwrap();

        let err = client
            .get::<u32>("/x")
            .on_request(|_| Err(HttpClientError::interceptor("denied")))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpClientError::Interceptor(msg) if msg == "denied"));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_instance_request_error_reaches_response_error_hooks() {
        let log: Log = Arc::default();
        let client = HttpClient::with_transport(config(), StubTransport::new(&log, "1"))
            .unwrap()
            .with_request_interceptor(|_: RequestConfig| -> Result<RequestConfig> {
                Err(HttpClientError::interceptor("blocked"))
            })
            .with_interceptor(Recording {
                log: log.clone(),
                name: "instance",
            });

        let err = client.get::<u32>("/x").send().await.unwrap_err();
        assert!(matches!(err, HttpClientError::Interceptor(_)));
        assert_eq!(*log.lock(), vec!["instance-error"]);
        assert!(client.pending_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_request_cancels_latest_only() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, "7");
        transport.delay = Duration::from_secs(10);
        let client = HttpClient::with_transport(config(), transport).unwrap();

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.get::<u32>("/x").send().await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.get::<u32>("/x").send().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(client.pending_requests(), vec!["/x".to_string()]);

        client.cancel_request("/x");
        assert!(!client.is_pending("/x"));

        let second = second.await.unwrap().unwrap_err();
        assert!(second.is_cancelled());
        assert_eq!(first.await.unwrap().unwrap(), 7);
        assert!(client.pending_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_requests() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, "1");
        transport.delay = Duration::from_secs(10);
        let client = HttpClient::with_transport(config(), transport).unwrap();

        let handles: Vec<_> = ["/a", "/b", "/c"]
            .into_iter()
            .map(|url| {
                let client = client.clone();
                tokio::spawn(async move { client.get::<u32>(url).send().await })
            })
            .collect();
        tokio::task::yield_now().await;
        assert_eq!(client.pending_requests().len(), 3);

        client.cancel_requests(["/b", "/unknown"]);
        assert_eq!(client.pending_requests(), vec!["/a".to_string(), "/c".to_string()]);

        client.cancel_all_requests();
        assert!(client.pending_requests().is_empty());

        for handle in handles {
            assert!(handle.await.unwrap().unwrap_err().is_cancelled());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_future_deregisters() {
        let log: Log = Arc::default();
        let mut transport = StubTransport::new(&log, "1");
        transport.delay = Duration::from_secs(10);
        let client = HttpClient::with_transport(config(), transport).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            client.get::<u32>("/slow").send(),
        )
        .await;
        assert!(result.is_err());
        assert!(client.pending_requests().is_empty());
    }

    #[tokio::test]
    async fn test_set_header_applies_to_later_requests() {
        let log: Log = Arc::default();
        let transport = StubTransport::new(&log, "null");
        let seen = transport.seen.clone();
        let client = HttpClient::with_transport(config(), transport).unwrap();

        client.get::<()>("/before").send().await.unwrap();
        client.set_header([("X-Test", "1")]).unwrap();
        client.get::<()>("/after").send().await.unwrap();

        let seen = seen.lock();
        assert!(seen[0].headers.get("x-test").is_none());
        assert_eq!(seen[1].headers.get("x-test").unwrap(), "1");
        assert_eq!(client.default_headers().get("x-test").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_interceptors_see_default_headers() {
        let log: Log = Arc::default();
        let seen_by_hooks: Log = Arc::default();
        let hook_log = seen_by_hooks.clone();
        let client = HttpClient::with_transport(config(), StubTransport::new(&log, "null"))
            .unwrap()
            .with_request_interceptor(move |config: RequestConfig| -> Result<RequestConfig> {
                let value = config.headers.get("x-test").map(|v| v.to_str().unwrap_or("?").to_string());
                hook_log.lock().push(format!("instance {value:?}"));
                Ok(config)
            });

        client.set_header([("X-Test", "1")]).unwrap();

        let call_log = seen_by_hooks.clone();
        client
            .get::<()>("/a")
            .on_request(move |config| {
                call_log.lock().push(format!("call {}", config.headers.contains_key("x-test")));
                Ok(config)
            })
            .send()
            .await
            .unwrap();

        assert_eq!(*seen_by_hooks.lock(), vec!["call true", "instance Some(\"1\")"]);
    }

    #[tokio::test]
    async fn test_interceptor_can_remove_default_header() {
        let log: Log = Arc::default();
        let transport = StubTransport::new(&log, "null");
        let seen = transport.seen.clone();
        let client = HttpClient::with_transport(
            HttpClientConfig::builder()
                .base_url("http://api.test")
                .default_header("Authorization", "Bearer secret")
                .default_header("X-App", "courier")
                .build(),
            transport,
        )
        .unwrap()
        .with_request_interceptor(|mut config: RequestConfig| -> Result<RequestConfig> {
            config.headers.remove(http::header::AUTHORIZATION);
            Ok(config)
        });

        client.get::<()>("/public").send().await.unwrap();

        let seen = seen.lock();
        assert!(seen[0].headers.get("authorization").is_none());
        assert_eq!(seen[0].headers.get("x-app").unwrap(), "courier");
        assert!(client.default_headers().contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_early_failure_logs_requested_url() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let captured = captured.clone();
                move || captured.clone()
            })
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let log: Log = Arc::default();
        let client = HttpClient::with_transport(config(), StubTransport::new(&log, "1"))
            .unwrap()
            .with_request_interceptor(|_: RequestConfig| -> Result<RequestConfig> {
                Err(HttpClientError::interceptor("blocked"))
            });

        client.get::<u32>("/blocked").send().await.unwrap_err();

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("Request failed"), "{output}");
        assert!(output.contains("url=/blocked"), "{output}");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_set_header_rejects_invalid_pairs_atomically() {
        let log: Log = Arc::default();
        let client = HttpClient::with_transport(config(), StubTransport::new(&log, "")).unwrap();

        let err = client
            .set_header([("X-Ok", "1"), ("bad name", "2")])
            .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidHeader(_)));
        assert!(client.default_headers().is_empty());
    }

    #[tokio::test]
    async fn test_relative_url_without_base() {
        let log: Log = Arc::default();
        let client = HttpClient::with_transport(
            HttpClientConfig::default(),
            StubTransport::new(&log, "1"),
        )
        .unwrap();

        let err = client.get::<u32>("/posts").send().await.unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidUrl(_)));
        assert!(client.pending_requests().is_empty());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_invalid_base_url() {
        let log: Log = Arc::default();
        let result = HttpClient::with_transport(
            HttpClientConfig::builder().base_url("not a url").build(),
            StubTransport::new(&log, ""),
        );
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }
}
