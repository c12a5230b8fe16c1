//! Shared application client.

use courier_http_client::{HttpClient, HttpClientConfig, LoggingInterceptor, Result};
use once_cell::sync::OnceCell;

/// Prefix of the environment variables the shared client is configured from.
pub const ENV_PREFIX: &str = "API";

static HTTP: OnceCell<HttpClient> = OnceCell::new();

/// Build an application client: the given configuration plus request and
/// response logging at the instance level.
pub fn build_client(config: HttpClientConfig) -> Result<HttpClient> {
    Ok(HttpClient::new(config)?.with_interceptor(LoggingInterceptor::new()))
}

/// The process-wide client, built from the environment on first use.
///
/// A failed initialisation is not cached; the next call tries again.
pub fn http() -> Result<&'static HttpClient> {
    HTTP.get_or_try_init(|| build_client(HttpClientConfig::from_env(ENV_PREFIX)?))
}
