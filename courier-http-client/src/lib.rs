//! # Courier HTTP Client
//!
//! A thin request wrapper over a pluggable HTTP transport, with a layered
//! interceptor pipeline and per-URL request cancellation.
//!
//! ## Features
//!
//! - **Layered interceptors**: call-level, instance-level and built-in global
//!   stages run in a fixed order
//! - **Cancellation**: every in-flight request is registered by URL and can be
//!   cancelled individually or all at once
//! - **Default headers**: mutable at runtime, applied to future requests
//! - **Pluggable transport**: `reqwest` by default, any [`Transport`] for tests
//!
//! ## Stage order
//!
//! ```text
//! call request -> instance request -> global request -> transport
//!   -> instance response -> global response -> call response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http_client::{HttpClient, HttpClientConfig};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Post {
//!     id: u32,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(
//!         HttpClientConfig::builder()
//!             .base_url("https://jsonplaceholder.typicode.com")
//!             .build(),
//!     )?;
//!
//!     let posts: Vec<Post> = client
//!         .get("/posts")
//!         .on_response(|posts: Vec<Post>| {
//!             tracing::info!(count = posts.len(), "Fetched posts");
//!             Ok(posts)
//!         })
//!         .send()
//!         .await?;
//!
//!     println!("First title: {}", posts[0].title);
//!     Ok(())
//! }
//! ```
//!
//! ## Cancellation
//!
//! ```rust,no_run
//! use courier_http_client::HttpClient;
//!
//! # async fn run(client: HttpClient) {
//! let slow = {
//!     let client = client.clone();
//!     tokio::spawn(async move { client.get::<serde_json::Value>("/reports").send().await })
//! };
//!
//! client.cancel_request("/reports");
//! assert!(slow.await.unwrap().unwrap_err().is_cancelled());
//! # }
//! ```

mod cancel;
mod client;
mod config;
mod env;
mod error;
mod interceptor;
mod request;
mod response;
mod transport;

pub use cancel::{CancellationRegistry, Registration};
pub use client::HttpClient;
pub use config::{DEFAULT_TIMEOUT, HttpClientConfig, HttpClientConfigBuilder};
pub use env::EnvLoader;
pub use error::{HttpClientError, Result};
pub use interceptor::{Interceptor, LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
pub use request::{OnRequest, OnResponse, RequestBuilder, RequestConfig, RequestInterceptors};
pub use response::Response;
pub use transport::{PreparedRequest, ReqwestTransport, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use courier_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::interceptor::{
        Interceptor, LoggingInterceptor, RequestInterceptor, ResponseInterceptor,
    };
    pub use crate::request::{RequestBuilder, RequestConfig, RequestInterceptors};
    pub use crate::response::Response;
    pub use crate::transport::{PreparedRequest, ReqwestTransport, Transport};
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
