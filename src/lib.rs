// Courier - HTTP request wrapper with layered interceptors
//
// This library re-exports the request wrapper and, with the `api` feature,
// the typed API calls built on it.

// Re-export the request wrapper
pub use courier_http_client::*;

// Re-export optional crates
#[cfg(feature = "api")]
pub use courier_api as api;
