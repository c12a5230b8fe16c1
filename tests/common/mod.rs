//! Common test utilities

#![allow(dead_code)]

use courier::{HttpClient, HttpClientConfig};
use std::time::Duration;
use wiremock::MockServer;

/// Install a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client pointed at the mock server.
pub fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .timeout(Duration::from_secs(5))
            .build(),
    )
    .expect("Failed to build test client")
}

/// Poll until `condition` holds, yielding to other tasks in between.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached");
}
