//! Typed API calls built on the shared courier HTTP client.
//!
//! The shared client reads its base URL from `API_BASE_URL` (and optionally
//! `API_TIMEOUT_SECS`) the first time it is used.
//!
//! ```rust,no_run
//! # async fn run() -> courier_api::Result<()> {
//! let posts = courier_api::posts::get_posts().await?;
//! let first = courier_api::posts::get_posts_by_id(posts[0].id).await?;
//! assert_eq!(first.id, posts[0].id);
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod posts;

pub use courier_http_client::{HttpClientError, Result};
pub use http::{ENV_PREFIX, build_client, http};
pub use posts::{Post, PostsApi};
