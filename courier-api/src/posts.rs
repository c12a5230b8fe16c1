//! Posts endpoints.

use courier_http_client::{HttpClient, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

use crate::http::http;

/// A post as returned by `/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub body: String,
}

/// Posts endpoints bound to a specific client.
#[derive(Debug, Clone)]
pub struct PostsApi {
    client: HttpClient,
}

impl PostsApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// `GET /posts`
    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        self.client.get("/posts").send().await
    }

    /// `GET /posts/{id}`, with call-level logging on both sides.
    pub async fn get_posts_by_id(&self, id: impl Display) -> Result<Post> {
        self.client
            .get(format!("/posts/{id}"))
            .on_request(|config| {
                debug!(url = %config.url, "Requesting post");
                Ok(config)
            })
            .on_response(|post: Post| {
                debug!(id = post.id, "Received post");
                Ok(post)
            })
            .send()
            .await
    }
}

/// `GET /posts` on the shared client.
pub async fn get_posts() -> Result<Vec<Post>> {
    PostsApi::new(http()?.clone()).get_posts().await
}

/// `GET /posts/{id}` on the shared client.
pub async fn get_posts_by_id(id: impl Display) -> Result<Post> {
    PostsApi::new(http()?.clone()).get_posts_by_id(id).await
}
