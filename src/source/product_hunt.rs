//! Product Hunt posts.
//!
//! The API pages by `days_ago`, starting at 0, while the rest of the crate
//! counts pages from 1; the conversion happens here and nowhere else.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{http, unsupported, DataSource, FeedItem, ItemDetail};
use crate::error::Result;
use crate::registry::SourceKind;

const NAME: &str = "Product Hunt";

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: u64,
    name: String,
    #[serde(default)]
    tagline: String,
    discussion_url: Option<String>,
    redirect_url: Option<String>,
    #[serde(default)]
    comments_count: u32,
    #[serde(default)]
    votes_count: u32,
    created_at: Option<DateTime<Utc>>,
}

impl From<RawPost> for FeedItem {
    fn from(post: RawPost) -> Self {
        FeedItem::new(
            post.id.to_string(),
            post.name,
            ItemDetail::Post {
                votes_count: post.votes_count,
                comments_count: post.comments_count,
                tagline: post.tagline,
                discussion_url: post.discussion_url,
            },
        )
        .with_url(post.redirect_url)
        .with_created_at(post.created_at)
    }
}

pub struct ProductHuntSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl ProductHuntSource {
    pub fn new(client: Client, endpoint: &str, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            token,
        }
    }

    /// Parse a `{"posts": [...]}` envelope.
    pub fn parse_posts(body: &str) -> serde_json::Result<Vec<FeedItem>> {
        let envelope: PostsEnvelope = serde_json::from_str(body)?;
        Ok(envelope.posts.into_iter().map(FeedItem::from).collect())
    }

    fn request(&self, kind: &SourceKind, page: u32) -> Option<RequestBuilder> {
        if *kind != SourceKind::ProductHunt {
            return None;
        }
        let days_ago = page.saturating_sub(1);
        let request = self
            .client
            .get(format!("{}v1/posts", self.endpoint))
            .query(&[("days_ago", days_ago)]);
        Some(http::with_bearer(request, self.token.as_deref()))
    }
}

#[async_trait]
impl DataSource for ProductHuntSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
        let request = self
            .request(kind, page)
            .ok_or_else(|| unsupported(self, kind))?;
        let body = http::get_body(request, NAME).await?;
        Ok(Self::parse_posts(&body)?)
    }
}
