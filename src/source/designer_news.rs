//! Designer News stories (popular, recent and search).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{http, unsupported, DataSource, FeedItem, ItemDetail};
use crate::error::Result;
use crate::registry::SourceKind;

const NAME: &str = "Designer News";

#[derive(Debug, Deserialize)]
struct StoriesEnvelope {
    #[serde(default)]
    stories: Vec<RawStory>,
}

#[derive(Debug, Deserialize)]
struct RawStory {
    id: u64,
    title: String,
    url: Option<String>,
    #[serde(default)]
    comment_count: u32,
    #[serde(default)]
    vote_count: u32,
    created_at: Option<DateTime<Utc>>,
    hostname: Option<String>,
    badge: Option<String>,
}

impl From<RawStory> for FeedItem {
    fn from(story: RawStory) -> Self {
        FeedItem::new(
            story.id.to_string(),
            story.title,
            ItemDetail::Story {
                vote_count: story.vote_count,
                comment_count: story.comment_count,
                hostname: story.hostname,
                badge: story.badge,
            },
        )
        .with_url(story.url)
        .with_created_at(story.created_at)
    }
}

pub struct DesignerNewsSource {
    client: Client,
    endpoint: String,
    client_id: Option<String>,
}

impl DesignerNewsSource {
    pub fn new(client: Client, endpoint: &str, client_id: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            client_id,
        }
    }

    /// Parse a `{"stories": [...]}` envelope.
    ///
    /// Pure (no I/O) so that tests can exercise it without the network.
    pub fn parse_stories(body: &str) -> serde_json::Result<Vec<FeedItem>> {
        let envelope: StoriesEnvelope = serde_json::from_str(body)?;
        Ok(envelope.stories.into_iter().map(FeedItem::from).collect())
    }

    fn request(&self, kind: &SourceKind, page: u32) -> Option<RequestBuilder> {
        let (path, query) = match kind {
            SourceKind::DesignerNewsPopular => ("api/v1/stories", None),
            SourceKind::DesignerNewsRecent => ("api/v1/stories/recent", None),
            SourceKind::DesignerNewsSearch { query } => ("api/v1/stories/search", Some(query)),
            _ => return None,
        };
        let mut request = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .query(&[("page", page)]);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }
        if let Some(client_id) = &self.client_id {
            request = request.query(&[("client_id", client_id)]);
        }
        Some(request)
    }
}

#[async_trait]
impl DataSource for DesignerNewsSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
        let request = self
            .request(kind, page)
            .ok_or_else(|| unsupported(self, kind))?;
        let body = http::get_body(request, NAME).await?;
        Ok(Self::parse_stories(&body)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DesignerNewsSource {
        DesignerNewsSource::new(Client::new(), "https://dn.test/", Some("abc".into()))
    }

    #[test]
    fn parse_stories_extracts_metrics() {
        let body = r#"{
            "stories": [
                {
                    "id": 101,
                    "title": "Motion in UI",
                    "url": "https://example.com/motion",
                    "comment_count": 12,
                    "vote_count": 40,
                    "created_at": "2016-03-01T10:00:00Z",
                    "hostname": "example.com",
                    "badge": "discussion"
                },
                { "id": 102, "title": "Bare story" }
            ]
        }"#;

        let items = DesignerNewsSource::parse_stories(body).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "101");
        assert_eq!(items[0].title, "Motion in UI");
        assert_eq!(items[0].url.as_deref(), Some("https://example.com/motion"));
        assert!(items[0].created_at.is_some());
        assert!(items[0].weight.is_none(), "weighing happens later");
        match &items[0].detail {
            ItemDetail::Story { vote_count, comment_count, hostname, .. } => {
                assert_eq!(*vote_count, 40);
                assert_eq!(*comment_count, 12);
                assert_eq!(hostname.as_deref(), Some("example.com"));
            }
            other => panic!("unexpected detail {other:?}"),
        }

        match &items[1].detail {
            ItemDetail::Story { vote_count, comment_count, .. } => {
                assert_eq!((*vote_count, *comment_count), (0, 0));
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn missing_envelope_is_an_empty_page() {
        assert!(DesignerNewsSource::parse_stories("{}").unwrap().is_empty());
    }

    #[test]
    fn search_request_carries_query_and_page() {
        let kind = SourceKind::DesignerNewsSearch { query: "motion design".into() };
        let request = source().request(&kind, 3).unwrap().build().unwrap();
        let url = request.url().as_str();

        assert!(url.starts_with("https://dn.test/api/v1/stories/search?"));
        assert!(url.contains("page=3"));
        assert!(url.contains("query=motion+design"));
        assert!(url.contains("client_id=abc"));
    }

    #[test]
    fn recent_uses_its_own_path() {
        let request = source()
            .request(&SourceKind::DesignerNewsRecent, 1)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/v1/stories/recent");
    }

    #[test]
    fn other_families_are_rejected() {
        assert!(source().request(&SourceKind::ProductHunt, 1).is_none());
    }

    #[test]
    fn name_returns_label() {
        assert_eq!(source().name(), "Designer News");
    }
}
