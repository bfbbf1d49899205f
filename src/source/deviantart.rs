//! DeviantArt popular deviations.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{http, unsupported, DataSource, FeedItem, ItemDetail};
use crate::error::Result;
use crate::registry::SourceKind;

const NAME: &str = "DeviantArt";

#[derive(Debug, Deserialize)]
struct PopularPage {
    #[serde(default)]
    results: Vec<RawDeviation>,
}

#[derive(Debug, Deserialize)]
struct RawDeviation {
    deviationid: String,
    #[serde(default)]
    title: String,
    url: Option<String>,
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    src: Option<String>,
    #[serde(default)]
    filesize: u64,
}

impl From<RawDeviation> for FeedItem {
    fn from(deviation: RawDeviation) -> Self {
        let (content_size, image_url) = match deviation.content {
            Some(content) => (content.filesize, content.src),
            None => (0, None),
        };
        FeedItem::new(
            deviation.deviationid,
            deviation.title,
            ItemDetail::Deviation {
                content_size,
                image_url,
            },
        )
        .with_url(deviation.url)
    }
}

pub struct DeviantArtSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
    per_page: u32,
}

impl DeviantArtSource {
    pub fn new(client: Client, endpoint: &str, token: Option<String>, per_page: u32) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            token,
            per_page,
        }
    }

    /// Parse a browse page (`{"results": [...]}`).
    pub fn parse_popular(body: &str) -> serde_json::Result<Vec<FeedItem>> {
        let page: PopularPage = serde_json::from_str(body)?;
        Ok(page.results.into_iter().map(FeedItem::from).collect())
    }

    fn request(&self, kind: &SourceKind, page: u32) -> Option<RequestBuilder> {
        if *kind != SourceKind::DeviantArtPopular {
            return None;
        }
        // Offset based: page 1 starts at 0.
        let offset = page.saturating_sub(1) * self.per_page;
        let mut request = self
            .client
            .get(format!("{}v1/oauth2/browse/popular", self.endpoint))
            .query(&[("limit", self.per_page), ("offset", offset)]);
        if let Some(token) = &self.token {
            request = request.query(&[("access_token", token)]);
        }
        Some(request)
    }
}

#[async_trait]
impl DataSource for DeviantArtSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
        let request = self
            .request(kind, page)
            .ok_or_else(|| unsupported(self, kind))?;
        let body = http::get_body(request, NAME).await?;
        Ok(Self::parse_popular(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_map_to_offsets() {
        let source = DeviantArtSource::new(Client::new(), "https://da.test/api/", None, 12);
        let request = source
            .request(&SourceKind::DeviantArtPopular, 3)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/v1/oauth2/browse/popular");
        assert_eq!(request.url().query(), Some("limit=12&offset=24"));
    }

    #[test]
    fn parse_popular_reads_content_size() {
        let body = r#"{
            "has_more": true,
            "next_offset": 12,
            "results": [
                {
                    "deviationid": "0C1E-AB",
                    "title": "Nebula",
                    "url": "https://www.deviantart.com/art/nebula",
                    "content": { "src": "https://img.test/nebula.jpg", "filesize": 48213, "width": 800, "height": 600 }
                },
                { "deviationid": "0C1E-AC", "title": "Text only" }
            ]
        }"#;

        let items = DeviantArtSource::parse_popular(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "0C1E-AB");
        assert_eq!(
            items[0].detail,
            ItemDetail::Deviation {
                content_size: 48213,
                image_url: Some("https://img.test/nebula.jpg".into()),
            }
        );
        assert_eq!(
            items[1].detail,
            ItemDetail::Deviation { content_size: 0, image_url: None }
        );
    }
}
