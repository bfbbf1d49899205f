//! Dribbble shots: the public lists, the signed-in user's feeds, and search.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{http, unsupported, DataSource, FeedItem, ItemDetail};
use crate::config::Credentials;
use crate::error::{FetchError, Result};
use crate::registry::SourceKind;

const NAME: &str = "Dribbble";

#[derive(Debug, Deserialize)]
struct RawShot {
    id: u64,
    title: String,
    html_url: Option<String>,
    #[serde(default)]
    likes_count: u64,
    #[serde(default)]
    views_count: u64,
    #[serde(default)]
    comments_count: u64,
    #[serde(default)]
    animated: bool,
    images: Option<RawImages>,
    user: Option<RawUser>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    hidpi: Option<String>,
    normal: Option<String>,
    teaser: Option<String>,
}

impl RawImages {
    /// Largest available rendition.
    fn best(self) -> Option<String> {
        self.hidpi.or(self.normal).or(self.teaser)
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    name: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLike {
    shot: RawShot,
}

impl From<RawShot> for FeedItem {
    fn from(shot: RawShot) -> Self {
        let author = shot.user.and_then(|u| u.name.or(u.username));
        FeedItem::new(
            shot.id.to_string(),
            shot.title,
            ItemDetail::Shot {
                likes_count: shot.likes_count,
                views_count: shot.views_count,
                comments_count: shot.comments_count,
                image_url: shot.images.and_then(RawImages::best),
                animated: shot.animated,
                author,
                weight_boost: 0.0,
            },
        )
        .with_url(shot.html_url)
        .with_created_at(shot.created_at)
    }
}

/// How a response body has to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Shots,
    /// The likes endpoint wraps each shot in a like.
    Likes,
    /// The user's own shots come back without their author.
    OwnShots,
}

pub struct DribbbleSource {
    client: Client,
    endpoint: String,
    search_endpoint: String,
    access_token: Option<String>,
    user: Option<String>,
    logged_in: bool,
    per_page: u32,
}

impl DribbbleSource {
    pub fn new(
        client: Client,
        endpoint: &str,
        search_endpoint: &str,
        credentials: &Credentials,
        per_page: u32,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            search_endpoint: search_endpoint.to_string(),
            access_token: credentials.dribbble_access_token.clone(),
            user: credentials.dribbble_user.clone(),
            logged_in: credentials.dribbble_logged_in(),
            per_page,
        }
    }

    /// Parse a JSON array of shots.
    pub fn parse_shots(body: &str) -> serde_json::Result<Vec<FeedItem>> {
        let shots: Vec<RawShot> = serde_json::from_str(body)?;
        Ok(shots.into_iter().map(FeedItem::from).collect())
    }

    /// Parse a JSON array of likes, keeping only the liked shots.
    pub fn parse_likes(body: &str) -> serde_json::Result<Vec<FeedItem>> {
        let likes: Vec<RawLike> = serde_json::from_str(body)?;
        Ok(likes.into_iter().map(|like| FeedItem::from(like.shot)).collect())
    }

    /// Parse the signed-in user's own shots, which the API returns without
    /// an author; `user` is filled in instead.
    pub fn parse_own_shots(body: &str, user: Option<&str>) -> serde_json::Result<Vec<FeedItem>> {
        let mut items = Self::parse_shots(body)?;
        for item in &mut items {
            if let ItemDetail::Shot { author, .. } = &mut item.detail {
                *author = user.map(str::to_string);
            }
        }
        Ok(items)
    }

    fn api(&self, path: &str, page: u32) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .query(&[("page", page), ("per_page", self.per_page)]);
        http::with_bearer(request, self.access_token.as_deref())
    }

    fn request(&self, kind: &SourceKind, page: u32) -> Result<(RequestBuilder, Body)> {
        let request = match kind {
            SourceKind::DribbblePopular => (self.api("v1/shots", page), Body::Shots),
            SourceKind::DribbbleRecent => (
                self.api("v1/shots", page).query(&[("sort", "recent")]),
                Body::Shots,
            ),
            SourceKind::DribbbleDebuts => (
                self.api("v1/shots", page).query(&[("list", "debuts")]),
                Body::Shots,
            ),
            SourceKind::DribbbleAnimated => (
                self.api("v1/shots", page).query(&[("list", "animated")]),
                Body::Shots,
            ),
            SourceKind::DribbbleFollowing => {
                (self.api("v1/user/following/shots", page), Body::Shots)
            }
            SourceKind::DribbbleUserLikes => {
                self.require_login()?;
                (self.api("v1/user/likes", page), Body::Likes)
            }
            SourceKind::DribbbleUserShots => {
                self.require_login()?;
                (self.api("v1/user/shots", page), Body::OwnShots)
            }
            SourceKind::DribbbleSearch { query } => {
                let request = self
                    .client
                    .get(format!("{}search", self.search_endpoint))
                    .query(&[("q", query.as_str()), ("s", "latest")])
                    .query(&[("page", page), ("per_page", self.per_page)]);
                (request, Body::Shots)
            }
            _ => return Err(unsupported(self, kind)),
        };
        Ok(request)
    }

    fn require_login(&self) -> Result<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(FetchError::NotLoggedIn(NAME))
        }
    }
}

#[async_trait]
impl DataSource for DribbbleSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, kind: &SourceKind, page: u32) -> Result<Vec<FeedItem>> {
        let (request, shape) = self.request(kind, page)?;
        let body = http::get_body(request, NAME).await?;
        let items = match shape {
            Body::Shots => Self::parse_shots(&body)?,
            Body::Likes => Self::parse_likes(&body)?,
            Body::OwnShots => Self::parse_own_shots(&body, self.user.as_deref())?,
        };
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
