//! The core data type shared across all feed sources.
//!
//! `FeedItem` represents a single story, shot, post or deviation.  Every API
//! client converts its native JSON into `FeedItem`s so the aggregator, the
//! weighers and the item list can stay source-agnostic, while the
//! engagement metrics each weigher needs travel in [`ItemDetail`].
//!
//! ## For contributors
//!
//! Adding a new family means adding an [`ItemDetail`] variant carrying the
//! metrics its weigher reads, plus a [`Family`] variant to route on.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// The API family an item (or a source) belongs to.
///
/// Items are only comparable for de-duplication within a family: a Dribbble
/// shot and a Designer News story may well share a numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    DesignerNews,
    Dribbble,
    ProductHunt,
    DeviantArt,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::DesignerNews => "Designer News",
            Family::Dribbble => "Dribbble",
            Family::ProductHunt => "Product Hunt",
            Family::DeviantArt => "DeviantArt",
        }
    }
}

/// Source-specific payload, including the raw metrics used for weighing.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDetail {
    /// A Designer News story.
    Story {
        vote_count: u32,
        comment_count: u32,
        hostname: Option<String>,
        badge: Option<String>,
    },
    /// A Dribbble shot.
    Shot {
        likes_count: u64,
        views_count: u64,
        comments_count: u64,
        image_url: Option<String>,
        animated: bool,
        author: Option<String>,
        /// Manually curated promotion added on top of the computed weight.
        weight_boost: f32,
    },
    /// A Product Hunt post.
    Post {
        votes_count: u32,
        comments_count: u32,
        tagline: String,
        discussion_url: Option<String>,
    },
    /// A DeviantArt deviation.
    Deviation {
        /// Size of the main image in bytes.  Stands in for a likes metric
        /// that the browse API does not return.
        content_size: u64,
        image_url: Option<String>,
    },
}

impl ItemDetail {
    pub fn family(&self) -> Family {
        match self {
            ItemDetail::Story { .. } => Family::DesignerNews,
            ItemDetail::Shot { .. } => Family::Dribbble,
            ItemDetail::Post { .. } => Family::ProductHunt,
            ItemDetail::Deviation { .. } => Family::DeviantArt,
        }
    }
}

/// A single feed entry, normalised from any data source.
///
/// `page` and `data_source` are stamped by the aggregator when the batch
/// arrives; clients leave them at their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    /// Identifier, unique within the item's [`Family`].
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// Link to the item on its site, if any.
    pub url: Option<String>,

    /// Creation timestamp reported by the API.
    pub created_at: Option<DateTime<Utc>>,

    /// The 1-based page this item was fetched on.
    pub page: u32,

    /// Ascending sort key.  `None` until a weigher has processed the batch
    /// this item arrived in.
    pub weight: Option<f32>,

    /// Key of the source that delivered this item.
    pub data_source: String,

    pub detail: ItemDetail,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, detail: ItemDetail) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            created_at: None,
            page: 0,
            weight: None,
            data_source: String::new(),
            detail,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn family(&self) -> Family {
        self.detail.family()
    }

    /// Whether both values describe the same upstream item, regardless of
    /// which source delivered them.
    pub fn is_same_item(&self, other: &FeedItem) -> bool {
        self.family() == other.family() && self.id == other.id
    }

    /// Ascending weight order.  Unweighed items sort after every weighed one.
    pub fn cmp_weight(&self, other: &FeedItem) -> Ordering {
        match (self.weight, other.weight) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
